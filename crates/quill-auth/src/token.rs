//! JWT minting and verification.
//!
//! Both token kinds are HS256 JWTs signed with the same secret and carry
//! the user id in `sub`. The `token_type` claim keeps them from being used
//! in each other's place: a refresh token presented as a bearer token is
//! rejected, and vice versa.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use quill_protocol::UserId;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{AuthConfig, AuthError};

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

/// Which of the two credentials a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims shared by access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    /// Issued at (Unix seconds).
    pub iat: i64,
    /// Expiration (Unix seconds).
    pub exp: i64,
    pub token_type: TokenType,
    /// Token id. For refresh tokens this names the server-side session.
    pub jti: String,
}

impl Claims {
    pub fn user_id(&self) -> UserId {
        UserId::from(self.sub.as_str())
    }

    /// When this token stops being accepted.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// The credentials handed out at login/registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signs and verifies Quill's JWTs.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: chrono::Duration,
    refresh_ttl: chrono::Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Builds an issuer from config.
    ///
    /// # Errors
    /// [`AuthError::Internal`] if a lifetime doesn't fit in a
    /// `chrono::Duration`.
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        let secret = config.jwt_secret.as_bytes();
        let to_chrono = |d: std::time::Duration| {
            chrono::Duration::from_std(d)
                .map_err(|e| AuthError::Internal(format!("token ttl: {e}")))
        };
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl: to_chrono(config.access_ttl)?,
            refresh_ttl: to_chrono(config.refresh_ttl)?,
        })
    }

    /// Mints an access token for `user_id`, valid from now.
    pub fn issue_access(&self, user_id: &UserId) -> Result<String, AuthError> {
        self.issue_access_at(user_id, Utc::now())
    }

    /// Mints an access token as if it had been issued at `issued_at`.
    pub fn issue_access_at(
        &self,
        user_id: &UserId,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.access_ttl).timestamp(),
            token_type: TokenType::Access,
            jti: generate_token_id(),
        };
        self.sign(&claims)
    }

    /// Mints a refresh token for `user_id`, valid from now. Returns the
    /// token and its claims so the caller can record the session.
    pub fn issue_refresh(
        &self,
        user_id: &UserId,
    ) -> Result<(String, Claims), AuthError> {
        self.issue_refresh_at(user_id, Utc::now())
    }

    /// Mints a refresh token as if it had been issued at `issued_at`.
    pub fn issue_refresh_at(
        &self,
        user_id: &UserId,
        issued_at: DateTime<Utc>,
    ) -> Result<(String, Claims), AuthError> {
        let claims = Claims {
            sub: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.refresh_ttl).timestamp(),
            token_type: TokenType::Refresh,
            jti: generate_token_id(),
        };
        let token = self.sign(&claims)?;
        Ok((token, claims))
    }

    /// Verifies an access token.
    ///
    /// # Errors
    /// - [`AuthError::ExpiredAccessToken`]: valid signature, past `exp`
    /// - [`AuthError::InvalidToken`]: anything else (bad signature,
    ///   garbage, wrong token type)
    pub fn verify_access(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.verify(token).map_err(|kind| match kind {
            ErrorKind::ExpiredSignature => AuthError::ExpiredAccessToken,
            _ => AuthError::InvalidToken,
        })?;
        if claims.token_type != TokenType::Access {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }

    /// Verifies a refresh token's signature, expiry, and type. Fails closed:
    /// every failure is [`AuthError::InvalidOrExpiredRefreshToken`].
    pub fn verify_refresh(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self
            .verify(token)
            .map_err(|_| AuthError::InvalidOrExpiredRefreshToken)?;
        if claims.token_type != TokenType::Refresh {
            return Err(AuthError::InvalidOrExpiredRefreshToken);
        }
        Ok(claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(JWT_ALGORITHM), claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("failed to sign token: {e}")))
    }

    fn verify(&self, token: &str) -> Result<Claims, ErrorKind> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| e.into_kind())
    }
}

/// Generates a random 32-character hex string (128 bits of entropy) used
/// as the `jti` of every token. For refresh tokens it doubles as the
/// session id.
fn generate_token_id() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
