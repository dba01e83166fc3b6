//! Authentication for Quill: who you are, and for how long.
//!
//! 1. **Credentials**: registration input validation and argon2id
//!    password hashing ([`validate_registration`], [`hash_password`]).
//! 2. **Tokens**: a [`TokenIssuer`] that mints short-lived access tokens
//!    and longer-lived refresh tokens, and tells an *expired* access token
//!    apart from an *invalid* one.
//! 3. **Lifecycle**: [`AuthService`] ties both to a [`UserStore`]:
//!    `register`, `login`, `refresh`, `logout`, `authenticate`.
//!
//! The user store is a boundary: [`InMemoryUserStore`] backs the server
//! and the tests; a document database slots in behind the same trait.

#![allow(async_fn_in_trait)]

mod config;
mod error;
mod password;
mod service;
mod sessions;
mod store;
mod token;
mod validation;

pub use config::AuthConfig;
pub use error::{AuthError, StoreError};
pub use password::{hash_password, verify_password};
pub use service::{AuthOutcome, AuthService};
pub use sessions::RefreshSessions;
pub use store::{InMemoryUserStore, NewUser, Notification, User, UserStore};
pub use token::{Claims, TokenIssuer, TokenPair, TokenType};
pub use validation::{normalize_email, validate_registration};
