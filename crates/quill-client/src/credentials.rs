//! Where the client keeps its tokens, and what happens when they're gone.

use std::sync::RwLock;

/// The two stored tokens. Having them is what "logged in" means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
}

/// Client-side token storage (a browser's local storage, a keychain, a
/// file). Synchronous: implementations must not block for long.
pub trait CredentialStore: Send + Sync + 'static {
    fn access_token(&self) -> Option<String>;

    fn refresh_token(&self) -> Option<String>;

    /// Stores a full pair after login or registration.
    fn store(&self, credentials: Credentials);

    /// Replaces the access token after a refresh, keeping the refresh token.
    fn set_access_token(&self, token: String);

    /// Forgets everything. Returns `true` if anything was stored.
    fn clear(&self) -> bool;
}

/// Called once when a failed refresh forces the user out, typically to
/// navigate to the sign-in page.
pub trait SignOut: Send + Sync + 'static {
    fn sign_out(&self);
}

impl<F> SignOut for F
where
    F: Fn() + Send + Sync + 'static,
{
    fn sign_out(&self) {
        self()
    }
}

/// A [`CredentialStore`] held in process memory.
#[derive(Debug, Default)]
pub struct MemoryCredentials {
    inner: RwLock<Option<Credentials>>,
}

impl MemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts out already logged in.
    pub fn with(credentials: Credentials) -> Self {
        Self {
            inner: RwLock::new(Some(credentials)),
        }
    }

    fn read(&self) -> Option<Credentials> {
        // A poisoned lock only means a writer panicked mid-assignment of
        // an `Option`; the value is still well-formed.
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<Credentials>> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CredentialStore for MemoryCredentials {
    fn access_token(&self) -> Option<String> {
        self.read().map(|c| c.access_token)
    }

    fn refresh_token(&self) -> Option<String> {
        self.read().map(|c| c.refresh_token)
    }

    fn store(&self, credentials: Credentials) {
        *self.write() = Some(credentials);
    }

    fn set_access_token(&self, token: String) {
        if let Some(c) = self.write().as_mut() {
            c.access_token = token;
        }
    }

    fn clear(&self) -> bool {
        self.write().take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> Credentials {
        Credentials {
            access_token: "a1".into(),
            refresh_token: "r1".into(),
        }
    }

    #[test]
    fn test_store_then_read_both_tokens() {
        let creds = MemoryCredentials::new();
        creds.store(pair());
        assert_eq!(creds.access_token().as_deref(), Some("a1"));
        assert_eq!(creds.refresh_token().as_deref(), Some("r1"));
    }

    #[test]
    fn test_set_access_token_keeps_refresh_token() {
        let creds = MemoryCredentials::with(pair());
        creds.set_access_token("a2".into());
        assert_eq!(creds.access_token().as_deref(), Some("a2"));
        assert_eq!(creds.refresh_token().as_deref(), Some("r1"));
    }

    #[test]
    fn test_set_access_token_when_logged_out_is_noop() {
        let creds = MemoryCredentials::new();
        creds.set_access_token("a2".into());
        assert!(creds.access_token().is_none());
    }

    #[test]
    fn test_clear_reports_whether_anything_was_stored() {
        let creds = MemoryCredentials::with(pair());
        assert!(creds.clear());
        assert!(!creds.clear());
        assert!(creds.refresh_token().is_none());
    }

    #[test]
    fn test_closure_is_a_sign_out_hook() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let hook = move || {
            counter.fetch_add(1, Ordering::SeqCst);
        };
        hook.sign_out();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
