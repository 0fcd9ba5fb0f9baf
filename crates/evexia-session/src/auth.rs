//! Stored authentication artifacts.
//!
//! The token and the signed-in identity live in local storage under fixed
//! keys. The session monitor never reads them directly: it is told whether
//! the user is authenticated and calls back into [`AuthStore`] on expiry.

use std::sync::Arc;

use evexia_store::{LocalStorage, Result};
use tracing::{debug, info, warn};

use crate::hooks::SessionHooks;

/// Local storage key holding the auth token.
pub const TOKEN_KEY: &str = "token";

/// Local storage key holding the signed-in identity.
pub const USER_KEY: &str = "user";

/// Reads and clears the stored credentials.
#[derive(Clone)]
pub struct AuthStore {
    storage: Arc<dyn LocalStorage>,
}

impl AuthStore {
    /// Create a store over shared local storage.
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self { storage }
    }

    /// Store credentials after a successful sign-in.
    pub fn login(&self, token: &str, user: Option<&str>) -> Result<()> {
        self.storage.set_item(TOKEN_KEY, token)?;
        match user {
            Some(user) => self.storage.set_item(USER_KEY, user)?,
            None => self.storage.remove_item(USER_KEY)?,
        }
        debug!(has_user = user.is_some(), "Credentials stored");
        Ok(())
    }

    /// Whether a non-empty token is stored.
    ///
    /// Read failures count as signed out.
    pub fn is_authenticated(&self) -> bool {
        match self.token() {
            Ok(token) => token.is_some_and(|t| !t.trim().is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read auth token");
                false
            }
        }
    }

    /// The stored token.
    pub fn token(&self) -> Result<Option<String>> {
        self.storage.get_item(TOKEN_KEY)
    }

    /// The stored identity.
    pub fn user(&self) -> Result<Option<String>> {
        self.storage.get_item(USER_KEY)
    }

    /// Remove the stored credentials.
    pub fn logout(&self) -> Result<()> {
        self.storage.remove_item(TOKEN_KEY)?;
        self.storage.remove_item(USER_KEY)?;
        info!("Signed out");
        Ok(())
    }
}

impl std::fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStore")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

/// Session expiry clears the stored credentials.
impl SessionHooks for AuthStore {
    fn on_logout(&mut self) {
        if let Err(e) = self.logout() {
            warn!(error = %e, "Failed to clear credentials on session expiry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evexia_store::MemoryStorage;

    fn store() -> AuthStore {
        AuthStore::new(Arc::new(MemoryStorage::new()))
    }

    #[test]
    fn test_login_and_logout() {
        let auth = store();
        assert!(!auth.is_authenticated());

        auth.login("jwt-token", Some(r#"{"id":"u-1"}"#)).unwrap();
        assert!(auth.is_authenticated());
        assert_eq!(auth.token().unwrap(), Some("jwt-token".to_string()));
        assert_eq!(auth.user().unwrap(), Some(r#"{"id":"u-1"}"#.to_string()));

        auth.logout().unwrap();
        assert!(!auth.is_authenticated());
        assert_eq!(auth.user().unwrap(), None);
    }

    #[test]
    fn test_blank_token_is_not_authenticated() {
        let auth = store();
        auth.login("  ", None).unwrap();
        assert!(!auth.is_authenticated());
    }

    #[test]
    fn test_login_without_user_clears_stale_identity() {
        let auth = store();
        auth.login("a", Some("old-user")).unwrap();
        auth.login("b", None).unwrap();
        assert_eq!(auth.user().unwrap(), None);
    }

    #[test]
    fn test_session_expiry_clears_credentials() {
        let mut auth = store();
        auth.login("jwt-token", Some("ana")).unwrap();

        auth.on_logout();

        assert!(!auth.is_authenticated());
        assert_eq!(auth.user().unwrap(), None);
    }

    #[test]
    fn test_clones_share_storage() {
        let auth = store();
        let other = auth.clone();
        auth.login("t", None).unwrap();
        assert!(other.is_authenticated());
    }
}
