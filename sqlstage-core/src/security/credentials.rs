//! Secure credential container with automatic memory zeroing.
//!
//! # Security
//! - Credentials are stored in `Zeroizing<T>` containers
//! - Memory is automatically cleared when credentials go out of scope
//! - Passwords are never exposed in debug output or logs

use zeroize::{Zeroize, Zeroizing};

/// Secure credential container that automatically zeros memory on drop.
///
/// Domain credentials additionally carry the Windows domain the user
/// belongs to; Oracle credentials leave it empty.
///
/// # Example
///
/// ```rust
/// use sqlstage_core::security::Credentials;
///
/// let creds = Credentials::domain("CORP".to_string(), "etl".to_string(), "secret".to_string());
/// assert_eq!(creds.username(), "etl");
/// assert_eq!(creds.qualified_username(), "CORP\\etl");
/// assert!(!format!("{:?}", creds).contains("secret"));
/// ```
#[derive(Clone, Zeroize)]
pub struct Credentials {
    domain: Zeroizing<Option<String>>,
    username: Zeroizing<String>,
    password: Zeroizing<String>,
}

impl Credentials {
    /// Creates database-native credentials (user and password).
    pub fn new(username: String, password: String) -> Self {
        Self {
            domain: Zeroizing::new(None),
            username: Zeroizing::new(username),
            password: Zeroizing::new(password),
        }
    }

    /// Creates Windows domain credentials.
    pub fn domain(domain: String, username: String, password: String) -> Self {
        Self {
            domain: Zeroizing::new(Some(domain)),
            username: Zeroizing::new(username),
            password: Zeroizing::new(password),
        }
    }

    /// Gets the username without its domain.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Gets the domain, if these are domain credentials.
    pub fn domain_name(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Gets the username as `DOMAIN\user` for domain credentials.
    pub fn qualified_username(&self) -> String {
        match self.domain_name() {
            Some(domain) => format!("{}\\{}", domain, self.username()),
            None => self.username().to_string(),
        }
    }

    /// Exposes the password to address rendering and the driver layer only.
    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("domain", &self.domain_name())
            .field("username", &self.username())
            .field("password", &"****")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_new() {
        let creds = Credentials::new("store_user".to_string(), "p".to_string());
        assert_eq!(creds.username(), "store_user");
        assert_eq!(creds.domain_name(), None);
        assert_eq!(creds.qualified_username(), "store_user");
        assert_eq!(creds.password(), "p");
    }

    #[test]
    fn test_credentials_domain() {
        let creds = Credentials::domain(
            "CORP".to_string(),
            "etl".to_string(),
            "pw".to_string(),
        );
        assert_eq!(creds.domain_name(), Some("CORP"));
        assert_eq!(creds.qualified_username(), "CORP\\etl");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("user".to_string(), "super_secret_password_123".to_string());
        let debug = format!("{:?}", creds);
        assert!(debug.contains("user"));
        assert!(!debug.contains("super_secret_password_123"));
    }

    #[test]
    fn test_credentials_clone() {
        let creds1 = Credentials::new("user".to_string(), "pass".to_string());
        let creds2 = creds1.clone();
        assert_eq!(creds1.username(), creds2.username());
        assert_eq!(creds1.password(), creds2.password());
    }
}
