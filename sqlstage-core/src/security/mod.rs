//! Security utilities for credential protection.
//!
//! # Security Guarantees
//! - Credentials are stored in `Zeroizing` containers for automatic memory clearing
//! - Passwords are redacted from `Debug` output, logs and error messages
//! - Passwords can be read from the OS credential store instead of files

mod credentials;
mod secret_store;

pub use credentials::Credentials;
pub use secret_store::secret_store_lookup;

/// Placeholder written wherever a password would appear in logged output.
pub const REDACTED: &str = "***";
