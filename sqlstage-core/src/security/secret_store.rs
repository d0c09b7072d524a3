//! Passwords kept in the operating system's credential store.
//!
//! Entries are addressed by a service and user pair, the same pair other
//! tools use when saving them (for example `keyring set fakeora pwd`).

use keyring::Entry;
use tracing::{debug, warn};

/// Reads a password from the OS credential store.
///
/// Returns `None` when there is no entry or the store cannot be read. The
/// field then stays absent and resolution reports it as missing.
pub fn secret_store_lookup(service: &str, user: &str) -> Option<String> {
    let entry = match Entry::new(service, user) {
        Ok(entry) => entry,
        Err(e) => {
            warn!("Invalid secret store entry '{}'/'{}': {}", service, user, e);
            return None;
        }
    };

    match entry.get_password() {
        Ok(password) => Some(password),
        Err(keyring::Error::NoEntry) => {
            debug!("No secret store entry for '{}'/'{}'", service, user);
            None
        }
        Err(e) => {
            warn!("Secret store lookup for '{}'/'{}' failed: {}", service, user, e);
            None
        }
    }
}
