use anyhow::{Context, Result};
use keyring::Entry;
use tracing::warn;

use super::TokenStorage;

/// Durable tier backed by the OS keychain.
/// Each storage key becomes one keychain entry under `service`.
///
/// When no keychain is reachable (e.g. a headless Linux box without a
/// secret service) reads return `None` and removals succeed, so the session
/// tier keeps working. Writes still fail.
pub struct KeyringStorage {
    service: String,
}

impl KeyringStorage {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> keyring::Result<Entry> {
        Entry::new(&self.service, key)
    }
}

/// The keychain itself is missing or broken, as opposed to the entry.
fn is_unavailable(err: &keyring::Error) -> bool {
    matches!(
        err,
        keyring::Error::NoStorageAccess(_) | keyring::Error::PlatformFailure(_)
    )
}

fn read_result(result: keyring::Result<String>) -> Result<Option<String>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) if is_unavailable(&e) => {
            warn!(error = %e, "Keychain unavailable, treating durable tier as empty");
            Ok(None)
        }
        Err(e) => Err(e).context("Failed to retrieve token from keychain"),
    }
}

fn remove_result(result: keyring::Result<()>) -> Result<()> {
    match result {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) if is_unavailable(&e) => {
            warn!(error = %e, "Keychain unavailable, nothing to remove");
            Ok(())
        }
        Err(e) => Err(e).context("Failed to delete token from keychain"),
    }
}

impl TokenStorage for KeyringStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        read_result(self.entry(key).and_then(|entry| entry.get_password()))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)
            .and_then(|entry| entry.set_password(value))
            .context("Failed to store token in keychain")
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        remove_result(self.entry(key).and_then(|entry| entry.delete_credential()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_access() -> keyring::Error {
        keyring::Error::NoStorageAccess(Box::new(std::io::Error::other("no secret service")))
    }

    fn platform_failure() -> keyring::Error {
        keyring::Error::PlatformFailure(Box::new(std::io::Error::other("dbus down")))
    }

    #[test]
    fn test_read_missing_entry_is_none() {
        assert_eq!(read_result(Err(keyring::Error::NoEntry)).unwrap(), None);
        assert_eq!(read_result(Ok("abc".to_string())).unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn test_unavailable_keychain_reads_as_empty() {
        assert_eq!(read_result(Err(no_access())).unwrap(), None);
        assert_eq!(read_result(Err(platform_failure())).unwrap(), None);
    }

    #[test]
    fn test_unavailable_keychain_remove_succeeds() {
        remove_result(Err(no_access())).unwrap();
        remove_result(Err(platform_failure())).unwrap();
        remove_result(Err(keyring::Error::NoEntry)).unwrap();
    }

    #[test]
    fn test_other_keychain_errors_propagate() {
        assert!(read_result(Err(keyring::Error::BadEncoding(vec![0xff]))).is_err());
        assert!(remove_result(Err(keyring::Error::Ambiguous(Vec::new()))).is_err());
    }
}
