//! Persistent credential storage
//!
//! Exactly two logical records are persisted: the API key and the selected
//! model id. Both sit behind the [`CredentialStore`] trait so workflows
//! never care where they live. The production [`ProfileStore`] keeps the key
//! in the system keyring and the model in the config file; [`MemoryStore`]
//! backs tests and ephemeral sessions.
//!
//! No value validation happens here; a bad key is the provider's to reject.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

use keyring::Entry;

use crate::core::config::{Config, ConfigError};

const KEYRING_SERVICE: &str = "causette";
const KEYRING_USER: &str = "api_key";

/// The two logical records the client persists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialKey {
    ApiKey,
    SelectedModel,
}

/// Describes failures when attempting to access the system keyring.
///
/// Recoverable errors indicate that the credential backend was temporarily
/// unavailable (for example when the keychain service is locked or
/// inaccessible). Permanent errors surface the underlying cause directly so
/// callers can report them to the user.
#[derive(Debug)]
pub enum KeyringAccessError {
    Recoverable(keyring::Error),
    Permanent(keyring::Error),
}

impl KeyringAccessError {
    fn inner(&self) -> &keyring::Error {
        match self {
            KeyringAccessError::Recoverable(err) | KeyringAccessError::Permanent(err) => err,
        }
    }

    /// True when the error represents a temporary outage of the platform
    /// keyring backend.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, KeyringAccessError::Recoverable(_))
    }
}

impl From<keyring::Error> for KeyringAccessError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::PlatformFailure(_) | keyring::Error::NoStorageAccess(_) => {
                KeyringAccessError::Recoverable(err)
            }
            other => KeyringAccessError::Permanent(other),
        }
    }
}

impl fmt::Display for KeyringAccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner())
    }
}

impl Error for KeyringAccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.inner())
    }
}

/// A store failure. Callers must treat this distinctly from "not set": a
/// missing record is `Ok(None)`, never an error.
#[derive(Debug)]
pub enum CredentialError {
    /// The platform keyring could not be accessed.
    Keyring(KeyringAccessError),
    /// The config file backing the selected model could not be used.
    Config(ConfigError),
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialError::Keyring(source) => write!(f, "{source}"),
            CredentialError::Config(source) => write!(f, "{source}"),
        }
    }
}

impl Error for CredentialError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CredentialError::Keyring(source) => Some(source),
            CredentialError::Config(source) => Some(source),
        }
    }
}

impl From<ConfigError> for CredentialError {
    fn from(err: ConfigError) -> Self {
        CredentialError::Config(err)
    }
}

/// Opaque get/set string store over the two logical records.
pub trait CredentialStore {
    /// `Ok(None)` means the record has never been set, distinct from an
    /// empty string and from a store failure.
    fn get(&self, key: CredentialKey) -> Result<Option<String>, CredentialError>;

    fn set(&mut self, key: CredentialKey, value: &str) -> Result<(), CredentialError>;

    /// Remove both records. Records that were never set are not an error.
    fn clear(&mut self) -> Result<(), CredentialError>;
}

/// Production store: API key in the system keyring, selected model in the
/// config file.
pub struct ProfileStore {
    config_path: PathBuf,
}

impl ProfileStore {
    pub fn open_default() -> Self {
        Self::open_at(Config::default_path())
    }

    pub fn open_at(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    fn entry() -> Result<Entry, CredentialError> {
        Entry::new(KEYRING_SERVICE, KEYRING_USER)
            .map_err(|err| CredentialError::Keyring(err.into()))
    }

    fn get_api_key(&self) -> Result<Option<String>, CredentialError> {
        match Self::entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(CredentialError::Keyring(err.into())),
        }
    }

    fn set_api_key(&self, value: &str) -> Result<(), CredentialError> {
        Self::entry()?
            .set_password(value)
            .map_err(|err| CredentialError::Keyring(err.into()))
    }

    fn clear_api_key(&self) -> Result<(), CredentialError> {
        match Self::entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(CredentialError::Keyring(err.into())),
        }
    }

    fn load_config(&self) -> Result<Config, CredentialError> {
        Ok(Config::load_from(&self.config_path)?)
    }

    fn store_model(&self, value: Option<String>) -> Result<(), CredentialError> {
        let mut config = self.load_config()?;
        config.selected_model = value;
        Ok(config.save_to(&self.config_path)?)
    }
}

impl CredentialStore for ProfileStore {
    fn get(&self, key: CredentialKey) -> Result<Option<String>, CredentialError> {
        match key {
            CredentialKey::ApiKey => self.get_api_key(),
            CredentialKey::SelectedModel => Ok(self.load_config()?.selected_model),
        }
    }

    fn set(&mut self, key: CredentialKey, value: &str) -> Result<(), CredentialError> {
        match key {
            CredentialKey::ApiKey => self.set_api_key(value),
            CredentialKey::SelectedModel => self.store_model(Some(value.to_string())),
        }
    }

    fn clear(&mut self) -> Result<(), CredentialError> {
        self.clear_api_key()?;
        self.store_model(None)
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    api_key: Option<String>,
    selected_model: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(api_key: Option<&str>, selected_model: Option<&str>) -> Self {
        Self {
            api_key: api_key.map(str::to_string),
            selected_model: selected_model.map(str::to_string),
        }
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: CredentialKey) -> Result<Option<String>, CredentialError> {
        Ok(match key {
            CredentialKey::ApiKey => self.api_key.clone(),
            CredentialKey::SelectedModel => self.selected_model.clone(),
        })
    }

    fn set(&mut self, key: CredentialKey, value: &str) -> Result<(), CredentialError> {
        match key {
            CredentialKey::ApiKey => self.api_key = Some(value.to_string()),
            CredentialKey::SelectedModel => self.selected_model = Some(value.to_string()),
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), CredentialError> {
        self.api_key = None;
        self.selected_model = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_distinguishes_unset_from_empty() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get(CredentialKey::ApiKey).unwrap(), None);

        store.set(CredentialKey::ApiKey, "").unwrap();
        assert_eq!(
            store.get(CredentialKey::ApiKey).unwrap(),
            Some(String::new())
        );
    }

    #[test]
    fn clear_removes_both_records() {
        let mut store = MemoryStore::with_values(Some("sk-test"), Some("mistral-small"));
        store.clear().unwrap();
        assert_eq!(store.get(CredentialKey::ApiKey).unwrap(), None);
        assert_eq!(store.get(CredentialKey::SelectedModel).unwrap(), None);
    }

    #[test]
    fn profile_store_persists_model_through_config_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut store = ProfileStore::open_at(dir.path().join("causette.toml"));

        assert_eq!(store.get(CredentialKey::SelectedModel).unwrap(), None);
        store
            .set(CredentialKey::SelectedModel, "mistral-small")
            .unwrap();
        assert_eq!(
            store.get(CredentialKey::SelectedModel).unwrap().as_deref(),
            Some("mistral-small")
        );
    }
}
