//! Configuration gating
//!
//! "Configured" means both an API key and a model id are present and
//! non-empty. The gate is an explicit value recomputed on demand after any
//! credential mutation; there is no reactive global flag. Chat entrypoints
//! call [`resolve_session`] and refuse to run when resolution fails.

use std::error::Error;
use std::fmt;

use crate::core::constants::API_KEY_ENV;
use crate::core::credentials::{CredentialError, CredentialKey, CredentialStore};

const QUICK_FIXES: &[&str] = &[
    "causette auth                   # Store an API key",
    "causette pick-model             # Choose a default model",
    "export MISTRAL_API_KEY=...      # Use an environment variable",
];

/// Session parameters handed to the chat workflow. Both fields are present
/// and non-empty by construction.
#[derive(Clone, Debug)]
pub struct ChatSession {
    pub api_key: String,
    pub model_id: String,
}

#[derive(Debug)]
pub enum SessionError {
    /// One or both credentials are absent; the chat workflow must refuse to
    /// operate and send the user back to setup.
    NotConfigured {
        missing_key: bool,
        missing_model: bool,
    },

    /// The store itself failed, which is not the same as "not set".
    Store(CredentialError),
}

impl SessionError {
    pub fn quick_fixes(&self) -> &'static [&'static str] {
        match self {
            SessionError::NotConfigured { .. } => QUICK_FIXES,
            SessionError::Store(_) => &[],
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            SessionError::NotConfigured { .. } => 2,
            SessionError::Store(_) => 1,
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NotConfigured {
                missing_key,
                missing_model,
            } => {
                let missing = match (*missing_key, *missing_model) {
                    (true, true) => "an API key and a model selection",
                    (true, false) => "an API key",
                    _ => "a model selection",
                };
                write!(f, "❌ Not configured: {missing} required before chatting")
            }
            SessionError::Store(source) => write!(f, "❌ Credential store error: {source}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SessionError::Store(source) => Some(source),
            _ => None,
        }
    }
}

/// Derived "configured" state, recomputed on demand from the store.
#[derive(Debug, Default)]
pub struct ConfigurationGate {
    configured: bool,
}

impl ConfigurationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute from the store. Store failures propagate rather than
    /// collapsing into a wrong default.
    pub fn recompute(&mut self, store: &dyn CredentialStore) -> Result<bool, CredentialError> {
        let api_key = store.get(CredentialKey::ApiKey)?;
        let model = store.get(CredentialKey::SelectedModel)?;
        self.configured = is_present(api_key.as_deref()) && is_present(model.as_deref());
        Ok(self.configured)
    }

    /// The value from the last `recompute` call. This process is the sole
    /// writer, so no external mutation can make it stale.
    pub fn is_configured(&self) -> bool {
        self.configured
    }
}

fn is_present(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

/// Resolve the exact `{api_key, model_id}` parameters the chat workflow
/// requires, refusing when either is absent. Falls back to the
/// `MISTRAL_API_KEY` environment variable when no key is stored.
pub fn resolve_session(store: &dyn CredentialStore) -> Result<ChatSession, SessionError> {
    let api_key = resolve_key_value(store)?;
    let model_id = store
        .get(CredentialKey::SelectedModel)
        .map_err(SessionError::Store)?
        .filter(|v| !v.is_empty());

    match (api_key, model_id) {
        (Some(api_key), Some(model_id)) => Ok(ChatSession { api_key, model_id }),
        (api_key, model_id) => Err(SessionError::NotConfigured {
            missing_key: api_key.is_none(),
            missing_model: model_id.is_none(),
        }),
    }
}

/// Resolve just the API key, for commands that work before a model is
/// selected (listing and picking models).
pub fn resolve_api_key(store: &dyn CredentialStore) -> Result<String, SessionError> {
    resolve_key_value(store)?.ok_or(SessionError::NotConfigured {
        missing_key: true,
        missing_model: false,
    })
}

fn resolve_key_value(store: &dyn CredentialStore) -> Result<Option<String>, SessionError> {
    let stored = store
        .get(CredentialKey::ApiKey)
        .map_err(SessionError::Store)?
        .filter(|v| !v.is_empty());
    Ok(stored.or_else(|| std::env::var(API_KEY_ENV).ok().filter(|v| !v.is_empty())))
}
