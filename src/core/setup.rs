//! Configuration workflow
//!
//! Owns credential edits and the catalog lifecycle. A key edit is persisted
//! immediately and schedules a debounced catalog refresh; refresh results
//! come back as [`CatalogEvent`]s on the receiver returned by
//! [`SetupWorkflow::new`]. Applying a refresh stores the catalog, selects
//! and persists the default model, and recomputes the configuration gate.

use std::error::Error;
use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::api::error::ApiError;
use crate::api::{ModelInfo, ProviderClient};
use crate::core::catalog::{EmptyCatalogError, ModelCatalog};
use crate::core::constants::REFRESH_DEBOUNCE;
use crate::core::credentials::{CredentialError, CredentialKey, CredentialStore};
use crate::core::debounce::DebouncedTask;
use crate::core::gate::ConfigurationGate;

/// Result of a background catalog refresh.
#[derive(Debug)]
pub enum CatalogEvent {
    Refreshed(Vec<ModelInfo>),
    RefreshFailed(ApiError),
}

#[derive(Debug)]
pub enum SetupError {
    Store(CredentialError),
    EmptyCatalog(EmptyCatalogError),
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::Store(source) => write!(f, "{source}"),
            SetupError::EmptyCatalog(source) => write!(f, "{source}"),
        }
    }
}

impl Error for SetupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SetupError::Store(source) => Some(source),
            SetupError::EmptyCatalog(source) => Some(source),
        }
    }
}

impl From<CredentialError> for SetupError {
    fn from(err: CredentialError) -> Self {
        SetupError::Store(err)
    }
}

pub struct SetupWorkflow<S: CredentialStore> {
    store: S,
    gate: ConfigurationGate,
    catalog: ModelCatalog,
    pending_refresh: DebouncedTask,
    events: mpsc::UnboundedSender<CatalogEvent>,
}

impl<S: CredentialStore> SetupWorkflow<S> {
    pub fn new(store: S) -> (Self, mpsc::UnboundedReceiver<CatalogEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (
            Self {
                store,
                gate: ConfigurationGate::new(),
                catalog: ModelCatalog::default(),
                pending_refresh: DebouncedTask::new(),
                events,
            },
            rx,
        )
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn is_configured(&self) -> bool {
        self.gate.is_configured()
    }

    /// Recompute the gate from the store. Called internally after every
    /// credential mutation; exposed for session start.
    pub fn recompute_gate(&mut self) -> Result<bool, CredentialError> {
        self.gate.recompute(&self.store)
    }

    /// Persist a key edit immediately, then schedule the debounced catalog
    /// refresh. A blank key only cancels whatever refresh was pending.
    pub fn edit_api_key(&mut self, value: &str) -> Result<(), CredentialError> {
        self.store.set(CredentialKey::ApiKey, value)?;
        self.gate.recompute(&self.store)?;

        if value.trim().is_empty() {
            self.pending_refresh.cancel();
            return Ok(());
        }
        self.schedule_refresh(REFRESH_DEBOUNCE, value.to_string());
        Ok(())
    }

    /// Refresh without the quiet period (explicit user action). Supersedes
    /// any pending debounced refresh.
    pub fn refresh_now(&mut self, api_key: &str) {
        self.schedule_refresh(Duration::ZERO, api_key.to_string());
    }

    /// Fold a completed refresh into the workflow: store the catalog, pick
    /// and persist the default model, recompute the gate.
    ///
    /// Returns the selected model id, or `None` when the provider advertises
    /// no models at all (nothing is selected or persisted in that case).
    pub fn apply_refresh(&mut self, models: Vec<ModelInfo>) -> Result<Option<String>, SetupError> {
        self.catalog = ModelCatalog::from_models(models);
        if self.catalog.is_empty() {
            self.gate.recompute(&self.store).map_err(SetupError::Store)?;
            return Ok(None);
        }

        let previous = self
            .store
            .get(CredentialKey::SelectedModel)
            .map_err(SetupError::Store)?;
        let selected = self
            .catalog
            .select_default(previous.as_deref())
            .map_err(SetupError::EmptyCatalog)?;
        self.select_model(&selected)?;
        Ok(Some(selected))
    }

    /// Persist a model selection immediately and recompute the gate.
    pub fn select_model(&mut self, model_id: &str) -> Result<(), SetupError> {
        self.store
            .set(CredentialKey::SelectedModel, model_id)
            .map_err(SetupError::Store)?;
        self.gate.recompute(&self.store).map_err(SetupError::Store)?;
        Ok(())
    }

    /// Explicit clear of both credentials.
    pub fn clear(&mut self) -> Result<(), SetupError> {
        self.pending_refresh.cancel();
        self.store.clear().map_err(SetupError::Store)?;
        self.catalog = ModelCatalog::default();
        self.gate.recompute(&self.store).map_err(SetupError::Store)?;
        Ok(())
    }

    fn schedule_refresh(&mut self, delay: Duration, api_key: String) {
        let events = self.events.clone();
        debug!(delay_ms = delay.as_millis() as u64, "scheduling catalog refresh");
        self.pending_refresh.schedule(delay, async move {
            let client = ProviderClient::new(api_key);
            let event = match ModelCatalog::refresh(&client).await {
                Ok(catalog) => CatalogEvent::Refreshed(catalog.into_models()),
                Err(err) => CatalogEvent::RefreshFailed(err),
            };
            let _ = events.send(event);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::credentials::MemoryStore;

    fn model(id: &str) -> ModelInfo {
        ModelInfo {
            id: id.to_string(),
            display_name: None,
            created: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn key_edits_persist_immediately() {
        let (mut setup, _events) = SetupWorkflow::new(MemoryStore::new());

        setup.edit_api_key("sk-test").unwrap();

        assert_eq!(
            setup.store().get(CredentialKey::ApiKey).unwrap().as_deref(),
            Some("sk-test")
        );
        // Key alone does not configure the session.
        assert!(!setup.is_configured());
    }

    #[test]
    fn applying_a_refresh_selects_and_persists_the_default() {
        let (mut setup, _events) = SetupWorkflow::new(MemoryStore::with_values(
            Some("sk-test"),
            None,
        ));
        setup.recompute_gate().unwrap();

        let selected = setup
            .apply_refresh(vec![model("a"), model("a"), model("b")])
            .unwrap();

        assert_eq!(selected.as_deref(), Some("a"));
        assert_eq!(setup.catalog().len(), 2);
        assert_eq!(
            setup
                .store()
                .get(CredentialKey::SelectedModel)
                .unwrap()
                .as_deref(),
            Some("a")
        );
        assert!(setup.is_configured());
    }

    #[test]
    fn refresh_keeps_a_previously_selected_model() {
        let (mut setup, _events) = SetupWorkflow::new(MemoryStore::with_values(
            Some("sk-test"),
            Some("b"),
        ));

        let selected = setup.apply_refresh(vec![model("a"), model("b")]).unwrap();

        assert_eq!(selected.as_deref(), Some("b"));
    }

    #[test]
    fn empty_refresh_selects_nothing() {
        let (mut setup, _events) = SetupWorkflow::new(MemoryStore::with_values(
            Some("sk-test"),
            None,
        ));

        let selected = setup.apply_refresh(Vec::new()).unwrap();

        assert_eq!(selected, None);
        assert!(setup.catalog().is_empty());
        assert!(!setup.is_configured());
    }

    #[test]
    fn clear_resets_credentials_catalog_and_gate() {
        let (mut setup, _events) = SetupWorkflow::new(MemoryStore::with_values(
            Some("sk-test"),
            Some("mistral-small"),
        ));
        setup.recompute_gate().unwrap();
        assert!(setup.is_configured());

        setup.clear().unwrap();

        assert_eq!(setup.store().get(CredentialKey::ApiKey).unwrap(), None);
        assert_eq!(setup.store().get(CredentialKey::SelectedModel).unwrap(), None);
        assert!(setup.catalog().is_empty());
        assert!(!setup.is_configured());
    }

    #[tokio::test(start_paused = true)]
    async fn blank_key_edit_cancels_the_pending_refresh() {
        let (mut setup, mut events) = SetupWorkflow::new(MemoryStore::new());

        setup.edit_api_key("sk-test").unwrap();
        setup.edit_api_key("").unwrap();

        // Past the debounce window: the cancelled refresh never reports.
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(events.try_recv().is_err());
    }
}
