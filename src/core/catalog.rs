//! Model catalog management
//!
//! Fetching, deduplication, ordering, and default selection of the models
//! the current key can access.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::error::Error;
use std::fmt;

use crate::api::error::ApiError;
use crate::api::{ModelInfo, ProviderClient};

/// Raised when a default is requested from an empty catalog.
///
/// This is a programming-contract violation: callers must guard with
/// [`ModelCatalog::is_empty`] before selecting, so it never reaches the user.
#[derive(Debug, PartialEq, Eq)]
pub struct EmptyCatalogError;

impl fmt::Display for EmptyCatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot select a default model from an empty catalog")
    }
}

impl Error for EmptyCatalogError {}

/// Deduplicated, newest-first list of models available to the current key.
#[derive(Debug, Default, Clone)]
pub struct ModelCatalog {
    models: Vec<ModelInfo>,
}

impl ModelCatalog {
    /// Fetch the models the key can access, deduplicated and sorted.
    pub async fn refresh(client: &ProviderClient) -> Result<Self, ApiError> {
        Ok(Self::from_models(client.list_models().await?))
    }

    pub fn from_models(models: Vec<ModelInfo>) -> Self {
        let mut models = dedup_models(models);
        sort_models(&mut models);
        Self { models }
    }

    pub fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    pub fn into_models(self) -> Vec<ModelInfo> {
        self.models
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.models.iter().any(|model| model.id == id)
    }

    /// Keep `previously_selected` if it is still available, else fall back
    /// to the first catalog entry.
    pub fn select_default(
        &self,
        previously_selected: Option<&str>,
    ) -> Result<String, EmptyCatalogError> {
        let first = self.models.first().ok_or(EmptyCatalogError)?;
        Ok(match previously_selected {
            Some(previous) if self.contains(previous) => previous.to_string(),
            _ => first.id.clone(),
        })
    }
}

/// Drop duplicate ids; the first occurrence wins regardless of field
/// differences in later duplicates.
pub fn dedup_models(models: Vec<ModelInfo>) -> Vec<ModelInfo> {
    let mut seen = HashSet::new();
    models
        .into_iter()
        .filter(|model| seen.insert(model.id.clone()))
        .collect()
}

/// Sort models by creation date (newest first), falling back to id order
/// for undated entries so the display stays stable.
pub fn sort_models(models: &mut [ModelInfo]) {
    models.sort_by(|a, b| match (&a.created, &b.created) {
        (Some(a_created), Some(b_created)) => {
            b_created.cmp(a_created).then_with(|| a.id.cmp(&b.id))
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.id.cmp(&b.id),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(id: &str) -> ModelInfo {
        ModelInfo {
            id: id.to_string(),
            display_name: None,
            created: None,
        }
    }

    fn dated_model(id: &str, created: u64) -> ModelInfo {
        ModelInfo {
            id: id.to_string(),
            display_name: None,
            created: Some(created),
        }
    }

    fn ids(models: &[ModelInfo]) -> Vec<&str> {
        models.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn duplicates_collapse_to_first_occurrence() {
        let deduped = dedup_models(vec![model("a"), model("a"), model("b")]);
        assert_eq!(ids(&deduped), ["a", "b"]);
    }

    #[test]
    fn dedup_is_idempotent() {
        let input = vec![model("a"), model("b"), model("a"), model("c"), model("b")];
        let once = dedup_models(input);
        let twice = dedup_models(once.clone());
        assert_eq!(ids(&once), ids(&twice));
    }

    #[test]
    fn dedup_keeps_first_fields_on_id_collision() {
        let deduped = dedup_models(vec![dated_model("a", 10), dated_model("a", 99)]);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].created, Some(10));
    }

    #[test]
    fn models_sort_newest_first_with_undated_last() {
        let mut models = vec![
            model("zeta"),
            dated_model("old", 100),
            dated_model("new", 300),
            model("alpha"),
            dated_model("mid", 200),
        ];
        sort_models(&mut models);
        assert_eq!(ids(&models), ["new", "mid", "old", "alpha", "zeta"]);
    }

    #[test]
    fn select_default_keeps_previous_when_available() {
        let catalog = ModelCatalog::from_models(vec![model("a"), model("b"), model("c")]);
        assert_eq!(catalog.select_default(Some("b")).unwrap(), "b");
    }

    #[test]
    fn select_default_falls_back_to_first_entry() {
        let catalog = ModelCatalog::from_models(vec![model("a"), model("b")]);
        assert_eq!(catalog.select_default(Some("gone")).unwrap(), "a");
        assert_eq!(catalog.select_default(None).unwrap(), "a");
    }

    #[test]
    fn select_default_on_empty_catalog_is_a_contract_violation() {
        let catalog = ModelCatalog::default();
        assert_eq!(catalog.select_default(None), Err(EmptyCatalogError));
    }
}
