//! Model listing functionality
//!
//! This module handles listing the models available to the stored key.

use std::error::Error;

use chrono::{DateTime, Utc};

use crate::api::{ModelInfo, ProviderClient};
use crate::core::catalog::ModelCatalog;
use crate::core::credentials::{CredentialKey, CredentialStore, ProfileStore};
use crate::core::gate::{resolve_api_key, SessionError};

pub async fn list_models() -> Result<(), Box<dyn Error>> {
    let store = ProfileStore::open_default();
    let api_key = resolve_api_key_or_exit(&store);

    println!("🤖 Available Models");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();

    if let Some(selected) = store.get(CredentialKey::SelectedModel)? {
        println!("🎯 Selected model: {selected}");
        println!();
    }

    let client = ProviderClient::new(api_key);
    let catalog = ModelCatalog::refresh(&client).await?;

    if catalog.is_empty() {
        println!("No models found for this key.");
        return Ok(());
    }

    println!("Found {} models (sorted newest first):", catalog.len());
    println!();
    for model in catalog.models() {
        println!("  • {}", model.id);
        print_model_details(model, "    ");
        println!();
    }

    Ok(())
}

/// Resolve the API key or exit with setup guidance; listing and picking
/// models only need the key, not a model selection.
pub(crate) fn resolve_api_key_or_exit(store: &dyn CredentialStore) -> String {
    match resolve_api_key(store) {
        Ok(api_key) => api_key,
        Err(err) => exit_with_session_error(err),
    }
}

pub(crate) fn exit_with_session_error(err: SessionError) -> ! {
    eprintln!("{err}");
    let fixes = err.quick_fixes();
    if !fixes.is_empty() {
        eprintln!();
        eprintln!("💡 Quick fixes:");
        for fix in fixes {
            eprintln!("  • {fix}");
        }
    }
    std::process::exit(err.exit_code());
}

/// Secondary model details, indented under the id line.
pub(crate) fn print_model_details(model: &ModelInfo, indent: &str) {
    if let Some(display_name) = &model.display_name {
        if !display_name.is_empty() && display_name != &model.id {
            println!("{indent}Name: {display_name}");
        }
    }
    if let Some(created) = model.created {
        if created > 0 {
            // Some APIs return timestamps in milliseconds, others in seconds.
            let timestamp_secs = if created > 10_000_000_000 {
                created / 1000
            } else {
                created
            };
            if let Some(dt) = DateTime::<Utc>::from_timestamp(timestamp_secs as i64, 0) {
                println!("{indent}Created: {}", dt.format("%Y-%m-%d %H:%M:%S UTC"));
            }
        }
    }
}
