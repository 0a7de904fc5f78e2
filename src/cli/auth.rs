//! Interactive credential setup and teardown

use std::error::Error;
use std::io::Write;

use crate::core::credentials::{CredentialStore, ProfileStore};
use crate::core::setup::{CatalogEvent, SetupWorkflow};

/// Prompt for an API key, persist it, and validate it by refreshing the
/// model catalog. The key is stored before validation; a bad key is the
/// provider's to reject, and the user can re-run auth to replace it.
pub async fn run_auth() -> Result<(), Box<dyn Error>> {
    print!("Enter your API key: ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    let key = input.trim();
    if key.is_empty() {
        return Err("API key cannot be empty".into());
    }

    let (mut setup, mut events) = SetupWorkflow::new(ProfileStore::open_default());
    setup.edit_api_key(key)?;
    println!("✓ API key stored");

    // Skip the edit debounce; this is an explicit user action.
    setup.refresh_now(key);
    match events.recv().await {
        Some(CatalogEvent::Refreshed(models)) => match setup.apply_refresh(models)? {
            Some(selected) => {
                println!("✓ Found {} models", setup.catalog().len());
                println!("✓ Default model: {selected}");
                println!();
                println!("✅ Configuration complete! Run 'causette' to start chatting.");
                println!("   Use 'causette pick-model' to choose a different model.");
                Ok(())
            }
            None => {
                println!("⚠️  The provider returned no models for this key.");
                Ok(())
            }
        },
        Some(CatalogEvent::RefreshFailed(err)) => {
            eprintln!("❌ Could not validate the key: {err}");
            eprintln!("   The key was stored; fix it by running 'causette auth' again.");
            std::process::exit(1);
        }
        None => Err("catalog refresh did not complete".into()),
    }
}

/// Explicit clear of both stored credentials.
pub fn run_deauth() -> Result<(), Box<dyn Error>> {
    let mut store = ProfileStore::open_default();
    store.clear()?;
    println!("✅ Removed the stored API key and model selection");
    Ok(())
}
