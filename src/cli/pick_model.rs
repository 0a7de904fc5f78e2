//! Default model selection
//!
//! Interactive selection and persistence of the model used for new chat
//! sessions.

use std::error::Error;

use crate::api::ProviderClient;
use crate::core::catalog::ModelCatalog;
use crate::core::credentials::{CredentialKey, CredentialStore, ProfileStore};

use super::model_list::{print_model_details, resolve_api_key_or_exit};

pub async fn pick_model() -> Result<(), Box<dyn Error>> {
    let mut store = ProfileStore::open_default();
    let api_key = resolve_api_key_or_exit(&store);

    let client = ProviderClient::new(api_key);
    let catalog = ModelCatalog::refresh(&client).await?;

    if catalog.is_empty() {
        println!("No models found for this key.");
        return Ok(());
    }

    println!("🤖 Available Models");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();
    for (i, model) in catalog.models().iter().enumerate() {
        println!("  {}. {}", i + 1, model.id);
        print_model_details(model, "     ");
        println!();
    }

    println!("Select a model to use for new chats (enter the number):");
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    let choice: usize = input.trim().parse().map_err(|_| "Invalid choice")?;

    if choice == 0 || choice > catalog.len() {
        return Err("Invalid choice".into());
    }

    let selected = &catalog.models()[choice - 1].id;
    store.set(CredentialKey::SelectedModel, selected)?;

    println!("✅ Selected model: {selected}");
    Ok(())
}
