//! One-shot "say" command

use std::error::Error;
use std::io::Write;

use crate::api::{ChatMessage, ProviderClient};
use crate::core::credentials::ProfileStore;
use crate::core::gate::{resolve_session, ChatSession};

use super::model_list::{exit_with_session_error, resolve_api_key_or_exit};

pub async fn run_say(
    prompt: Vec<String>,
    model_override: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.is_empty() {
        eprintln!("Usage: causette say <prompt>");
        std::process::exit(1);
    }

    let store = ProfileStore::open_default();
    let session = match model_override {
        Some(model_id) => ChatSession {
            api_key: resolve_api_key_or_exit(&store),
            model_id,
        },
        None => match resolve_session(&store) {
            Ok(session) => session,
            Err(err) => exit_with_session_error(err),
        },
    };

    let client = ProviderClient::new(session.api_key);
    let history = vec![ChatMessage::user(prompt)];

    let mut stream = match client.open_stream(&session.model_id, history).await {
        Ok(stream) => stream,
        Err(err) => {
            eprintln!("❌ Error: {err}");
            std::process::exit(1);
        }
    };

    loop {
        match stream.next_delta().await {
            Ok(Some(content)) => {
                print!("{content}");
                std::io::stdout().flush()?;
            }
            Ok(None) => {
                println!();
                break;
            }
            Err(err) => {
                eprintln!();
                eprintln!("❌ Error: {err}");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
