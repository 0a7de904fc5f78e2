//! Interactive chat loop
//!
//! A line-oriented transcript REPL on stdin/stdout. Each send streams the
//! reply as it arrives, then lands it in the conversation workflow so the
//! transcript invariants hold regardless of how the send ended.

use std::error::Error;
use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::api::{ApiError, ProviderClient};
use crate::core::conversation::ConversationWorkflow;
use crate::core::credentials::ProfileStore;
use crate::core::gate::{resolve_session, ChatSession};

use super::model_list::{exit_with_session_error, resolve_api_key_or_exit};

pub async fn run_chat(model_override: Option<String>) -> Result<(), Box<dyn Error>> {
    let store = ProfileStore::open_default();

    // With -m the model comes from the flag; only the key needs resolving.
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

    let model_id = session.model_id;
    let client = ProviderClient::new(session.api_key);
    let mut conversation = ConversationWorkflow::new();

    println!("Chatting with {model_id}. Press Ctrl+D or type /quit to leave.");
    println!();
    println!("{}", conversation.transcript()[0].text);
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(input) = lines.next_line().await? else {
            break;
        };
        if input.trim() == "/quit" {
            break;
        }

        let Some(history) = conversation.begin_send(&input) else {
            // Blank input: no state change, no request.
            continue;
        };

        match client.open_stream(&model_id, history).await {
            Ok(mut stream) => {
                let mut reply = String::new();
                let mut failure: Option<ApiError> = None;
                loop {
                    match stream.next_delta().await {
                        Ok(Some(delta)) => {
                            print!("{delta}");
                            std::io::stdout().flush()?;
                            reply.push_str(&delta);
                        }
                        Ok(None) => break,
                        Err(err) => {
                            failure = Some(err);
                            break;
                        }
                    }
                }
                println!();
                match failure {
                    None => conversation.complete_send(Ok(reply)),
                    Some(err) => conversation.complete_send(Err(err)),
                }
            }
            Err(err) => conversation.complete_send(Err(err)),
        }

        if let Some(err) = conversation.last_error() {
            eprintln!("❌ {err}");
        }
        println!();
    }

    Ok(())
}
