//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the
//! appropriate commands.

pub mod auth;
pub mod chat;
pub mod model_list;
pub mod pick_model;
pub mod say;

use std::error::Error;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cli::auth::{run_auth, run_deauth};
use crate::cli::chat::run_chat;
use crate::cli::model_list::list_models;
use crate::cli::pick_model::pick_model;
use crate::cli::say::run_say;

#[derive(Parser)]
#[command(name = "causette")]
#[command(about = "A terminal chat client for Mistral-compatible APIs")]
#[command(
    long_about = "Causette is a terminal chat client that connects to Mistral-compatible \
chat APIs for real-time conversations. It supports streaming responses and keeps \
your API key in the system keyring.\n\n\
Setup:\n\
  Use 'causette auth' to store an API key and pick a default model.\n\n\
Environment Variables:\n\
  MISTRAL_API_KEY   API key fallback when none is stored\n\
  MISTRAL_BASE_URL  Custom API base URL (optional, defaults to https://api.mistral.ai/v1)\n\n\
Controls:\n\
  Type              Enter your message at the prompt\n\
  Enter             Send the message\n\
  Ctrl+D or /quit   Leave the chat"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use for this session (overrides the stored selection)
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store an API key and validate it against the provider
    Auth,
    /// Remove the stored API key and model selection
    Deauth,
    /// Start the chat interface (default)
    Chat,
    /// List the models available to the stored key
    Models,
    /// Interactively select and persist a default model
    PickModel,
    /// Send a single prompt and print the streamed reply
    Say {
        /// Prompt text; multiple words are joined with spaces
        #[arg(trailing_var_arg = true)]
        prompt: Vec<String>,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()
        .unwrap()
        .block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let args = Args::parse();

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Auth => run_auth().await,
        Commands::Deauth => run_deauth(),
        Commands::Chat => run_chat(args.model).await,
        Commands::Models => list_models().await,
        Commands::PickModel => pick_model().await,
        Commands::Say { prompt } => run_say(prompt, args.model).await,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn bare_invocation_defaults_to_chat() {
        let args = Args::parse_from(["causette"]);
        assert!(args.command.is_none());
        assert!(args.model.is_none());
    }

    #[test]
    fn model_override_is_global() {
        let args = Args::parse_from(["causette", "say", "-m", "mistral-small", "hello"]);
        assert_eq!(args.model.as_deref(), Some("mistral-small"));
        match args.command {
            Some(Commands::Say { prompt }) => assert_eq!(prompt, ["hello"]),
            _ => panic!("expected say command"),
        }
    }
}
