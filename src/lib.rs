//! Causette is a terminal chat client for Mistral-compatible chat APIs.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns credential storage, configuration gating, the model
//!   catalog, and the conversation workflow that drives each chat session.
//! - [`api`] defines the wire payloads and the HTTP client for the remote
//!   chat-completion API, including streaming delta decoding.
//! - [`cli`] parses command-line arguments and executes the interactive
//!   commands.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
