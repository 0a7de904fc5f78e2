//! Shared constants used across the application

use std::time::Duration;

/// Hosted Mistral API endpoint used when no override is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.mistral.ai/v1";

/// Environment variable overriding the API base URL (self-hosted gateways).
pub const BASE_URL_ENV: &str = "MISTRAL_BASE_URL";

/// Environment variable consulted when no API key is stored.
pub const API_KEY_ENV: &str = "MISTRAL_API_KEY";

/// Sampling temperature sent with every completion request.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Upper bound on generated tokens per completion.
pub const MAX_COMPLETION_TOKENS: u32 = 1000;

/// Greeting seeded into every new transcript. Shown to the user, never sent
/// to the provider.
pub const GREETING: &str = "How can I help you today?";

/// Quiet period between the last API key edit and the catalog refresh it
/// triggers.
pub const REFRESH_DEBOUNCE: Duration = Duration::from_millis(500);
