//! Shared OpenAI client construction.

use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Request timeout. Whisper uploads of long audio tracks can take minutes.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Create an OpenAI client with the shared timeout applied.
///
/// The API key is read from `OPENAI_API_KEY` by the underlying config.
pub fn create_client() -> Client<OpenAIConfig> {
    let http_client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_default();

    Client::with_config(OpenAIConfig::default()).with_http_client(http_client)
}
