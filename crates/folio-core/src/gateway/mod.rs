//! Assistant gateway: the boundary between the chat session and the remote model.
//!
//! A gateway turns one user query into one completed assistant [`Message`] or a
//! [`GatewayError`]. Implementations are stateless; the conversation store is
//! what keeps a single query in flight.

pub mod gemini;
pub mod mock;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::Config;
use crate::message::Message;
use crate::provider::Provider;

pub use gemini::GeminiGateway;
pub use mock::MockGateway;

/// Used when the upstream answers without any text
pub const EMPTY_RESPONSE_TEXT: &str = "I was unable to process the query. No output generated.";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("API key not configured")]
    MissingApiKey,

    #[error("request failed: {0}")]
    Request(String),

    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("query task did not complete: {0}")]
    Aborted(String),
}

#[async_trait]
pub trait AssistantGateway: Send + Sync {
    async fn query(&self, text: &str) -> Result<Message, GatewayError>;

    /// Short label for headers and logs, e.g. the model name
    fn label(&self) -> String;
}

/// Build the gateway selected by the config's provider
pub fn build_gateway(config: &Config) -> anyhow::Result<Arc<dyn AssistantGateway>> {
    let gateway: Arc<dyn AssistantGateway> = match config.provider()? {
        Provider::Gemini => Arc::new(GeminiGateway::new(config)?),
        Provider::Mock => Arc::new(MockGateway::new()),
    };
    tracing::debug!(gateway = %gateway.label(), "Assistant gateway ready");
    Ok(gateway)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_mock_gateway() {
        let config = Config {
            provider: Some("mock".to_string()),
            ..Config::new()
        };
        let gateway = build_gateway(&config).unwrap();
        let reply = gateway.query("ping").await.unwrap();
        assert_eq!(reply.text(), "Mock response to: ping");
    }

    #[test]
    fn test_build_rejects_unknown_provider() {
        let config = Config {
            provider: Some("nope".to_string()),
            ..Config::new()
        };
        assert!(build_gateway(&config).is_err());
    }
}
