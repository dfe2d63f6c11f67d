//! Offline gateway
//!
//! Selected when the provider is `"mock"`. Returns deterministic answers so the
//! chat can be exercised without network access or an API key.

use async_trait::async_trait;

use super::{AssistantGateway, GatewayError};
use crate::message::Message;

#[derive(Debug, Clone, Default)]
pub struct MockGateway;

impl MockGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AssistantGateway for MockGateway {
    async fn query(&self, text: &str) -> Result<Message, GatewayError> {
        tracing::info!("Mock gateway processing query");
        Ok(Message::assistant(format!("Mock response to: {}", text)))
    }

    fn label(&self) -> String {
        "mock".to_string()
    }
}
