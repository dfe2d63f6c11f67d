pub mod config;
pub mod gateway;
pub mod message;
pub mod provider;
pub mod session;
pub mod transcript;

// Re-export main types for convenience
pub use config::Config;
pub use gateway::{build_gateway, AssistantGateway, GatewayError, GeminiGateway, MockGateway};
pub use message::{Citation, Message, Role};
pub use provider::Provider;
pub use session::{ConversationStore, Status, SubmitOutcome};
pub use transcript::{project, AutoScroll, Chip, TranscriptView, ViewLine};
