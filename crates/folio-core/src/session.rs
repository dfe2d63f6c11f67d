//! Conversation store: the single authority over the transcript and the
//! Idle/Awaiting submission state.
//!
//! The store never calls the gateway itself while borrowed by a UI. `submit`
//! hands back the query to dispatch, and `resolve` takes the gateway result
//! once it arrives. [`ConversationStore::ask`] chains the two for callers that
//! can simply await.

use crate::gateway::{AssistantGateway, GatewayError};
use crate::message::Message;

/// Shown when the gateway fails for any reason
pub const ERROR_TEXT: &str =
    "ERROR: Could not reach the assistant. Please check your network and try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Awaiting,
}

/// Result of a submit attempt. Rejections are silent for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Accepted; the trimmed query must be sent to the gateway
    Dispatch(String),
    /// Blank or whitespace-only input
    EmptyInput,
    /// A query is already in flight
    Busy,
}

#[derive(Debug, Clone)]
pub struct ConversationStore {
    transcript: Vec<Message>,
    pending_input: String,
    status: Status,
    cleared_greeting: String,
}

impl ConversationStore {
    /// Start a session seeded with one assistant greeting
    pub fn new(greeting: impl Into<String>, cleared_greeting: impl Into<String>) -> Self {
        Self {
            transcript: vec![Message::assistant(greeting)],
            pending_input: String::new(),
            status: Status::Idle,
            cleared_greeting: cleared_greeting.into(),
        }
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_awaiting(&self) -> bool {
        self.status == Status::Awaiting
    }

    /// Controlled-input echo; no validation
    pub fn update_input(&mut self, text: impl Into<String>) {
        self.pending_input = text.into();
    }

    pub fn submit(&mut self, text: &str) -> SubmitOutcome {
        let query = text.trim();
        if query.is_empty() {
            return SubmitOutcome::EmptyInput;
        }
        if self.status == Status::Awaiting {
            tracing::debug!("Ignoring submit while a query is in flight");
            return SubmitOutcome::Busy;
        }

        self.transcript.push(Message::user(query));
        self.pending_input.clear();
        self.status = Status::Awaiting;
        SubmitOutcome::Dispatch(query.to_string())
    }

    /// Submit whatever is in `pending_input`
    pub fn submit_pending(&mut self) -> SubmitOutcome {
        let text = self.pending_input.clone();
        self.submit(&text)
    }

    /// Apply the outcome of the in-flight gateway call and return to Idle.
    ///
    /// Returns false (and changes nothing) when no call was in flight.
    pub fn resolve(&mut self, result: Result<Message, GatewayError>) -> bool {
        if self.status != Status::Awaiting {
            tracing::warn!("Dropping gateway result with no query in flight");
            return false;
        }

        let reply = match result {
            Ok(message) => message,
            Err(err) => {
                tracing::error!(error = %err, "Assistant gateway failed");
                Message::assistant(ERROR_TEXT)
            }
        };
        self.transcript.push(reply);
        self.status = Status::Idle;
        true
    }

    /// Replace the transcript with a single fresh greeting. Status is untouched.
    pub fn clear(&mut self) {
        self.transcript = vec![Message::assistant(self.cleared_greeting.clone())];
    }

    /// Submit, await the gateway, and resolve. Returns the outcome of the submit.
    pub async fn ask(&mut self, gateway: &dyn AssistantGateway, text: &str) -> SubmitOutcome {
        let outcome = self.submit(text);
        if let SubmitOutcome::Dispatch(query) = &outcome {
            let result = gateway.query(query).await;
            self.resolve(result);
        }
        outcome
    }
}
