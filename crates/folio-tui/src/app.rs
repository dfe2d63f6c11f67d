use std::sync::Arc;

use folio_core::transcript::{bottom_offset, ViewLine};
use folio_core::{
    project, AssistantGateway, AutoScroll, Config, ConversationStore, GatewayError, Message,
    Provider, SubmitOutcome,
};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Transcript,
    Input,
}

pub type QueryTask = JoinHandle<Result<Message, GatewayError>>;

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,

    // Conversation
    pub store: ConversationStore,
    pub input_cursor: usize, // cursor position in chars, not bytes
    pub query_task: Option<QueryTask>,

    // Transcript viewport
    pub chat_scroll: usize,
    pub chat_height: u16, // inner height, set during render
    pub chat_width: u16,  // inner width, set during render
    pub follow: AutoScroll,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Gateway
    pub provider: Provider,
    pub gateway: Arc<dyn AssistantGateway>,
}

impl App {
    pub fn new(config: &Config, provider: Provider, gateway: Arc<dyn AssistantGateway>) -> Self {
        Self {
            should_quit: false,
            // Start with the input focused, like a chat widget
            input_mode: InputMode::Editing,
            focus: FocusPane::Input,

            store: ConversationStore::new(config.greeting(), config.cleared_greeting()),
            input_cursor: 0,
            query_task: None,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            follow: AutoScroll::default(),

            animation_frame: 0,

            provider,
            gateway,
        }
    }

    /// Submit the input field. Spawns the gateway call when the store accepts it.
    pub fn submit(&mut self) {
        match self.store.submit_pending() {
            SubmitOutcome::Dispatch(query) => {
                self.input_cursor = 0;
                self.animation_frame = 0;

                let gateway = Arc::clone(&self.gateway);
                self.query_task = Some(tokio::spawn(async move { gateway.query(&query).await }));
            }
            SubmitOutcome::EmptyInput | SubmitOutcome::Busy => {}
        }
    }

    /// Feed the finished gateway call back into the store
    pub fn finish_query(&mut self, result: Result<Message, GatewayError>) {
        self.query_task = None;
        self.store.resolve(result);
    }

    pub fn clear_chat(&mut self) {
        self.store.clear();
        self.chat_scroll = 0;
    }

    /// Edit the pending input through the store so it stays the single source of truth
    pub fn edit_input(&mut self, edit: impl FnOnce(&mut String, &mut usize)) {
        let mut text = self.store.pending_input().to_string();
        let mut cursor = self.input_cursor;
        edit(&mut text, &mut cursor);
        self.input_cursor = cursor.min(text.chars().count());
        self.store.update_input(text);
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.store.is_awaiting() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn transcript_lines(&self) -> Vec<ViewLine> {
        project(self.store.transcript(), self.store.status()).layout(self.chat_width as usize)
    }

    pub fn max_scroll(&self) -> usize {
        bottom_offset(self.transcript_lines().len(), self.chat_height as usize)
    }

    /// Jump to the newest line whenever a message lands or the awaiting indicator toggles
    pub fn follow_transcript(&mut self) {
        if self.follow.observe(self.store.transcript().len(), self.store.status()) {
            self.scroll_to_bottom();
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        self.chat_scroll = self.max_scroll();
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_scroll = 0;
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.chat_scroll = (self.chat_scroll + lines).min(self.max_scroll());
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn page_size(&self) -> usize {
        (self.chat_height as usize).max(2) / 2
    }
}

/// Resolve when the in-flight query finishes; pending forever when there is none.
///
/// A task that panicked or was cancelled still counts as a finished query so
/// the session always returns to Idle.
pub async fn wait_for_reply(task: &mut Option<QueryTask>) -> Result<Message, GatewayError> {
    let Some(handle) = task.as_mut() else {
        return std::future::pending().await;
    };
    let joined = handle.await;
    *task = None;
    joined.unwrap_or_else(|e| Err(GatewayError::Aborted(e.to_string())))
}
