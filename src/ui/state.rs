use crate::common::{EngineState, Message};
use crate::sync::EngineHandle;

/// Trạng thái cục bộ của UI.
pub struct AppState {
    pub messages: Vec<Message>,
    pub input_text: String,
    pub connection: EngineState,
    /// Tin nhắn đã báo trong lúc app chạy nền.
    pub missed: Vec<Message>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            input_text: String::new(),
            connection: EngineState::Idle,
            missed: Vec::new(),
        }
    }

    pub fn sync_from(&mut self, engine: &EngineHandle) {
        self.messages = engine.snapshot();
        self.connection = engine.connection_state();
    }

    pub fn record_missed(&mut self, mut notices: Vec<Message>) {
        self.missed.append(&mut notices);
    }

    pub fn clear_missed(&mut self) {
        self.missed.clear();
    }
}
