use serde_json::Value;

pub const EVENT_CONNECT: &str = "connect";
pub const EVENT_DISCONNECT: &str = "disconnect";
pub const EVENT_PREVIOUS_MESSAGES: &str = "previousMessages";
pub const EVENT_MESSAGE: &str = "message";

/// Sự kiện từ relay gửi lên Sync Engine.
#[derive(Debug, Clone)]
pub enum RelayEvent {
    Connected,
    Disconnected,
    PreviousMessages(Option<Value>),
    MessageReceived(Option<Value>),
}

impl RelayEvent {
    /// Maps a named relay event to its variant; unknown names yield `None`.
    pub fn from_wire(name: &str, payload: Option<Value>) -> Option<Self> {
        match name {
            EVENT_CONNECT => Some(Self::Connected),
            EVENT_DISCONNECT => Some(Self::Disconnected),
            EVENT_PREVIOUS_MESSAGES => Some(Self::PreviousMessages(payload)),
            EVENT_MESSAGE => Some(Self::MessageReceived(payload)),
            _ => None,
        }
    }
}

/// Trạng thái kết nối mà Sync Engine quan sát được.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Connecting,
    Connected,
    Disconnected,
}
