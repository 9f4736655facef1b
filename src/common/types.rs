/// Nguồn gốc của một tin nhắn: người dùng cục bộ hay peer ở xa.
///
/// Only used for rendering side and notification eligibility, never as a
/// durable identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    LocalUser,
    RemotePeer,
}

/// Domain model đại diện một tin nhắn chat.
///
/// Immutable once it is in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: i64,
    pub text: String,
    pub sender: Sender,
    /// `HH:mm`, from the author's own clock.
    pub time: String,
}

impl Message {
    pub fn is_local(&self) -> bool {
        self.sender == Sender::LocalUser
    }
}
