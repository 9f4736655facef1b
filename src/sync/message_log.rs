use tokio::sync::watch;

use crate::common::{Message, Sender};

/// Danh sách tin nhắn có thứ tự, chỉ thêm vào cuối.
///
/// Entries live inside the watch channel so every mutation is also the
/// change notification for whoever renders the log.
pub struct MessageLog {
    entries: watch::Sender<Vec<Message>>,
}

impl MessageLog {
    pub fn new() -> Self {
        let (entries, _) = watch::channel(Vec::new());
        Self { entries }
    }

    pub fn append(&self, message: Message) {
        self.entries.send_modify(|entries| entries.push(message));
    }

    /// History replay only. Drops whatever was there, local echoes included.
    pub fn replace_all(&self, messages: Vec<Message>) {
        self.entries.send_replace(messages);
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.entries.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Message>> {
        self.entries.subscribe()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// True when a local-user entry with the same id and text is already in the
    /// log, whether it was appended by `submit` or came in with history.
    pub fn has_local_echo(&self, message: &Message) -> bool {
        message.sender == Sender::LocalUser
            && self.entries.borrow().iter().any(|entry| {
                entry.sender == Sender::LocalUser
                    && entry.id == message.id
                    && entry.text == message.text
            })
    }
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new()
    }
}
