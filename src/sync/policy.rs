use std::sync::atomic::{AtomicBool, Ordering};

use crate::common::{Message, Sender};
use crate::error::NotifyError;

/// Chỉ báo khi tin nhắn đến từ peer và app đang chạy nền.
pub fn should_notify(message: &Message, app_is_foreground: bool) -> bool {
    message.sender == Sender::RemotePeer && !app_is_foreground
}

/// Host-owned answer to "is the UI visible right now".
pub trait ForegroundProbe: Send + Sync {
    fn is_foreground(&self) -> bool;
}

impl ForegroundProbe for AtomicBool {
    fn is_foreground(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

/// Host-owned side effect that surfaces a message to the user.
pub trait Notifier: Send + Sync {
    fn raise(&self, message: &Message) -> Result<(), NotifyError>;
}

/// Notifier that only writes a log line; used where no desktop is attached.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn raise(&self, message: &Message) -> Result<(), NotifyError> {
        log::info!("New message [{}]: {}", message.time, message.text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn message(sender: Sender) -> Message {
        Message {
            id: 1,
            text: "hi".to_string(),
            sender,
            time: "10:00".to_string(),
        }
    }

    #[test]
    fn remote_message_in_background_notifies() {
        assert!(should_notify(&message(Sender::RemotePeer), false));
    }

    #[test]
    fn remote_message_in_foreground_is_silent() {
        assert!(!should_notify(&message(Sender::RemotePeer), true));
    }

    #[test]
    fn local_message_in_background_is_silent() {
        assert!(!should_notify(&message(Sender::LocalUser), false));
    }

    #[test]
    fn local_message_in_foreground_is_silent() {
        assert!(!should_notify(&message(Sender::LocalUser), true));
    }

    #[test]
    fn atomic_flag_acts_as_probe() {
        let flag = Arc::new(AtomicBool::new(true));
        assert!(flag.is_foreground());
        flag.store(false, Ordering::Relaxed);
        assert!(!flag.is_foreground());
    }
}
