use std::sync::{Arc, Mutex, OnceLock};

use eframe::egui;

use crate::common::Message;
use crate::error::NotifyError;
use crate::sync::Notifier;

/// Hộp thư các tin nhắn đến khi cửa sổ không được focus.
#[derive(Clone, Default)]
pub struct NoticeBoard {
    ctx: Arc<OnceLock<egui::Context>>,
    pending: Arc<Mutex<Vec<Message>>>,
}

impl NoticeBoard {
    /// Called once the window exists; raises before that are refused.
    pub fn attach(&self, ctx: &egui::Context) {
        if self.ctx.set(ctx.clone()).is_err() {
            log::debug!("Notice board already attached");
        }
    }

    pub fn take(&self) -> Vec<Message> {
        match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

/// Asks the window manager for attention and queues a notice banner.
pub struct DesktopNotifier {
    board: NoticeBoard,
    enabled: bool,
}

impl DesktopNotifier {
    pub fn new(board: NoticeBoard, enabled: bool) -> Self {
        Self { board, enabled }
    }
}

impl Notifier for DesktopNotifier {
    fn raise(&self, message: &Message) -> Result<(), NotifyError> {
        if !self.enabled {
            return Err(NotifyError::PermissionDenied);
        }
        let ctx = self
            .board
            .ctx
            .get()
            .ok_or_else(|| NotifyError::Unavailable("window not created yet".to_string()))?;

        self.board
            .pending
            .lock()
            .map_err(|_| NotifyError::Unavailable("notice board poisoned".to_string()))?
            .push(message.clone());

        ctx.send_viewport_cmd(egui::ViewportCommand::RequestUserAttention(
            egui::UserAttentionType::Informational,
        ));
        ctx.request_repaint();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Sender;

    fn message() -> Message {
        Message {
            id: 1,
            text: "hi".to_string(),
            sender: Sender::RemotePeer,
            time: "10:00".to_string(),
        }
    }

    #[test]
    fn disabled_notifications_are_denied() {
        let notifier = DesktopNotifier::new(NoticeBoard::default(), false);
        assert!(matches!(
            notifier.raise(&message()),
            Err(NotifyError::PermissionDenied)
        ));
    }

    #[test]
    fn raise_before_window_is_unavailable() {
        let notifier = DesktopNotifier::new(NoticeBoard::default(), true);
        assert!(matches!(
            notifier.raise(&message()),
            Err(NotifyError::Unavailable(_))
        ));
    }

    #[test]
    fn attached_board_collects_notices() {
        let board = NoticeBoard::default();
        board.attach(&egui::Context::default());
        let notifier = DesktopNotifier::new(board.clone(), true);

        notifier.raise(&message()).unwrap();
        assert_eq!(board.take().len(), 1);
        assert!(board.take().is_empty());
    }
}
