mod app;
mod components;
mod notifier;
mod state;

pub use app::ChatApp;
pub use notifier::{DesktopNotifier, NoticeBoard};
