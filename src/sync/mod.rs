pub mod engine;
pub mod message_log;
pub mod policy;

pub use engine::{EngineHandle, SyncEngine};
pub use policy::{LogNotifier, Notifier};
