use super::events::RelayEvent;

/// Lệnh gửi vào worker của Sync Engine.
///
/// Relay callbacks and `submit` both go through this queue so the log has a
/// single writer.
#[derive(Debug)]
pub enum EngineCommand {
    Relay(RelayEvent),
    Submit(String),
    Shutdown,
}
