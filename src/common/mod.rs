pub mod commands;
pub mod events;
pub mod types;

pub use commands::EngineCommand;
pub use events::{EngineState, RelayEvent};
pub use types::{Message, Sender};
