pub mod codec;
pub mod connection;
pub mod frame;

pub use codec::{MessageCodec, SenderTags};
pub use connection::{ConnectionManager, ReconnectPolicy, Relay};
