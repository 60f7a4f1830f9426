pub mod display;
pub mod hover;
pub mod protocol;

pub use display::DisplayCommand;
pub use hover::{BridgeCommand, HoverEvent};
pub use protocol::ProtocolLine;
