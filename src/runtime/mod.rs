mod channel;
mod context;
mod executor;

pub use channel::{Channel, ChannelEvent, ChannelOptions};
pub use context::NodeContext;
pub use executor::NodeExecutor;
