//! Controller connection: transport channel and lifecycle supervision.

mod channel;
mod supervisor;

pub use channel::{connect, Channel, ChannelError, ChannelReader, FrameSink};
pub use supervisor::{Supervisor, SupervisorError};
