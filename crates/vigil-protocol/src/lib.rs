//! Wire protocol spoken between a Vigil agent and its controller.
//!
//! Every frame on the wire is a JSON text message. The agent only ever
//! produces [`Message`] values; everything arriving from the controller is
//! decoded into an [`Envelope`] first and then classified as either an
//! acknowledgement ([`Ack`]) or a request ([`Command`]).

pub mod envelope;
pub mod error;
pub mod message;
pub mod snapshot;

pub use envelope::{Ack, Command, Envelope, Inbound};
pub use error::ProtocolError;
pub use message::{AuthPayload, Message};
pub use snapshot::{CpuInfo, CpuSample, DiskUsage, HostSnapshot, MemorySnapshot};
