//! vigil-agent: monitoring agent for the Vigil controller
//!
//! The agent runs on monitored hosts and keeps a single outbound
//! WebSocket connection to the controller. It answers control requests,
//! probes liveness on a timer, and reports host metrics once the
//! controller has acknowledged a first report.

pub mod conn;
pub mod dispatch;
pub mod metrics;
pub mod state;
pub mod tasks;

pub use state::AgentState;
