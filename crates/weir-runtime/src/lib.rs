//! WEIR Runtime - admission scheduling and delivery
//!
//! The `EventScheduler` buffers every inbound message until its wait
//! deadline, delivers it to the owning session in event-time order, and
//! forwards the session's outbound messages to the transport boundary.

pub mod scheduler;
pub mod telemetry;

pub use scheduler::*;
