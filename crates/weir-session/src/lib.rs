//! WEIR Session - per-client source of truth and reactive controller
//!
//! A `ClientSession` owns one client's event history, notify filter,
//! matched-event log and standing actuator rules, answers the analytical
//! and predictive queries, and emits outbound actuator commands. The
//! `SessionRegistry` creates sessions lazily on first contact.

pub mod registry;
pub mod session;

pub use registry::*;
pub use session::*;
