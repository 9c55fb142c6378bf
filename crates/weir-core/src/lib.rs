//! WEIR Core - Fundamental types and primitives
//!
//! This crate defines the core types used throughout WEIR:
//! - Identifiers (ClientId, EntityId) and opaque transport addresses
//! - The Event value type (numeric and boolean device readings)
//! - Time primitives (event-time windows, the wall clock in milliseconds)
//! - The error taxonomy

pub mod error;
pub mod event;
pub mod id;
pub mod time;

pub use error::*;
pub use event::*;
pub use id::*;
pub use time::*;
