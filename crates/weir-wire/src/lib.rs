//! WEIR Wire - the text protocol boundary
//!
//! This crate is the only place raw protocol text is seen. Inbound lines
//! decode into typed messages (`InboundMessage`); outbound messages encode
//! back into the line format the devices and clients expect. The grammar
//! is kept byte-compatible with the deployed fleet.

pub mod message;
pub mod outbound;
pub mod request;

pub use message::*;
pub use outbound::*;
pub use request::*;
