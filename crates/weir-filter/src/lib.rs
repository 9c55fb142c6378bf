//! WEIR Filter Engine - composable event predicates
//!
//! A filter evaluates one event against a boolean or numeric condition on
//! its value or timestamp, or against a conjunction of sub-filters. Filters
//! have a canonical text serialization for wire transmission.

pub mod filter;
pub mod serial;

pub use filter::*;
