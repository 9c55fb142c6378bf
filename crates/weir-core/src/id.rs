//! Identity types for WEIR
//!
//! Client and entity ids are plain 32-bit integers on the wire; the
//! newtypes keep them from being mixed up inside the core.

use std::fmt;

/// Client identity - owner of a session and of the entities reporting to it
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ClientId(pub u32);

impl ClientId {
    #[inline]
    pub fn new(id: u32) -> Self {
        ClientId(id)
    }
}

impl fmt::Debug for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Client({})", self.0)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Entity identity - one physical device (sensor or actuator)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Sentinel returned by queries over an empty session
    pub const NONE: EntityId = EntityId(0);

    #[inline]
    pub fn new(id: u32) -> Self {
        EntityId(id)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque destination the transport layer knows how to reach.
///
/// The core never opens connections; it tags outbound messages with an
/// `Address` (client reply address or actuator callback) and leaves the
/// sending to the transport adapter.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Address(pub String);

impl Address {
    pub fn new(addr: impl Into<String>) -> Self {
        Address(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_ordering() {
        assert!(EntityId(7) > EntityId(3));
        assert_eq!(ClientId::new(5), ClientId(5));
    }

    #[test]
    fn test_display() {
        assert_eq!(EntityId(42).to_string(), "42");
        assert_eq!(format!("{:?}", ClientId(1)), "Client(1)");
    }
}
