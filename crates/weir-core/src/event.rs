//! Event definitions
//!
//! An event is one immutable reading from a device: a numeric sample from
//! a sensor or a boolean sample from an actuator. The timestamp is event
//! time (when the reading occurred at the source), never arrival time.

use std::fmt;

use crate::{ClientId, EntityId};

/// Event payload - distinguishes sensor readings from actuator readings
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Payload {
    /// Sensor sample
    Numeric(f64),
    /// Actuator sample
    Boolean(bool),
}

impl Payload {
    /// Numeric value, if this is a sensor reading
    #[inline]
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            Payload::Numeric(v) => Some(*v),
            Payload::Boolean(_) => None,
        }
    }

    /// Boolean value, if this is an actuator reading
    #[inline]
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Payload::Boolean(v) => Some(*v),
            Payload::Numeric(_) => None,
        }
    }

    #[inline]
    pub fn is_boolean(&self) -> bool {
        matches!(self, Payload::Boolean(_))
    }
}

/// Event - one timestamped device reading
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// Event time in milliseconds (as reported by the source)
    pub timestamp: f64,
    /// Owning client
    pub client_id: ClientId,
    /// Reporting entity
    pub entity_id: EntityId,
    /// Entity kind tag (e.g. "TempSensor", "Switch")
    pub entity_type: String,
    /// The reading itself
    pub payload: Payload,
}

impl Event {
    /// Create a sensor event
    pub fn numeric(
        timestamp: f64,
        client_id: ClientId,
        entity_id: EntityId,
        entity_type: impl Into<String>,
        value: f64,
    ) -> Self {
        Event {
            timestamp,
            client_id,
            entity_id,
            entity_type: entity_type.into(),
            payload: Payload::Numeric(value),
        }
    }

    /// Create an actuator event
    pub fn boolean(
        timestamp: f64,
        client_id: ClientId,
        entity_id: EntityId,
        entity_type: impl Into<String>,
        value: bool,
    ) -> Self {
        Event {
            timestamp,
            client_id,
            entity_id,
            entity_type: entity_type.into(),
            payload: Payload::Boolean(value),
        }
    }

    /// Does this event come from an actuator?
    #[inline]
    pub fn is_actuator(&self) -> bool {
        self.payload.is_boolean()
    }
}

impl fmt::Display for Event {
    // Wire-compatible rendering used in client reply bodies.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, value) = match self.payload {
            Payload::Numeric(v) => ("SensorEvent", format!("{:?}", v)),
            Payload::Boolean(v) => ("ActuatorEvent", v.to_string()),
        };
        write!(
            f,
            "{}: {{timeStamp={:?}, clientId={}, entityId={}, entityType={}, value={}}}",
            name, self.timestamp, self.client_id, self.entity_id, self.entity_type, value
        )
    }
}
