//! Filter predicate tree and evaluation
//!
//! Three variants: a boolean predicate (actuator payloads only), a numeric
//! predicate on the value or timestamp field, and a conjunction satisfied
//! only when every child is. A predicate never matches an event whose
//! payload kind it is not compatible with; it returns false, never errors.

use weir_core::{Event, Payload, WeirError, WeirResult};

/// Comparison operator for boolean predicates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum BooleanOp {
    Equals = 0,
    NotEquals = 1,
}

impl BooleanOp {
    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            0 => Some(BooleanOp::Equals),
            1 => Some(BooleanOp::NotEquals),
            _ => None,
        }
    }

    #[inline]
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    #[inline]
    fn compare(self, lhs: bool, rhs: bool) -> bool {
        match self {
            BooleanOp::Equals => lhs == rhs,
            BooleanOp::NotEquals => lhs != rhs,
        }
    }
}

/// Comparison operator for numeric predicates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum NumericOp {
    Equals = 0,
    GreaterThan = 1,
    LessThan = 2,
    GreaterThanOrEquals = 3,
    LessThanOrEquals = 4,
}

impl NumericOp {
    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            0 => Some(NumericOp::Equals),
            1 => Some(NumericOp::GreaterThan),
            2 => Some(NumericOp::LessThan),
            3 => Some(NumericOp::GreaterThanOrEquals),
            4 => Some(NumericOp::LessThanOrEquals),
            _ => None,
        }
    }

    #[inline]
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    #[inline]
    fn compare(self, lhs: f64, rhs: f64) -> bool {
        match self {
            NumericOp::Equals => lhs == rhs,
            NumericOp::GreaterThan => lhs > rhs,
            NumericOp::LessThan => lhs < rhs,
            NumericOp::GreaterThanOrEquals => lhs >= rhs,
            NumericOp::LessThanOrEquals => lhs <= rhs,
        }
    }
}

/// Field a numeric predicate reads from the event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumericField {
    /// Sensor value - compatible only with numeric payloads
    Value,
    /// Event timestamp - compatible with both payload kinds
    Timestamp,
}

impl NumericField {
    /// Resolve a wire field name. This is the one validated construction
    /// failure in the engine.
    pub fn from_name(name: &str) -> WeirResult<Self> {
        match name {
            "value" => Ok(NumericField::Value),
            "timestamp" => Ok(NumericField::Timestamp),
            other => Err(WeirError::InvalidFilterField(other.to_string())),
        }
    }
}

/// Filter - a predicate tree over events
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    /// Compare a boolean payload against a constant
    Boolean { op: BooleanOp, value: bool },
    /// Compare the value or timestamp field against a constant
    Numeric {
        field: NumericField,
        op: NumericOp,
        value: f64,
    },
    /// Satisfied iff every child is satisfied
    All(Vec<Filter>),
}

impl Filter {
    /// Boolean predicate over actuator payloads
    pub fn boolean(op: BooleanOp, value: bool) -> Self {
        Filter::Boolean { op, value }
    }

    /// Numeric predicate; fails fast on an unrecognized field name.
    pub fn numeric(field: &str, op: NumericOp, value: f64) -> WeirResult<Self> {
        Ok(Filter::Numeric {
            field: NumericField::from_name(field)?,
            op,
            value,
        })
    }

    /// Conjunction of sub-filters
    pub fn all(children: Vec<Filter>) -> Self {
        Filter::All(children)
    }

    /// Does the event satisfy this filter? Total: an incompatible payload
    /// kind yields false rather than an error.
    pub fn satisfies(&self, event: &Event) -> bool {
        match self {
            Filter::Boolean { op, value } => match event.payload {
                Payload::Boolean(actual) => op.compare(actual, *value),
                Payload::Numeric(_) => false,
            },
            Filter::Numeric { field, op, value } => match field {
                NumericField::Value => match event.payload {
                    Payload::Numeric(actual) => op.compare(actual, *value),
                    Payload::Boolean(_) => false,
                },
                NumericField::Timestamp => op.compare(event.timestamp, *value),
            },
            // An empty conjunction is never satisfied.
            Filter::All(children) => {
                !children.is_empty() && children.iter().all(|f| f.satisfies(event))
            }
        }
    }

    /// The event itself if it satisfies the filter
    pub fn sift_one<'a>(&self, event: &'a Event) -> Option<&'a Event> {
        self.satisfies(event).then_some(event)
    }

    /// The subsequence of events satisfying the filter, input order kept
    pub fn sift(&self, events: &[Event]) -> Vec<Event> {
        events
            .iter()
            .filter(|e| self.satisfies(e))
            .cloned()
            .collect()
    }
}
