//! Canonical filter serialization
//!
//! A filter travels on the wire as `;`-joined `kind:opOrdinal:value`
//! triples, kind 0 = boolean, 1 = numeric-value, 2 = numeric-timestamp.
//! A conjunction serializes as its children's triples each followed by
//! `;`; a single plain filter is exactly one triple with no trailing `;`.
//! Nested conjunctions flatten to one level on the wire.

use std::fmt;

use weir_core::{WeirError, WeirResult};

use crate::{BooleanOp, Filter, NumericField, NumericOp};

impl Filter {
    /// Canonical text form
    pub fn serialize(&self) -> String {
        match self {
            Filter::Boolean { op, value } => format!("0:{}:{}", op.ordinal(), value),
            Filter::Numeric { field, op, value } => {
                let kind = match field {
                    NumericField::Value => 1,
                    NumericField::Timestamp => 2,
                };
                format!("{}:{}:{:?}", kind, op.ordinal(), value)
            }
            Filter::All(children) => {
                let mut out = String::new();
                for child in children {
                    out.push_str(&child.serialize());
                    out.push(';');
                }
                out
            }
        }
    }

    /// Parse the canonical text form. One triple yields the plain variant,
    /// two or more yield a conjunction.
    pub fn deserialize(serialized: &str) -> WeirResult<Filter> {
        let mut filters = Vec::new();
        for triple in serialized.split(';') {
            if triple.is_empty() {
                continue;
            }
            filters.push(parse_triple(triple)?);
        }
        match filters.len() {
            0 => Err(WeirError::MalformedFilter(format!(
                "no predicates in {:?}",
                serialized
            ))),
            1 => Ok(filters.remove(0)),
            _ => Ok(Filter::All(filters)),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

fn parse_triple(triple: &str) -> WeirResult<Filter> {
    let malformed = |reason: &str| WeirError::MalformedFilter(format!("{reason} in {triple:?}"));

    let mut parts = triple.split(':');
    let (kind, op, value) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(kind), Some(op), Some(value), None) => (kind, op, value),
        _ => return Err(malformed("expected kind:op:value")),
    };

    let ordinal: u8 = op.parse().map_err(|_| malformed("bad operator ordinal"))?;

    match kind {
        "0" => {
            let op = BooleanOp::from_ordinal(ordinal).ok_or_else(|| malformed("bad operator"))?;
            // Lenient boolean parse: anything that is not "true" is false,
            // matching the wire producers.
            let value = value.eq_ignore_ascii_case("true");
            Ok(Filter::Boolean { op, value })
        }
        "1" | "2" => {
            let op = NumericOp::from_ordinal(ordinal).ok_or_else(|| malformed("bad operator"))?;
            let value: f64 = value.parse().map_err(|_| malformed("bad numeric value"))?;
            let field = if kind == "1" {
                NumericField::Value
            } else {
                NumericField::Timestamp
            };
            Ok(Filter::Numeric { field, op, value })
        }
        _ => Err(malformed("unknown predicate kind")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_single_filter_has_no_trailing_separator() {
        let f = Filter::boolean(BooleanOp::NotEquals, false);
        assert_eq!(f.serialize(), "0:1:false");

        let f = Filter::numeric("value", NumericOp::GreaterThan, 2.5).unwrap();
        assert_eq!(f.serialize(), "1:1:2.5");

        let f = Filter::numeric("timestamp", NumericOp::LessThanOrEquals, 10.0).unwrap();
        assert_eq!(f.serialize(), "2:4:10.0");
    }

    #[test]
    fn test_conjunction_serialization() {
        let f = Filter::all(vec![
            Filter::boolean(BooleanOp::Equals, true),
            Filter::numeric("timestamp", NumericOp::GreaterThan, 1.0).unwrap(),
        ]);
        assert_eq!(f.serialize(), "0:0:true;2:1:1.0;");
    }

    #[test]
    fn test_deserialize_single() {
        let f = Filter::deserialize("1:3:42.0").unwrap();
        assert_eq!(
            f,
            Filter::numeric("value", NumericOp::GreaterThanOrEquals, 42.0).unwrap()
        );
    }

    #[test]
    fn test_deserialize_rejects_garbage() {
        assert!(Filter::deserialize("").is_err());
        assert!(Filter::deserialize("9:0:1.0").is_err());
        assert!(Filter::deserialize("1:7:1.0").is_err());
        assert!(Filter::deserialize("1:0").is_err());
        assert!(Filter::deserialize("1:0:abc").is_err());
    }

    #[test]
    fn test_nested_conjunction_flattens() {
        let nested = Filter::all(vec![
            Filter::all(vec![
                Filter::boolean(BooleanOp::Equals, true),
                Filter::numeric("timestamp", NumericOp::GreaterThan, 1.0).unwrap(),
            ]),
            Filter::numeric("timestamp", NumericOp::LessThan, 9.0).unwrap(),
        ]);
        let flat = Filter::deserialize(&nested.serialize()).unwrap();
        assert_eq!(
            flat,
            Filter::all(vec![
                Filter::boolean(BooleanOp::Equals, true),
                Filter::numeric("timestamp", NumericOp::GreaterThan, 1.0).unwrap(),
                Filter::numeric("timestamp", NumericOp::LessThan, 9.0).unwrap(),
            ])
        );
    }

    fn leaf_strategy() -> impl Strategy<Value = Filter> {
        let boolean = (0u8..2, any::<bool>()).prop_map(|(op, value)| Filter::Boolean {
            op: BooleanOp::from_ordinal(op).unwrap(),
            value,
        });
        let numeric = (
            prop_oneof![Just(NumericField::Value), Just(NumericField::Timestamp)],
            0u8..5,
            -1.0e9..1.0e9f64,
        )
            .prop_map(|(field, op, value)| Filter::Numeric {
                field,
                op: NumericOp::from_ordinal(op).unwrap(),
                value,
            });
        prop_oneof![boolean, numeric]
    }

    fn filter_strategy() -> impl Strategy<Value = Filter> {
        prop_oneof![
            leaf_strategy(),
            prop::collection::vec(leaf_strategy(), 2..5).prop_map(Filter::All),
        ]
    }

    proptest! {
        #[test]
        fn prop_roundtrip_is_structural_identity(f in filter_strategy()) {
            let recovered = Filter::deserialize(&f.serialize()).unwrap();
            prop_assert_eq!(recovered, f);
        }
    }
}
