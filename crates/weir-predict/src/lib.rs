//! WEIR Prediction - next-value forecasting over entity history
//!
//! Two stateless algorithms chosen by payload kind: polynomial
//! extrapolation with period-2 alternation detection for numeric
//! sequences, and first-order Markov next-state selection for boolean
//! sequences.

pub mod boolean;
pub mod numeric;

pub use boolean::predict_boolean;
pub use numeric::predict_numeric;
