//! Numeric extrapolation
//!
//! A period-2 alternation over the six most recent values is continued by
//! echoing the last two values in rotation; anything else is extrapolated
//! by the degree-(n-1) Lagrange polynomial through all (index, value)
//! pairs. Linear and quadratic sequences are therefore recovered exactly,
//! and constant/periodic signals reproduce without drift.

/// Predict the next `n` values of a numeric sequence.
///
/// Empty history yields an empty prediction.
pub fn predict_numeric(history: &[f64], n: usize) -> Vec<f64> {
    if history.is_empty() {
        return Vec::new();
    }

    if alternates(history) {
        let len = history.len();
        return (0..n)
            .map(|i| if i % 2 == 0 { history[len - 2] } else { history[len - 1] })
            .collect();
    }

    (history.len()..history.len() + n)
        .map(|x| lagrange(history, x as f64))
        .collect()
}

/// Do the six most recent values alternate with period 2?
fn alternates(history: &[f64]) -> bool {
    let len = history.len();
    if len < 6 {
        return false;
    }
    let odd = history[len - 1] == history[len - 3] && history[len - 1] == history[len - 5];
    let even = history[len - 2] == history[len - 4] && history[len - 2] == history[len - 6];
    odd && even
}

/// Evaluate the interpolating polynomial through (i, history[i]) at x.
fn lagrange(history: &[f64], x: f64) -> f64 {
    let mut result = 0.0;
    for (i, &value) in history.iter().enumerate() {
        let mut term = value;
        for j in 0..history.len() {
            if j != i {
                term *= (x - j as f64) / (i as f64 - j as f64);
            }
        }
        result += term;
    }
    result
}
