//! Boolean next-state prediction
//!
//! Builds a first-order Markov transition count table from consecutive
//! history pairs, then walks forward from the last known state, always
//! taking the most frequent successor. A tie picks `false` (the smallest
//! outcome); a state with no observed outgoing transition stays put.

/// Predict the next `n` values of a boolean sequence.
///
/// Empty history yields an empty prediction.
pub fn predict_boolean(history: &[bool], n: usize) -> Vec<bool> {
    let Some(&last) = history.last() else {
        return Vec::new();
    };

    // counts[from][to]
    let mut counts = [[0u32; 2]; 2];
    for pair in history.windows(2) {
        counts[pair[0] as usize][pair[1] as usize] += 1;
    }

    let mut state = last;
    let mut predictions = Vec::with_capacity(n);
    for _ in 0..n {
        let [to_false, to_true] = counts[state as usize];
        let next = if to_false == 0 && to_true == 0 {
            state
        } else if to_true > to_false {
            true
        } else {
            false
        };
        predictions.push(next);
        state = next;
    }
    predictions
}
