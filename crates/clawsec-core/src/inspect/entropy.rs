//! Shannon entropy over the character distribution of a text.

use std::collections::HashMap;

/// `H = -Σ p_i·log2(p_i)` over the distinct characters of `text`.
///
/// Empty text has entropy 0 by convention. The result lies in
/// `[0, log2(distinct characters)]`.
pub fn shannon_entropy(text: &str) -> f64 {
    let mut counts: HashMap<char, usize> = HashMap::new();
    let mut total = 0usize;
    for c in text.chars() {
        *counts.entry(c).or_insert(0) += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }

    let n = total as f64;
    counts
        .values()
        .map(|&count| {
            let p = count as f64 / n;
            -p * p.log2()
        })
        .sum()
}
