//! Numerically stable primitives for log-domain probability math.

/// Stable log(sum(exp(values))).
///
/// Returns NEG_INFINITY for empty input or all -inf inputs.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NEG_INFINITY;
    }
    if values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    if max == f64::INFINITY {
        return f64::INFINITY;
    }
    let mut sum = 0.0;
    for v in values {
        sum += (*v - max).exp();
    }
    max + sum.ln()
}

/// Stable log(exp(a) + exp(b)).
pub fn log_add_exp(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        return f64::NAN;
    }
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    if a == f64::INFINITY || b == f64::INFINITY {
        return f64::INFINITY;
    }
    let m = a.max(b);
    let diff = (a - b).abs();
    m + (-diff).exp().ln_1p()
}

/// Natural log of a probability, mapping exact zero to NEG_INFINITY.
///
/// Negative or NaN inputs yield NaN.
pub fn ln_prob(p: f64) -> f64 {
    if p.is_nan() || p < 0.0 {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    p.ln()
}

/// Convert a log-domain vector back to a normalized probability vector.
///
/// All -inf input yields a uniform vector; an empty input stays empty.
pub fn log_normalize(log_values: &[f64]) -> Vec<f64> {
    if log_values.is_empty() {
        return Vec::new();
    }
    let total = log_sum_exp(log_values);
    if total == f64::NEG_INFINITY {
        let uniform = 1.0 / log_values.len() as f64;
        return vec![uniform; log_values.len()];
    }
    log_values.iter().map(|v| (v - total).exp()).collect()
}
