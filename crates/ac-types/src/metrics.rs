//! Scoring functions shared by the oracle and the evaluator.

/// Fraction of positions where `predicted` equals `actual`.
///
/// Returns NaN for empty input.
pub fn accuracy<T: PartialEq>(actual: &[T], predicted: &[T]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return f64::NAN;
    }
    let hits = actual
        .iter()
        .zip(predicted)
        .filter(|(a, p)| a == p)
        .count();
    hits as f64 / n as f64
}

/// Coefficient of determination.
///
/// A constant `actual` scores 1.0 on a perfect fit and 0.0 otherwise.
/// Returns NaN for empty input.
pub fn r2(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return f64::NAN;
    }
    let mean = actual[..n].iter().sum::<f64>() / n as f64;
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual[..n].iter().map(|a| (a - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}
