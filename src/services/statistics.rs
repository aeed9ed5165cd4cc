// Shared formulas for the analyzers. Every function guards its degenerate
// inputs and returns 0 instead of NaN or infinity.

use chrono::{Datelike, Duration, NaiveDate};
use statrs::statistics::Statistics;

/// Epley one-rep-max estimate, rounded to the nearest unit
pub fn estimated_one_rep_max(weight: f64, reps: u32) -> f64 {
    if weight <= 0.0 {
        return 0.0;
    }

    (weight * (1.0 + reps as f64 / 30.0)).round()
}

/// Ordinary least squares slope of `values` against their index
pub fn linear_trend(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let n = values.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = values.iter().sum::<f64>() / n;

    let numerator: f64 = values
        .iter()
        .enumerate()
        .map(|(i, &y)| (i as f64 - x_mean) * (y - y_mean))
        .sum();

    let denominator: f64 = (0..values.len()).map(|i| (i as f64 - x_mean).powi(2)).sum();

    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Change from the first to the last value, in percent
pub fn percent_change(values: &[f64]) -> f64 {
    match (values.first(), values.last()) {
        (Some(&first), Some(&last)) if values.len() >= 2 && first != 0.0 => {
            (last - first) / first * 100.0
        }
        _ => 0.0,
    }
}

/// Population coefficient of variation
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mean = values.iter().mean();
    if mean == 0.0 || !mean.is_finite() {
        return 0.0;
    }

    let std_dev = values.iter().population_std_dev();
    if std_dev.is_finite() {
        std_dev / mean
    } else {
        0.0
    }
}

/// `100 * (1 - CV)` clamped to [0, 100]; 0 when there is nothing to measure
pub fn consistency_score(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    if mean == 0.0 {
        return 0.0;
    }

    (100.0 * (1.0 - coefficient_of_variation(values))).clamp(0.0, 100.0)
}

/// Consistency score that is 0 below `min_points` samples
pub fn consistency_score_min(values: &[f64], min_points: usize) -> f64 {
    if values.len() < min_points {
        0.0
    } else {
        consistency_score(values)
    }
}

/// Share of `part` in `total` as a percentage, 0 when the total is 0
pub fn percentage(part: f64, total: f64) -> f64 {
    if total <= 0.0 {
        0.0
    } else {
        part / total * 100.0
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Monday of the ISO week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}
