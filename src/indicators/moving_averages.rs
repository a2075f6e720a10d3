//! Moving Average indicators: Exponential Moving Average (EMA) and MACD

use serde::{Deserialize, Serialize};

/// Calculates the full EMA series over a slice of values.
///
/// EMA gives more weight to recent values using a smoothing multiplier.
/// EMA = Value * multiplier + EMA_prev * (1 - multiplier)
/// where multiplier = 2 / (period + 1)
///
/// The first EMA value is seeded with the simple average of the first `period` values,
/// so the returned vector has length `values.len() - period + 1`.
/// Returns an empty vector if there are not enough values.
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut ema_values = Vec::with_capacity(values.len() - period + 1);

    let mut prev_ema = values[..period].iter().sum::<f64>() / period as f64;
    ema_values.push(prev_ema);

    for &value in &values[period..] {
        prev_ema = value * multiplier + prev_ema * (1.0 - multiplier);
        ema_values.push(prev_ema);
    }

    ema_values
}

/// MACD reading for the most recent bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Macd {
    /// Fast EMA minus slow EMA
    pub line: f64,
    /// EMA of the MACD line
    pub signal: f64,
    /// line - signal
    pub histogram: f64,
}

/// Calculates MACD over closing prices.
///
/// The MACD line exists from the first bar where the slow EMA is defined; the
/// signal line is an EMA of that series. Returns `None` if `fast >= slow`, any
/// period is zero, or the history is too short to produce one signal value
/// (fewer than `slow + signal - 1` closes).
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Option<Macd> {
    if fast == 0 || signal == 0 || fast >= slow {
        return None;
    }

    let fast_series = ema_series(closes, fast);
    let slow_series = ema_series(closes, slow);
    if slow_series.is_empty() {
        return None;
    }

    // fast_series starts (slow - fast) bars earlier than slow_series
    let offset = slow - fast;
    let macd_line: Vec<f64> = slow_series
        .iter()
        .enumerate()
        .map(|(i, slow_ema)| fast_series[i + offset] - slow_ema)
        .collect();

    let signal_series = ema_series(&macd_line, signal);
    let line = *macd_line.last()?;
    let signal = *signal_series.last()?;

    Some(Macd {
        line,
        signal,
        histogram: line - signal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_values() -> Vec<f64> {
        vec![10.0, 11.0, 12.0, 13.0, 14.0]
    }

    fn trending_up(len: usize) -> Vec<f64> {
        (0..len).map(|i| 100.0 * 1.01_f64.powi(i as i32)).collect()
    }

    #[test]
    fn test_ema_insufficient_values() {
        assert!(ema_series(&sample_values(), 10).is_empty());
        assert!(ema_series(&sample_values(), 0).is_empty());
    }

    #[test]
    fn test_ema_series_length() {
        let series = ema_series(&sample_values(), 3);
        // With 5 values and period 3, we should get 3 EMA values (5 - 3 + 1)
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn test_ema_series_values() {
        let series = ema_series(&sample_values(), 3);
        // Seed: (10 + 11 + 12) / 3 = 11, multiplier = 0.5
        assert_eq!(series[0], 11.0);
        assert_eq!(series[1], 12.0);
        assert_eq!(series[2], 13.0);
    }

    #[test]
    fn test_ema_weights_recent_more() {
        let values = trending_up(8);
        let seed = values[..5].iter().sum::<f64>() / 5.0;
        let ema_val = *ema_series(&values, 5).last().unwrap();
        assert!(
            ema_val > seed && ema_val < values[7],
            "EMA ({}) should move toward recent values",
            ema_val
        );
    }

    #[test]
    fn test_macd_requires_history() {
        let values = trending_up(30);
        assert!(macd(&values, 12, 26, 9).is_none());
        let values = trending_up(34);
        assert!(macd(&values, 12, 26, 9).is_some());
    }

    #[test]
    fn test_macd_rejects_bad_periods() {
        let values = trending_up(60);
        assert!(macd(&values, 26, 12, 9).is_none());
        assert!(macd(&values, 0, 26, 9).is_none());
        assert!(macd(&values, 12, 26, 0).is_none());
    }

    #[test]
    fn test_macd_positive_in_uptrend() {
        let values = trending_up(60);
        let reading = macd(&values, 12, 26, 9).unwrap();
        assert!(reading.line > 0.0);
        assert!((reading.histogram - (reading.line - reading.signal)).abs() < 1e-12);
    }

    #[test]
    fn test_macd_flat_is_zero() {
        let reading = macd(&[50.0; 40], 12, 26, 9).unwrap();
        assert_eq!(reading.line, 0.0);
        assert_eq!(reading.histogram, 0.0);
    }
}
