//! Momentum indicators: Relative Strength Index (RSI) and recent price change

/// RSI reported when there is not enough history to measure anything.
pub const NEUTRAL_RSI: f64 = 50.0;

/// Calculates the Relative Strength Index (RSI) over a series of closing prices.
///
/// RSI is a momentum oscillator that measures the speed and magnitude of price changes.
/// It oscillates between 0 and 100.
///
/// RSI = 100 - (100 / (1 + RS))
/// where RS = Average Gain / Average Loss, smoothed with Wilder's method:
/// the first averages are simple means over `period` changes, then
/// avg = (prev_avg * (period - 1) + current) / period for every later change.
///
/// Returns `NEUTRAL_RSI` if there are not enough closes (need at least period + 1)
/// or if prices never moved.
pub fn rsi(closes: &[f64], period: usize) -> f64 {
    if period == 0 || closes.len() < period + 1 {
        return NEUTRAL_RSI;
    }

    let changes = price_changes(closes);
    let (gains, losses) = gains_and_losses(&changes);

    let mut avg_gain: f64 = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss: f64 = losses[..period].iter().sum::<f64>() / period as f64;

    for i in period..changes.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
    }

    if avg_loss == 0.0 {
        // Flat series has neither gains nor losses
        return if avg_gain == 0.0 { NEUTRAL_RSI } else { 100.0 };
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// Percentage change from the close `lookback - 1` bars back to the latest close.
///
/// Returns `0.0` when fewer than `lookback` closes exist or the base price is zero.
pub fn price_change_pct(closes: &[f64], lookback: usize) -> f64 {
    if lookback < 2 || closes.len() < lookback {
        return 0.0;
    }

    let base = closes[closes.len() - lookback];
    let last = closes[closes.len() - 1];
    if base == 0.0 {
        return 0.0;
    }

    (last - base) / base * 100.0
}

/// Calculates price changes between consecutive closes.
fn price_changes(closes: &[f64]) -> Vec<f64> {
    closes.windows(2).map(|pair| pair[1] - pair[0]).collect()
}

/// Separates price changes into gains and losses.
///
/// Returns a tuple of (gains, losses) where:
/// - gains[i] = change if positive, else 0
/// - losses[i] = |change| if negative, else 0
fn gains_and_losses(changes: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let gains: Vec<f64> = changes.iter().map(|&c| if c > 0.0 { c } else { 0.0 }).collect();

    let losses: Vec<f64> = changes
        .iter()
        .map(|&c| if c < 0.0 { c.abs() } else { 0.0 })
        .collect();

    (gains, losses)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uptrend_closes() -> Vec<f64> {
        vec![
            100.0, 102.0, 105.0, 108.0, 112.0, 116.0, 120.0, 125.0, 130.0, 136.0, 142.0, 148.0,
            155.0, 162.0, 170.0,
        ]
    }

    fn downtrend_closes() -> Vec<f64> {
        vec![
            170.0, 165.0, 160.0, 154.0, 148.0, 142.0, 135.0, 128.0, 121.0, 114.0, 107.0, 100.0,
            93.0, 86.0, 80.0,
        ]
    }

    fn sideways_closes() -> Vec<f64> {
        vec![
            100.0, 102.0, 100.0, 103.0, 101.0, 104.0, 102.0, 105.0, 103.0, 106.0, 104.0, 107.0,
            105.0, 108.0, 106.0,
        ]
    }

    #[test]
    fn test_rsi_overbought() {
        let result = rsi(&uptrend_closes(), 14);
        assert_eq!(result, 100.0, "pure uptrend has no losses");
    }

    #[test]
    fn test_rsi_oversold() {
        let result = rsi(&downtrend_closes(), 14);
        assert!(result < 30.0, "RSI ({}) should be < 30 for strong downtrend", result);
    }

    #[test]
    fn test_rsi_neutral() {
        let result = rsi(&sideways_closes(), 14);
        assert!(
            result > 30.0 && result < 70.0,
            "RSI ({}) should be between 30 and 70 for sideways movement",
            result
        );
    }

    #[test]
    fn test_rsi_insufficient_closes_is_neutral() {
        assert_eq!(rsi(&[100.0, 102.0], 14), NEUTRAL_RSI);
    }

    #[test]
    fn test_rsi_zero_period_is_neutral() {
        assert_eq!(rsi(&uptrend_closes(), 0), NEUTRAL_RSI);
    }

    #[test]
    fn test_rsi_flat_series_is_neutral() {
        assert_eq!(rsi(&[100.0; 20], 14), NEUTRAL_RSI);
    }

    #[test]
    fn test_rsi_wilder_smoothing_uses_full_history() {
        // Same last 14 changes, different earlier history: Wilder's RSI must differ
        let mut a = vec![100.0, 90.0, 80.0, 70.0];
        let mut b = vec![100.0, 110.0, 120.0, 130.0];
        let tail = sideways_closes();
        a.extend(tail.iter().map(|c| c - 30.0));
        b.extend(tail.iter().map(|c| c + 30.0));
        assert_ne!(rsi(&a, 5), rsi(&b, 5));
    }

    #[test]
    fn test_rsi_bounds() {
        for closes in [uptrend_closes(), downtrend_closes(), sideways_closes()] {
            let result = rsi(&closes, 5);
            assert!((0.0..=100.0).contains(&result));
        }
    }

    #[test]
    fn test_price_changes() {
        let changes = price_changes(&[100.0, 105.0, 103.0]);
        assert_eq!(changes, vec![5.0, -2.0]);
    }

    #[test]
    fn test_gains_and_losses() {
        let changes = vec![5.0, -3.0, 2.0, -1.0, 4.0];
        let (gains, losses) = gains_and_losses(&changes);

        assert_eq!(gains, vec![5.0, 0.0, 2.0, 0.0, 4.0]);
        assert_eq!(losses, vec![0.0, 3.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_price_change_pct() {
        let closes = [90.0, 100.0, 101.0, 102.0, 103.0, 110.0];
        assert!((price_change_pct(&closes, 5) - 10.0).abs() < 1e-9);
        assert_eq!(price_change_pct(&closes[..3], 5), 0.0);
        assert_eq!(price_change_pct(&[0.0, 1.0, 2.0, 3.0, 4.0], 5), 0.0);
    }
}
