//! Volume indicators

/// Ratio of the latest volume to the average of the `period` bars before it.
///
/// The latest bar is excluded from the average. Returns `1.0` when there is
/// not enough history or the average volume is zero.
pub fn volume_ratio(volumes: &[f64], period: usize) -> f64 {
    if period == 0 || volumes.len() < period + 1 {
        return 1.0;
    }

    let latest = volumes[volumes.len() - 1];
    let window = &volumes[volumes.len() - 1 - period..volumes.len() - 1];
    let average = window.iter().sum::<f64>() / period as f64;

    if average == 0.0 {
        return 1.0;
    }

    latest / average
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_ratio_excludes_latest() {
        // Average of the three bars before the latest is 100
        let volumes = [999.0, 100.0, 100.0, 100.0, 250.0];
        assert_eq!(volume_ratio(&volumes, 3), 2.5);
    }

    #[test]
    fn test_volume_ratio_insufficient_history() {
        assert_eq!(volume_ratio(&[100.0, 200.0], 20), 1.0);
    }

    #[test]
    fn test_volume_ratio_zero_average() {
        assert_eq!(volume_ratio(&[0.0, 0.0, 0.0, 50.0], 3), 1.0);
    }
}
