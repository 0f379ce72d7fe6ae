//! Technical Indicators
//!
//! Pure computation over `f64` price series. No I/O, no state. Every
//! function degrades to a documented neutral value on insufficient or
//! degenerate input instead of returning an error:
//!
//! - `ema` falls back to the arithmetic mean of whatever is available
//! - `rsi` returns a neutral 50.0, or 100.0 when smoothed losses are zero
//! - `expected_return` and `volatility` return 0.0 below two prices
//! - `moving_averages` collapses both windows to the last price
//!
//! Log-return pairs with a non-positive price contribute 0.0 rather than
//! propagating NaN.

/// Default smoothing period for RSI and expected return.
pub const DEFAULT_PERIOD: usize = 14;

/// Short moving-average window.
pub const SHORT_WINDOW: usize = 7;

/// Long moving-average window.
pub const LONG_WINDOW: usize = 30;

/// Short and long simple moving averages of a price series.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MovingAverages {
    /// Mean of the last [`SHORT_WINDOW`] prices
    pub short: f64,

    /// Mean of the last [`LONG_WINDOW`] prices, falling back to `short`
    pub long: f64,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Day-over-day log-returns `ln(p[t] / p[t-1])`.
///
/// Pairs containing a non-positive price yield 0.0.
fn log_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .map(|w| {
            if w[0] > 0.0 && w[1] > 0.0 {
                (w[1] / w[0]).ln()
            } else {
                0.0
            }
        })
        .collect()
}

/// Exponential Moving Average, returning only the final smoothed value.
///
/// Seeded with the simple mean of the first `period` values, then
/// `alpha = 2 / (period + 1)` applied over the remainder. With fewer than
/// `period` values this degrades to the arithmetic mean of what exists.
pub fn ema(series: &[f64], period: usize) -> f64 {
    if series.is_empty() || period == 0 {
        return 0.0;
    }
    if series.len() < period {
        return mean(series);
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut ema = mean(&series[..period]);
    for &value in &series[period..] {
        ema = value * alpha + ema * (1.0 - alpha);
    }
    ema
}

/// Expected return as the EMA of historical log-returns, in percent.
///
/// Requires at least two prices (else 0.0). With fewer than `period`
/// log-returns the arithmetic mean is used instead of the EMA.
pub fn expected_return(prices: &[f64], period: usize) -> f64 {
    if prices.len() < 2 {
        return 0.0;
    }

    let returns = log_returns(prices);
    let raw = if returns.len() < period {
        mean(&returns)
    } else {
        ema(&returns, period)
    };
    raw * 100.0
}

/// Relative Strength Index with Wilder's smoothing.
///
/// Seeds average gain/loss with the simple mean of the first `period`
/// deltas, then applies `avg = ((period - 1) * avg + new) / period`.
/// Returns 50.0 below `period + 1` prices, 100.0 when the smoothed
/// average loss is zero, and the neutral 50.0 when both smoothed
/// averages are zero (a perfectly flat series).
pub fn rsi(prices: &[f64], period: usize) -> f64 {
    if period == 0 || prices.len() < period + 1 {
        return 50.0;
    }

    let deltas: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();
    let n = period as f64;

    let mut avg_gain = deltas[..period].iter().map(|&d| d.max(0.0)).sum::<f64>() / n;
    let mut avg_loss = deltas[..period].iter().map(|&d| (-d).max(0.0)).sum::<f64>() / n;

    for &d in &deltas[period..] {
        let (gain, loss) = if d > 0.0 { (d, 0.0) } else { (0.0, -d) };
        avg_gain = ((n - 1.0) * avg_gain + gain) / n;
        avg_loss = ((n - 1.0) * avg_loss + loss) / n;
    }

    if avg_loss == 0.0 {
        // No smoothed losses: maximal strength, unless there were no
        // gains either (flat series carries no directional signal).
        return if avg_gain == 0.0 { 50.0 } else { 100.0 };
    }

    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// Volatility as the population standard deviation of log-returns, in
/// percent. Requires at least two prices (else 0.0).
pub fn volatility(prices: &[f64]) -> f64 {
    if prices.len() < 2 {
        return 0.0;
    }

    let returns = log_returns(prices);
    let m = mean(&returns);
    let variance = returns.iter().map(|r| (r - m).powi(2)).sum::<f64>() / returns.len() as f64;
    variance.sqrt() * 100.0
}

/// Short (7) and long (30) simple moving averages.
///
/// With fewer than 7 points both windows collapse to the last available
/// price (0.0 if empty); with fewer than 30 the long window falls back
/// to the short one.
pub fn moving_averages(prices: &[f64]) -> MovingAverages {
    if prices.len() < SHORT_WINDOW {
        let last = prices.last().copied().unwrap_or(0.0);
        return MovingAverages { short: last, long: last };
    }

    let short = mean(&prices[prices.len() - SHORT_WINDOW..]);
    let long = if prices.len() >= LONG_WINDOW {
        mean(&prices[prices.len() - LONG_WINDOW..])
    } else {
        short
    };

    MovingAverages { short, long }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ema_empty_and_short_series() {
        assert_eq!(ema(&[], 14), 0.0);
        // Below the period: arithmetic mean of what exists
        assert!((ema(&[1.0, 2.0, 3.0], 14) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_ema_constant_series() {
        let series = vec![5.0; 40];
        assert!((ema(&series, 14) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_ema_weights_recent_values() {
        let mut series = vec![1.0; 20];
        series.extend(vec![10.0; 20]);
        let value = ema(&series, 14);
        assert!(value > 5.5 && value < 10.0);
    }

    #[test]
    fn test_expected_return_needs_two_prices() {
        assert_eq!(expected_return(&[], DEFAULT_PERIOD), 0.0);
        assert_eq!(expected_return(&[100.0], DEFAULT_PERIOD), 0.0);
    }

    #[test]
    fn test_expected_return_flat_series_is_zero() {
        let prices = vec![100.0; 30];
        assert!(expected_return(&prices, DEFAULT_PERIOD).abs() < 1e-12);
    }

    #[test]
    fn test_expected_return_short_history_uses_mean() {
        // 5 prices -> 4 log-returns, below the period of 14
        let prices = vec![100.0, 110.0, 121.0, 133.1, 146.41];
        let expected = (1.1f64).ln() * 100.0;
        assert!((expected_return(&prices, DEFAULT_PERIOD) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_rsi_neutral_below_minimum() {
        let prices = vec![100.0; DEFAULT_PERIOD]; // period + 1 not reached
        assert_eq!(rsi(&prices, DEFAULT_PERIOD), 50.0);
    }

    #[test]
    fn test_rsi_monotonic_increase_hits_100() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + f64::from(i)).collect();
        assert_eq!(rsi(&prices, DEFAULT_PERIOD), 100.0);
    }

    #[test]
    fn test_rsi_monotonic_decrease_hits_0() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 - f64::from(i)).collect();
        assert!(rsi(&prices, DEFAULT_PERIOD).abs() < 1e-12);
    }

    #[test]
    fn test_rsi_flat_series_is_neutral() {
        let prices = vec![100.0; 20];
        assert_eq!(rsi(&prices, DEFAULT_PERIOD), 50.0);
    }

    #[test]
    fn test_rsi_alternating_moves_stay_bounded() {
        for len in (DEFAULT_PERIOD + 1)..60 {
            let prices: Vec<f64> = (0..len)
                .map(|i| if i % 2 == 0 { 100.0 } else { 103.0 })
                .collect();
            let value = rsi(&prices, DEFAULT_PERIOD);
            assert!((0.0..=100.0).contains(&value), "rsi {value} out of range");
        }
    }

    #[test]
    fn test_volatility_constant_price_is_zero() {
        let prices = vec![42.0; 25];
        assert_eq!(volatility(&prices), 0.0);
        assert_eq!(volatility(&[42.0]), 0.0);
    }

    #[test]
    fn test_volatility_positive_for_moving_prices() {
        let prices = vec![100.0, 105.0, 98.0, 110.0, 102.0];
        assert!(volatility(&prices) > 0.0);
    }

    #[test]
    fn test_moving_averages_short_history_collapses_to_last() {
        let mas = moving_averages(&[10.0, 11.0, 12.0]);
        assert_eq!(mas.short, 12.0);
        assert_eq!(mas.long, 12.0);

        let empty = moving_averages(&[]);
        assert_eq!(empty.short, 0.0);
        assert_eq!(empty.long, 0.0);
    }

    #[test]
    fn test_moving_averages_long_falls_back_to_short() {
        let prices: Vec<f64> = (0..10).map(f64::from).collect();
        let mas = moving_averages(&prices);
        let expected_short = (3..10).map(f64::from).sum::<f64>() / 7.0;
        assert!((mas.short - expected_short).abs() < 1e-12);
        assert_eq!(mas.long, mas.short);
    }

    #[test]
    fn test_moving_averages_full_windows() {
        let prices = vec![50.0; 35];
        let mas = moving_averages(&prices);
        assert!((mas.short - 50.0).abs() < 1e-12);
        assert!((mas.long - 50.0).abs() < 1e-12);
    }
}
