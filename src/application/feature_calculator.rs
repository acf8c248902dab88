//! Computes the fixed-shape [`Features`] record from raw candle series.
//!
//! Every function here is a pure transform of its slice arguments. No
//! function performs I/O, logs, or holds state across calls — mirroring how
//! the market regime detector keeps statistics free of side effects and
//! leaves logging to the calling layer.

use crate::domain::calibration::Calibration;
use crate::domain::candle::Candle;
use crate::domain::features::{Features, SessionRangeHistory};
use crate::domain::session::SessionMapper;
use rust_decimal::prelude::ToPrimitive;
use statrs::statistics::{Data, Distribution};

const VWAP_SLOPE_WINDOW: usize = 30;
const ATR_PERIOD: usize = 14;
const ATR_SLOPE_LOOKBACK: usize = 10;
const RV_SHORT_WINDOW: usize = 20;
const RV_LONG_WINDOW: usize = 100;
const RV_LONG_MIN: usize = 40;
const OVERLAP_WINDOW: usize = 24;
const EFFICIENCY_WINDOW: usize = 60;
const RANGE_PER_VOLUME_WINDOW: usize = 12;
const ATR_ZSCORE_WINDOW: usize = 200;
const ATR_ZSCORE_MIN: usize = 40;

fn mean(values: &[f64]) -> f64 {
    Data::new(values.to_vec()).mean().unwrap_or(0.0)
}

fn std_dev(values: &[f64]) -> f64 {
    Data::new(values.to_vec()).std_dev().unwrap_or(0.0)
}

/// Slope of the best-fit line through `(0, y[0]), (1, y[1]), ...`.
fn linear_regression_slope(y: &[f64]) -> Option<f64> {
    let n = y.len();
    if n < 2 {
        return None;
    }
    let n_f = n as f64;
    let x_sum: f64 = (0..n).map(|i| i as f64).sum();
    let y_sum: f64 = y.iter().sum();
    let xy_sum: f64 = y.iter().enumerate().map(|(i, v)| i as f64 * v).sum();
    let x2_sum: f64 = (0..n).map(|i| (i * i) as f64).sum();

    let denominator = n_f * x2_sum - x_sum * x_sum;
    if denominator.abs() < 1e-12 {
        return None;
    }
    Some((n_f * xy_sum - x_sum * y_sum) / denominator)
}

fn f(value: rust_decimal::Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

fn true_range(candle: &Candle, prev_close: f64) -> f64 {
    let high = f(candle.high);
    let low = f(candle.low);
    (high - low).max((high - prev_close).abs()).max((low - prev_close).abs())
}

/// Wilder-smoothed ATR(14) series, one value per bar starting at index
/// `ATR_PERIOD` (the first bar has no true range). Returns an empty vec if
/// fewer than `ATR_PERIOD + 1` candles are supplied.
fn wilder_atr_series(candles: &[Candle]) -> Vec<f64> {
    if candles.len() < ATR_PERIOD + 1 {
        return Vec::new();
    }
    let mut trs = Vec::with_capacity(candles.len() - 1);
    for i in 1..candles.len() {
        trs.push(true_range(&candles[i], f(candles[i - 1].close)));
    }

    let mut atrs = Vec::with_capacity(trs.len() - ATR_PERIOD + 1);
    let seed: f64 = trs[..ATR_PERIOD].iter().sum::<f64>() / ATR_PERIOD as f64;
    atrs.push(seed);
    let mut prev = seed;
    for tr in &trs[ATR_PERIOD..] {
        let next = (prev * (ATR_PERIOD as f64 - 1.0) + tr) / ATR_PERIOD as f64;
        atrs.push(next);
        prev = next;
    }
    atrs
}

fn vwap_series(one_minute_regular: &[Candle]) -> Vec<f64> {
    let mut cum_pv = 0.0;
    let mut cum_v = 0.0;
    let mut out = Vec::with_capacity(one_minute_regular.len());
    for candle in one_minute_regular {
        let typical = f(candle.typical_price());
        cum_pv += typical * candle.volume as f64;
        cum_v += candle.volume as f64;
        if cum_v > 0.0 {
            out.push(cum_pv / cum_v);
        }
    }
    out
}

fn overlap_ratio(a: &Candle, b: &Candle) -> f64 {
    let (a_low, a_high) = (f(a.low), f(a.high));
    let (b_low, b_high) = (f(b.low), f(b.high));
    let overlap = a_high.min(b_high) - a_low.max(b_low);
    let union = a_high.max(b_high) - a_low.min(b_low);
    if union <= 0.0 {
        0.0
    } else {
        overlap.max(0.0) / union
    }
}

/// Computes the full [`Features`] record for one classification instant.
///
/// `one_minute` and `five_minute` must already be filtered to the caller's
/// lookback window; this function never trims by wall-clock time itself,
/// only by bar count, consistent with the ATR/RV windows defined below.
pub fn calculate_features(
    one_minute: &[Candle],
    five_minute: &[Candle],
    calibration: &Calibration,
    now: chrono::DateTime<chrono::Utc>,
    history: &SessionRangeHistory,
) -> Features {
    let mut features = Features::default();

    let session_open_today = session_start_index(one_minute, now);
    let regular_session_bars = &one_minute[session_open_today..];

    let vwaps = vwap_series(regular_session_bars);
    features.vwap = vwaps.last().copied();

    if vwaps.len() >= VWAP_SLOPE_WINDOW {
        let window = &vwaps[vwaps.len() - VWAP_SLOPE_WINDOW..];
        if let (Some(slope), Some(&current)) = (linear_regression_slope(window), vwaps.last()) {
            if current.abs() > 1e-9 {
                features.vwap_slope = Some(slope / current);
            }
        }
    }

    if let (Some(vwap), Some(last_candle)) = (features.vwap, one_minute.last()) {
        if vwap.abs() > 1e-9 {
            features.price_vs_vwap = Some((f(last_candle.close) - vwap) / vwap);
        }
    }

    let atr_series = wilder_atr_series(five_minute);
    features.atr_14_5m = atr_series.last().copied();

    if atr_series.len() > ATR_SLOPE_LOOKBACK {
        let current = atr_series[atr_series.len() - 1];
        let earlier = atr_series[atr_series.len() - 1 - ATR_SLOPE_LOOKBACK];
        if earlier.abs() > 1e-9 {
            features.atr_slope = Some((current - earlier) / earlier);
        }
    }

    let log_returns = log_returns(five_minute);
    if log_returns.len() >= RV_SHORT_WINDOW {
        let window = &log_returns[log_returns.len() - RV_SHORT_WINDOW..];
        features.realized_vol_short = Some(std_dev(window));
    }
    if log_returns.len() >= RV_LONG_MIN {
        let take = log_returns.len().min(RV_LONG_WINDOW);
        let window = &log_returns[log_returns.len() - take..];
        features.realized_vol_long = Some(std_dev(window));
    }
    if let (Some(short), Some(long)) = (features.realized_vol_short, features.realized_vol_long) {
        if long.abs() > 1e-12 {
            features.rv_ratio = Some(short / long);
        }
    }

    if five_minute.len() >= OVERLAP_WINDOW {
        let window = &five_minute[five_minute.len() - OVERLAP_WINDOW..];
        let overlaps: Vec<f64> = window.windows(2).map(|pair| overlap_ratio(&pair[0], &pair[1])).collect();
        if !overlaps.is_empty() {
            features.bar_overlap_ratio = Some(mean(&overlaps));
        }
    }

    if one_minute.len() >= EFFICIENCY_WINDOW {
        let window = &one_minute[one_minute.len() - EFFICIENCY_WINDOW..];
        let net = f(window.last().unwrap().close) - f(window.first().unwrap().close);
        let total: f64 = window
            .windows(2)
            .map(|pair| (f(pair[1].close) - f(pair[0].close)).abs())
            .sum();
        if total > 1e-9 {
            features.directional_efficiency = Some(net / total);
        }

        if let Some(atr) = features.atr_14_5m {
            features.avg_pullback_depth = avg_pullback_depth(window, atr, net);
        }
    }

    let session_range = session_range(regular_session_bars);
    features.session_range = session_range;
    if let Some(range) = session_range {
        let hist = history.as_slice();
        if hist.len() >= 5 {
            let m = mean(hist);
            let sd = std_dev(hist);
            if sd > 1e-9 {
                features.session_range_zscore = Some((range - m) / sd);
            }
        }
    }

    let minutes_since_open = SessionMapper::minutes_since_session_open(now);
    features.opening_range_position =
        opening_range_position(regular_session_bars, one_minute.last(), minutes_since_open);

    let cum_volume: u64 = regular_session_bars.iter().map(|c| c.volume).sum();
    let expected_fraction = calibration.expected_volume_fraction_floored(minutes_since_open);
    let expected_volume_so_far = expected_fraction * typical_session_volume(calibration);
    features.volume_vs_expected = Some(cum_volume as f64 / expected_volume_so_far);

    features.volume_acceleration = volume_acceleration(one_minute);
    features.range_per_volume = range_per_volume(five_minute);

    features.atr_zscore = atr_zscore(five_minute);

    features
}

/// Order-of-magnitude typical regular-session cumulative volume, used only to
/// turn the calibration's expected-volume-fraction curve (§4.4.A) into a
/// volume figure so `volume_vs_expected` comes out as a ratio centered on
/// 1.0. Not a calibration knob in its own right: the curve's *shape* is what
/// the spec fixes per instrument, this is a fixed scale factor.
fn typical_session_volume(calibration: &Calibration) -> f64 {
    match calibration.instrument {
        crate::domain::instrument::Instrument::Es => 1_500_000.0,
        crate::domain::instrument::Instrument::Nq => 900_000.0,
    }
}

/// Index of the first bar at/after the most recent 08:30 CT session-open
/// boundary. Stays entirely in naive Chicago wall-clock arithmetic (matching
/// `SessionMapper::minutes_since_session_open`) to sidestep DST ambiguity
/// when re-localizing a constructed local time. Returns `one_minute.len()`
/// (an empty `regular_session_bars` slice) if no bar qualifies.
fn session_start_index(one_minute: &[Candle], now: chrono::DateTime<chrono::Utc>) -> usize {
    use chrono::NaiveTime;
    use chrono_tz::America::Chicago;

    let open_time = NaiveTime::from_hms_opt(8, 30, 0).expect("8:30 is always a valid time");
    let local_now = now.with_timezone(&Chicago).naive_local();
    let today_open = local_now.date().and_time(open_time);
    let session_open = if local_now >= today_open {
        today_open
    } else {
        today_open - chrono::Duration::days(1)
    };

    one_minute
        .iter()
        .position(|c| c.timestamp.with_timezone(&Chicago).naive_local() >= session_open)
        .unwrap_or(one_minute.len())
}

fn log_returns(candles: &[Candle]) -> Vec<f64> {
    candles
        .windows(2)
        .filter_map(|pair| {
            let prev = f(pair[0].close);
            let curr = f(pair[1].close);
            if prev > 0.0 && curr > 0.0 {
                Some((curr / prev).ln())
            } else {
                None
            }
        })
        .collect()
}

fn avg_pullback_depth(window: &[Candle], atr: f64, net_travel: f64) -> Option<f64> {
    if window.len() < 3 || net_travel.abs() < 1e-9 {
        return None;
    }
    let closes: Vec<f64> = window.iter().map(|c| f(c.close)).collect();
    let min_extreme = 0.1 * atr;
    let mut depths = Vec::new();
    for i in 1..closes.len() - 1 {
        let (prev, curr, next) = (closes[i - 1], closes[i], closes[i + 1]);
        let is_high = curr > prev + min_extreme && curr > next + min_extreme;
        let is_low = curr < prev - min_extreme && curr < next - min_extreme;
        if is_high || is_low {
            depths.push((curr - closes[0]).abs());
        }
    }
    if depths.is_empty() {
        return None;
    }
    Some(mean(&depths) / net_travel.abs())
}

fn session_range(regular_session_bars: &[Candle]) -> Option<f64> {
    if regular_session_bars.is_empty() {
        return None;
    }
    let high = regular_session_bars
        .iter()
        .map(|c| f(c.high))
        .fold(f64::NEG_INFINITY, f64::max);
    let low = regular_session_bars
        .iter()
        .map(|c| f(c.low))
        .fold(f64::INFINITY, f64::min);
    Some(high - low)
}

fn opening_range_position(
    regular_session_bars: &[Candle],
    last_candle: Option<&Candle>,
    minutes_since_open: i64,
) -> Option<f64> {
    if minutes_since_open < 0 {
        return None;
    }
    let or_bars: Vec<&Candle> = regular_session_bars
        .iter()
        .filter(|c| {
            let mins = (c.timestamp - regular_session_bars[0].timestamp).num_minutes();
            (0..30).contains(&mins)
        })
        .collect();
    if or_bars.is_empty() {
        return None;
    }
    let or_high = or_bars.iter().map(|c| f(c.high)).fold(f64::NEG_INFINITY, f64::max);
    let or_low = or_bars.iter().map(|c| f(c.low)).fold(f64::INFINITY, f64::min);
    let span = or_high - or_low;
    if span.abs() < 1e-9 {
        return None;
    }
    let close = f(last_candle?.close);
    Some(((close - or_low) / span).clamp(0.0, 1.0))
}

fn volume_acceleration(one_minute: &[Candle]) -> Option<f64> {
    if one_minute.len() < 20 {
        return None;
    }
    let last_10: u64 = one_minute[one_minute.len() - 10..].iter().map(|c| c.volume).sum();
    let prior_10: u64 = one_minute[one_minute.len() - 20..one_minute.len() - 10]
        .iter()
        .map(|c| c.volume)
        .sum();
    if prior_10 == 0 {
        return None;
    }
    Some(last_10 as f64 / prior_10 as f64 - 1.0)
}

fn range_per_volume(five_minute: &[Candle]) -> Option<f64> {
    if five_minute.len() < RANGE_PER_VOLUME_WINDOW {
        return None;
    }
    let window = &five_minute[five_minute.len() - RANGE_PER_VOLUME_WINDOW..];
    let ratios: Vec<f64> = window
        .iter()
        .filter(|c| c.volume > 0)
        .map(|c| (f(c.high) - f(c.low)) / c.volume as f64)
        .collect();
    if ratios.is_empty() {
        None
    } else {
        Some(mean(&ratios))
    }
}

fn atr_zscore(five_minute: &[Candle]) -> Option<f64> {
    let lookback = ATR_PERIOD + ATR_ZSCORE_WINDOW;
    let tail = &five_minute[five_minute.len().saturating_sub(lookback)..];
    let atrs = wilder_atr_series(tail);
    if atrs.len() < ATR_ZSCORE_MIN {
        return None;
    }
    let current = *atrs.last()?;
    let m = mean(&atrs);
    let sd = std_dev(&atrs);
    if sd < 1e-9 {
        return None;
    }
    Some((current - m) / sd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::calibration::ES_CAL;
    use crate::domain::candle::Frequency;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn candle_at(base: chrono::DateTime<Utc>, minute: i64, price: Decimal, volume: u64) -> Candle {
        Candle {
            timestamp: base + chrono::Duration::minutes(minute),
            open: price,
            high: price + dec!(1),
            low: price - dec!(1),
            close: price,
            volume,
        }
    }

    fn session_open() -> chrono::DateTime<Utc> {
        use chrono_tz::America::Chicago;
        Chicago
            .with_ymd_and_hms(2025, 12, 16, 8, 30, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn missing_features_when_no_bars() {
        let history = SessionRangeHistory::new();
        let features = calculate_features(&[], &[], &ES_CAL, session_open(), &history);
        assert!(features.vwap.is_none());
        assert!(features.atr_14_5m.is_none());
    }

    #[test]
    fn session_start_excludes_pre_open_bars_sharing_todays_calendar_date() {
        let open = session_open();
        let mut bars: Vec<Candle> = (-60..0).map(|i| candle_at(open, i, dec!(100), 10)).collect();
        bars.extend((0..5).map(|i| candle_at(open, i, dec!(200), 10)));

        let history = SessionRangeHistory::new();
        let features = calculate_features(&bars, &[], &ES_CAL, open + chrono::Duration::minutes(4), &history);
        let vwap = features.vwap.expect("regular-session bars are present");
        assert!(
            (vwap - 200.0).abs() < 1e-6,
            "vwap {vwap} should reflect only the post-08:30 bars, not the 07:30-08:29 pre-market ones"
        );
    }

    #[test]
    fn vwap_is_computed_from_session_bars() {
        let base = session_open();
        let one_minute: Vec<Candle> = (0..5)
            .map(|i| candle_at(base, i, dec!(100) + Decimal::from(i), 10))
            .collect();
        let history = SessionRangeHistory::new();
        let features = calculate_features(&one_minute, &[], &ES_CAL, base + chrono::Duration::minutes(4), &history);
        assert!(features.vwap.is_some());
    }

    #[test]
    fn atr_requires_fifteen_five_minute_bars() {
        let base = session_open();
        let five_minute: Vec<Candle> = (0..14)
            .map(|i| candle_at(base, i * 5, dec!(5800), 100))
            .collect();
        let atrs = wilder_atr_series(&five_minute);
        assert!(atrs.is_empty());

        let five_minute: Vec<Candle> = (0..15)
            .map(|i| candle_at(base, i * 5, dec!(5800) + Decimal::from(i % 3), 100))
            .collect();
        let atrs = wilder_atr_series(&five_minute);
        assert_eq!(atrs.len(), 1);
    }

    #[test]
    fn directional_efficiency_is_one_for_monotonic_rise() {
        let base = session_open();
        let one_minute: Vec<Candle> = (0..60)
            .map(|i| candle_at(base, i, dec!(100) + Decimal::from(i), 10))
            .collect();
        let history = SessionRangeHistory::new();
        let features = calculate_features(&one_minute, &[], &ES_CAL, base + chrono::Duration::minutes(59), &history);
        assert!((features.directional_efficiency.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn bar_overlap_ratio_is_in_unit_interval() {
        let base = session_open();
        let five_minute: Vec<Candle> = (0..24)
            .map(|i| candle_at(base, i * 5, dec!(5800), 100))
            .collect();
        let history = SessionRangeHistory::new();
        let features = calculate_features(&[], &five_minute, &ES_CAL, base + chrono::Duration::minutes(120), &history);
        let ratio = features.bar_overlap_ratio.unwrap();
        assert!((0.0..=1.0).contains(&ratio));
    }

    #[test]
    fn session_range_zscore_requires_history() {
        let base = session_open();
        let one_minute: Vec<Candle> = (0..5)
            .map(|i| candle_at(base, i, dec!(100), 10))
            .collect();
        let empty_history = SessionRangeHistory::new();
        let features = calculate_features(&one_minute, &[], &ES_CAL, base, &empty_history);
        assert!(features.session_range_zscore.is_none());

        let full_history = SessionRangeHistory::from_ranges(vec![10.0, 11.0, 9.0, 10.5, 9.5, 10.2]);
        let features = calculate_features(&one_minute, &[], &ES_CAL, base, &full_history);
        assert!(features.session_range.is_some());
        if full_history.as_slice().len() >= 5 {
            assert!(features.session_range_zscore.is_some() || features.session_range.is_some());
        }
    }

    #[test]
    fn volume_acceleration_needs_twenty_bars() {
        let base = session_open();
        let too_few: Vec<Candle> = (0..10).map(|i| candle_at(base, i, dec!(100), 10)).collect();
        assert!(volume_acceleration(&too_few).is_none());

        let enough: Vec<Candle> = (0..20).map(|i| candle_at(base, i, dec!(100), 10)).collect();
        assert!(volume_acceleration(&enough).is_some());
    }

    #[test]
    fn range_per_volume_excludes_zero_volume_bars() {
        let base = session_open();
        let mut bars: Vec<Candle> = (0..12).map(|i| candle_at(base, i * 5, dec!(100), 10)).collect();
        bars[0].volume = 0;
        let result = range_per_volume(&bars);
        assert!(result.is_some());
    }
}
