use crate::domain::errors::CoreError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fixed bar frequency a `CandleSeries` is sampled at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    OneMinute,
    FiveMinute,
}

impl Frequency {
    pub fn minutes(&self) -> i64 {
        match self {
            Frequency::OneMinute => 1,
            Frequency::FiveMinute => 5,
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.minutes())
    }
}

/// A single OHLCV bar. `timestamp` marks the start of the bar, UTC, millisecond
/// resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

impl Candle {
    fn validate(&self, index: usize) -> Result<(), CoreError> {
        let body_low = self.open.min(self.close);
        let body_high = self.open.max(self.close);
        if self.low > body_low {
            return Err(CoreError::InvalidCandle {
                index,
                reason: format!("low {} exceeds min(open, close) {}", self.low, body_low),
            });
        }
        if self.high < body_high {
            return Err(CoreError::InvalidCandle {
                index,
                reason: format!("high {} is below max(open, close) {}", self.high, body_high),
            });
        }
        if self.low > self.high {
            return Err(CoreError::InvalidCandle {
                index,
                reason: format!("low {} exceeds high {}", self.low, self.high),
            });
        }
        Ok(())
    }

    /// Midpoint of the high/low/close range, used by VWAP.
    pub fn typical_price(&self) -> Decimal {
        (self.high + self.low + self.close) / Decimal::from(3)
    }
}

/// An ordered sequence of candles at a fixed frequency, validated on
/// construction: strictly increasing timestamps, uniform spacing equal to the
/// series frequency, and per-candle OHLC invariants.
#[derive(Debug, Clone)]
pub struct CandleSeries {
    frequency: Frequency,
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(frequency: Frequency, candles: Vec<Candle>) -> Result<Self, CoreError> {
        let step = frequency.duration();
        for (i, candle) in candles.iter().enumerate() {
            candle.validate(i)?;
            if i > 0 {
                let prev = &candles[i - 1];
                if candle.timestamp <= prev.timestamp {
                    return Err(CoreError::InvalidCandle {
                        index: i,
                        reason: "timestamp does not strictly increase".to_string(),
                    });
                }
                if candle.timestamp - prev.timestamp != step {
                    return Err(CoreError::InvalidCandle {
                        index: i,
                        reason: format!(
                            "spacing {} does not match series frequency {:?}",
                            candle.timestamp - prev.timestamp,
                            frequency
                        ),
                    });
                }
            }
        }
        Ok(Self { frequency, candles })
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn as_slice(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// Last `n` candles, or every candle if fewer than `n` are available.
    pub fn tail(&self, n: usize) -> &[Candle] {
        let start = self.candles.len().saturating_sub(n);
        &self.candles[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn candle_at(minute: i64, price: Decimal) -> Candle {
        Candle {
            timestamp: Utc.timestamp_opt(1_700_000_000 + minute * 60, 0).unwrap(),
            open: price,
            high: price + dec!(1),
            low: price - dec!(1),
            close: price,
            volume: 1_000,
        }
    }

    #[test]
    fn accepts_well_formed_uniform_series() {
        let candles = vec![candle_at(0, dec!(100)), candle_at(1, dec!(101))];
        let series = CandleSeries::new(Frequency::OneMinute, candles).unwrap();
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn rejects_low_above_body() {
        let mut bad = candle_at(0, dec!(100));
        bad.low = dec!(100.5);
        let err = CandleSeries::new(Frequency::OneMinute, vec![bad]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidCandle { index: 0, .. }));
    }

    #[test]
    fn rejects_non_monotonic_timestamps() {
        let candles = vec![candle_at(1, dec!(100)), candle_at(0, dec!(101))];
        let err = CandleSeries::new(Frequency::OneMinute, candles).unwrap_err();
        assert!(matches!(err, CoreError::InvalidCandle { index: 1, .. }));
    }

    #[test]
    fn rejects_nonuniform_spacing() {
        let candles = vec![candle_at(0, dec!(100)), candle_at(3, dec!(101))];
        let err = CandleSeries::new(Frequency::OneMinute, candles).unwrap_err();
        assert!(matches!(err, CoreError::InvalidCandle { index: 1, .. }));
    }

    #[test]
    fn tail_returns_full_slice_when_fewer_than_requested() {
        let candles = vec![candle_at(0, dec!(100)), candle_at(1, dec!(101))];
        let series = CandleSeries::new(Frequency::OneMinute, candles).unwrap();
        assert_eq!(series.tail(10).len(), 2);
    }

    #[test]
    fn typical_price_averages_hlc() {
        let c = candle_at(0, dec!(100));
        assert_eq!(c.typical_price(), (dec!(101) + dec!(99) + dec!(100)) / dec!(3));
    }
}
