use crate::domain::candle::{Candle, CandleSeries, Frequency};
use crate::domain::errors::CoreError;
use crate::domain::instrument::Symbol;
use crate::ports::CandleSource;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// In-memory [`CandleSource`] that fabricates a deterministic random walk.
/// Stands in for the out-of-scope quote-vendor transport (§1): no network
/// call is ever made. The walk is seeded from the symbol and frequency, so
/// repeated `fetch` calls for the same inputs return byte-identical series.
pub struct MockCandleSource {
    reference_time: DateTime<Utc>,
    base_price: f64,
}

impl MockCandleSource {
    pub fn new(reference_time: DateTime<Utc>, base_price: f64) -> Self {
        Self {
            reference_time,
            base_price,
        }
    }

    fn seed_for(&self, symbol: &Symbol, frequency: Frequency) -> u64 {
        let mut hasher = DefaultHasher::new();
        symbol.as_str().hash(&mut hasher);
        frequency.minutes().hash(&mut hasher);
        hasher.finish()
    }
}

#[async_trait]
impl CandleSource for MockCandleSource {
    async fn fetch(
        &self,
        symbol: &Symbol,
        frequency: Frequency,
        lookback_days: u32,
    ) -> Result<CandleSeries, CoreError> {
        let step = frequency.duration();
        let bars_per_day = (24 * 60) / frequency.minutes();
        let count = (bars_per_day as u32 * lookback_days).max(1) as usize;

        let mut rng = StdRng::seed_from_u64(self.seed_for(symbol, frequency));
        let start = self.reference_time - step * (count as i32 - 1);

        let mut price = self.base_price;
        let mut candles = Vec::with_capacity(count);
        for i in 0..count {
            let drift: f64 = rng.random_range(-0.4..0.4);
            let open = price;
            let close = (open + drift).max(1.0);
            let wick: f64 = rng.random_range(0.1..0.6);
            let high = open.max(close) + wick;
            let low = (open.min(close) - wick).max(0.1);
            let volume = rng.random_range(50..500) as u64;

            candles.push(Candle {
                timestamp: start + step * i as i32,
                open: decimal(open),
                high: decimal(high),
                low: decimal(low),
                close: decimal(close),
                volume,
            });
            price = close;
        }

        CandleSeries::new(frequency, candles)
    }
}

fn decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn fetch_produces_a_valid_series_of_the_requested_span() {
        let source = MockCandleSource::new(Utc.with_ymd_and_hms(2025, 12, 16, 20, 30, 0).unwrap(), 5800.0);
        let symbol = Symbol::new("/ESH26");
        let series = source.fetch(&symbol, Frequency::OneMinute, 1).await.unwrap();
        assert_eq!(series.len(), 24 * 60);
    }

    #[tokio::test]
    async fn fetch_is_deterministic_for_the_same_symbol_and_frequency() {
        let source = MockCandleSource::new(Utc.with_ymd_and_hms(2025, 12, 16, 20, 30, 0).unwrap(), 20000.0);
        let symbol = Symbol::new("/NQH26");
        let a = source.fetch(&symbol, Frequency::FiveMinute, 2).await.unwrap();
        let b = source.fetch(&symbol, Frequency::FiveMinute, 2).await.unwrap();
        assert_eq!(a.as_slice(), b.as_slice());
    }
}
