//! Wires a [`CandleSource`] through the Contract Resolver, Feature
//! Calculator, and Regime Classifier. This is the only place in the crate
//! that awaits anything — the core itself never suspends (§5).

use crate::application::classifier::classify;
use crate::application::feature_calculator::calculate_features;
use crate::domain::calibration::Calibration;
use crate::domain::candle::Frequency;
use crate::domain::contract::ContractResolver;
use crate::domain::errors::CoreError;
use crate::domain::features::SessionRangeHistory;
use crate::domain::instrument::Instrument;
use crate::domain::regime::RegimeReport;
use crate::domain::session::SessionMapper;
use crate::ports::{CandleSource, Clock, EventWindow};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{info, instrument};

const MIN_ONE_MINUTE_BARS: usize = 60;
const MIN_FIVE_MINUTE_BARS: usize = 20;

/// Async seam between the sync core and the outside world. Holds the only
/// mutable state in the crate: each instrument's rolling [`SessionRangeHistory`],
/// owned by the orchestrator per §3.A, never touched by the core directly.
pub struct Pipeline {
    candle_source: Arc<dyn CandleSource>,
    clock: Arc<dyn Clock>,
    event_window: Option<Arc<dyn EventWindow>>,
    lookback_days_1m: u32,
    lookback_days_5m: u32,
    history: Mutex<HashMap<Instrument, SessionRangeHistory>>,
}

impl Pipeline {
    pub fn new(
        candle_source: Arc<dyn CandleSource>,
        clock: Arc<dyn Clock>,
        event_window: Option<Arc<dyn EventWindow>>,
        lookback_days_1m: u32,
        lookback_days_5m: u32,
    ) -> Self {
        Self {
            candle_source,
            clock,
            event_window,
            lookback_days_1m,
            lookback_days_5m,
            history: Mutex::new(HashMap::new()),
        }
    }

    /// Runs one end-to-end classification for `instrument`. Resolver →
    /// CandleSource → Calculator → Classifier, per §5's happens-before order.
    #[instrument(skip(self), fields(instrument = %instrument))]
    pub async fn run(&self, instrument: Instrument) -> anyhow::Result<RegimeReport> {
        let now = self.clock.now();
        let calibration = Calibration::for_instrument(instrument);
        let symbol = ContractResolver::resolve(instrument, now);

        info!(symbol = %symbol, "resolved front-month contract");

        let (one_minute, five_minute) = tokio::try_join!(
            self.candle_source.fetch(&symbol, Frequency::OneMinute, self.lookback_days_1m),
            self.candle_source.fetch(&symbol, Frequency::FiveMinute, self.lookback_days_5m),
        )?;

        if one_minute.len() < MIN_ONE_MINUTE_BARS || five_minute.len() < MIN_FIVE_MINUTE_BARS {
            return Err(CoreError::InsufficientData {
                observed_1m: one_minute.len(),
                required_1m: MIN_ONE_MINUTE_BARS,
                observed_5m: five_minute.len(),
                required_5m: MIN_FIVE_MINUTE_BARS,
            }
            .into());
        }

        let range_history = self
            .history
            .lock()
            .expect("history mutex is never held across an await point")
            .get(&instrument)
            .cloned()
            .unwrap_or_default();

        let features = calculate_features(
            one_minute.as_slice(),
            five_minute.as_slice(),
            calibration,
            now,
            &range_history,
        );

        let session_phase = SessionMapper::phase(now);
        let event_active = self
            .event_window
            .as_ref()
            .is_some_and(|window| window.is_event_active(now));

        let report = classify(instrument, now, &features, calibration, session_phase, event_active);

        if let Some(range) = features.session_range {
            let mut guard = self
                .history
                .lock()
                .expect("history mutex is never held across an await point");
            guard.entry(instrument).or_default().push(range);
        }

        info!(
            primary_regime = %report.primary_regime,
            confidence = report.confidence,
            "classification complete"
        );

        Ok(report)
    }

    /// Runs ES and NQ concurrently. The core is re-entrant (§5): each call
    /// gets its own immutable `Calibration` and candle slices.
    pub async fn run_all(&self) -> anyhow::Result<Vec<RegimeReport>> {
        let (es, nq) = tokio::try_join!(self.run(Instrument::Es), self.run(Instrument::Nq))?;
        Ok(vec![es, nq])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candle::{Candle, CandleSeries};
    use crate::domain::instrument::Symbol;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    struct FixedClock(chrono::DateTime<Utc>);
    impl Clock for FixedClock {
        fn now(&self) -> chrono::DateTime<Utc> {
            self.0
        }
    }

    struct StubSource {
        one_minute_count: usize,
        five_minute_count: usize,
    }

    #[async_trait]
    impl CandleSource for StubSource {
        async fn fetch(
            &self,
            _symbol: &Symbol,
            frequency: Frequency,
            _lookback_days: u32,
        ) -> Result<CandleSeries, CoreError> {
            let count = match frequency {
                Frequency::OneMinute => self.one_minute_count,
                Frequency::FiveMinute => self.five_minute_count,
            };
            let base = Utc.with_ymd_and_hms(2025, 12, 16, 8, 30, 0).unwrap();
            let step = frequency.duration();
            let candles: Vec<Candle> = (0..count)
                .map(|i| Candle {
                    timestamp: base + step * i as i32,
                    open: dec!(5800),
                    high: dec!(5801),
                    low: dec!(5799),
                    close: dec!(5800),
                    volume: 100,
                })
                .collect();
            CandleSeries::new(frequency, candles)
        }
    }

    #[tokio::test]
    async fn fails_with_insufficient_data_below_boundary() {
        let pipeline = Pipeline::new(
            Arc::new(StubSource {
                one_minute_count: 59,
                five_minute_count: 20,
            }),
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 12, 16, 10, 0, 0).unwrap())),
            None,
            1,
            10,
        );
        let err = pipeline.run(Instrument::Es).await.unwrap_err();
        assert!(err.downcast_ref::<CoreError>().is_some());
    }

    #[tokio::test]
    async fn succeeds_at_exactly_the_boundary() {
        let pipeline = Pipeline::new(
            Arc::new(StubSource {
                one_minute_count: 60,
                five_minute_count: 20,
            }),
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 12, 16, 10, 0, 0).unwrap())),
            None,
            1,
            10,
        );
        let report = pipeline.run(Instrument::Es).await.unwrap();
        assert_eq!(report.instrument, Instrument::Es);
    }

    #[tokio::test]
    async fn run_all_classifies_both_instruments() {
        let pipeline = Pipeline::new(
            Arc::new(StubSource {
                one_minute_count: 60,
                five_minute_count: 20,
            }),
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 12, 16, 10, 0, 0).unwrap())),
            None,
            1,
            10,
        );
        let reports = pipeline.run_all().await.unwrap();
        assert_eq!(reports.len(), 2);
    }
}
