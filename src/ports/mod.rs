//! Trait boundaries between the pure core and its external collaborators.
//! Nothing in `domain` or `application` depends on a concrete adapter —
//! only on these traits.

use crate::domain::candle::{CandleSeries, Frequency};
use crate::domain::errors::CoreError;
use crate::domain::instrument::Symbol;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Supplies historical candles for a resolved contract symbol at a given
/// frequency. The only collaborator the core ever awaits on.
#[async_trait]
pub trait CandleSource: Send + Sync {
    async fn fetch(
        &self,
        symbol: &Symbol,
        frequency: Frequency,
        lookback_days: u32,
    ) -> Result<CandleSeries, CoreError>;
}

/// Returns the current instant. A trait (rather than a direct `Utc::now()`
/// call) so tests can supply a fixed instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Optional news/event-window flag. Treated as permanently `false` when no
/// adapter is wired up.
pub trait EventWindow: Send + Sync {
    fn is_event_active(&self, now: DateTime<Utc>) -> bool;
}
