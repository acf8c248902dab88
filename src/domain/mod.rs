//! Pure types and value objects. Nothing here performs I/O; everything is a
//! deterministic function of its inputs.

pub mod calibration;
pub mod candle;
pub mod contract;
pub mod errors;
pub mod features;
pub mod instrument;
pub mod regime;
pub mod session;

pub use calibration::{Calibration, VolumeCurvePoint, ES_CAL, NQ_CAL};
pub use candle::{Candle, CandleSeries, Frequency};
pub use contract::ContractResolver;
pub use errors::{CoreError, CoreResult};
pub use features::{Features, SessionRangeHistory};
pub use instrument::{Instrument, Symbol};
pub use regime::{
    BalanceState, NoiseLevel, ParticipationState, PrimaryRegime, RegimeReport, SecondaryTag,
    TrendQuality, VolatilityState,
};
pub use session::{SessionMapper, SessionPhase};
