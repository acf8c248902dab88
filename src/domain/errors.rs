use thiserror::Error;

/// Closed error taxonomy for the classification core.
///
/// No other error kind originates inside the feature calculator or the
/// classifier. Transport, authentication, and persistence failures belong to
/// collaborators (`CandleSource`, etc.) and never surface from here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown instrument root: {root}")]
    InvalidInstrument { root: String },

    #[error(
        "insufficient data: have {observed_1m} 1m / {observed_5m} 5m bars, need {required_1m} / {required_5m}"
    )]
    InsufficientData {
        observed_1m: usize,
        required_1m: usize,
        observed_5m: usize,
        required_5m: usize,
    },

    #[error("invalid candle at index {index}: {reason}")]
    InvalidCandle { index: usize, reason: String },
}

pub type CoreResult<T> = Result<T, CoreError>;
