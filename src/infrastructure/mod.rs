//! Concrete adapters for the [`ports`](crate::ports) traits. Everything here
//! is out of scope for the specification proper (§1): no OAuth, no HTTP
//! transport, no SQLite. The demo binary wires only the two adapters below.

pub mod mock_candle_source;
pub mod system_clock;

pub use mock_candle_source::MockCandleSource;
pub use system_clock::SystemClock;
