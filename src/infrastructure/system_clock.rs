use crate::ports::Clock;
use chrono::{DateTime, Utc};

/// [`Clock`] backed by the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_recent() {
        let before = Utc::now();
        let reading = SystemClock.now();
        assert!(reading >= before);
    }
}
