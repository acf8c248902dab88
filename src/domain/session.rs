use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::America::Chicago;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named segment of the America/Chicago trading day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    PreOpen,
    OpeningRange,
    MidMorning,
    Lunch,
    MidAfternoon,
    PowerHour,
    Close,
    Extended,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::PreOpen => "pre_open",
            SessionPhase::OpeningRange => "opening_range",
            SessionPhase::MidMorning => "mid_morning",
            SessionPhase::Lunch => "lunch",
            SessionPhase::MidAfternoon => "mid_afternoon",
            SessionPhase::PowerHour => "power_hour",
            SessionPhase::Close => "close",
            SessionPhase::Extended => "extended",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Translates instants to America/Chicago session phases. Stateless: every
/// method is a pure function of its input instant.
pub struct SessionMapper;

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("static time literal is always valid")
}

impl SessionMapper {
    /// Session phase boundaries are inclusive of the lower bound, exclusive of
    /// the upper bound.
    pub fn phase(instant: DateTime<Utc>) -> SessionPhase {
        let local_time = instant.with_timezone(&Chicago).time();
        if local_time >= t(5, 0) && local_time < t(8, 30) {
            SessionPhase::PreOpen
        } else if local_time >= t(8, 30) && local_time < t(9, 0) {
            SessionPhase::OpeningRange
        } else if local_time >= t(9, 0) && local_time < t(11, 30) {
            SessionPhase::MidMorning
        } else if local_time >= t(11, 30) && local_time < t(13, 0) {
            SessionPhase::Lunch
        } else if local_time >= t(13, 0) && local_time < t(15, 0) {
            SessionPhase::MidAfternoon
        } else if local_time >= t(15, 0) && local_time < t(16, 0) {
            SessionPhase::PowerHour
        } else if local_time >= t(16, 0) && local_time < t(17, 0) {
            SessionPhase::Close
        } else {
            SessionPhase::Extended
        }
    }

    /// Minutes since the most recent 08:30 CT boundary on the same local
    /// date. Negative if `instant` falls before that boundary.
    pub fn minutes_since_session_open(instant: DateTime<Utc>) -> i64 {
        let local = instant.with_timezone(&Chicago).naive_local();
        let session_open = local.date().and_time(t(8, 30));
        (local - session_open).num_minutes()
    }

    pub fn is_regular_session(instant: DateTime<Utc>) -> bool {
        matches!(
            Self::phase(instant),
            SessionPhase::OpeningRange
                | SessionPhase::MidMorning
                | SessionPhase::Lunch
                | SessionPhase::MidAfternoon
                | SessionPhase::PowerHour
        )
    }
}
