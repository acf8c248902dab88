use crate::domain::errors::CoreError;
use crate::domain::instrument::{Instrument, Symbol};
use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use std::str::FromStr;

/// Quarterly expiration months in CME index-futures convention, ascending.
const QUARTER_MONTHS: [(u32, char); 4] = [(3, 'H'), (6, 'M'), (9, 'U'), (12, 'Z')];

const ROLLOVER_WINDOW_DAYS: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QuarterlyContract {
    year: i32,
    month: u32,
    code: char,
}

impl QuarterlyContract {
    fn containing(instant: DateTime<Utc>) -> Self {
        let month = instant.month();
        let (quarter_month, code) = QUARTER_MONTHS
            .iter()
            .find(|(m, _)| *m >= month)
            .copied()
            .expect("every month 1..=12 is covered by a quarterly month <= 12");
        Self {
            year: instant.year(),
            month: quarter_month,
            code,
        }
    }

    fn next(self) -> Self {
        let idx = QUARTER_MONTHS
            .iter()
            .position(|(m, c)| *m == self.month && *c == self.code)
            .expect("self was constructed from QUARTER_MONTHS");
        let next_idx = (idx + 1) % QUARTER_MONTHS.len();
        let (month, code) = QUARTER_MONTHS[next_idx];
        let year = if next_idx == 0 { self.year + 1 } else { self.year };
        Self { year, month, code }
    }

    /// Third Friday of the contract month, at 00:00 UTC.
    fn expiration(&self) -> DateTime<Utc> {
        let first_of_month = NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .expect("contract month is always 3, 6, 9, or 12");
        let days_to_friday = (Weekday::Fri.num_days_from_monday() + 7
            - first_of_month.weekday().num_days_from_monday())
            % 7;
        let first_friday = first_of_month + chrono::Duration::days(days_to_friday as i64);
        let third_friday = first_friday + chrono::Duration::days(14);
        third_friday
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always valid")
            .and_utc()
    }

    fn symbol(&self, root: &str) -> Symbol {
        Symbol::new(format!("/{root}{}{:02}", self.code, self.year % 100))
    }
}

/// Computes the front-month contract symbol for an instrument at a given
/// instant, rolling over 10 calendar days before (or after) expiration.
pub struct ContractResolver;

impl ContractResolver {
    pub fn resolve(instrument: Instrument, instant: DateTime<Utc>) -> Symbol {
        let mut contract = QuarterlyContract::containing(instant);
        let days_from_expiration = (instant.date_naive() - contract.expiration().date_naive())
            .num_days()
            .abs();
        if days_from_expiration <= ROLLOVER_WINDOW_DAYS {
            contract = contract.next();
        }
        contract.symbol(instrument.root())
    }

    /// Convenience entry point for callers holding a raw root string instead
    /// of a typed `Instrument`.
    pub fn resolve_str(root: &str, instant: DateTime<Utc>) -> Result<Symbol, CoreError> {
        let instrument = Instrument::from_str(root)?;
        Ok(Self::resolve(instrument, instant))
    }
}
