use crate::domain::instrument::Instrument;
use crate::domain::session::SessionPhase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level market structure verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimaryRegime {
    #[serde(rename = "Balanced / Rotational")]
    BalancedRotational,
    #[serde(rename = "Trend / Initiative")]
    TrendInitiative,
    #[serde(rename = "Transition / Breakout Attempt")]
    TransitionBreakoutAttempt,
    #[serde(rename = "Event-Distorted")]
    EventDistorted,
}

impl PrimaryRegime {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimaryRegime::BalancedRotational => "Balanced / Rotational",
            PrimaryRegime::TrendInitiative => "Trend / Initiative",
            PrimaryRegime::TransitionBreakoutAttempt => "Transition / Breakout Attempt",
            PrimaryRegime::EventDistorted => "Event-Distorted",
        }
    }
}

impl fmt::Display for PrimaryRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Secondary qualifier tag. Which variants are reachable depends on the
/// accompanying `PrimaryRegime`; the classifier enforces that pairing, this
/// type only enforces that the *label* is one of the known strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondaryTag {
    Tight,
    Migrating,
    Normal,
    Grinding,
    Clean,
    Liquidation,
}

impl SecondaryTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecondaryTag::Tight => "tight",
            SecondaryTag::Migrating => "migrating",
            SecondaryTag::Normal => "normal",
            SecondaryTag::Grinding => "grinding",
            SecondaryTag::Clean => "clean",
            SecondaryTag::Liquidation => "liquidation",
        }
    }
}

impl fmt::Display for SecondaryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityState {
    Compressing,
    Normal,
    Expanding,
    Extreme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationState {
    Thin,
    Normal,
    Heavy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceState {
    Balanced,
    Transitioning,
    Imbalanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendQuality {
    None,
    Weak,
    Clean,
    Extreme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseLevel {
    Low,
    Medium,
    High,
}

/// The classifier's complete, self-describing verdict for one instant.
/// Serializes to exactly the shape callers receive over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeReport {
    pub instrument: Instrument,
    pub timestamp: DateTime<Utc>,
    pub primary_regime: PrimaryRegime,
    pub secondary_tag: Option<SecondaryTag>,
    pub confidence: u8,
    pub volatility_state: VolatilityState,
    pub participation_state: ParticipationState,
    pub balance_state: BalanceState,
    pub trend_quality: TrendQuality,
    pub noise_level: NoiseLevel,
    pub session_phase: SessionPhase,
    pub order_flow_reliability_note: String,
}
