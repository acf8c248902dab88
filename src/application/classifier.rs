//! Regime Classifier: turns a [`Features`] record plus calibration and
//! session context into a [`RegimeReport`]. Pure function, no I/O, no
//! logging — the orchestrator logs around the call, not inside it.

use crate::domain::calibration::Calibration;
use crate::domain::features::Features;
use crate::domain::regime::{
    BalanceState, NoiseLevel, ParticipationState, PrimaryRegime, RegimeReport, SecondaryTag,
    TrendQuality, VolatilityState,
};
use crate::domain::session::SessionPhase;

const EVENT_CONFIDENCE_MIN: u8 = 30;
const EVENT_CONFIDENCE_MAX: u8 = 60;
const PRIMARY_MARGIN: i32 = 2;

struct Scores {
    balance: i32,
    imbalance: i32,
}

fn score(features: &Features, calibration: &Calibration) -> Scores {
    let mut balance = 0;
    let mut imbalance = 0;

    if features.bar_overlap_ratio.is_some_and(|v| v >= calibration.balance_overlap_threshold) {
        balance += 1;
    }
    if features.price_vs_vwap.is_some_and(|v| v.abs() <= 0.002) {
        balance += 1;
    }
    if features.directional_efficiency.is_some_and(|v| v.abs() <= 0.30) {
        balance += 1;
    }
    if features.rv_ratio.is_some_and(|v| v < 1.0) {
        balance += 1;
    }

    if features
        .directional_efficiency
        .is_some_and(|v| v.abs() >= calibration.imbalance_efficiency_threshold)
    {
        imbalance += 1;
    }
    if features.vwap_slope.is_some_and(|v| v.abs() >= calibration.vwap_slope_strong) {
        imbalance += 1;
    }
    if features.bar_overlap_ratio.is_some_and(|v| v < 0.40) {
        imbalance += 1;
    }
    if features.atr_slope.is_some_and(|v| v >= calibration.atr_expanding_slope) {
        imbalance += 1;
    }

    Scores { balance, imbalance }
}

fn primary_regime(scores: &Scores) -> PrimaryRegime {
    if scores.imbalance - scores.balance >= PRIMARY_MARGIN {
        PrimaryRegime::TrendInitiative
    } else if scores.balance - scores.imbalance >= PRIMARY_MARGIN {
        PrimaryRegime::BalancedRotational
    } else {
        PrimaryRegime::TransitionBreakoutAttempt
    }
}

fn secondary_tag(
    primary: PrimaryRegime,
    features: &Features,
    calibration: &Calibration,
) -> Option<SecondaryTag> {
    match primary {
        PrimaryRegime::BalancedRotational => {
            if features.session_range_zscore.is_some_and(|z| z <= -1.0) {
                Some(SecondaryTag::Tight)
            } else if features
                .vwap_slope
                .is_some_and(|s| s.abs() >= calibration.vwap_slope_strong * 0.5)
            {
                Some(SecondaryTag::Migrating)
            } else {
                Some(SecondaryTag::Normal)
            }
        }
        PrimaryRegime::TrendInitiative => {
            let efficiency = features.directional_efficiency.map(f64::abs);
            let (extreme_eff, extreme_atr) = calibration.trend_quality_extreme;
            if efficiency.is_some_and(|e| e >= extreme_eff)
                && features.atr_zscore.is_some_and(|z| z >= extreme_atr)
            {
                Some(SecondaryTag::Liquidation)
            } else if efficiency.is_some_and(|e| e >= calibration.trend_quality_clean) {
                Some(SecondaryTag::Clean)
            } else {
                Some(SecondaryTag::Grinding)
            }
        }
        PrimaryRegime::TransitionBreakoutAttempt | PrimaryRegime::EventDistorted => None,
    }
}

fn volatility_state(features: &Features, calibration: &Calibration) -> VolatilityState {
    if features.atr_zscore.is_some_and(|z| z >= calibration.atr_extreme_zscore) {
        return VolatilityState::Extreme;
    }
    let expanding = features.atr_slope.is_some_and(|s| s >= calibration.atr_expanding_slope)
        && features.rv_ratio.is_some_and(|r| r >= calibration.rv_ratio_expanding);
    if expanding {
        return VolatilityState::Expanding;
    }
    let compressing = features.atr_slope.is_some_and(|s| s <= calibration.atr_compressing_slope)
        && features.rv_ratio.is_some_and(|r| r < 1.0);
    if compressing {
        return VolatilityState::Compressing;
    }
    VolatilityState::Normal
}

fn participation_state(features: &Features, calibration: &Calibration) -> ParticipationState {
    match features.volume_vs_expected {
        Some(v) if v >= calibration.participation_heavy => ParticipationState::Heavy,
        Some(v) if v <= calibration.participation_thin => ParticipationState::Thin,
        _ => ParticipationState::Normal,
    }
}

fn balance_state(primary: PrimaryRegime) -> BalanceState {
    match primary {
        PrimaryRegime::TrendInitiative => BalanceState::Imbalanced,
        PrimaryRegime::BalancedRotational => BalanceState::Balanced,
        PrimaryRegime::TransitionBreakoutAttempt | PrimaryRegime::EventDistorted => {
            BalanceState::Transitioning
        }
    }
}

fn trend_quality(primary: PrimaryRegime, features: &Features, calibration: &Calibration) -> TrendQuality {
    if primary != PrimaryRegime::TrendInitiative {
        return TrendQuality::None;
    }
    let efficiency = features.directional_efficiency.map(f64::abs);
    let (extreme_eff, extreme_atr) = calibration.trend_quality_extreme;
    if efficiency.is_some_and(|e| e >= extreme_eff) && features.atr_zscore.is_some_and(|z| z >= extreme_atr) {
        TrendQuality::Extreme
    } else if efficiency.is_some_and(|e| e >= calibration.trend_quality_clean) {
        TrendQuality::Clean
    } else {
        TrendQuality::Weak
    }
}

fn noise_level(features: &Features) -> NoiseLevel {
    let overlap = features.bar_overlap_ratio;
    let atr_slope = features.atr_slope;
    if overlap.is_some_and(|o| o < 0.40) && atr_slope.is_some_and(|s| s > 0.0) {
        NoiseLevel::Low
    } else if overlap.is_some_and(|o| o > 0.65) || features.rv_ratio.is_some_and(|r| (r - 1.0).abs() > 0.5) {
        NoiseLevel::High
    } else {
        NoiseLevel::Medium
    }
}

/// The eight features Step 2/4/5/9 read directly; used for the missing-data
/// confidence penalty. A feature counts once even if read by multiple steps.
fn top_contributors(features: &Features) -> [bool; 8] {
    [
        features.bar_overlap_ratio.is_some(),
        features.price_vs_vwap.is_some(),
        features.directional_efficiency.is_some(),
        features.rv_ratio.is_some(),
        features.vwap_slope.is_some(),
        features.atr_slope.is_some(),
        features.session_range_zscore.is_some(),
        features.atr_zscore.is_some(),
    ]
}

fn confidence(
    primary: PrimaryRegime,
    scores: &Scores,
    features: &Features,
    volatility: VolatilityState,
    participation: ParticipationState,
) -> u8 {
    let mut value: i32 = 50;

    let margin = match primary {
        PrimaryRegime::TrendInitiative | PrimaryRegime::BalancedRotational => {
            (scores.imbalance - scores.balance).abs()
        }
        PrimaryRegime::TransitionBreakoutAttempt | PrimaryRegime::EventDistorted => 0,
    };
    let contributing_scores = (margin - PRIMARY_MARGIN).max(0);
    value += (contributing_scores * 10).min(30);

    let missing = top_contributors(features).iter().filter(|present| !**present).count() as i32;
    value -= (missing * 10).min(30);

    if primary == PrimaryRegime::TransitionBreakoutAttempt {
        value -= 15;
    }

    if volatility == VolatilityState::Normal && participation == ParticipationState::Normal {
        value += 5;
    }

    value.clamp(0, 100) as u8
}

fn reliability_note(primary: PrimaryRegime, tag: Option<SecondaryTag>) -> String {
    let note = match (primary, tag) {
        (PrimaryRegime::BalancedRotational, Some(SecondaryTag::Tight)) => {
            "Range is compressed; breakout risk rises near edges."
        }
        (PrimaryRegime::BalancedRotational, Some(SecondaryTag::Migrating)) => {
            "Balance is drifting; watch for a developing trend day."
        }
        (PrimaryRegime::BalancedRotational, Some(SecondaryTag::Normal)) => {
            "Reliable only at range extremes; unreliable mid-range."
        }
        (PrimaryRegime::TrendInitiative, Some(SecondaryTag::Clean)) => {
            "Continuation signals favored; fading less reliable."
        }
        (PrimaryRegime::TrendInitiative, Some(SecondaryTag::Grinding)) => {
            "Trend intact but choppy; expect shallow pullbacks, not reversals."
        }
        (PrimaryRegime::TrendInitiative, Some(SecondaryTag::Liquidation)) => {
            "Acceleration may be exhaustion; trail risk, do not add."
        }
        (PrimaryRegime::TransitionBreakoutAttempt, None) => {
            "Breakout unconfirmed; fade and follow both carry elevated risk."
        }
        (PrimaryRegime::EventDistorted, None) => {
            "Price action is news-driven; technical levels are unreliable until the window clears."
        }
        _ => "Reliable only at range extremes; unreliable mid-range.",
    };
    note.to_string()
}

/// Classifies one instant. `event_active` mirrors `EventWindow::is_event_active`
/// (§6); callers pass `false` when no `EventWindow` collaborator is wired up.
pub fn classify(
    instrument: crate::domain::instrument::Instrument,
    timestamp: chrono::DateTime<chrono::Utc>,
    features: &Features,
    calibration: &Calibration,
    session_phase: SessionPhase,
    event_active: bool,
) -> RegimeReport {
    let volatility = volatility_state(features, calibration);
    let participation = participation_state(features, calibration);
    let noise = noise_level(features);

    if event_active {
        let primary = PrimaryRegime::EventDistorted;
        return RegimeReport {
            instrument,
            timestamp,
            primary_regime: primary,
            secondary_tag: None,
            confidence: confidence(primary, &Scores { balance: 0, imbalance: 0 }, features, volatility, participation)
                .clamp(EVENT_CONFIDENCE_MIN, EVENT_CONFIDENCE_MAX),
            volatility_state: volatility,
            participation_state: participation,
            balance_state: balance_state(primary),
            trend_quality: trend_quality(primary, features, calibration),
            noise_level: noise,
            session_phase,
            order_flow_reliability_note: reliability_note(primary, None),
        };
    }

    let scores = score(features, calibration);
    let primary = primary_regime(&scores);
    let tag = secondary_tag(primary, features, calibration);

    RegimeReport {
        instrument,
        timestamp,
        primary_regime: primary,
        secondary_tag: tag,
        confidence: confidence(primary, &scores, features, volatility, participation),
        volatility_state: volatility,
        participation_state: participation,
        balance_state: balance_state(primary),
        trend_quality: trend_quality(primary, features, calibration),
        noise_level: noise,
        session_phase,
        order_flow_reliability_note: reliability_note(primary, tag),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::calibration::ES_CAL;
    use crate::domain::instrument::Instrument;
    use chrono::{TimeZone, Utc};

    fn ts() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 16, 20, 30, 0).unwrap()
    }

    fn balanced_features() -> Features {
        Features {
            bar_overlap_ratio: Some(0.70),
            price_vs_vwap: Some(0.0005),
            directional_efficiency: Some(0.10),
            rv_ratio: Some(0.9),
            vwap_slope: Some(1e-6),
            atr_slope: Some(-0.05),
            session_range_zscore: Some(0.0),
            atr_zscore: Some(0.2),
            volume_vs_expected: Some(1.0),
            ..Default::default()
        }
    }

    fn trending_features() -> Features {
        Features {
            bar_overlap_ratio: Some(0.20),
            price_vs_vwap: Some(0.01),
            directional_efficiency: Some(0.90),
            rv_ratio: Some(1.5),
            vwap_slope: Some(3e-5),
            atr_slope: Some(0.15),
            session_range_zscore: Some(0.5),
            atr_zscore: Some(1.0),
            volume_vs_expected: Some(1.3),
            ..Default::default()
        }
    }

    #[test]
    fn balanced_inputs_yield_balanced_rotational() {
        let report = classify(
            Instrument::Es,
            ts(),
            &balanced_features(),
            &ES_CAL,
            SessionPhase::Lunch,
            false,
        );
        assert_eq!(report.primary_regime, PrimaryRegime::BalancedRotational);
        assert_eq!(report.secondary_tag, Some(SecondaryTag::Normal));
        assert_eq!(report.balance_state, BalanceState::Balanced);
    }

    #[test]
    fn trending_inputs_yield_trend_initiative() {
        let report = classify(
            Instrument::Nq,
            ts(),
            &trending_features(),
            &ES_CAL,
            SessionPhase::MidMorning,
            false,
        );
        assert_eq!(report.primary_regime, PrimaryRegime::TrendInitiative);
        assert_eq!(report.balance_state, BalanceState::Imbalanced);
    }

    #[test]
    fn event_window_forces_event_distorted_and_clamped_confidence() {
        let report = classify(
            Instrument::Nq,
            ts(),
            &trending_features(),
            &ES_CAL,
            SessionPhase::MidMorning,
            true,
        );
        assert_eq!(report.primary_regime, PrimaryRegime::EventDistorted);
        assert!(report.confidence >= 30 && report.confidence <= 60);
        assert!(report.secondary_tag.is_none());
    }

    #[test]
    fn transition_inputs_yield_transition_breakout_attempt() {
        let features = Features {
            bar_overlap_ratio: Some(0.50),
            price_vs_vwap: Some(0.0015),
            directional_efficiency: Some(0.35),
            rv_ratio: Some(1.8),
            vwap_slope: Some(1e-5),
            atr_slope: Some(0.05),
            session_range_zscore: Some(0.0),
            atr_zscore: Some(0.3),
            volume_vs_expected: Some(1.0),
            ..Default::default()
        };
        let report = classify(Instrument::Es, ts(), &features, &ES_CAL, SessionPhase::OpeningRange, false);
        assert_eq!(report.primary_regime, PrimaryRegime::TransitionBreakoutAttempt);
        assert!(report.secondary_tag.is_none());
        assert_eq!(report.noise_level, NoiseLevel::High);
        assert!(report.confidence <= 65);
    }

    #[test]
    fn confidence_is_always_in_bounds() {
        let report = classify(
            Instrument::Es,
            ts(),
            &Features::default(),
            &ES_CAL,
            SessionPhase::Extended,
            false,
        );
        assert!(report.confidence <= 100);
    }

    #[test]
    fn liquidation_tag_requires_extreme_efficiency_and_atr_zscore() {
        let mut features = trending_features();
        features.directional_efficiency = Some(0.90);
        features.atr_zscore = Some(2.0);
        let report = classify(Instrument::Es, ts(), &features, &ES_CAL, SessionPhase::PowerHour, false);
        assert_eq!(report.secondary_tag, Some(SecondaryTag::Liquidation));
    }

    #[test]
    fn reliability_note_matches_known_pair() {
        let report = classify(
            Instrument::Es,
            ts(),
            &trending_features(),
            &ES_CAL,
            SessionPhase::MidAfternoon,
            false,
        );
        if report.secondary_tag == Some(SecondaryTag::Clean) {
            assert_eq!(
                report.order_flow_reliability_note,
                "Continuation signals favored; fading less reliable."
            );
        }
    }
}
