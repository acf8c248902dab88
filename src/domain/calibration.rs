use crate::domain::instrument::Instrument;

/// A single `(minutes_since_open, expected_cumulative_volume_fraction)`
/// control point of a session's expected-volume curve.
#[derive(Debug, Clone, Copy)]
pub struct VolumeCurvePoint {
    pub minute: i64,
    pub fraction: f64,
}

const fn p(minute: i64, fraction: f64) -> VolumeCurvePoint {
    VolumeCurvePoint { minute, fraction }
}

/// Floor applied to `expected_volume_fraction` so `volume_vs_expected` never
/// divides by (or near) zero outside the regular session.
pub const MIN_EXPECTED_VOLUME_FRACTION: f64 = 0.01;

/// Immutable, per-instrument set of thresholds the classifier consumes.
/// Two static instances exist: [`ES_CAL`] and [`NQ_CAL`].
#[derive(Debug, Clone, Copy)]
pub struct Calibration {
    pub instrument: Instrument,
    pub balance_overlap_threshold: f64,
    pub imbalance_efficiency_threshold: f64,
    pub vwap_slope_strong: f64,
    pub atr_expanding_slope: f64,
    pub atr_compressing_slope: f64,
    pub atr_extreme_zscore: f64,
    pub rv_ratio_expanding: f64,
    pub participation_heavy: f64,
    pub participation_thin: f64,
    pub expected_volume_curve: &'static [VolumeCurvePoint],
    pub trend_quality_clean: f64,
    /// (efficiency_threshold, atr_zscore_threshold) combined gate for the
    /// `liquidation` secondary tag.
    pub trend_quality_extreme: (f64, f64),
}

impl Calibration {
    pub fn for_instrument(instrument: Instrument) -> &'static Calibration {
        match instrument {
            Instrument::Es => &ES_CAL,
            Instrument::Nq => &NQ_CAL,
        }
    }

    /// Piecewise-linear interpolation of the expected cumulative volume
    /// fraction at `minutes_since_open`, clamped to the curve's endpoints.
    pub fn expected_volume_fraction(&self, minutes_since_open: i64) -> f64 {
        let curve = self.expected_volume_curve;
        let first = curve.first().expect("curve always has at least two points");
        let last = curve.last().expect("curve always has at least two points");

        if minutes_since_open <= first.minute {
            return first.fraction;
        }
        if minutes_since_open >= last.minute {
            return last.fraction;
        }
        for pair in curve.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if minutes_since_open >= a.minute && minutes_since_open <= b.minute {
                let span = (b.minute - a.minute) as f64;
                let t = (minutes_since_open - a.minute) as f64 / span;
                return a.fraction + t * (b.fraction - a.fraction);
            }
        }
        last.fraction
    }

    /// [`expected_volume_fraction`](Self::expected_volume_fraction) floored
    /// at [`MIN_EXPECTED_VOLUME_FRACTION`], safe to use as a ratio denominator.
    pub fn expected_volume_fraction_floored(&self, minutes_since_open: i64) -> f64 {
        self.expected_volume_fraction(minutes_since_open)
            .max(MIN_EXPECTED_VOLUME_FRACTION)
    }
}

static ES_CURVE: [VolumeCurvePoint; 8] = [
    p(0, 0.00),
    p(30, 0.14),
    p(60, 0.22),
    p(150, 0.45),
    p(210, 0.55),
    p(330, 0.78),
    p(360, 0.88),
    p(390, 1.00),
];

static NQ_CURVE: [VolumeCurvePoint; 8] = [
    p(0, 0.00),
    p(30, 0.17),
    p(60, 0.26),
    p(150, 0.48),
    p(210, 0.58),
    p(330, 0.80),
    p(360, 0.90),
    p(390, 1.00),
];

pub static ES_CAL: Calibration = Calibration {
    instrument: Instrument::Es,
    balance_overlap_threshold: 0.55,
    imbalance_efficiency_threshold: 0.45,
    vwap_slope_strong: 1.5e-5,
    atr_expanding_slope: 0.10,
    atr_compressing_slope: -0.10,
    atr_extreme_zscore: 2.0,
    rv_ratio_expanding: 1.2,
    participation_heavy: 1.3,
    participation_thin: 0.7,
    expected_volume_curve: &ES_CURVE,
    trend_quality_clean: 0.60,
    trend_quality_extreme: (0.80, 1.5),
};

pub static NQ_CAL: Calibration = Calibration {
    instrument: Instrument::Nq,
    balance_overlap_threshold: 0.60,
    imbalance_efficiency_threshold: 0.55,
    vwap_slope_strong: 2.2e-5,
    atr_expanding_slope: 0.10,
    atr_compressing_slope: -0.10,
    atr_extreme_zscore: 2.0,
    rv_ratio_expanding: 1.3,
    participation_heavy: 1.3,
    participation_thin: 0.7,
    expected_volume_curve: &NQ_CURVE,
    trend_quality_clean: 0.70,
    trend_quality_extreme: (0.85, 1.5),
};
