/// Fixed-shape numeric feature record produced once per classification.
///
/// Every field is `None` ("missing") when the input series had too few bars
/// to compute it; downstream classification logic treats a missing feature
/// as "does not contribute to its score" rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Features {
    pub vwap: Option<f64>,
    pub vwap_slope: Option<f64>,
    pub price_vs_vwap: Option<f64>,
    pub atr_14_5m: Option<f64>,
    pub atr_slope: Option<f64>,
    pub realized_vol_short: Option<f64>,
    pub realized_vol_long: Option<f64>,
    pub rv_ratio: Option<f64>,
    pub bar_overlap_ratio: Option<f64>,
    pub directional_efficiency: Option<f64>,
    pub avg_pullback_depth: Option<f64>,
    pub session_range: Option<f64>,
    pub session_range_zscore: Option<f64>,
    pub opening_range_position: Option<f64>,
    pub volume_vs_expected: Option<f64>,
    pub volume_acceleration: Option<f64>,
    pub range_per_volume: Option<f64>,
    pub atr_zscore: Option<f64>,
}

/// Caller-owned rolling history of prior sessions' `session_range` values,
/// oldest first, read-only from the core's perspective. Holds at most 20
/// entries; the Feature Calculator uses whatever prefix is available to
/// compute `session_range_zscore`, matching §4.3's "available history".
#[derive(Debug, Clone, Default)]
pub struct SessionRangeHistory {
    ranges: Vec<f64>,
}

impl SessionRangeHistory {
    pub const CAPACITY: usize = 20;

    pub fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    pub fn from_ranges(ranges: Vec<f64>) -> Self {
        let start = ranges.len().saturating_sub(Self::CAPACITY);
        Self {
            ranges: ranges[start..].to_vec(),
        }
    }

    pub fn push(&mut self, range: f64) {
        self.ranges.push(range);
        if self.ranges.len() > Self::CAPACITY {
            self.ranges.remove(0);
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.ranges
    }
}
