//! Linear trend estimation over the sample index

use crate::models::{HistoricalTrend, MetricTrend, TrendDirection};
use crate::utils::stats::{least_squares_slope, mean, round2};

/// Minimum number of samples for a trend analysis
pub const MIN_TREND_SAMPLES: usize = 5;

/// Slopes within this band (either direction) count as stable
pub const STABLE_SLOPE: f64 = 0.1;

impl TrendDirection {
    pub fn from_slope(slope: f64) -> Self {
        if slope > STABLE_SLOPE {
            Self::Increasing
        } else if slope < -STABLE_SLOPE {
            Self::Decreasing
        } else {
            Self::Stable
        }
    }
}

/// Fit a trend to values ordered by time
///
/// The x axis is the sample index, so uneven sampling intervals do not skew the slope.
pub fn fit(values: &[f64]) -> MetricTrend {
    let slope = least_squares_slope(values);
    MetricTrend {
        direction: TrendDirection::from_slope(slope),
        slope: round2(slope),
        first_value: round2(values.first().copied().unwrap_or(0.0)),
        last_value: round2(values.last().copied().unwrap_or(0.0)),
        mean: round2(mean(values)),
    }
}

/// Overall trend derived from the elapsed-time direction
pub fn overall_trend(elapsed: TrendDirection) -> HistoricalTrend {
    match elapsed {
        TrendDirection::Increasing => HistoricalTrend::Degrading,
        TrendDirection::Decreasing => HistoricalTrend::Improving,
        TrendDirection::Stable => HistoricalTrend::Stable,
    }
}
