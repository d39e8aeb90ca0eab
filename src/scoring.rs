//! Placeholder hygiene scoring. None of these values come from a validated
//! clinical algorithm; they stand in until a dental-specific model and a real
//! scoring policy replace the stock detector. See DESIGN.md.

use serde::Serialize;

const BASE_SCORE: i64 = 80;
const PER_DETECTION_PENALTY: i64 = 5;

// Placeholder per-metric constants exposed for the record-keeping backend.
const PLAQUE_COVERAGE: f32 = 25.0;
const GINGIVAL_INFLAMMATION: f32 = 15.0;
const TARTAR: f32 = 10.0;

#[derive(Debug, Clone, Serialize)]
pub struct HygieneMetrics {
    pub hygiene_score: i64,
    pub plaque_coverage: f32,
    pub gingival_inflammation: f32,
    pub tartar: f32,
    pub num_detections: usize,
}

/// Derives the hygiene score from the detection count: start at a baseline
/// and deduct five points per detection, clamped at zero.
pub fn assess(num_detections: usize) -> HygieneMetrics {
    let deductions = (num_detections as i64).saturating_mul(PER_DETECTION_PENALTY);
    let hygiene_score = BASE_SCORE.saturating_sub(deductions).max(0);

    HygieneMetrics {
        hygiene_score,
        plaque_coverage: PLAQUE_COVERAGE,
        gingival_inflammation: GINGIVAL_INFLAMMATION,
        tartar: TARTAR,
        num_detections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_image_scores_the_baseline() {
        assert_eq!(assess(0).hygiene_score, 80);
    }

    #[test]
    fn each_detection_deducts_five_points() {
        assert_eq!(assess(4).hygiene_score, 60);
        assert_eq!(assess(10).hygiene_score, 30);
    }

    #[test]
    fn score_clamps_at_zero() {
        assert_eq!(assess(16).hygiene_score, 0);
        assert_eq!(assess(100).hygiene_score, 0);
        assert_eq!(assess(usize::MAX / 8).hygiene_score, 0);
    }

    #[test]
    fn placeholder_metrics_ride_along() {
        let metrics = assess(3);
        assert_eq!(metrics.num_detections, 3);
        assert!(metrics.plaque_coverage > 0.0);
        assert!(metrics.gingival_inflammation > 0.0);
        assert!(metrics.tartar > 0.0);
    }
}
