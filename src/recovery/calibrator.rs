//! Confidence calibration
//!
//! Blends pattern-match confidence with an optional AI confidence and
//! penalises repeated retries.
//!
//! confidence = blend × 0.9^min(retry_count, 5), clamped to [0, 1]
//! blend      = pattern                        (no AI)
//!            = 0.4 × pattern + 0.6 × ai       (with AI)

/// Weight of the pattern confidence when AI confidence is present
const PATTERN_WEIGHT: f64 = 0.4;

/// Weight of the AI confidence
const AI_WEIGHT: f64 = 0.6;

/// Multiplicative penalty per retry
const RETRY_PENALTY: f64 = 0.9;

/// Retry count beyond which the penalty stops growing
const MAX_PENALISED_RETRIES: u32 = 5;

/// Stateless confidence calibrator
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidenceCalibrator;

impl ConfidenceCalibrator {
    pub fn new() -> Self {
        Self
    }

    /// Combine confidences into a single score in [0, 1]
    pub fn calibrate(
        &self,
        pattern_confidence: f64,
        ai_confidence: Option<f64>,
        retry_count: u32,
    ) -> f64 {
        let pattern = sanitize(pattern_confidence);
        let blended = match ai_confidence {
            Some(ai) => PATTERN_WEIGHT * pattern + AI_WEIGHT * sanitize(ai),
            None => pattern,
        };

        let penalty = RETRY_PENALTY.powi(retry_count.min(MAX_PENALISED_RETRIES) as i32);
        (blended * penalty).clamp(0.0, 1.0)
    }
}

// NaN would otherwise survive clamp.
fn sanitize(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_pattern_only() {
        let c = ConfidenceCalibrator::new();
        assert!(approx(c.calibrate(0.8, None, 0), 0.8));
    }

    #[test]
    fn test_weighted_average_with_ai() {
        let c = ConfidenceCalibrator::new();
        // 0.4 * 0.5 + 0.6 * 1.0 = 0.8
        assert!(approx(c.calibrate(0.5, Some(1.0), 0), 0.8));
    }

    #[test]
    fn test_retry_penalty() {
        let c = ConfidenceCalibrator::new();
        assert!(approx(c.calibrate(1.0, None, 1), 0.9));
        assert!(approx(c.calibrate(1.0, None, 2), 0.81));
    }

    #[test]
    fn test_penalty_floors_at_five_retries() {
        let c = ConfidenceCalibrator::new();
        let at_five = c.calibrate(1.0, None, 5);
        assert!(approx(at_five, 0.9f64.powi(5)));
        assert!(approx(c.calibrate(1.0, None, 50), at_five));
    }

    #[test]
    fn test_out_of_range_inputs_clamped() {
        let c = ConfidenceCalibrator::new();
        assert!(approx(c.calibrate(3.0, None, 0), 1.0));
        assert!(approx(c.calibrate(-1.0, Some(-2.0), 0), 0.0));
        assert!(approx(c.calibrate(f64::NAN, None, 0), 0.0));
    }

    #[quickcheck]
    fn prop_result_in_unit_interval(pattern: f64, ai: Option<f64>, retries: u32) -> bool {
        let score = ConfidenceCalibrator::new().calibrate(pattern, ai, retries);
        (0.0..=1.0).contains(&score)
    }

    #[quickcheck]
    fn prop_more_retries_never_raise_confidence(pattern: u8, retries: u8) -> bool {
        let c = ConfidenceCalibrator::new();
        let p = pattern as f64 / 255.0;
        c.calibrate(p, None, retries as u32 + 1) <= c.calibrate(p, None, retries as u32)
    }
}
