// src/metrics.rs
//
// Summary statistics over the per-trial outcomes of one learner (or one
// sweep value of a learner). The protocol keeps every outcome it collects,
// so the summary is computed once, after the last trial reports.

use serde::Serialize;

/// Distribution of a learner's final outcome across trials.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OutcomeSummary {
    pub trials: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1); 0 below two trials.
    pub std: f64,
    /// Standard error of the mean, `std / sqrt(n)`.
    pub std_error: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl OutcomeSummary {
    /// Summarize `outcomes`. An empty slice gives the all-zero summary.
    ///
    /// Every outcome counts; a NaN outcome makes the mean and spread NaN
    /// rather than disappearing from the count.
    pub fn from_outcomes(outcomes: &[f64]) -> Self {
        let n = outcomes.len();
        if n == 0 {
            return Self::default();
        }

        let mean = outcomes.iter().sum::<f64>() / n as f64;
        let std = if n > 1 {
            let ss: f64 = outcomes.iter().map(|x| (x - mean).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        } else {
            0.0
        };

        let mut sorted = outcomes.to_vec();
        sorted.sort_by(f64::total_cmp);
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };

        Self {
            trials: n,
            mean,
            std,
            std_error: std / (n as f64).sqrt(),
            median,
            min: sorted[0],
            max: sorted[n - 1],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_outcomes_summarize_to_zero() {
        assert_eq!(OutcomeSummary::from_outcomes(&[]), OutcomeSummary::default());
    }

    #[test]
    fn regret_outcomes() {
        let s = OutcomeSummary::from_outcomes(&[4.0, 1.0, 7.0, 2.0]);
        assert_eq!(s.trials, 4);
        assert!((s.mean - 3.5).abs() < 1e-12);
        // squared deviations 0.25 + 6.25 + 12.25 + 2.25 = 21
        assert!((s.std - (21.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!((s.std_error - s.std / 2.0).abs() < 1e-12);
        assert_eq!(s.median, 3.0);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 7.0);
    }

    #[test]
    fn best_arm_hit_rate() {
        // 0/1 best-arm regrets: the mean is the error rate.
        let s = OutcomeSummary::from_outcomes(&[0.0, 0.0, 1.0, 0.0, 0.0]);
        assert!((s.mean - 0.2).abs() < 1e-12);
        assert_eq!(s.median, 0.0);
    }

    #[test]
    fn single_trial_has_no_spread() {
        let s = OutcomeSummary::from_outcomes(&[12.5]);
        assert_eq!(s.std, 0.0);
        assert_eq!(s.median, 12.5);
    }

    #[test]
    fn nan_outcome_is_counted() {
        let s = OutcomeSummary::from_outcomes(&[1.0, f64::NAN]);
        assert_eq!(s.trials, 2);
        assert!(s.mean.is_nan());
    }
}
