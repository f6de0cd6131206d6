//! Score aggregation.
//!
//! Invoked once all five `DimensionResult`s for a task have arrived. A
//! dimension that errored, or whose score falls outside `[0, 1]`,
//! contributes 0 to the weighted sum and is dropped from the
//! denominator — the remaining weights are renormalised so they still
//! sum to 1 over the dimensions that actually produced a valid score.

use crate::models::{Dimension, DimensionResult, Weights};
use std::collections::HashMap;

pub struct AggregationOutcome {
    pub scores: HashMap<Dimension, f64>,
    pub final_score: f64,
    pub processing_errors: Vec<String>,
    /// True if at least one dimension produced a valid, in-range score.
    /// When false the record is finalised as `failed`, not `completed`,
    /// even though every dimension that ran is individually recorded.
    pub any_valid: bool,
}

pub fn aggregate(
    results: &HashMap<Dimension, DimensionResult>,
    weights: &Weights,
) -> AggregationOutcome {
    let mut scores = HashMap::new();
    let mut errors = Vec::new();
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    let mut any_valid = false;

    for dimension in crate::models::ALL_DIMENSIONS {
        let Some(result) = results.get(&dimension) else {
            errors.push(format!("{dimension}: no result received"));
            scores.insert(dimension, 0.0);
            continue;
        };

        if let Some(err) = &result.error {
            errors.push(format!("{dimension}: {err}"));
            scores.insert(dimension, 0.0);
            continue;
        }

        if !(0.0..=1.0).contains(&result.score) {
            errors.push(format!(
                "{dimension}: score {} out of range [0, 1]",
                result.score
            ));
            scores.insert(dimension, 0.0);
            continue;
        }

        scores.insert(dimension, result.score);
        let weight = weights.get(dimension);
        weighted_sum += weight * result.score;
        weight_total += weight;
        any_valid = true;
    }

    let final_score = if weight_total > 0.0 {
        weighted_sum / weight_total
    } else {
        0.0
    };

    AggregationOutcome {
        scores,
        final_score,
        processing_errors: errors,
        any_valid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ALL_DIMENSIONS;

    fn result(dimension: Dimension, score: f64, error: Option<&str>) -> DimensionResult {
        DimensionResult {
            task_id: "t1".into(),
            dimension,
            record_id: "r1".into(),
            batch_id: "b1".into(),
            agent_id: "a1".into(),
            score,
            details: None,
            error: error.map(str::to_string),
            processing_time_ms: 5,
            worker_id: "w1".into(),
        }
    }

    #[test]
    fn clean_run_matches_weighted_average() {
        let mut results = HashMap::new();
        for dim in ALL_DIMENSIONS {
            results.insert(dim, result(dim, 0.8, None));
        }
        let outcome = aggregate(&results, &Weights::default());
        assert!(outcome.any_valid);
        assert!((outcome.final_score - 0.8).abs() < 1e-9);
        assert!(outcome.processing_errors.is_empty());
    }

    #[test]
    fn errored_dimension_is_excluded_and_renormalised() {
        let mut results = HashMap::new();
        for dim in ALL_DIMENSIONS {
            results.insert(dim, result(dim, 0.9, None));
        }
        results.insert(
            Dimension::Hallucination,
            result(Dimension::Hallucination, 0.0, Some("nli timeout")),
        );

        let outcome = aggregate(&results, &Weights::default());
        assert!(outcome.any_valid);
        assert!((outcome.final_score - 0.9).abs() < 1e-9);
        assert_eq!(outcome.processing_errors.len(), 1);
        assert!(outcome.processing_errors[0].contains("hallucination"));
    }

    #[test]
    fn all_dimensions_erroring_yields_no_valid_score() {
        let mut results = HashMap::new();
        for dim in ALL_DIMENSIONS {
            results.insert(dim, result(dim, 0.0, Some("worker crashed")));
        }
        let outcome = aggregate(&results, &Weights::default());
        assert!(!outcome.any_valid);
        assert_eq!(outcome.final_score, 0.0);
        assert_eq!(outcome.processing_errors.len(), ALL_DIMENSIONS.len());
    }

    #[test]
    fn out_of_range_score_is_treated_as_an_error() {
        let mut results = HashMap::new();
        for dim in ALL_DIMENSIONS {
            results.insert(dim, result(dim, 0.5, None));
        }
        results.insert(Dimension::Accuracy, result(Dimension::Accuracy, 1.4, None));

        let outcome = aggregate(&results, &Weights::default());
        assert!(outcome
            .processing_errors
            .iter()
            .any(|e| e.contains("accuracy") && e.contains("out of range")));
        assert_eq!(*outcome.scores.get(&Dimension::Accuracy).unwrap(), 0.0);
    }
}
