//! Context-aware boosting
//!
//! Redirects near-tied keyword results toward the active specialist's task
//! types. Never boosts a type that was not already a plausible near-miss.

use std::collections::HashMap;

use tracing::debug;

use super::keyword::{KeywordMatch, keyword_confidence};
use crate::domain::{Specialist, TaskType};

/// Candidates must be within this distance of the best confidence
pub const BOOST_WINDOW: f64 = 0.1;

/// Added to a candidate's confidence
pub const BOOST_AMOUNT: f64 = 0.15;

/// Ceiling of a boosted confidence
pub const BOOST_CAP: f64 = 0.95;

/// Float tolerance on the window boundary
const EPSILON: f64 = 1e-9;

/// Apply the specialist boost to a keyword result
///
/// `scores` are the normalized keyword scores; only types that scored above
/// zero are candidates. The highest boosted candidate replaces `best` only if
/// it strictly exceeds the original best confidence.
pub fn boost(best: KeywordMatch, scores: &HashMap<TaskType, f64>, specialist: Option<Specialist>) -> KeywordMatch {
    let Some(specialist) = specialist else {
        return best;
    };

    let mut winner: Option<KeywordMatch> = None;
    for task_type in specialist.task_types() {
        let score = scores.get(task_type).copied().unwrap_or(0.0);
        if score <= 0.0 {
            continue;
        }

        let confidence = keyword_confidence(score);
        if best.confidence - confidence > BOOST_WINDOW + EPSILON {
            continue;
        }

        let boosted = (confidence + BOOST_AMOUNT).min(BOOST_CAP);
        if boosted > best.confidence && winner.is_none_or(|w| boosted > w.confidence) {
            winner = Some(KeywordMatch {
                task_type: *task_type,
                confidence: boosted,
            });
        }
    }

    match winner {
        Some(boosted) => {
            debug!(
                %specialist,
                from = %best.task_type,
                to = %boosted.task_type,
                confidence = boosted.confidence,
                "boost: redirected toward specialist"
            );
            boosted
        }
        None => best,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn best(task_type: TaskType, confidence: f64) -> KeywordMatch {
        KeywordMatch { task_type, confidence }
    }

    #[test]
    fn test_no_hint_is_identity() {
        let original = best(TaskType::QbrGeneration, 0.6);
        let scores = HashMap::from([(TaskType::RiskAssessment, 0.3)]);
        assert_eq!(boost(original, &scores, None), original);
    }

    #[test]
    fn test_candidate_exactly_at_window_is_eligible() {
        // best 0.6 (score 0.3); candidate 0.5 (score 0.2) sits exactly 0.1 below
        let original = best(TaskType::QbrGeneration, 0.6);
        let scores = HashMap::from([(TaskType::QbrGeneration, 0.3), (TaskType::RiskAssessment, 0.2)]);

        let result = boost(original, &scores, Some(Specialist::Risk));
        assert_eq!(result.task_type, TaskType::RiskAssessment);
        assert!((result.confidence - 0.65).abs() < 1e-9);
    }

    #[test]
    fn test_candidate_just_outside_window_is_ignored() {
        // candidate confidence 0.4999 is 0.1001 below the best
        let original = best(TaskType::QbrGeneration, 0.6);
        let scores = HashMap::from([(TaskType::QbrGeneration, 0.3), (TaskType::RiskAssessment, 0.1999)]);

        assert_eq!(boost(original, &scores, Some(Specialist::Risk)), original);
    }

    #[test]
    fn test_zero_score_types_are_not_candidates() {
        let original = best(TaskType::Custom, 0.0);
        let scores = HashMap::from([(TaskType::RiskAssessment, 0.0)]);
        assert_eq!(boost(original, &scores, Some(Specialist::Risk)), original);
    }

    #[test]
    fn test_best_in_subset_gets_boosted() {
        let original = best(TaskType::RenewalForecast, 0.7);
        let scores = HashMap::from([(TaskType::RenewalForecast, 0.4)]);

        let result = boost(original, &scores, Some(Specialist::Renewal));
        assert_eq!(result.task_type, TaskType::RenewalForecast);
        assert!((result.confidence - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_boost_is_capped() {
        let original = best(TaskType::SavePlay, 0.9);
        let scores = HashMap::from([(TaskType::SavePlay, 2.0)]);
        assert_eq!(boost(original, &scores, Some(Specialist::Risk)).confidence, BOOST_CAP);
    }

    #[test]
    fn test_highest_boosted_candidate_wins() {
        let original = best(TaskType::QbrGeneration, 0.6);
        let scores = HashMap::from([
            (TaskType::QbrGeneration, 0.3),
            (TaskType::RiskAssessment, 0.22),
            (TaskType::SavePlay, 0.25),
        ]);

        let result = boost(original, &scores, Some(Specialist::Risk));
        assert_eq!(result.task_type, TaskType::SavePlay);
        assert!((result.confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_other_specialist_does_not_apply() {
        let original = best(TaskType::QbrGeneration, 0.6);
        let scores = HashMap::from([(TaskType::QbrGeneration, 0.3), (TaskType::RiskAssessment, 0.25)]);
        // Adoption owns none of the near-tied types
        assert_eq!(boost(original, &scores, Some(Specialist::Adoption)), original);
    }
}
