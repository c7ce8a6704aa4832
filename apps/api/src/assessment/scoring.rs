//! Scoring aggregation — collapses a session's per-question outcomes into the
//! single percentage frozen on the completed session.

use crate::assessment::models::{AnswerResult, GradeOutcome};

/// Computes the final 0–100 score for a finished result set.
///
/// Objective sessions score the fraction answered correctly (an unanswered
/// result counts as incorrect). Rubric sessions average each question's
/// component-score mean. Called exactly once, when the last answer lands;
/// the stored score is never recomputed on re-read.
pub fn aggregate(results: &[AnswerResult]) -> u32 {
    if results.is_empty() {
        return 0;
    }

    let composites: Vec<f64> = results
        .iter()
        .filter_map(|r| r.outcome.as_ref())
        .filter_map(GradeOutcome::composite)
        .collect();

    let score = if composites.is_empty() {
        let correct = results
            .iter()
            .filter(|r| matches!(r.outcome, Some(GradeOutcome::Objective { is_correct: true })))
            .count();
        correct as f64 * 100.0 / results.len() as f64
    } else {
        composites.iter().sum::<f64>() / composites.len() as f64
    };

    score.round().clamp(0.0, 100.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::models::ComponentScore;
    use uuid::Uuid;

    fn objective(is_correct: bool) -> AnswerResult {
        AnswerResult {
            question_id: Uuid::new_v4(),
            user_answer: Some("answer".to_string()),
            outcome: Some(GradeOutcome::Objective { is_correct }),
            feedback: None,
        }
    }

    fn rubric(scores: &[f64]) -> AnswerResult {
        AnswerResult {
            question_id: Uuid::new_v4(),
            user_answer: Some("a story".to_string()),
            outcome: Some(GradeOutcome::Rubric {
                components: scores
                    .iter()
                    .map(|s| ComponentScore {
                        name: "Action".to_string(),
                        score: *s,
                        feedback: String::new(),
                    })
                    .collect(),
                summary: String::new(),
            }),
            feedback: None,
        }
    }

    #[test]
    fn test_objective_score_is_correct_fraction() {
        let results = vec![
            objective(true),
            objective(true),
            objective(false),
            objective(true),
            objective(false),
        ];
        assert_eq!(aggregate(&results), 60);
    }

    #[test]
    fn test_objective_score_rounds_to_nearest_integer() {
        // 1/3 = 33.33 → 33, 2/3 = 66.67 → 67
        assert_eq!(
            aggregate(&[objective(true), objective(false), objective(false)]),
            33
        );
        assert_eq!(
            aggregate(&[objective(true), objective(true), objective(false)]),
            67
        );
    }

    #[test]
    fn test_unanswered_results_count_as_incorrect() {
        let results = vec![objective(true), AnswerResult::unanswered(Uuid::new_v4())];
        assert_eq!(aggregate(&results), 50);
    }

    #[test]
    fn test_rubric_score_is_mean_of_composites() {
        // composites: 75 and 85 → 80
        let results = vec![rubric(&[80.0, 70.0, 80.0, 70.0]), rubric(&[90.0, 80.0, 90.0, 80.0])];
        assert_eq!(aggregate(&results), 80);
    }

    #[test]
    fn test_rubric_score_stays_within_bounds() {
        let all_low = vec![rubric(&[0.0, 0.0, 0.0, 0.0])];
        assert_eq!(aggregate(&all_low), 0);
        let all_high = vec![rubric(&[100.0, 100.0, 100.0, 100.0])];
        assert_eq!(aggregate(&all_high), 100);
    }

    #[test]
    fn test_empty_results_score_zero() {
        assert_eq!(aggregate(&[]), 0);
    }
}
