//! Test history, the retake-incorrect derivation, and the guidance summary.

use std::collections::HashMap;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::assessment::generator::{GenerationRequest, QuestionGenerator};
use crate::assessment::lifecycle::{self, StartedSession};
use crate::assessment::models::{Difficulty, SessionStatus, TestType};
use crate::assessment::store::SessionStore;
use crate::errors::AppError;

/// One row of the history listing.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub topic: String,
    #[serde(rename = "type")]
    pub test_type: TestType,
    pub difficulty: Difficulty,
    pub status: SessionStatus,
    pub score: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// All sessions, newest first.
pub async fn list_history(store: &SessionStore) -> Vec<SessionSummary> {
    let mut sessions = store.sessions().await;
    sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sessions
        .into_iter()
        .map(|s| SessionSummary {
            id: s.id,
            topic: s.topic,
            test_type: s.test_type,
            difficulty: s.difficulty,
            status: s.status,
            score: s.score,
            created_at: s.created_at,
            completed_at: s.completed_at,
        })
        .collect()
}

/// Derives a brand-new session covering only the missed items of a completed
/// one: results graded incorrect (objective types) or left unanswered. The
/// generator re-produces fresh questions for exactly those prompts; the
/// source session and its results stay frozen.
pub async fn retake_incorrect(
    store: &SessionStore,
    generator: &dyn QuestionGenerator,
    session_id: Uuid,
) -> Result<StartedSession, AppError> {
    let record = store
        .record(session_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Test session {session_id} not found")))?;

    if record.session.status != SessionStatus::Completed {
        return Err(AppError::InvalidState(
            "only completed sessions can be retaken".to_string(),
        ));
    }

    let missed: Vec<String> = record
        .questions
        .iter()
        .zip(&record.results)
        .filter(|(_, result)| result.is_missed())
        .map(|(question, _)| question.question_text.clone())
        .collect();
    if missed.is_empty() {
        return Err(AppError::NothingToRetake(
            "every question in this session was answered correctly".to_string(),
        ));
    }

    let request = GenerationRequest {
        topic: record.session.topic.clone(),
        difficulty: record.session.difficulty,
        test_type: record.session.test_type,
        count: missed.len(),
    };
    let generated = generator.regenerate(&request, &missed).await?;
    lifecycle::ensure_batch_size(generated.len(), missed.len())?;

    let new_record = lifecycle::build_record(
        request.topic,
        request.difficulty,
        request.test_type,
        generated,
    );
    let session = new_record.session.clone();
    let first = new_record
        .questions
        .first()
        .cloned()
        .ok_or_else(|| AppError::Internal(anyhow!("retake session created with no questions")))?;

    info!(
        "Retaking {} missed questions from session {} as session {}",
        new_record.questions.len(),
        session_id,
        session.id
    );
    store.insert(new_record).await;

    Ok(StartedSession { session, question: first })
}

/// One row of the guidance summary: how a topic is trending.
#[derive(Debug, Clone, Serialize)]
pub struct TopicAverage {
    pub topic: String,
    pub average_score: f64,
    pub completed_sessions: usize,
}

/// Per-topic mean score over completed sessions, weakest topics first.
pub async fn guidance_summary(store: &SessionStore) -> Vec<TopicAverage> {
    let mut by_topic: HashMap<String, (f64, usize)> = HashMap::new();
    for session in store.sessions().await {
        if let Some(score) = session.score {
            let entry = by_topic.entry(session.topic).or_insert((0.0, 0));
            entry.0 += score as f64;
            entry.1 += 1;
        }
    }

    let mut summary: Vec<TopicAverage> = by_topic
        .into_iter()
        .map(|(topic, (total, count))| TopicAverage {
            topic,
            average_score: total / count as f64,
            completed_sessions: count,
        })
        .collect();
    summary.sort_by(|a, b| {
        a.average_score
            .partial_cmp(&b.average_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::lifecycle::start_session;
    use crate::assessment::models::QuestionPayload;
    use crate::assessment::testing::{complete_mc_session, start_request, StubGenerator};

    #[tokio::test]
    async fn test_history_lists_newest_first_with_scores() {
        let store = SessionStore::default();
        complete_mc_session(&store, "SQL", ["B", "A", "B", "A", "B"]).await;
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let in_progress = start_session(&store, &StubGenerator, start_request(TestType::ShortAnswer))
            .await
            .unwrap();

        let history = list_history(&store).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, in_progress.session.id);
        assert_eq!(history[0].status, SessionStatus::InProgress);
        assert!(history[0].score.is_none());
        assert_eq!(history[1].status, SessionStatus::Completed);
        assert_eq!(history[1].score, Some(60));
    }

    #[tokio::test]
    async fn test_retake_builds_new_session_from_missed_questions() {
        let store = SessionStore::default();
        // Stub reference is "B": questions 2 and 4 are missed.
        let source = complete_mc_session(&store, "SQL", ["B", "A", "B", "C", "B"]).await;

        let retake = retake_incorrect(&store, &StubGenerator, source.id)
            .await
            .unwrap();
        assert_ne!(retake.session.id, source.id);
        assert_eq!(retake.session.status, SessionStatus::InProgress);
        assert_eq!(retake.session.topic, "SQL");

        let record = store.record(retake.session.id).await.unwrap();
        assert_eq!(record.questions.len(), 2);
        assert_eq!(record.questions.len(), record.results.len());
        // The stub regenerates from the missed prompts ("Q2" and "Q4").
        assert!(record.questions[0].question_text.contains("Q2"));
        assert!(record.questions[1].question_text.contains("Q4"));
        for question in &record.questions {
            assert!(matches!(question.payload, QuestionPayload::Options { .. }));
        }

        // The source session is untouched.
        let source_record = store.record(source.id).await.unwrap();
        assert_eq!(source_record.session.status, SessionStatus::Completed);
        assert_eq!(source_record.session.score, Some(60));
        assert_eq!(source_record.questions.len(), 5);
    }

    // Scenario: retaking an all-correct session has nothing to offer.
    #[tokio::test]
    async fn test_retake_on_perfect_session_fails() {
        let store = SessionStore::default();
        let source = complete_mc_session(&store, "SQL", ["B", "B", "B", "B", "B"]).await;

        let err = retake_incorrect(&store, &StubGenerator, source.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NothingToRetake(_)));
    }

    #[tokio::test]
    async fn test_retake_requires_a_completed_session() {
        let store = SessionStore::default();
        let started = start_session(
            &store,
            &StubGenerator,
            start_request(TestType::MultipleChoice),
        )
        .await
        .unwrap();

        let err = retake_incorrect(&store, &StubGenerator, started.session.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        let err = retake_incorrect(&store, &StubGenerator, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_guidance_summary_orders_weakest_topics_first() {
        let store = SessionStore::default();
        complete_mc_session(&store, "SQL", ["B", "A", "C", "A", "B"]).await; // 40
        complete_mc_session(&store, "React", ["B", "B", "B", "B", "B"]).await; // 100
        start_session(&store, &StubGenerator, start_request(TestType::ShortAnswer))
            .await
            .unwrap(); // in progress — excluded

        let summary = guidance_summary(&store).await;
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].topic, "SQL");
        assert_eq!(summary[0].average_score, 40.0);
        assert_eq!(summary[0].completed_sessions, 1);
        assert_eq!(summary[1].topic, "React");
        assert_eq!(summary[1].average_score, 100.0);
    }
}
