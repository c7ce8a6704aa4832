//! In-memory session store. Sessions are independent aggregates: one record
//! owns the session row, its ordered questions, and their answer results,
//! and dies with them.
//!
//! All mutation goes through this module so the check-and-write of a
//! submission happens inside a single critical section. A delete racing an
//! in-flight submission therefore resolves one way only: the submission
//! fails `NotFound` and writes nothing.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::assessment::models::{AnswerResult, GradeOutcome, Question, Session, SessionStatus};
use crate::assessment::scoring;
use crate::errors::AppError;

/// One session aggregate. `questions[i]` pairs with `results[i]`; the two
/// vectors are equal-length from creation on.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub session: Session,
    pub questions: Vec<Question>,
    pub results: Vec<AnswerResult>,
}

impl SessionRecord {
    /// Builds the aggregate with one unanswered result per question.
    pub fn new(session: Session, questions: Vec<Question>) -> Self {
        let results = questions
            .iter()
            .map(|q| AnswerResult::unanswered(q.id))
            .collect();
        Self {
            session,
            questions,
            results,
        }
    }

    /// Index of the current question: the lowest sequence index still
    /// unanswered. `None` once every question is answered.
    pub fn current_index(&self) -> Option<usize> {
        self.results.iter().position(|r| !r.is_answered())
    }

    pub fn answered_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_answered()).count()
    }
}

/// Where a submission landed: the next question to serve, or the finalized
/// session with its frozen score.
#[derive(Debug, Clone)]
pub enum SubmissionAdvance {
    Next(Question),
    Completed(Session),
}

/// Pre-grading snapshot of everything `submit` needs to validate a request
/// before calling the judge.
#[derive(Debug, Clone)]
pub struct SubmissionContext {
    pub session: Session,
    pub question: Question,
    pub already_answered: bool,
}

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<StoreInner>>,
}

#[derive(Default)]
struct StoreInner {
    sessions: HashMap<Uuid, SessionRecord>,
    /// question id → owning session id
    question_owner: HashMap<Uuid, Uuid>,
}

impl SessionStore {
    pub async fn insert(&self, record: SessionRecord) {
        let mut inner = self.inner.write().await;
        for question in &record.questions {
            inner.question_owner.insert(question.id, record.session.id);
        }
        inner.sessions.insert(record.session.id, record);
    }

    pub async fn record(&self, session_id: Uuid) -> Option<SessionRecord> {
        self.inner.read().await.sessions.get(&session_id).cloned()
    }

    pub async fn sessions(&self) -> Vec<Session> {
        self.inner
            .read()
            .await
            .sessions
            .values()
            .map(|record| record.session.clone())
            .collect()
    }

    /// Removes the whole aggregate; the question index entries go with it.
    pub async fn remove(&self, session_id: Uuid) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .sessions
            .remove(&session_id)
            .ok_or_else(|| AppError::NotFound(format!("Test session {session_id} not found")))?;
        for question in &record.questions {
            inner.question_owner.remove(&question.id);
        }
        Ok(())
    }

    /// Resolves a question id to its owning session for pre-grading checks.
    pub async fn submission_context(&self, question_id: Uuid) -> Option<SubmissionContext> {
        let inner = self.inner.read().await;
        let session_id = inner.question_owner.get(&question_id)?;
        let record = inner.sessions.get(session_id)?;
        let index = record.questions.iter().position(|q| q.id == question_id)?;
        Some(SubmissionContext {
            session: record.session.clone(),
            question: record.questions[index].clone(),
            already_answered: record.results[index].is_answered(),
        })
    }

    /// Writes a graded answer and advances or finalizes the session.
    ///
    /// One critical section, re-validating everything checked before the
    /// grading call: the session may have been deleted or the question
    /// answered while the judge was running. Finalization (score freeze,
    /// `completed_at`, status flip) happens here so it cannot race a second
    /// writer.
    pub async fn commit_answer(
        &self,
        question_id: Uuid,
        user_answer: String,
        outcome: GradeOutcome,
        feedback: String,
    ) -> Result<SubmissionAdvance, AppError> {
        let mut inner = self.inner.write().await;

        let session_id = *inner
            .question_owner
            .get(&question_id)
            .ok_or_else(|| AppError::NotFound(format!("Test question {question_id} not found")))?;
        let record = inner
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| AppError::NotFound(format!("Test session {session_id} not found")))?;

        if record.session.status == SessionStatus::Completed {
            return Err(AppError::InvalidState(
                "cannot submit an answer to a completed session".to_string(),
            ));
        }

        let index = record
            .questions
            .iter()
            .position(|q| q.id == question_id)
            .ok_or_else(|| AppError::NotFound(format!("Test question {question_id} not found")))?;
        if record.results[index].is_answered() {
            return Err(AppError::AlreadyAnswered(format!(
                "question {question_id} already has an answer"
            )));
        }

        record.results[index].user_answer = Some(user_answer);
        record.results[index].outcome = Some(outcome);
        record.results[index].feedback = Some(feedback);

        match record.current_index() {
            Some(next) => Ok(SubmissionAdvance::Next(record.questions[next].clone())),
            None => {
                record.session.score = Some(scoring::aggregate(&record.results));
                record.session.completed_at = Some(Utc::now());
                record.session.status = SessionStatus::Completed;
                Ok(SubmissionAdvance::Completed(record.session.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::models::{Difficulty, QuestionPayload, TestType};
    use chrono::Utc;

    fn make_record(question_count: usize) -> SessionRecord {
        let session = Session {
            id: Uuid::new_v4(),
            topic: "SQL".to_string(),
            difficulty: Difficulty::MidLevel,
            test_type: TestType::ShortAnswer,
            status: SessionStatus::InProgress,
            score: None,
            created_at: Utc::now(),
            completed_at: None,
        };
        let questions = (0..question_count)
            .map(|i| Question {
                id: Uuid::new_v4(),
                session_id: session.id,
                sequence_index: i,
                question_text: format!("Q{}", i + 1),
                payload: QuestionPayload::None,
                reference_answer: format!("ref-{}", i + 1),
            })
            .collect();
        SessionRecord::new(session, questions)
    }

    fn correct() -> GradeOutcome {
        GradeOutcome::Objective { is_correct: true }
    }

    #[tokio::test]
    async fn test_record_is_created_with_matching_result_slots() {
        let store = SessionStore::default();
        let record = make_record(5);
        let session_id = record.session.id;
        store.insert(record).await;

        let stored = store.record(session_id).await.unwrap();
        assert_eq!(stored.questions.len(), stored.results.len());
        assert_eq!(stored.current_index(), Some(0));
        assert_eq!(stored.answered_count(), 0);
    }

    #[tokio::test]
    async fn test_commit_answer_advances_then_finalizes() {
        let store = SessionStore::default();
        let record = make_record(2);
        let session_id = record.session.id;
        let q1 = record.questions[0].id;
        let q2 = record.questions[1].id;
        store.insert(record).await;

        let advance = store
            .commit_answer(q1, "a".into(), correct(), "ok".into())
            .await
            .unwrap();
        match advance {
            SubmissionAdvance::Next(next) => assert_eq!(next.id, q2),
            other => panic!("expected next question, got {other:?}"),
        }

        let advance = store
            .commit_answer(q2, "b".into(), correct(), "ok".into())
            .await
            .unwrap();
        match advance {
            SubmissionAdvance::Completed(session) => {
                assert_eq!(session.status, SessionStatus::Completed);
                assert_eq!(session.score, Some(100));
                assert!(session.completed_at.is_some());
            }
            other => panic!("expected completion, got {other:?}"),
        }

        // The frozen session reads back unchanged.
        let stored = store.record(session_id).await.unwrap();
        assert_eq!(stored.session.score, Some(100));
    }

    #[tokio::test]
    async fn test_commit_answer_rejects_duplicate_submission() {
        let store = SessionStore::default();
        let record = make_record(2);
        let q1 = record.questions[0].id;
        let session_id = record.session.id;
        store.insert(record).await;

        store
            .commit_answer(q1, "first".into(), correct(), "ok".into())
            .await
            .unwrap();
        let err = store
            .commit_answer(
                q1,
                "second".into(),
                GradeOutcome::Objective { is_correct: false },
                "no".into(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyAnswered(_)));

        // The stored result is unchanged from the first submission.
        let stored = store.record(session_id).await.unwrap();
        assert_eq!(stored.results[0].user_answer.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_remove_cascades_to_question_index() {
        let store = SessionStore::default();
        let record = make_record(3);
        let session_id = record.session.id;
        let q1 = record.questions[0].id;
        store.insert(record).await;

        store.remove(session_id).await.unwrap();
        assert!(store.record(session_id).await.is_none());
        assert!(store.submission_context(q1).await.is_none());

        // A submission that lost the race against delete fails cleanly.
        let err = store
            .commit_answer(q1, "late".into(), correct(), "ok".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = store.remove(session_id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
