//! Session lifecycle — start, continue, results, delete, and answer
//! submission/progression.
//!
//! Flow: start asks the generator for a fixed batch and persists the whole
//! aggregate atomically; submit validates the payload shape, grades through
//! the type's strategy, and writes through the store's single critical
//! section, finalizing the score on the last answer.

use anyhow::anyhow;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::assessment::generator::{GeneratedQuestion, GenerationRequest, QuestionGenerator};
use crate::assessment::judge::AnswerJudge;
use crate::assessment::models::{
    AnswerPayload, Difficulty, Question, Session, SessionStatus, TestType,
};
use crate::assessment::store::{SessionRecord, SessionStore, SubmissionAdvance};
use crate::assessment::strategy::{strategy_for, GradedAnswer};
use crate::errors::AppError;

/// Request body for starting a session. `topic` and `difficulty` may be
/// omitted for behavioral types, which normalize both.
#[derive(Debug, Clone, Deserialize)]
pub struct StartTestRequest {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(rename = "type")]
    pub test_type: TestType,
}

/// A freshly created session and its first question.
#[derive(Debug, Clone)]
pub struct StartedSession {
    pub session: Session,
    pub question: Question,
}

/// The resume point of an in-progress session.
#[derive(Debug, Clone)]
pub struct ContinuedSession {
    pub session: Session,
    pub question: Question,
    pub question_number: usize,
    pub total_questions: usize,
}

/// Request body for submitting an answer to the current question.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitAnswerRequest {
    pub question_id: Uuid,
    pub answer: AnswerPayload,
}

/// A graded submission plus where the session landed afterwards.
#[derive(Debug, Clone)]
pub struct SubmittedAnswer {
    pub graded: GradedAnswer,
    /// The reference answer revealed to the caller now that the question is
    /// answered (judge-corrected where the judge supplied one).
    pub reference_answer: String,
    pub advance: SubmissionAdvance,
}

/// Starts a session: resolves topic/difficulty through the type's strategy,
/// requests the fixed question batch from the generator, and persists
/// Session + Questions + unanswered AnswerResults as one aggregate.
pub async fn start_session(
    store: &SessionStore,
    generator: &dyn QuestionGenerator,
    request: StartTestRequest,
) -> Result<StartedSession, AppError> {
    let strategy = strategy_for(request.test_type);

    let topic = match strategy.fixed_topic() {
        Some(fixed) => fixed.to_string(),
        None => request
            .topic
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "topic is required for {} tests",
                    request.test_type.as_str()
                ))
            })?
            .to_string(),
    };
    let difficulty = strategy.resolve_difficulty(request.difficulty)?;
    let count = strategy.question_count();

    let generated = generator
        .generate(&GenerationRequest {
            topic: topic.clone(),
            difficulty,
            test_type: request.test_type,
            count,
        })
        .await?;
    ensure_batch_size(generated.len(), count)?;

    let record = build_record(topic, difficulty, request.test_type, generated);
    let session = record.session.clone();
    let first = record
        .questions
        .first()
        .cloned()
        .ok_or_else(|| AppError::Internal(anyhow!("session created with no questions")))?;

    info!(
        "Started {} session {} on \"{}\" ({} questions)",
        session.test_type.as_str(),
        session.id,
        session.topic,
        record.questions.len()
    );
    store.insert(record).await;

    Ok(StartedSession { session, question: first })
}

/// Returns the current question of an in-progress session and its 1-based
/// position. Completed sessions are inspected via results, not continued.
pub async fn continue_session(
    store: &SessionStore,
    session_id: Uuid,
) -> Result<ContinuedSession, AppError> {
    let record = store
        .record(session_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Test session {session_id} not found")))?;

    if record.session.status == SessionStatus::Completed {
        return Err(AppError::InvalidState(
            "this test has already been completed; fetch its results instead".to_string(),
        ));
    }

    let index = record.current_index().ok_or_else(|| {
        AppError::Internal(anyhow!(
            "in-progress session {session_id} has no unanswered question"
        ))
    })?;

    Ok(ContinuedSession {
        question: record.questions[index].clone(),
        question_number: record.answered_count() + 1,
        total_questions: record.questions.len(),
        session: record.session,
    })
}

/// Returns the full aggregate for the results view.
pub async fn get_results(
    store: &SessionStore,
    session_id: Uuid,
) -> Result<SessionRecord, AppError> {
    store
        .record(session_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Test session {session_id} not found")))
}

/// Deletes a session, cascading to its questions and results.
pub async fn delete_session(store: &SessionStore, session_id: Uuid) -> Result<(), AppError> {
    store.remove(session_id).await?;
    info!("Deleted test session {session_id}");
    Ok(())
}

/// Submits an answer for the given question: validates shape, grades through
/// the strategy, writes the result, and advances or finalizes the session.
///
/// Grading happens outside the store lock. If the judge fails, nothing has
/// been written and the same submission can be retried; if the session is
/// deleted while the judge runs, the write loses and fails `NotFound`.
pub async fn submit_answer(
    store: &SessionStore,
    judge: &dyn AnswerJudge,
    request: SubmitAnswerRequest,
) -> Result<SubmittedAnswer, AppError> {
    let ctx = store
        .submission_context(request.question_id)
        .await
        .ok_or_else(|| {
            AppError::NotFound(format!("Test question {} not found", request.question_id))
        })?;

    if ctx.session.status == SessionStatus::Completed {
        return Err(AppError::InvalidState(
            "cannot submit an answer to a completed session".to_string(),
        ));
    }
    if ctx.already_answered {
        return Err(AppError::AlreadyAnswered(format!(
            "question {} already has an answer",
            request.question_id
        )));
    }

    let strategy = strategy_for(ctx.session.test_type);
    let raw_answer = strategy.encode_answer(&request.answer)?;
    let graded = strategy.grade(judge, &ctx.question, &raw_answer).await?;

    let advance = store
        .commit_answer(
            request.question_id,
            raw_answer,
            graded.outcome.clone(),
            graded.feedback.clone(),
        )
        .await?;

    if let SubmissionAdvance::Completed(session) = &advance {
        info!(
            "Session {} completed with score {}",
            session.id,
            session.score.unwrap_or_default()
        );
    }

    let reference_answer = graded
        .reference_override
        .clone()
        .unwrap_or_else(|| ctx.question.reference_answer.clone());

    Ok(SubmittedAnswer {
        graded,
        reference_answer,
        advance,
    })
}

/// Builds a new session aggregate from a generated batch. Shared by start
/// and retake — a retake is a brand-new aggregate, never a rewrite.
pub(crate) fn build_record(
    topic: String,
    difficulty: Difficulty,
    test_type: TestType,
    generated: Vec<GeneratedQuestion>,
) -> SessionRecord {
    let session = Session {
        id: Uuid::new_v4(),
        topic,
        difficulty,
        test_type,
        status: SessionStatus::InProgress,
        score: None,
        created_at: Utc::now(),
        completed_at: None,
    };
    let questions = generated
        .into_iter()
        .enumerate()
        .map(|(index, g)| Question {
            id: Uuid::new_v4(),
            session_id: session.id,
            sequence_index: index,
            question_text: g.question_text,
            payload: g.payload,
            reference_answer: g.reference_answer,
        })
        .collect();
    SessionRecord::new(session, questions)
}

/// The generator must return exactly the batch size the engine fixed at
/// session creation.
pub(crate) fn ensure_batch_size(got: usize, expected: usize) -> Result<(), AppError> {
    if got != expected {
        return Err(AppError::Generator(format!(
            "generator returned {got} questions, expected {expected}"
        )));
    }
    Ok(())
}
