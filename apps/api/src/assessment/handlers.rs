//! Axum route handlers for the Test Hub API.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::assessment::history::{self, SessionSummary, TopicAverage};
use crate::assessment::lifecycle::{self, StartTestRequest, SubmitAnswerRequest};
use crate::assessment::models::{
    GradeOutcome, QuestionPayload, QuestionView, Session, SessionStatus,
};
use crate::assessment::store::{SessionRecord, SubmissionAdvance};
use crate::assessment::strategy::{strategy_for, GenerationSource, ALL_TYPES};
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct StartTestResponse {
    pub session: Session,
    pub question: QuestionView,
}

/// The grading verdict echoed back on submission. The reference answer is
/// revealed here — the question is answered now.
#[derive(Debug, Serialize)]
pub struct EvaluationView {
    pub outcome: GradeOutcome,
    pub feedback: String,
    pub reference_answer: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitAnswerResponse {
    pub evaluation: EvaluationView,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_question: Option<QuestionView>,
    /// The finalized session, present only on completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<Session>,
}

#[derive(Debug, Serialize)]
pub struct ContinueResponse {
    pub session: Session,
    pub question: QuestionView,
    pub question_number: usize,
    pub total_questions: usize,
}

/// One question joined with its answer result for the results view.
#[derive(Debug, Serialize)]
pub struct ResultView {
    pub question_id: Uuid,
    pub sequence_index: usize,
    pub question_text: String,
    pub payload: QuestionPayload,
    /// Withheld (`null`) while the question is unanswered in an in-progress
    /// session.
    pub reference_answer: Option<String>,
    pub user_answer: Option<String>,
    pub outcome: Option<GradeOutcome>,
    pub feedback: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResultsResponse {
    pub session: Session,
    pub results: Vec<ResultView>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

fn result_views(record: &SessionRecord) -> Vec<ResultView> {
    let completed = record.session.status == SessionStatus::Completed;
    record
        .questions
        .iter()
        .zip(&record.results)
        .map(|(question, result)| ResultView {
            question_id: question.id,
            sequence_index: question.sequence_index,
            question_text: question.question_text.clone(),
            payload: question.payload.clone(),
            reference_answer: (completed || result.is_answered())
                .then(|| question.reference_answer.clone()),
            user_answer: result.user_answer.clone(),
            outcome: result.outcome.clone(),
            feedback: result.feedback.clone(),
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/tests/start
///
/// Starts a session: generates the fixed question batch for the topic and
/// returns the session with its first question.
pub async fn handle_start_test(
    State(state): State<AppState>,
    Json(request): Json<StartTestRequest>,
) -> Result<(StatusCode, Json<StartTestResponse>), AppError> {
    let started = lifecycle::start_session(&state.store, state.generator.as_ref(), request).await?;

    Ok((
        StatusCode::CREATED,
        Json(StartTestResponse {
            question: QuestionView::from(&started.question),
            session: started.session,
        }),
    ))
}

/// POST /api/v1/tests/submit-answer
///
/// Grades the submitted answer and returns the next question, or the
/// completion signal with the finalized session.
pub async fn handle_submit_answer(
    State(state): State<AppState>,
    Json(request): Json<SubmitAnswerRequest>,
) -> Result<Json<SubmitAnswerResponse>, AppError> {
    let submitted = lifecycle::submit_answer(&state.store, state.judge.as_ref(), request).await?;

    let evaluation = EvaluationView {
        outcome: submitted.graded.outcome,
        feedback: submitted.graded.feedback,
        reference_answer: submitted.reference_answer,
    };
    let (completed, next_question, session) = match submitted.advance {
        SubmissionAdvance::Next(question) => (false, Some(QuestionView::from(&question)), None),
        SubmissionAdvance::Completed(session) => (true, None, Some(session)),
    };

    Ok(Json(SubmitAnswerResponse {
        evaluation,
        completed,
        next_question,
        session,
    }))
}

/// GET /api/v1/tests/sessions/:id/continue
///
/// Resumes an in-progress session at its current question.
pub async fn handle_continue(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ContinueResponse>, AppError> {
    let continued = lifecycle::continue_session(&state.store, session_id).await?;

    Ok(Json(ContinueResponse {
        question: QuestionView::from(&continued.question),
        session: continued.session,
        question_number: continued.question_number,
        total_questions: continued.total_questions,
    }))
}

/// GET /api/v1/tests/sessions/:id
///
/// Returns the session joined with all questions and answer results in
/// sequence order.
pub async fn handle_get_results(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionResultsResponse>, AppError> {
    let record = lifecycle::get_results(&state.store, session_id).await?;

    Ok(Json(SessionResultsResponse {
        results: result_views(&record),
        session: record.session,
    }))
}

/// DELETE /api/v1/tests/sessions/:id
///
/// Deletes a session, cascading to its questions and results.
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, AppError> {
    lifecycle::delete_session(&state.store, session_id).await?;

    Ok(Json(DeleteResponse {
        message: "Test session deleted successfully.".to_string(),
    }))
}

/// POST /api/v1/tests/sessions/:id/retake-incorrect
///
/// Starts a brand-new session covering only the missed items of a completed
/// one.
pub async fn handle_retake_incorrect(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<(StatusCode, Json<StartTestResponse>), AppError> {
    let started =
        history::retake_incorrect(&state.store, state.generator.as_ref(), session_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(StartTestResponse {
            question: QuestionView::from(&started.question),
            session: started.session,
        }),
    ))
}

/// GET /api/v1/tests/history
///
/// All sessions, newest first.
pub async fn handle_history(State(state): State<AppState>) -> Json<Vec<SessionSummary>> {
    Json(history::list_history(&state.store).await)
}

/// GET /api/v1/tests/prompts
///
/// The generation prompt template per LLM-generated type.
pub async fn handle_prompt_matrix() -> Json<BTreeMap<&'static str, &'static str>> {
    let mut matrix = BTreeMap::new();
    for test_type in ALL_TYPES {
        if let GenerationSource::Prompted { template } = strategy_for(test_type).generation() {
            matrix.insert(test_type.as_str(), template);
        }
    }
    Json(matrix)
}

/// GET /api/v1/guidance/summary
///
/// Per-topic mean scores over completed sessions, weakest first.
pub async fn handle_guidance_summary(State(state): State<AppState>) -> Json<Vec<TopicAverage>> {
    Json(history::guidance_summary(&state.store).await)
}
