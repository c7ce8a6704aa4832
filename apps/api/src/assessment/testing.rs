//! Deterministic collaborator stubs and fixtures shared by the engine tests.

use async_trait::async_trait;

use crate::assessment::generator::{
    GeneratedQuestion, GenerationRequest, QuestionGenerator,
};
use crate::assessment::judge::{
    AnswerJudge, ObjectiveEvaluation, RubricEvaluation, RubricFramework,
};
use crate::assessment::lifecycle::{
    start_session, submit_answer, StartTestRequest, SubmitAnswerRequest,
};
use crate::assessment::models::{
    AnswerPayload, ComponentScore, Difficulty, QuestionPayload, Session, TestType,
};
use crate::assessment::store::{SessionStore, SubmissionAdvance};
use crate::errors::AppError;

/// Generator stub. Question texts are "Q1".."Qn" (or echo the source prompt
/// on regenerate). References are "ref-1".."ref-n", except multiple choice,
/// which always uses four fixed options with "B" correct.
pub struct StubGenerator;

fn stub_question(test_type: TestType, text: String, ordinal: usize) -> GeneratedQuestion {
    match test_type {
        TestType::MultipleChoice => GeneratedQuestion {
            question_text: text,
            payload: QuestionPayload::Options {
                options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            },
            reference_answer: "B".to_string(),
        },
        TestType::CodeChallenge => GeneratedQuestion {
            question_text: text,
            payload: QuestionPayload::Starter {
                language: "javascript".to_string(),
                snippet: "function solve() {}".to_string(),
            },
            reference_answer: format!("ref-{ordinal}"),
        },
        TestType::ShortAnswer => GeneratedQuestion {
            question_text: text,
            payload: QuestionPayload::None,
            reference_answer: format!("ref-{ordinal}"),
        },
        TestType::BehavioralStar | TestType::BehavioralSoar => GeneratedQuestion {
            question_text: text,
            payload: QuestionPayload::None,
            reference_answer: "N/A".to_string(),
        },
    }
}

#[async_trait]
impl QuestionGenerator for StubGenerator {
    async fn generate(&self, req: &GenerationRequest) -> Result<Vec<GeneratedQuestion>, AppError> {
        Ok((0..req.count)
            .map(|i| stub_question(req.test_type, format!("Q{}", i + 1), i + 1))
            .collect())
    }

    async fn regenerate(
        &self,
        req: &GenerationRequest,
        source_prompts: &[String],
    ) -> Result<Vec<GeneratedQuestion>, AppError> {
        Ok(source_prompts
            .iter()
            .enumerate()
            .map(|(i, prompt)| stub_question(req.test_type, format!("retake of {prompt}"), i + 1))
            .collect())
    }
}

/// Judge stub. Objective answers are correct exactly when they equal the
/// reference; rubric answers score a fixed 80 per component.
pub struct StubJudge;

#[async_trait]
impl AnswerJudge for StubJudge {
    async fn evaluate_objective(
        &self,
        _question: &str,
        reference: &str,
        answer: &str,
    ) -> Result<ObjectiveEvaluation, AppError> {
        let is_correct = answer == reference;
        Ok(ObjectiveEvaluation {
            is_correct,
            feedback: if is_correct {
                "Correct.".to_string()
            } else {
                "Close, but not quite.".to_string()
            },
            correct_answer: None,
        })
    }

    async fn evaluate_rubric(
        &self,
        framework: &RubricFramework,
        _question: &str,
        _answer: &str,
    ) -> Result<RubricEvaluation, AppError> {
        Ok(RubricEvaluation {
            components: framework
                .components
                .iter()
                .map(|name| ComponentScore {
                    name: (*name).to_string(),
                    score: 80.0,
                    feedback: format!("Solid {name}."),
                })
                .collect(),
            summary: "Well structured answer.".to_string(),
        })
    }
}

/// Judge stub that always fails, as a collaborator outage would.
pub struct UnavailableJudge;

#[async_trait]
impl AnswerJudge for UnavailableJudge {
    async fn evaluate_objective(
        &self,
        _question: &str,
        _reference: &str,
        _answer: &str,
    ) -> Result<ObjectiveEvaluation, AppError> {
        Err(AppError::GradingUnavailable("judge timed out".to_string()))
    }

    async fn evaluate_rubric(
        &self,
        _framework: &RubricFramework,
        _question: &str,
        _answer: &str,
    ) -> Result<RubricEvaluation, AppError> {
        Err(AppError::GradingUnavailable("judge timed out".to_string()))
    }
}

/// A start request with sensible defaults for the given type.
pub fn start_request(test_type: TestType) -> StartTestRequest {
    StartTestRequest {
        topic: Some("SQL".to_string()),
        difficulty: Some(Difficulty::MidLevel),
        test_type,
    }
}

/// Starts a multiple-choice session on `topic` and submits the five given
/// options, returning the finalized session. Stub reference is "B".
pub async fn complete_mc_session(
    store: &SessionStore,
    topic: &str,
    answers: [&str; 5],
) -> Session {
    let started = start_session(
        store,
        &StubGenerator,
        StartTestRequest {
            topic: Some(topic.to_string()),
            difficulty: Some(Difficulty::MidLevel),
            test_type: TestType::MultipleChoice,
        },
    )
    .await
    .expect("stub start should succeed");

    let mut question = started.question;
    for option in answers {
        let submitted = submit_answer(
            store,
            &StubJudge,
            SubmitAnswerRequest {
                question_id: question.id,
                answer: AnswerPayload::Choice(option.to_string()),
            },
        )
        .await
        .expect("stub submit should succeed");
        match submitted.advance {
            SubmissionAdvance::Next(next) => question = next,
            SubmissionAdvance::Completed(session) => return session,
        }
    }
    panic!("session did not complete after five answers");
}
