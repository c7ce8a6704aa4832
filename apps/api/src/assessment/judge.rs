//! Answer Judge — the external grading collaborator for free-text, code, and
//! behavioral answers. Multiple-choice grading never reaches the judge; its
//! strategy grades locally by exact match.
//!
//! All judge failures surface as `GradingUnavailable`: the lifecycle layer
//! guarantees no state was written, so the submission stays retryable.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use crate::assessment::models::ComponentScore;
use crate::assessment::prompts::{
    OBJECTIVE_EVALUATION_SYSTEM, OBJECTIVE_EVALUATION_TEMPLATE, RUBRIC_EVALUATION_SYSTEM_TEMPLATE,
    RUBRIC_EVALUATION_TEMPLATE,
};
use crate::errors::AppError;
use crate::llm_client::LlmClient;

/// A behavioral grading framework: a named rubric with four scored components.
#[derive(Debug, Clone, Copy)]
pub struct RubricFramework {
    pub name: &'static str,
    pub components: [&'static str; 4],
}

pub const STAR: RubricFramework = RubricFramework {
    name: "STAR",
    components: ["Situation", "Task", "Action", "Result"],
};

pub const SOAR: RubricFramework = RubricFramework {
    name: "SOAR",
    components: ["Situation", "Obstacle", "Action", "Result"],
};

/// Judge verdict for an objectively gradable answer.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectiveEvaluation {
    pub is_correct: bool,
    pub feedback: String,
    /// Judge-verified reference answer; shown to the caller in place of the
    /// stored one when present.
    #[serde(default)]
    pub correct_answer: Option<String>,
}

/// Judge verdict for a rubric-graded behavioral answer.
#[derive(Debug, Clone)]
pub struct RubricEvaluation {
    pub components: Vec<ComponentScore>,
    pub summary: String,
}

/// The grading collaborator contract. Carried in `AppState` as
/// `Arc<dyn AnswerJudge>`; tests substitute deterministic stubs.
#[async_trait]
pub trait AnswerJudge: Send + Sync {
    async fn evaluate_objective(
        &self,
        question: &str,
        reference: &str,
        answer: &str,
    ) -> Result<ObjectiveEvaluation, AppError>;

    async fn evaluate_rubric(
        &self,
        framework: &RubricFramework,
        question: &str,
        answer: &str,
    ) -> Result<RubricEvaluation, AppError>;
}

/// LLM-backed judge.
pub struct LlmJudge {
    llm: LlmClient,
}

impl LlmJudge {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[derive(Debug, Deserialize)]
struct RubricWire {
    components: Vec<ComponentWire>,
    summary: String,
}

#[derive(Debug, Deserialize)]
struct ComponentWire {
    name: String,
    score: f64,
    #[serde(default)]
    feedback: String,
}

#[async_trait]
impl AnswerJudge for LlmJudge {
    async fn evaluate_objective(
        &self,
        question: &str,
        reference: &str,
        answer: &str,
    ) -> Result<ObjectiveEvaluation, AppError> {
        let prompt = OBJECTIVE_EVALUATION_TEMPLATE
            .replace("{question}", question)
            .replace("{reference}", reference)
            .replace("{answer}", answer);

        self.llm
            .call_json::<ObjectiveEvaluation>(&prompt, OBJECTIVE_EVALUATION_SYSTEM)
            .await
            .map_err(|e| AppError::GradingUnavailable(format!("objective evaluation failed: {e}")))
    }

    async fn evaluate_rubric(
        &self,
        framework: &RubricFramework,
        question: &str,
        answer: &str,
    ) -> Result<RubricEvaluation, AppError> {
        let system = RUBRIC_EVALUATION_SYSTEM_TEMPLATE
            .replace("{framework}", framework.name)
            .replace("{components}", &framework.components.join(", "));
        let prompt = RUBRIC_EVALUATION_TEMPLATE
            .replace("{question}", question)
            .replace("{answer}", answer);

        let wire: RubricWire = self
            .llm
            .call_json(&prompt, &system)
            .await
            .map_err(|e| AppError::GradingUnavailable(format!("rubric evaluation failed: {e}")))?;

        validate_rubric(framework, wire)
    }
}

/// Checks the judge response against the framework: component count must
/// match, names are normalized to the framework's, and scores are clamped
/// into 0–100.
fn validate_rubric(
    framework: &RubricFramework,
    wire: RubricWire,
) -> Result<RubricEvaluation, AppError> {
    if wire.components.len() != framework.components.len() {
        return Err(AppError::GradingUnavailable(format!(
            "judge returned {} rubric components, expected {}",
            wire.components.len(),
            framework.components.len()
        )));
    }

    let mut components = Vec::with_capacity(wire.components.len());
    for (expected, got) in framework.components.iter().zip(wire.components) {
        if !got.name.eq_ignore_ascii_case(expected) {
            warn!(
                "Judge renamed rubric component {expected:?} to {:?}; keeping the framework name",
                got.name
            );
        }
        components.push(ComponentScore {
            name: (*expected).to_string(),
            score: got.score.clamp(0.0, 100.0),
            feedback: got.feedback,
        });
    }

    Ok(RubricEvaluation {
        components,
        summary: wire.summary,
    })
}
