//! Question Generator — the content collaborator that produces a session's
//! question batch. The engine fixes the batch size per type at session start;
//! each type's strategy decides how its questions are sourced (LLM prompt or
//! question bank).

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::Deserialize;
use tracing::info;

use crate::assessment::models::{Difficulty, QuestionPayload, TestType};
use crate::assessment::prompts::{QUESTION_GENERATION_SYSTEM, REGENERATE_NOTE_TEMPLATE};
use crate::assessment::strategy::{strategy_for, GenerationSource};
use crate::errors::AppError;
use crate::llm_client::LlmClient;

/// What the engine asks the generator for.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub topic: String,
    pub difficulty: Difficulty,
    pub test_type: TestType,
    pub count: usize,
}

/// One generated question. The reference answer is included here — it is the
/// lifecycle layer, not the generator, that withholds it from callers.
#[derive(Debug, Clone)]
pub struct GeneratedQuestion {
    pub question_text: String,
    pub payload: QuestionPayload,
    pub reference_answer: String,
}

/// Raw collaborator output before the type's strategy validates its shape.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedQuestionWire {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub starter_code: Option<String>,
}

/// The question generation contract. Carried in `AppState` as
/// `Arc<dyn QuestionGenerator>`; tests substitute deterministic stubs.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Produces `req.count` fresh questions for the topic.
    async fn generate(&self, req: &GenerationRequest) -> Result<Vec<GeneratedQuestion>, AppError>;

    /// Re-produces questions covering exactly the given source prompts, one
    /// per prompt and in order (used by retake-incorrect).
    async fn regenerate(
        &self,
        req: &GenerationRequest,
        source_prompts: &[String],
    ) -> Result<Vec<GeneratedQuestion>, AppError>;
}

/// LLM-backed generator.
pub struct LlmGenerator {
    llm: LlmClient,
}

impl LlmGenerator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    async fn generate_one(
        &self,
        req: &GenerationRequest,
        variant_note: Option<&str>,
    ) -> Result<GeneratedQuestion, AppError> {
        let strategy = strategy_for(req.test_type);
        match strategy.generation() {
            GenerationSource::Prompted { template } => {
                let mut prompt = template
                    .replace("{topic}", &req.topic)
                    .replace("{difficulty}", req.difficulty.as_str());
                if let Some(note) = variant_note {
                    prompt.push_str("\n\n");
                    prompt.push_str(note);
                }

                let wire: GeneratedQuestionWire = self
                    .llm
                    .call_json(&prompt, QUESTION_GENERATION_SYSTEM)
                    .await
                    .map_err(|e| AppError::Generator(format!("question generation failed: {e}")))?;

                strategy.decode_generated(wire)
            }
            GenerationSource::Bank(bank) => {
                let question = bank
                    .choose(&mut rand::thread_rng())
                    .copied()
                    .unwrap_or("Describe a project you are particularly proud of.");
                Ok(GeneratedQuestion {
                    question_text: question.to_string(),
                    payload: QuestionPayload::None,
                    reference_answer: "N/A".to_string(),
                })
            }
        }
    }
}

#[async_trait]
impl QuestionGenerator for LlmGenerator {
    async fn generate(&self, req: &GenerationRequest) -> Result<Vec<GeneratedQuestion>, AppError> {
        info!(
            "Generating {} {} questions for \"{}\" ({})",
            req.count,
            req.test_type.as_str(),
            req.topic,
            req.difficulty.as_str()
        );

        let mut questions = Vec::with_capacity(req.count);
        for _ in 0..req.count {
            questions.push(self.generate_one(req, None).await?);
        }
        Ok(questions)
    }

    async fn regenerate(
        &self,
        req: &GenerationRequest,
        source_prompts: &[String],
    ) -> Result<Vec<GeneratedQuestion>, AppError> {
        info!(
            "Regenerating {} {} questions for \"{}\"",
            source_prompts.len(),
            req.test_type.as_str(),
            req.topic
        );

        let mut questions = Vec::with_capacity(source_prompts.len());
        for source in source_prompts {
            let note = REGENERATE_NOTE_TEMPLATE.replace("{source_question}", source);
            questions.push(self.generate_one(req, Some(&note)).await?);
        }
        Ok(questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_deserializes_with_optional_fields_absent() {
        let json = r#"{"question": "What is normalization?", "answer": "Organizing data to reduce redundancy."}"#;
        let wire: GeneratedQuestionWire = serde_json::from_str(json).unwrap();
        assert!(wire.options.is_none());
        assert!(wire.language.is_none());
        assert!(wire.starter_code.is_none());
    }

    #[test]
    fn test_wire_deserializes_multiple_choice_shape() {
        let json = r#"{
            "question": "Which SQL clause filters grouped rows?",
            "options": ["WHERE", "HAVING", "GROUP BY", "ORDER BY"],
            "answer": "HAVING"
        }"#;
        let wire: GeneratedQuestionWire = serde_json::from_str(json).unwrap();
        assert_eq!(wire.options.unwrap().len(), 4);
        assert_eq!(wire.answer, "HAVING");
    }
}
