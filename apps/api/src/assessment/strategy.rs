//! Question-type strategies — the single place that knows how each test type
//! shapes its payload, sources its questions, encodes answers, and grades
//! submissions.
//!
//! Everything else dispatches through `strategy_for`; lifecycle code must
//! never match on `TestType` itself. Adding a type means adding one strategy
//! implementation here.

use async_trait::async_trait;

use crate::assessment::generator::{GeneratedQuestion, GeneratedQuestionWire};
use crate::assessment::judge::{AnswerJudge, RubricFramework, SOAR, STAR};
use crate::assessment::models::{
    AnswerPayload, Difficulty, GradeOutcome, Question, QuestionPayload, TestType,
};
use crate::assessment::prompts::{
    BEHAVIORAL_QUESTION_BANK, CODE_CHALLENGE_PROMPT_TEMPLATE, MULTIPLE_CHOICE_PROMPT_TEMPLATE,
    SHORT_ANSWER_PROMPT_TEMPLATE,
};
use crate::errors::AppError;

/// How a strategy sources its questions from the generator collaborator.
pub enum GenerationSource {
    /// LLM generation from a template with `{topic}` / `{difficulty}` slots.
    Prompted { template: &'static str },
    /// Sampled from a fixed question bank (topic and difficulty play no role).
    Bank(&'static [&'static str]),
}

/// A graded submission: the outcome plus caller-facing feedback, and
/// optionally a judge-corrected reference answer for display.
#[derive(Debug, Clone)]
pub struct GradedAnswer {
    pub outcome: GradeOutcome,
    pub feedback: String,
    pub reference_override: Option<String>,
}

#[async_trait]
pub trait QuestionStrategy: Send + Sync {
    fn test_type(&self) -> TestType;

    /// Number of questions created per session, fixed at start.
    fn question_count(&self) -> usize {
        5
    }

    /// Session topic override for types where the caller's topic is irrelevant.
    fn fixed_topic(&self) -> Option<&'static str> {
        None
    }

    /// Validates/normalizes the caller-supplied difficulty for this type.
    fn resolve_difficulty(&self, requested: Option<Difficulty>) -> Result<Difficulty, AppError> {
        match requested {
            Some(Difficulty::NotApplicable) | None => Err(AppError::Validation(format!(
                "difficulty is required for {} tests",
                self.test_type().as_str()
            ))),
            Some(difficulty) => Ok(difficulty),
        }
    }

    fn generation(&self) -> GenerationSource;

    /// Validates the generator's raw output shape for this type.
    fn decode_generated(&self, wire: GeneratedQuestionWire) -> Result<GeneratedQuestion, AppError>;

    /// Validates the submission payload shape and extracts the raw answer.
    fn encode_answer(&self, payload: &AnswerPayload) -> Result<String, AppError>;

    /// Grades a raw answer, delegating to the judge where the type needs one.
    async fn grade(
        &self,
        judge: &dyn AnswerJudge,
        question: &Question,
        answer: &str,
    ) -> Result<GradedAnswer, AppError>;
}

fn shape_mismatch(expected: &str, got: &AnswerPayload, test_type: TestType) -> AppError {
    AppError::Validation(format!(
        "expected a {expected} answer for a {} question, got {}",
        test_type.as_str(),
        got.kind()
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Short answer — judge-graded free text
// ────────────────────────────────────────────────────────────────────────────

pub struct ShortAnswerStrategy;

#[async_trait]
impl QuestionStrategy for ShortAnswerStrategy {
    fn test_type(&self) -> TestType {
        TestType::ShortAnswer
    }

    fn generation(&self) -> GenerationSource {
        GenerationSource::Prompted {
            template: SHORT_ANSWER_PROMPT_TEMPLATE,
        }
    }

    fn decode_generated(&self, wire: GeneratedQuestionWire) -> Result<GeneratedQuestion, AppError> {
        Ok(GeneratedQuestion {
            question_text: wire.question,
            payload: QuestionPayload::None,
            reference_answer: wire.answer,
        })
    }

    fn encode_answer(&self, payload: &AnswerPayload) -> Result<String, AppError> {
        match payload {
            AnswerPayload::Text(text) => Ok(text.clone()),
            other => Err(shape_mismatch("text", other, self.test_type())),
        }
    }

    async fn grade(
        &self,
        judge: &dyn AnswerJudge,
        question: &Question,
        answer: &str,
    ) -> Result<GradedAnswer, AppError> {
        let eval = judge
            .evaluate_objective(&question.question_text, &question.reference_answer, answer)
            .await?;
        Ok(GradedAnswer {
            outcome: GradeOutcome::Objective {
                is_correct: eval.is_correct,
            },
            feedback: eval.feedback,
            reference_override: eval.correct_answer,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Multiple choice — graded locally by exact match
// ────────────────────────────────────────────────────────────────────────────

pub struct MultipleChoiceStrategy;

#[async_trait]
impl QuestionStrategy for MultipleChoiceStrategy {
    fn test_type(&self) -> TestType {
        TestType::MultipleChoice
    }

    fn generation(&self) -> GenerationSource {
        GenerationSource::Prompted {
            template: MULTIPLE_CHOICE_PROMPT_TEMPLATE,
        }
    }

    fn decode_generated(&self, wire: GeneratedQuestionWire) -> Result<GeneratedQuestion, AppError> {
        let options = wire.options.unwrap_or_default();
        if options.len() < 2 {
            return Err(AppError::Generator(
                "multiple-choice question needs at least two options".to_string(),
            ));
        }
        if !options.contains(&wire.answer) {
            return Err(AppError::Generator(
                "multiple-choice correct answer is not among the options".to_string(),
            ));
        }
        Ok(GeneratedQuestion {
            question_text: wire.question,
            payload: QuestionPayload::Options { options },
            reference_answer: wire.answer,
        })
    }

    fn encode_answer(&self, payload: &AnswerPayload) -> Result<String, AppError> {
        match payload {
            AnswerPayload::Choice(option) => Ok(option.clone()),
            other => Err(shape_mismatch("choice", other, self.test_type())),
        }
    }

    async fn grade(
        &self,
        _judge: &dyn AnswerJudge,
        question: &Question,
        answer: &str,
    ) -> Result<GradedAnswer, AppError> {
        // Exact match against the stored correct option; no judge involved.
        let is_correct = answer == question.reference_answer;
        let feedback = if is_correct {
            "Correct.".to_string()
        } else {
            format!(
                "Incorrect. The correct option is \"{}\".",
                question.reference_answer
            )
        };
        Ok(GradedAnswer {
            outcome: GradeOutcome::Objective { is_correct },
            feedback,
            reference_override: None,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Code challenge — one question, judged externally (never executed in-engine)
// ────────────────────────────────────────────────────────────────────────────

pub struct CodeChallengeStrategy;

#[async_trait]
impl QuestionStrategy for CodeChallengeStrategy {
    fn test_type(&self) -> TestType {
        TestType::CodeChallenge
    }

    fn question_count(&self) -> usize {
        1
    }

    fn generation(&self) -> GenerationSource {
        GenerationSource::Prompted {
            template: CODE_CHALLENGE_PROMPT_TEMPLATE,
        }
    }

    fn decode_generated(&self, wire: GeneratedQuestionWire) -> Result<GeneratedQuestion, AppError> {
        Ok(GeneratedQuestion {
            question_text: wire.question,
            payload: QuestionPayload::Starter {
                language: wire.language.unwrap_or_else(|| "javascript".to_string()),
                snippet: wire.starter_code.unwrap_or_default(),
            },
            reference_answer: wire.answer,
        })
    }

    fn encode_answer(&self, payload: &AnswerPayload) -> Result<String, AppError> {
        match payload {
            AnswerPayload::Code(source) => Ok(source.clone()),
            other => Err(shape_mismatch("code", other, self.test_type())),
        }
    }

    async fn grade(
        &self,
        judge: &dyn AnswerJudge,
        question: &Question,
        answer: &str,
    ) -> Result<GradedAnswer, AppError> {
        let eval = judge
            .evaluate_objective(&question.question_text, &question.reference_answer, answer)
            .await?;
        Ok(GradedAnswer {
            outcome: GradeOutcome::Objective {
                is_correct: eval.is_correct,
            },
            feedback: eval.feedback,
            reference_override: eval.correct_answer,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Behavioral — bank-sourced questions, rubric-graded narratives
// ────────────────────────────────────────────────────────────────────────────

pub struct BehavioralStrategy {
    test_type: TestType,
    framework: &'static RubricFramework,
}

#[async_trait]
impl QuestionStrategy for BehavioralStrategy {
    fn test_type(&self) -> TestType {
        self.test_type
    }

    fn fixed_topic(&self) -> Option<&'static str> {
        Some("Behavioral")
    }

    fn resolve_difficulty(&self, _requested: Option<Difficulty>) -> Result<Difficulty, AppError> {
        // Caller-supplied difficulty is ignored for behavioral sessions.
        Ok(Difficulty::NotApplicable)
    }

    fn generation(&self) -> GenerationSource {
        GenerationSource::Bank(BEHAVIORAL_QUESTION_BANK)
    }

    fn decode_generated(&self, wire: GeneratedQuestionWire) -> Result<GeneratedQuestion, AppError> {
        Ok(GeneratedQuestion {
            question_text: wire.question,
            payload: QuestionPayload::None,
            reference_answer: wire.answer,
        })
    }

    fn encode_answer(&self, payload: &AnswerPayload) -> Result<String, AppError> {
        match payload {
            AnswerPayload::Narrative(text) => Ok(text.clone()),
            other => Err(shape_mismatch("narrative", other, self.test_type())),
        }
    }

    async fn grade(
        &self,
        judge: &dyn AnswerJudge,
        question: &Question,
        answer: &str,
    ) -> Result<GradedAnswer, AppError> {
        let eval = judge
            .evaluate_rubric(self.framework, &question.question_text, answer)
            .await?;
        Ok(GradedAnswer {
            feedback: eval.summary.clone(),
            outcome: GradeOutcome::Rubric {
                components: eval.components,
                summary: eval.summary,
            },
            reference_override: None,
        })
    }
}

static STAR_STRATEGY: BehavioralStrategy = BehavioralStrategy {
    test_type: TestType::BehavioralStar,
    framework: &STAR,
};

static SOAR_STRATEGY: BehavioralStrategy = BehavioralStrategy {
    test_type: TestType::BehavioralSoar,
    framework: &SOAR,
};

/// All supported types, in display order (drives the prompt matrix endpoint).
pub const ALL_TYPES: [TestType; 5] = [
    TestType::ShortAnswer,
    TestType::MultipleChoice,
    TestType::CodeChallenge,
    TestType::BehavioralStar,
    TestType::BehavioralSoar,
];

/// The strategy registry: one entry per `TestType` variant.
pub fn strategy_for(test_type: TestType) -> &'static dyn QuestionStrategy {
    match test_type {
        TestType::ShortAnswer => &ShortAnswerStrategy,
        TestType::MultipleChoice => &MultipleChoiceStrategy,
        TestType::CodeChallenge => &CodeChallengeStrategy,
        TestType::BehavioralStar => &STAR_STRATEGY,
        TestType::BehavioralSoar => &SOAR_STRATEGY,
    }
}
