//! Domain models for the assessment engine: sessions, questions, answer
//! results, grade outcomes, and the closed test-type/difficulty enums.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed set of supported test types. Adding a type means adding one
/// strategy implementation in `strategy.rs` — nothing else branches on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestType {
    ShortAnswer,
    MultipleChoice,
    CodeChallenge,
    BehavioralStar,
    BehavioralSoar,
}

impl TestType {
    /// Wire/display name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TestType::ShortAnswer => "short_answer",
            TestType::MultipleChoice => "multiple_choice",
            TestType::CodeChallenge => "code_challenge",
            TestType::BehavioralStar => "behavioral_star",
            TestType::BehavioralSoar => "behavioral_soar",
        }
    }
}

/// Difficulty of a session. Behavioral sessions carry the `N/A` sentinel;
/// technical sessions must carry one of the three real levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Junior,
    #[serde(rename = "Mid-Level")]
    MidLevel,
    Senior,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Junior => "Junior",
            Difficulty::MidLevel => "Mid-Level",
            Difficulty::Senior => "Senior",
            Difficulty::NotApplicable => "N/A",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
}

/// One attempt at an assessment: a fixed, ordered list of questions answered
/// one at a time. `score` is absent while in progress and frozen exactly once
/// when the last answer lands.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub topic: String,
    pub difficulty: Difficulty,
    #[serde(rename = "type")]
    pub test_type: TestType,
    pub status: SessionStatus,
    pub score: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Type-specific question payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionPayload {
    /// No extra payload (short answer, behavioral).
    None,
    /// Enumerated option strings for multiple choice.
    Options { options: Vec<String> },
    /// Starter snippet for a code challenge.
    Starter { language: String, snippet: String },
}

/// A stored question, reference answer included. Never serialized to callers
/// directly — views go through `QuestionView`, which withholds the reference.
#[derive(Debug, Clone)]
pub struct Question {
    pub id: Uuid,
    pub session_id: Uuid,
    pub sequence_index: usize,
    pub question_text: String,
    pub payload: QuestionPayload,
    pub reference_answer: String,
}

/// Caller-facing projection of a question: everything except the reference
/// answer, which stays withheld until the question is answered.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: Uuid,
    pub session_id: Uuid,
    pub sequence_index: usize,
    pub question_text: String,
    pub payload: QuestionPayload,
}

impl From<&Question> for QuestionView {
    fn from(question: &Question) -> Self {
        QuestionView {
            id: question.id,
            session_id: question.session_id,
            sequence_index: question.sequence_index,
            question_text: question.question_text.clone(),
            payload: question.payload.clone(),
        }
    }
}

/// One scored rubric component of a behavioral answer (e.g. "Situation").
#[derive(Debug, Clone, Serialize)]
pub struct ComponentScore {
    pub name: String,
    pub score: f64,
    pub feedback: String,
}

/// How a submitted answer was graded: a boolean verdict for objective types,
/// or a per-component rubric breakdown for behavioral types.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GradeOutcome {
    Objective {
        is_correct: bool,
    },
    Rubric {
        components: Vec<ComponentScore>,
        summary: String,
    },
}

impl GradeOutcome {
    pub fn is_incorrect(&self) -> bool {
        matches!(self, GradeOutcome::Objective { is_correct: false })
    }

    /// Mean of the rubric component scores; `None` for objective outcomes.
    pub fn composite(&self) -> Option<f64> {
        match self {
            GradeOutcome::Objective { .. } => None,
            GradeOutcome::Rubric { components, .. } => {
                if components.is_empty() {
                    return Some(0.0);
                }
                Some(components.iter().map(|c| c.score).sum::<f64>() / components.len() as f64)
            }
        }
    }
}

/// The answer slot created alongside each question. Filled exactly once on
/// submission; a completed session's results are read-only.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerResult {
    pub question_id: Uuid,
    pub user_answer: Option<String>,
    pub outcome: Option<GradeOutcome>,
    pub feedback: Option<String>,
}

impl AnswerResult {
    pub fn unanswered(question_id: Uuid) -> Self {
        AnswerResult {
            question_id,
            user_answer: None,
            outcome: None,
            feedback: None,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.user_answer.is_some()
    }

    /// Missed = graded incorrect (objective types) or never answered.
    /// Rubric-graded answers are never "missed" — they have no boolean verdict.
    pub fn is_missed(&self) -> bool {
        match &self.outcome {
            Some(outcome) => outcome.is_incorrect(),
            None => true,
        }
    }
}

/// Submission payload, tagged by answer shape. Validated against the
/// session's type at the boundary — a shape mismatch is rejected before any
/// grading call.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnswerPayload {
    /// Free text (short answer).
    Text(String),
    /// Exactly one option string (multiple choice).
    Choice(String),
    /// Source text (code challenge).
    Code(String),
    /// Narrative text (behavioral).
    Narrative(String),
}

impl AnswerPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            AnswerPayload::Text(_) => "text",
            AnswerPayload::Choice(_) => "choice",
            AnswerPayload::Code(_) => "code",
            AnswerPayload::Narrative(_) => "narrative",
        }
    }
}
