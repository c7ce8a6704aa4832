use std::sync::Arc;

use crate::assessment::generator::QuestionGenerator;
use crate::assessment::judge::AnswerJudge;
use crate::assessment::store::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: SessionStore,
    /// Question generation collaborator. Swapped for a stub in tests.
    pub generator: Arc<dyn QuestionGenerator>,
    /// Grading collaborator for free-text, code, and behavioral answers.
    pub judge: Arc<dyn AnswerJudge>,
}
