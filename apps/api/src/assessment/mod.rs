//! The skills-assessment session engine ("Test Hub"): bounded question
//! sequences per topic, one-at-a-time answering, objective and rubric
//! grading, resume of interrupted attempts, and retake-incorrect derivation.

pub mod generator;
pub mod handlers;
pub mod history;
pub mod judge;
pub mod lifecycle;
pub mod models;
pub mod prompts;
pub mod scoring;
pub mod store;
pub mod strategy;

#[cfg(test)]
pub(crate) mod testing;
