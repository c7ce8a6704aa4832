// All LLM prompt constants for the assessment engine: question generation
// templates per type, the objective evaluator, and the rubric evaluator.

/// System prompt for question generation — enforces JSON-only output.
pub const QUESTION_GENERATION_SYSTEM: &str =
    "You are a senior software engineer writing technical interview content. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Multiple-choice generation template. Replace `{topic}` and `{difficulty}`.
pub const MULTIPLE_CHOICE_PROMPT_TEMPLATE: &str = r#"Generate one multiple-choice question to test a candidate's understanding of {topic} at a {difficulty} level.

Provide a clear question and four distinct options, exactly one of them correct.

Return a JSON object with this EXACT schema (no extra fields):
{
  "question": "the full question text",
  "options": ["option 1", "option 2", "option 3", "option 4"],
  "answer": "the correct option, copied verbatim from options"
}"#;

/// Short-answer generation template. Replace `{topic}` and `{difficulty}`.
pub const SHORT_ANSWER_PROMPT_TEMPLATE: &str = r#"Generate one short-answer question to test a candidate's conceptual understanding of {topic} at a {difficulty} level.

The question must be answerable in one or two concise sentences.

Return a JSON object with this EXACT schema (no extra fields):
{
  "question": "the full question text",
  "answer": "a model correct answer"
}"#;

/// Code-challenge generation template. Replace `{topic}` and `{difficulty}`.
/// The reference solution must be raw code — no fences, no prose.
pub const CODE_CHALLENGE_PROMPT_TEMPLATE: &str = r#"Generate one code challenge to test a candidate's practical application of {topic} at a {difficulty} level.

Provide a clear problem description, a starter snippet the candidate completes, and the reference solution.

Return a JSON object with this EXACT schema (no extra fields):
{
  "question": "the full problem description",
  "language": "the implementation language, e.g. javascript",
  "starter_code": "a small starter snippet the candidate fills in",
  "answer": "the reference solution as raw code only — no markdown, no code fences, no block quotes"
}"#;

/// Appended to a generation prompt when re-producing a previously missed
/// question for a retake. Replace `{source_question}`.
pub const REGENERATE_NOTE_TEMPLATE: &str = "\
This question replaces one the candidate previously missed. \
Cover the same concept as the question below, without repeating it verbatim:\n\
{source_question}";

/// System prompt for the objective answer evaluator — enforces JSON-only output.
pub const OBJECTIVE_EVALUATION_SYSTEM: &str =
    "You are a meticulous and fair technical interview evaluator. \
    You grade a user's answer against a question and a model answer. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Objective evaluation template.
/// Replace `{question}`, `{reference}`, `{answer}`.
pub const OBJECTIVE_EVALUATION_TEMPLATE: &str = r#"Evaluate the user's answer.

Evaluation steps:
1. Re-read the question and identify all of its key constraints (timeframes, technologies, required formats, ...).
2. Compare the user's answer against those constraints. The answer is correct if it satisfies all key constraints, even when the wording differs from the model answer.
3. Write brief, constructive feedback explaining why the answer is correct or incorrect, referencing the specific constraints.
4. Validate the model answer against the question's constraints as well. If it is flawed, correct it — the "correct_answer" you return is shown to the user.

Return a JSON object with this EXACT schema (no extra fields):
{
  "is_correct": true,
  "feedback": "your constructive feedback",
  "correct_answer": "the verified, truly correct answer"
}

Question: "{question}"
Model Answer: "{reference}"
User's Answer: "{answer}""#;

/// System prompt for the rubric (behavioral) evaluator.
/// Replace `{framework}` and `{components}` (comma-separated, in order).
pub const RUBRIC_EVALUATION_SYSTEM_TEMPLATE: &str = r#"You are an expert interview coach specializing in the {framework} method ({components}). Evaluate the user's answer, scoring each component 0-100 with concise, constructive feedback.

Return ONLY valid JSON with this EXACT schema — one entry per component, in the order listed above:
{
  "components": [
    { "name": "the component name", "score": 0, "feedback": "concise feedback for this component" }
  ],
  "summary": "a brief overall summary of the user's answer"
}
Do NOT include any text outside the JSON object. Do NOT use markdown code fences."#;

/// Rubric evaluation template. Replace `{question}` and `{answer}`.
pub const RUBRIC_EVALUATION_TEMPLATE: &str = r#"Question: "{question}"

User's Answer: "{answer}"

Evaluate the answer using the method described in your instructions and provide structured, per-component feedback."#;

/// Question bank for behavioral sessions — sampled instead of LLM-generated.
pub const BEHAVIORAL_QUESTION_BANK: &[&str] = &[
    "Tell me about a time you had to work with a difficult colleague.",
    "Describe a time you had to learn a new technology quickly.",
    "Tell me about a time you disagreed with a manager or a technical lead.",
    "Describe a project you are particularly proud of and explain your role in it.",
    "Tell me about a time you failed or made a mistake at work.",
    "Describe a time you had to handle a tight deadline or high-pressure situation.",
    "How do you handle constructive criticism?",
    "Tell me about a time you had to persuade someone to see your point of view.",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_templates_carry_topic_and_difficulty_slots() {
        for template in [
            MULTIPLE_CHOICE_PROMPT_TEMPLATE,
            SHORT_ANSWER_PROMPT_TEMPLATE,
            CODE_CHALLENGE_PROMPT_TEMPLATE,
        ] {
            assert!(template.contains("{topic}"));
            assert!(template.contains("{difficulty}"));
        }
    }

    #[test]
    fn test_behavioral_bank_is_nonempty() {
        assert!(!BEHAVIORAL_QUESTION_BANK.is_empty());
    }
}
