use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

pub const QUESTIONS_PER_PAGE: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub category: i64,
    pub difficulty: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewQuestion {
    pub question: String,
    pub answer: String,
    pub category: i64,
    pub difficulty: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuizCategory {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub issue: String,
}

pub fn validate_new_question(payload: &NewQuestion) -> Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    if payload.question.trim().is_empty() {
        issues.push(ValidationIssue {
            field: "question".into(),
            issue: "must not be empty".into(),
        });
    }
    if payload.answer.trim().is_empty() {
        issues.push(ValidationIssue {
            field: "answer".into(),
            issue: "must not be empty".into(),
        });
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

/// Slice of `questions` for a 1-based page number; empty when out of range.
pub fn paginate(questions: &[Question], page: i64) -> &[Question] {
    if page < 1 {
        return &[];
    }
    let start = (page as usize - 1) * QUESTIONS_PER_PAGE;
    if start >= questions.len() {
        return &[];
    }
    let end = (start + QUESTIONS_PER_PAGE).min(questions.len());
    &questions[start..end]
}

pub fn matches_term(question: &Question, term: &str) -> bool {
    question
        .question
        .to_lowercase()
        .contains(&term.to_lowercase())
}

/// Uniform random draw over `pool` minus the already-asked ids.
pub fn pick_unseen<'a>(pool: &'a [Question], previous: &[i64]) -> Option<&'a Question> {
    let candidates: Vec<&Question> = pool
        .iter()
        .filter(|q| !previous.contains(&q.id))
        .collect();
    candidates.choose(&mut rand::thread_rng()).copied()
}
