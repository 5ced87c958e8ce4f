use crate::error::ApiError;
use crate::models::{
    matches_term, paginate, pick_unseen, validate_new_question, NewQuestion, Question,
    QuizCategory,
};
use crate::state::AppState;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

fn request_id_from_headers(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub success: bool,
    pub categories: BTreeMap<i64, String>,
}

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoriesResponse>, ApiError> {
    let categories = state.db.categories_map().await;
    Ok(Json(CategoriesResponse {
        success: true,
        categories,
    }))
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct QuestionPageResponse {
    pub success: bool,
    pub questions: Vec<Question>,
    pub total_questions: usize,
    pub categories: BTreeMap<i64, String>,
}

pub async fn list_questions(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<QuestionPageResponse>, ApiError> {
    let Query(query) = query?;
    let page = query.page.unwrap_or(1);

    let all = state.db.questions_sorted().await;
    let slice = paginate(&all, page);
    if slice.is_empty() {
        return Err(ApiError::NotFound);
    }

    Ok(Json(QuestionPageResponse {
        success: true,
        questions: slice.to_vec(),
        total_questions: all.len(),
        categories: state.db.categories_map().await,
    }))
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub success: bool,
    pub created: i64,
    pub questions: Vec<Question>,
    pub total_questions: usize,
}

pub async fn create_question(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<NewQuestion>, JsonRejection>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let req_id = request_id_from_headers(&headers);
    let Json(payload) = payload?;

    if let Err(issues) = validate_new_question(&payload) {
        warn!(request_id = %req_id, ?issues, "rejected question payload");
        return Err(ApiError::Unprocessable);
    }

    let created = state.create_question(payload).await?;
    info!(request_id = %req_id, id = created.id, "question created");

    let all = state.db.questions_sorted().await;
    Ok(Json(CreatedResponse {
        success: true,
        created: created.id,
        questions: paginate(&all, 1).to_vec(),
        total_questions: all.len(),
    }))
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub success: bool,
    pub deleted: i64,
}

pub async fn delete_question(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let req_id = request_id_from_headers(&headers);
    let Path(id) = id?;
    let deleted = state.delete_question(id).await?;
    info!(request_id = %req_id, id = deleted, "question deleted");
    Ok(Json(DeletedResponse {
        success: true,
        deleted,
    }))
}

#[derive(Debug, Serialize)]
pub struct CategoryQuestionsResponse {
    pub success: bool,
    pub questions: Vec<Question>,
    #[serde(rename = "totalQuestions")]
    pub total_questions: usize,
    #[serde(rename = "currentCategory")]
    pub current_category: i64,
}

pub async fn category_questions(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<CategoryQuestionsResponse>, ApiError> {
    let Path(id) = id?;
    let questions: Vec<Question> = state
        .db
        .questions_sorted()
        .await
        .into_iter()
        .filter(|q| q.category == id)
        .collect();
    if questions.is_empty() {
        return Err(ApiError::NotFound);
    }

    Ok(Json(CategoryQuestionsResponse {
        success: true,
        total_questions: questions.len(),
        questions,
        current_category: id,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SearchPayload {
    #[serde(rename = "searchTerm")]
    pub search_term: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub questions: Vec<Question>,
    pub total_questions: usize,
}

pub async fn search_questions(
    State(state): State<AppState>,
    payload: Result<Json<SearchPayload>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(payload) = payload?;
    let questions: Vec<Question> = state
        .db
        .questions_sorted()
        .await
        .into_iter()
        .filter(|q| matches_term(q, &payload.search_term))
        .collect();

    // An empty result is a valid answer here, not a 404.
    Ok(Json(SearchResponse {
        success: true,
        total_questions: questions.len(),
        questions,
    }))
}

#[derive(Debug, Deserialize)]
pub struct QuizPayload {
    #[serde(default)]
    pub previous_questions: Vec<i64>,
    pub quiz_category: Option<QuizCategory>,
}

#[derive(Debug, Serialize)]
pub struct QuizResponse {
    pub success: bool,
    pub question: Option<Question>,
}

pub async fn play_quiz(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<QuizPayload>, JsonRejection>,
) -> Result<Json<QuizResponse>, ApiError> {
    let req_id = request_id_from_headers(&headers);
    let Json(payload) = payload?;

    // Category id 0 (the frontend's "all") and a missing category both mean
    // the whole question pool.
    let category_id = payload.quiz_category.as_ref().map(|c| c.id).unwrap_or(0);
    if let Some(category) = payload.quiz_category.as_ref() {
        tracing::debug!(request_id = %req_id, category = %category.kind, "quiz draw requested");
    }
    let pool: Vec<Question> = state
        .db
        .questions_sorted()
        .await
        .into_iter()
        .filter(|q| category_id == 0 || q.category == category_id)
        .collect();

    let question = pick_unseen(&pool, &payload.previous_questions).cloned();
    if question.is_none() {
        info!(request_id = %req_id, category_id, "quiz pool exhausted");
    }

    Ok(Json(QuizResponse {
        success: true,
        question,
    }))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
