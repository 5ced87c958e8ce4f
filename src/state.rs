use crate::models::{Category, NewQuestion, Question};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::warn;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("question {0} does not exist")]
    QuestionMissing(i64),
    #[error("category {0} does not exist")]
    CategoryMissing(i64),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedData {
    pub categories: Vec<Category>,
    pub questions: Vec<Question>,
}

pub struct InMemoryDb {
    pub categories: RwLock<BTreeMap<i64, String>>,
    pub questions: RwLock<HashMap<i64, Question>>,
    next_question_id: AtomicI64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistentSnapshot {
    categories: BTreeMap<i64, String>,
    questions: HashMap<i64, Question>,
    next_question_id: i64,
    saved_at: DateTime<Utc>,
}

impl InMemoryDb {
    pub fn new(snapshot_path: Option<&str>, seed: SeedData) -> Self {
        let snapshot = snapshot_path.and_then(|path| {
            let raw = fs::read_to_string(path).ok()?;
            match serde_json::from_str::<PersistentSnapshot>(&raw) {
                Ok(s) => Some(s),
                Err(err) => {
                    warn!("failed to read local snapshot {}: {}", path, err);
                    None
                }
            }
        });

        let (categories, questions, next_hint) = match snapshot {
            Some(s) => (s.categories, s.questions, s.next_question_id),
            None => {
                let categories: BTreeMap<i64, String> =
                    seed.categories.into_iter().map(|c| (c.id, c.kind)).collect();
                let questions: HashMap<i64, Question> =
                    seed.questions.into_iter().map(|q| (q.id, q)).collect();
                (categories, questions, 1)
            }
        };

        let next_question_id = next_hint.max(questions.keys().max().copied().unwrap_or(0) + 1);

        Self {
            categories: RwLock::new(categories),
            questions: RwLock::new(questions),
            next_question_id: AtomicI64::new(next_question_id),
        }
    }

    pub fn next_question_id(&self) -> i64 {
        self.next_question_id.fetch_add(1, Ordering::SeqCst)
    }

    /// All questions ordered by ascending id, the order every listing uses.
    pub async fn questions_sorted(&self) -> Vec<Question> {
        let mut questions: Vec<Question> = self.questions.read().await.values().cloned().collect();
        questions.sort_by_key(|q| q.id);
        questions
    }

    pub async fn categories_map(&self) -> BTreeMap<i64, String> {
        self.categories.read().await.clone()
    }

    async fn snapshot(&self) -> PersistentSnapshot {
        PersistentSnapshot {
            categories: self.categories.read().await.clone(),
            questions: self.questions.read().await.clone(),
            next_question_id: self.next_question_id.load(Ordering::SeqCst),
            saved_at: Utc::now(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<InMemoryDb>,
    pub local_state_path: Option<String>,
}

impl AppState {
    pub fn new(seed: SeedData) -> Self {
        let local_state_path = std::env::var("LOCAL_STATE_PATH")
            .ok()
            .filter(|v| !v.trim().is_empty());
        Self {
            db: Arc::new(InMemoryDb::new(local_state_path.as_deref(), seed)),
            local_state_path,
        }
    }

    pub async fn create_question(&self, payload: NewQuestion) -> Result<Question, StoreError> {
        if !self.db.categories.read().await.contains_key(&payload.category) {
            return Err(StoreError::CategoryMissing(payload.category));
        }

        let id = self.db.next_question_id();
        let question = Question {
            id,
            question: payload.question,
            answer: payload.answer,
            category: payload.category,
            difficulty: payload.difficulty,
        };
        self.db.questions.write().await.insert(id, question.clone());
        if let Err(err) = self.persist_core_data().await {
            warn!("failed to persist local state after create_question: {}", err);
        }
        Ok(question)
    }

    pub async fn delete_question(&self, id: i64) -> Result<i64, StoreError> {
        self.db
            .questions
            .write()
            .await
            .remove(&id)
            .ok_or(StoreError::QuestionMissing(id))?;
        if let Err(err) = self.persist_core_data().await {
            warn!("failed to persist local state after delete_question: {}", err);
        }
        Ok(id)
    }

    pub async fn persist_core_data(&self) -> anyhow::Result<()> {
        let Some(path) = self.local_state_path.as_ref() else {
            return Ok(());
        };
        let snapshot = self.db.snapshot().await;
        let serialized = serde_json::to_vec_pretty(&snapshot)?;
        if let Some(parent) = Path::new(path).parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, serialized).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> SeedData {
        SeedData {
            categories: vec![
                Category { id: 1, kind: "Science".into() },
                Category { id: 2, kind: "Art".into() },
            ],
            questions: vec![Question {
                id: 7,
                question: "La Giaconda is better known as what?".into(),
                answer: "Mona Lisa".into(),
                category: 2,
                difficulty: 3,
            }],
        }
    }

    fn state() -> AppState {
        AppState {
            db: Arc::new(InMemoryDb::new(None, seed())),
            local_state_path: None,
        }
    }

    #[tokio::test]
    async fn create_assigns_fresh_ids_after_seed() {
        let state = state();
        let created = state
            .create_question(NewQuestion {
                question: "Who discovered penicillin?".into(),
                answer: "Alexander Fleming".into(),
                category: 1,
                difficulty: 3,
            })
            .await
            .unwrap();
        assert_eq!(created.id, 8);
        assert_eq!(state.db.questions_sorted().await.len(), 2);
    }

    #[tokio::test]
    async fn create_rejects_unknown_category() {
        let state = state();
        let err = state
            .create_question(NewQuestion {
                question: "Lost question".into(),
                answer: "Lost answer".into(),
                category: 99,
                difficulty: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::CategoryMissing(99)));
    }

    #[tokio::test]
    async fn delete_is_permanent() {
        let state = state();
        assert_eq!(state.delete_question(7).await.unwrap(), 7);
        assert!(state.db.questions.read().await.get(&7).is_none());
        let err = state.delete_question(7).await.unwrap_err();
        assert!(matches!(err, StoreError::QuestionMissing(7)));
    }
}
