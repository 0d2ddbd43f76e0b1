//! Entity recognition — trait-based, so the handler never knows which backend labels the text.
//!
//! Default: `PatternRuler` (rule-based, loaded from a JSONL pattern file at startup).
//! `AppState` holds an `Arc<dyn EntityRecognizer>`, built once in `main`.

pub mod ruler;
pub mod tokenizer;

use async_trait::async_trait;

use crate::errors::AppError;

pub use ruler::PatternRuler;

/// Only entities carrying exactly this label count as skills.
pub const SKILL_LABEL: &str = "SKILL";

/// A labelled span of the input text. `start`/`end` are byte offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub text: String,
    pub label: String,
    pub start: usize,
    pub end: usize,
}

impl Entity {
    pub fn is_skill(&self) -> bool {
        self.label == SKILL_LABEL
    }
}

/// The recognizer trait. Implement this to swap in a model-backed backend
/// without touching the scanner or handler code.
#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    async fn recognize(&self, text: &str) -> Result<Vec<Entity>, AppError>;
}
