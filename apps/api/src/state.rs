use std::sync::Arc;

use crate::recognizer::EntityRecognizer;
use crate::skills::fetcher::Fetcher;

/// Shared application state injected into all route handlers via Axum extractors.
/// Built once at startup and never mutated.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: Fetcher,
    /// Pluggable recognizer. Default: PatternRuler loaded from SKILL_PATTERNS_PATH.
    pub recognizer: Arc<dyn EntityRecognizer>,
}
