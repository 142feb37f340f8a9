//! Pattern store boundary.
//!
//! The engine consumes rule sets, records usage, logs misses, and
//! persists feedback through this trait. The SQLite implementation lives
//! in `crate::database`; `MemoryPatternStore` backs tests and embedded
//! callers that do not want a database.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;

use super::confidence;
use super::models::{
    CompressionPattern, FeedbackEvent, MissEntry, MissKind, PassPriority,
};

/// Errors surfaced by pattern store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection or query failure in the backing store.
    #[error("Store error: {0}")]
    Database(String),

    /// Pattern or entry not present.
    #[error("Not found: {0}")]
    NotFound(String),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Create a database error with the given message.
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a not found error with the given message.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence contract consumed by the compression engine.
///
/// Implementations own the patterns; the engine only ever sees snapshots
/// and issues targeted mutations.
#[async_trait]
pub trait PatternStore: Send + Sync {
    /// Rule set for one pass at or above the given confidence.
    async fn patterns_by_priority(
        &self,
        priority: PassPriority,
        min_confidence: f64,
    ) -> StoreResult<Vec<CompressionPattern>>;

    /// Look up a single pattern by its original text (case-insensitive).
    async fn pattern_by_text(&self, text: &str) -> StoreResult<Option<CompressionPattern>>;

    /// Bump a pattern's usage counter. Best-effort semantics at the
    /// call site; under-counting on races is accepted.
    async fn increment_usage(&self, original_text: &str) -> StoreResult<()>;

    /// Upsert a miss entry: increment frequency and update last-seen,
    /// or create with frequency 1.
    async fn log_miss(
        &self,
        text: &str,
        kind: MissKind,
        context_samples: &[String],
    ) -> StoreResult<()>;

    /// Apply the feedback delta for one pattern, clamped to [0, 1].
    /// Returns the (old, new) confidence pair the store actually applied,
    /// so callers report the persisted mutation rather than a stale
    /// snapshot.
    async fn update_confidence(&self, pattern_id: i64, satisfied: bool)
        -> StoreResult<(f64, f64)>;

    /// Manual override: set an arbitrary confidence with an audit reason.
    async fn set_confidence(
        &self,
        pattern_id: i64,
        value: f64,
        reason: &str,
    ) -> StoreResult<()>;

    /// Force every pattern below `threshold` to 0.0 (logical disable).
    /// Returns the number of patterns swept.
    async fn disable_patterns_below(&self, threshold: f64) -> StoreResult<u64>;

    /// Persist a write-once feedback event.
    async fn submit_feedback(&self, event: &FeedbackEvent) -> StoreResult<()>;
}

// ============================================================================
// In-memory store
// ============================================================================

/// In-memory `PatternStore` for tests and embedded use.
#[derive(Default)]
pub struct MemoryPatternStore {
    patterns: RwLock<Vec<CompressionPattern>>,
    misses: RwLock<HashMap<String, MissEntry>>,
    feedback: RwLock<Vec<FeedbackEvent>>,
}

impl MemoryPatternStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with patterns; ids are assigned sequentially when 0.
    pub async fn with_patterns(patterns: Vec<CompressionPattern>) -> Self {
        let store = Self::new();
        {
            let mut guard = store.patterns.write().await;
            for (i, mut pattern) in patterns.into_iter().enumerate() {
                if pattern.id == 0 {
                    pattern.id = i as i64 + 1;
                }
                guard.push(pattern);
            }
        }
        store
    }

    pub async fn pattern(&self, id: i64) -> Option<CompressionPattern> {
        self.patterns.read().await.iter().find(|p| p.id == id).cloned()
    }

    pub async fn miss(&self, text: &str) -> Option<MissEntry> {
        self.misses.read().await.get(&text.to_lowercase()).cloned()
    }

    pub async fn feedback_events(&self) -> Vec<FeedbackEvent> {
        self.feedback.read().await.clone()
    }
}

#[async_trait]
impl PatternStore for MemoryPatternStore {
    async fn patterns_by_priority(
        &self,
        priority: PassPriority,
        min_confidence: f64,
    ) -> StoreResult<Vec<CompressionPattern>> {
        Ok(self
            .patterns
            .read()
            .await
            .iter()
            .filter(|p| p.pass_priority == priority && p.confidence >= min_confidence)
            .cloned()
            .collect())
    }

    async fn pattern_by_text(&self, text: &str) -> StoreResult<Option<CompressionPattern>> {
        Ok(self
            .patterns
            .read()
            .await
            .iter()
            .find(|p| p.original_text.eq_ignore_ascii_case(text))
            .cloned())
    }

    async fn increment_usage(&self, original_text: &str) -> StoreResult<()> {
        let mut patterns = self.patterns.write().await;
        if let Some(pattern) = patterns
            .iter_mut()
            .find(|p| p.original_text.eq_ignore_ascii_case(original_text))
        {
            pattern.usage_count += 1;
        }
        Ok(())
    }

    async fn log_miss(
        &self,
        text: &str,
        kind: MissKind,
        _context_samples: &[String],
    ) -> StoreResult<()> {
        let mut misses = self.misses.write().await;
        let now = Utc::now();
        misses
            .entry(text.to_lowercase())
            .and_modify(|entry| {
                entry.frequency += 1;
                entry.last_seen = now;
            })
            .or_insert_with(|| MissEntry {
                text: text.to_string(),
                frequency: 1,
                kind,
                first_seen: now,
                last_seen: now,
                reviewed: false,
            });
        Ok(())
    }

    async fn update_confidence(
        &self,
        pattern_id: i64,
        satisfied: bool,
    ) -> StoreResult<(f64, f64)> {
        let mut patterns = self.patterns.write().await;
        let pattern = patterns
            .iter_mut()
            .find(|p| p.id == pattern_id)
            .ok_or_else(|| StoreError::not_found(format!("pattern {pattern_id}")))?;
        let old = pattern.confidence;
        pattern.confidence = confidence::clamp(old + confidence::feedback_delta(satisfied));
        Ok((old, pattern.confidence))
    }

    async fn set_confidence(
        &self,
        pattern_id: i64,
        value: f64,
        _reason: &str,
    ) -> StoreResult<()> {
        let mut patterns = self.patterns.write().await;
        let pattern = patterns
            .iter_mut()
            .find(|p| p.id == pattern_id)
            .ok_or_else(|| StoreError::not_found(format!("pattern {pattern_id}")))?;
        pattern.confidence = confidence::clamp(value);
        Ok(())
    }

    async fn disable_patterns_below(&self, threshold: f64) -> StoreResult<u64> {
        let mut patterns = self.patterns.write().await;
        let mut swept = 0;
        for pattern in patterns.iter_mut() {
            if pattern.confidence < threshold && pattern.confidence > 0.0 {
                pattern.confidence = 0.0;
                swept += 1;
            }
        }
        Ok(swept)
    }

    async fn submit_feedback(&self, event: &FeedbackEvent) -> StoreResult<()> {
        self.feedback.write().await.push(event.clone());
        Ok(())
    }
}
