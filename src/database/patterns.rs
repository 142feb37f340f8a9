//! Pattern store and curation operations.
//!
//! `Database` implements the engine-facing `PatternStore` contract here,
//! plus `PatternCurationOps` for the admin boundary: adding and editing
//! rules, reviewing the miss log.

use async_trait::async_trait;
use sqlx::Row;
use tracing::debug;

use super::models::{MissRecord, PatternRecord};
use super::Database;
use crate::core::confidence;
use crate::core::models::{
    CompressionPattern, FeedbackEvent, MissEntry, MissKind, PassPriority,
};
use crate::core::store::{PatternStore, StoreError, StoreResult};

fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::database(e.to_string())
}

// ============================================================================
// PatternStore contract
// ============================================================================

#[async_trait]
impl PatternStore for Database {
    async fn patterns_by_priority(
        &self,
        priority: PassPriority,
        min_confidence: f64,
    ) -> StoreResult<Vec<CompressionPattern>> {
        let records = sqlx::query_as::<_, PatternRecord>(
            r#"
            SELECT id, original_text, compressed_form, word_count, pass_priority, confidence, usage_count
            FROM compression_patterns
            WHERE pass_priority = ? AND confidence >= ?
            ORDER BY word_count DESC, id
            "#,
        )
        .bind(priority.as_i64())
        .bind(min_confidence)
        .fetch_all(self.pool())
        .await
        .map_err(db_err)?;

        Ok(records
            .into_iter()
            .filter_map(PatternRecord::into_domain)
            .collect())
    }

    async fn pattern_by_text(&self, text: &str) -> StoreResult<Option<CompressionPattern>> {
        let record = sqlx::query_as::<_, PatternRecord>(
            r#"
            SELECT id, original_text, compressed_form, word_count, pass_priority, confidence, usage_count
            FROM compression_patterns
            WHERE original_text = ? COLLATE NOCASE
            "#,
        )
        .bind(text)
        .fetch_optional(self.pool())
        .await
        .map_err(db_err)?;

        Ok(record.and_then(PatternRecord::into_domain))
    }

    async fn increment_usage(&self, original_text: &str) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE compression_patterns
            SET usage_count = usage_count + 1, updated_at = datetime('now')
            WHERE original_text = ? COLLATE NOCASE
            "#,
        )
        .bind(original_text)
        .execute(self.pool())
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn log_miss(
        &self,
        text: &str,
        kind: MissKind,
        context_samples: &[String],
    ) -> StoreResult<()> {
        let samples = serde_json::to_string(context_samples)?;
        sqlx::query(
            r#"
            INSERT INTO miss_log (text, kind, frequency, context_samples)
            VALUES (?, ?, 1, ?)
            ON CONFLICT (text) DO UPDATE SET
                frequency = frequency + 1,
                last_seen = datetime('now')
            "#,
        )
        .bind(text)
        .bind(kind.as_str())
        .bind(samples)
        .execute(self.pool())
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn update_confidence(
        &self,
        pattern_id: i64,
        satisfied: bool,
    ) -> StoreResult<(f64, f64)> {
        let delta = confidence::feedback_delta(satisfied);
        let reason = confidence::feedback_reason(satisfied);

        let mut tx = self.pool().begin().await.map_err(db_err)?;

        let row = sqlx::query("SELECT confidence FROM compression_patterns WHERE id = ?")
            .bind(pattern_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?
            .ok_or_else(|| StoreError::not_found(format!("pattern {pattern_id}")))?;
        let old: f64 = row.get("confidence");
        let new = confidence::clamp(old + delta);

        sqlx::query(
            "UPDATE compression_patterns SET confidence = ?, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(new)
        .bind(pattern_id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        sqlx::query(
            r#"
            INSERT INTO confidence_audit (pattern_id, old_confidence, new_confidence, delta, reason)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(pattern_id)
        .bind(old)
        .bind(new)
        .bind(new - old)
        .bind(reason)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok((old, new))
    }

    async fn set_confidence(&self, pattern_id: i64, value: f64, reason: &str) -> StoreResult<()> {
        let value = confidence::clamp(value);
        let mut tx = self.pool().begin().await.map_err(db_err)?;

        let row = sqlx::query("SELECT confidence FROM compression_patterns WHERE id = ?")
            .bind(pattern_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?
            .ok_or_else(|| StoreError::not_found(format!("pattern {pattern_id}")))?;
        let old: f64 = row.get("confidence");

        sqlx::query(
            "UPDATE compression_patterns SET confidence = ?, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(value)
        .bind(pattern_id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        sqlx::query(
            r#"
            INSERT INTO confidence_audit (pattern_id, old_confidence, new_confidence, delta, reason)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(pattern_id)
        .bind(old)
        .bind(value)
        .bind(value - old)
        .bind(reason)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        debug!(pattern_id, old, new = value, reason, "confidence override");
        Ok(())
    }

    async fn disable_patterns_below(&self, threshold: f64) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE compression_patterns
            SET confidence = 0.0, updated_at = datetime('now')
            WHERE confidence < ? AND confidence > 0.0
            "#,
        )
        .bind(threshold)
        .execute(self.pool())
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected())
    }

    async fn submit_feedback(&self, event: &FeedbackEvent) -> StoreResult<()> {
        let rules = serde_json::to_string(&event.rules_applied)?;
        sqlx::query(
            r#"
            INSERT INTO feedback_events
            (id, satisfied, original_text, compressed_text, rules_applied,
             compression_ratio, processing_time_ms, session_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.id.to_string())
        .bind(event.satisfied)
        .bind(&event.original_text)
        .bind(&event.compressed_text)
        .bind(rules)
        .bind(event.compression_ratio)
        .bind(event.processing_time_ms.map(|ms| ms as i64))
        .bind(&event.session_id)
        .bind(event.created_at.to_rfc3339())
        .execute(self.pool())
        .await
        .map_err(db_err)?;
        Ok(())
    }
}

// ============================================================================
// Curation operations (admin boundary)
// ============================================================================

/// A pattern as submitted by manual curation.
#[derive(Debug, Clone)]
pub struct NewPattern {
    pub original_text: String,
    pub compressed_form: String,
    pub pass_priority: PassPriority,
    pub confidence: f64,
}

/// Extension trait for rule curation and miss review.
pub trait PatternCurationOps {
    /// Insert a new pattern, returning its id. Word count is derived
    /// from the original text.
    fn create_pattern(
        &self,
        pattern: &NewPattern,
    ) -> impl std::future::Future<Output = StoreResult<i64>> + Send;

    /// Edit an existing pattern's compressed form.
    fn update_compressed_form(
        &self,
        pattern_id: i64,
        compressed_form: &str,
    ) -> impl std::future::Future<Output = StoreResult<()>> + Send;

    /// All patterns, optionally restricted to one pass, disabled rules
    /// included.
    fn list_patterns(
        &self,
        priority: Option<PassPriority>,
    ) -> impl std::future::Future<Output = StoreResult<Vec<CompressionPattern>>> + Send;

    /// Misses not yet reviewed, most frequent first.
    fn unreviewed_misses(
        &self,
        limit: i64,
    ) -> impl std::future::Future<Output = StoreResult<Vec<MissEntry>>> + Send;

    /// Mark a miss reviewed once a rule has been derived from it.
    fn mark_miss_reviewed(
        &self,
        text: &str,
    ) -> impl std::future::Future<Output = StoreResult<()>> + Send;
}

impl PatternCurationOps for Database {
    async fn create_pattern(&self, pattern: &NewPattern) -> StoreResult<i64> {
        let word_count = pattern.original_text.split_whitespace().count() as i64;
        let result = sqlx::query(
            r#"
            INSERT INTO compression_patterns
            (original_text, compressed_form, word_count, pass_priority, confidence)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(pattern.original_text.to_lowercase())
        .bind(&pattern.compressed_form)
        .bind(word_count)
        .bind(pattern.pass_priority.as_i64())
        .bind(confidence::clamp(pattern.confidence))
        .execute(self.pool())
        .await
        .map_err(db_err)?;
        Ok(result.last_insert_rowid())
    }

    async fn update_compressed_form(
        &self,
        pattern_id: i64,
        compressed_form: &str,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE compression_patterns
            SET compressed_form = ?, updated_at = datetime('now')
            WHERE id = ?
            "#,
        )
        .bind(compressed_form)
        .bind(pattern_id)
        .execute(self.pool())
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("pattern {pattern_id}")));
        }
        Ok(())
    }

    async fn list_patterns(
        &self,
        priority: Option<PassPriority>,
    ) -> StoreResult<Vec<CompressionPattern>> {
        let base = r#"
            SELECT id, original_text, compressed_form, word_count, pass_priority, confidence, usage_count
            FROM compression_patterns
        "#;
        let records = match priority {
            Some(priority) => {
                sqlx::query_as::<_, PatternRecord>(&format!(
                    "{base} WHERE pass_priority = ? ORDER BY word_count DESC, id"
                ))
                .bind(priority.as_i64())
                .fetch_all(self.pool())
                .await
            }
            None => {
                sqlx::query_as::<_, PatternRecord>(&format!(
                    "{base} ORDER BY pass_priority, word_count DESC, id"
                ))
                .fetch_all(self.pool())
                .await
            }
        }
        .map_err(db_err)?;

        Ok(records
            .into_iter()
            .filter_map(PatternRecord::into_domain)
            .collect())
    }

    async fn unreviewed_misses(&self, limit: i64) -> StoreResult<Vec<MissEntry>> {
        let records = sqlx::query_as::<_, MissRecord>(
            r#"
            SELECT text, kind, frequency, first_seen, last_seen, reviewed
            FROM miss_log
            WHERE reviewed = 0
            ORDER BY frequency DESC, last_seen DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .map_err(db_err)?;

        Ok(records.into_iter().map(MissRecord::into_domain).collect())
    }

    async fn mark_miss_reviewed(&self, text: &str) -> StoreResult<()> {
        let result = sqlx::query("UPDATE miss_log SET reviewed = 1 WHERE text = ? COLLATE NOCASE")
            .bind(text)
            .execute(self.pool())
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("miss entry '{text}'")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn db() -> Database {
        Database::in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_seeded_patterns_load_by_priority() {
        let db = db().await;
        let prefixes = db
            .patterns_by_priority(PassPriority::Prefix, 0.5)
            .await
            .unwrap();
        assert!(!prefixes.is_empty());
        // Longest first for deterministic tier ordering
        assert!(prefixes[0].word_count >= prefixes[prefixes.len() - 1].word_count);

        let phrases = db
            .patterns_by_priority(PassPriority::Phrase, 0.7)
            .await
            .unwrap();
        assert!(phrases.iter().any(|p| p.original_text == "machine learning"));
    }

    #[tokio::test]
    async fn test_confidence_filter_excludes_low_rules() {
        let db = db().await;
        let id = db
            .create_pattern(&NewPattern {
                original_text: "approximately".to_string(),
                compressed_form: "approx".to_string(),
                pass_priority: PassPriority::Word,
                confidence: 0.45,
            })
            .await
            .unwrap();

        let loaded = db.patterns_by_priority(PassPriority::Word, 0.7).await.unwrap();
        assert!(!loaded.iter().any(|p| p.id == id));

        let loaded = db.patterns_by_priority(PassPriority::Word, 0.4).await.unwrap();
        assert!(loaded.iter().any(|p| p.id == id));
    }

    #[tokio::test]
    async fn test_pattern_by_text_case_insensitive() {
        let db = db().await;
        let found = db.pattern_by_text("Machine Learning").await.unwrap();
        assert_eq!(found.unwrap().compressed_form, "ML");
        assert!(db.pattern_by_text("no such rule").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_usage_increment_persists() {
        let db = db().await;
        db.increment_usage("machine learning").await.unwrap();
        db.increment_usage("MACHINE LEARNING").await.unwrap();

        let pattern = db.pattern_by_text("machine learning").await.unwrap().unwrap();
        assert_eq!(pattern.usage_count, 2);
    }

    #[tokio::test]
    async fn test_list_patterns_includes_disabled() {
        let db = db().await;
        let id = db
            .create_pattern(&NewPattern {
                original_text: "weakling".to_string(),
                compressed_form: "wk".to_string(),
                pass_priority: PassPriority::Word,
                confidence: 0.0,
            })
            .await
            .unwrap();

        let words = db.list_patterns(Some(PassPriority::Word)).await.unwrap();
        assert!(words.iter().any(|p| p.id == id));
        assert!(words.iter().all(|p| p.pass_priority == PassPriority::Word));

        let all = db.list_patterns(None).await.unwrap();
        assert!(all.len() > words.len());
    }

    #[tokio::test]
    async fn test_update_compressed_form() {
        let db = db().await;
        let pattern = db.pattern_by_text("tomorrow").await.unwrap().unwrap();

        db.update_compressed_form(pattern.id, "tmw").await.unwrap();
        let updated = db.pattern_by_text("tomorrow").await.unwrap().unwrap();
        assert_eq!(updated.compressed_form, "tmw");

        let err = db.update_compressed_form(9999, "x").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_miss_upsert() {
        let db = db().await;
        db.log_miss("blockchain", MissKind::Word, &["ctx".to_string()])
            .await
            .unwrap();
        db.log_miss("blockchain", MissKind::Word, &["ctx2".to_string()])
            .await
            .unwrap();

        let misses = db.unreviewed_misses(10).await.unwrap();
        let entry = misses.iter().find(|m| m.text == "blockchain").unwrap();
        assert_eq!(entry.frequency, 2);
    }

    #[tokio::test]
    async fn test_mark_miss_reviewed() {
        let db = db().await;
        db.log_miss("blockchain", MissKind::Word, &[]).await.unwrap();
        db.mark_miss_reviewed("Blockchain").await.unwrap();

        assert!(db.unreviewed_misses(10).await.unwrap().is_empty());

        let err = db.mark_miss_reviewed("never logged").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_feedback_update_clamps_and_audits() {
        let db = db().await;
        let id = db
            .create_pattern(&NewPattern {
                original_text: "testword".to_string(),
                compressed_form: "tw".to_string(),
                pass_priority: PassPriority::Word,
                confidence: 0.01,
            })
            .await
            .unwrap();

        let (old, new) = db.update_confidence(id, false).await.unwrap();
        assert_eq!(old, 0.01);
        assert_eq!(new, 0.0);
        let pattern = db.pattern_by_text("testword").await.unwrap().unwrap();
        assert_eq!(pattern.confidence, 0.0);

        let row = sqlx::query("SELECT COUNT(*) as count FROM confidence_audit WHERE pattern_id = ?")
            .bind(id)
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(row.get::<i64, _>("count"), 1);
    }

    #[tokio::test]
    async fn test_manual_override_with_reason() {
        let db = db().await;
        let pattern = db.pattern_by_text("machine learning").await.unwrap().unwrap();

        db.set_confidence(pattern.id, 0.2, "curator demotion")
            .await
            .unwrap();

        let updated = db.pattern_by_text("machine learning").await.unwrap().unwrap();
        assert_eq!(updated.confidence, 0.2);

        let row = sqlx::query(
            "SELECT reason FROM confidence_audit WHERE pattern_id = ? ORDER BY id DESC LIMIT 1",
        )
        .bind(pattern.id)
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(row.get::<String, _>("reason"), "curator demotion");
    }

    #[tokio::test]
    async fn test_disable_sweep_forces_zero() {
        let db = db().await;
        let id = db
            .create_pattern(&NewPattern {
                original_text: "weakrule".to_string(),
                compressed_form: "wr".to_string(),
                pass_priority: PassPriority::Word,
                confidence: 0.25,
            })
            .await
            .unwrap();

        let swept = db.disable_patterns_below(0.30).await.unwrap();
        assert!(swept >= 1);

        let pattern = db.pattern_by_text("weakrule").await.unwrap().unwrap();
        assert_eq!(pattern.confidence, 0.0);
        let _ = id;
    }

    #[tokio::test]
    async fn test_feedback_event_round_trip() {
        let db = db().await;
        let event = FeedbackEvent::new(true, "original", "orig", vec![]);
        db.submit_feedback(&event).await.unwrap();

        let row = sqlx::query("SELECT satisfied FROM feedback_events WHERE id = ?")
            .bind(event.id.to_string())
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(row.get::<i64, _>("satisfied"), 1);
    }
}
