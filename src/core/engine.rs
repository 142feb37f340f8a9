//! Compression engine orchestrator.
//!
//! Sequences the pipeline per call:
//! cache check → pattern load → Pass 0 → tokenize → Pass 1 → Pass 2 →
//! reassembly → miss discovery → usage updates → cache store.
//!
//! Only the pattern load is fatal; miss logging and usage increments are
//! best-effort. The engine is an explicit value owning its cache and an
//! injected store handle, so tests construct isolated instances freely.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::config::CompressionConfig;

use super::cache::{CacheStats, ResultCache};
use super::confidence::{self, CompressionMode, DISABLE_THRESHOLD, PREFIX_MIN_CONFIDENCE};
use super::error::{CompressionError, CompressionResult};
use super::miss;
use super::models::{
    AppliedRule, CompressedText, ConfidenceAdjustment, FeedbackEvent, PassPriority, PassResults,
    PassStats,
};
use super::phrase::{self, PatternIndex};
use super::prefix::PrefixRemover;
use super::reassemble::reassemble;
use super::store::PatternStore;
use super::tokenizer::tokenize;
use super::word;

/// Rule-driven text compression engine.
pub struct CompressionEngine {
    store: Arc<dyn PatternStore>,
    cache: ResultCache,
    config: CompressionConfig,
}

impl CompressionEngine {
    pub fn new(store: Arc<dyn PatternStore>, config: CompressionConfig) -> Self {
        Self {
            cache: ResultCache::new(config.cache.capacity),
            store,
            config,
        }
    }

    pub fn with_defaults(store: Arc<dyn PatternStore>) -> Self {
        Self::new(store, CompressionConfig::default())
    }

    pub fn mode(&self) -> CompressionMode {
        self.config.engine.mode
    }

    /// Compress `text` through the three-pass pipeline.
    pub async fn compress(
        &self,
        text: &str,
        session_id: Option<&str>,
    ) -> CompressionResult<CompressedText> {
        let started = Instant::now();

        if text.trim().is_empty() {
            let mut result = CompressedText::empty();
            result.original = text.to_string();
            result.compressed = text.to_string();
            return Ok(result);
        }
        self.validate(text)?;

        if self.config.cache.enabled {
            if let Some(mut cached) = self.cache.get(text).await {
                cached.from_cache = true;
                cached.processing_time_ms = started.elapsed().as_millis() as u64;
                debug!(session_id, "compression served from cache");
                return Ok(cached);
            }
        }

        // Pattern load failure aborts the call; everything after this is
        // best-effort or pure
        let min_confidence = self.config.engine.mode.min_confidence();
        let prefix_patterns = self
            .store
            .patterns_by_priority(PassPriority::Prefix, PREFIX_MIN_CONFIDENCE)
            .await
            .map_err(CompressionError::PatternLoad)?;
        let phrase_patterns = self
            .store
            .patterns_by_priority(PassPriority::Phrase, min_confidence)
            .await
            .map_err(CompressionError::PatternLoad)?;
        let word_patterns = self
            .store
            .patterns_by_priority(PassPriority::Word, min_confidence)
            .await
            .map_err(CompressionError::PatternLoad)?;

        let mut rules_applied: Vec<AppliedRule> = Vec::new();
        let mut pass_results = PassResults::default();

        // Pass 0
        let pass0_started = Instant::now();
        let remover = PrefixRemover::new(&prefix_patterns);
        let outcome = remover.apply(text);
        pass_results.pass0 = PassStats {
            tokens_processed: outcome
                .applied
                .as_ref()
                .map(|rule| rule.end_index - rule.start_index + 1)
                .unwrap_or(0),
            rules_applied: usize::from(outcome.applied.is_some()),
            processing_time_ms: pass0_started.elapsed().as_millis() as u64,
        };
        if let Some(rule) = outcome.applied.clone() {
            rules_applied.push(rule);
        }

        let mut tokens = tokenize(&outcome.processed);

        // Pass 1
        let pass1_started = Instant::now();
        let phrase_index = PatternIndex::new(phrase_patterns);
        let phrase_rules = phrase::run(
            &mut tokens,
            &phrase_index,
            self.config.engine.max_phrase_words,
        );
        pass_results.pass1 = PassStats {
            tokens_processed: phrase_rules
                .iter()
                .map(|rule| rule.end_index - rule.start_index + 1)
                .sum(),
            rules_applied: phrase_rules.len(),
            processing_time_ms: pass1_started.elapsed().as_millis() as u64,
        };
        rules_applied.extend(phrase_rules);

        // Pass 2
        let pass2_started = Instant::now();
        let word_index = PatternIndex::new(word_patterns);
        let word_rules = word::run(&mut tokens, &word_index);
        pass_results.pass2 = PassStats {
            tokens_processed: word_rules.len(),
            rules_applied: word_rules.len(),
            processing_time_ms: pass2_started.elapsed().as_millis() as u64,
        };
        rules_applied.extend(word_rules);

        let compressed = reassemble(&tokens);
        let compression_ratio = CompressedText::ratio(text, &compressed);

        // Miss discovery is best-effort: failures are logged, never fatal
        for candidate in miss::discover(&tokens, text, &rules_applied) {
            if let Err(e) = self
                .store
                .log_miss(&candidate.text, candidate.kind, &[candidate.context.clone()])
                .await
            {
                warn!(text = %candidate.text, "failed to log miss: {e}");
            }
        }

        // Usage increments are best-effort and keyed by original text;
        // built-in prefix tiers have no store row to update
        let mut seen = HashSet::new();
        for rule in rules_applied.iter().filter(|r| r.pattern_id.is_some()) {
            if !seen.insert(rule.original_text.to_lowercase()) {
                continue;
            }
            if let Err(e) = self.store.increment_usage(&rule.original_text).await {
                warn!(rule = %rule.original_text, "failed to increment usage: {e}");
            }
        }

        let result = CompressedText {
            original: text.to_string(),
            compressed,
            compression_ratio,
            processing_time_ms: started.elapsed().as_millis() as u64,
            rules_applied,
            from_cache: false,
            pass_results,
        };

        if self.config.cache.enabled {
            self.cache.put(text, result.clone()).await;
        }

        debug!(
            session_id,
            ratio = result.compression_ratio,
            rules = result.rules_applied.len(),
            "compression complete"
        );
        Ok(result)
    }

    /// Persist a feedback event and adjust confidence for every distinct
    /// rule it covers.
    ///
    /// The event write happens first: if it fails, no adjustment is
    /// computed or persisted, so the returned list is always consistent
    /// with a stored event.
    #[allow(clippy::too_many_arguments)]
    pub async fn process_feedback(
        &self,
        satisfied: bool,
        original_text: &str,
        compressed_text: &str,
        rules_applied: &[AppliedRule],
        session_id: Option<String>,
        compression_ratio: Option<i32>,
        processing_time_ms: Option<u64>,
    ) -> CompressionResult<Vec<ConfidenceAdjustment>> {
        let mut event = FeedbackEvent::new(
            satisfied,
            original_text,
            compressed_text,
            rules_applied.to_vec(),
        );
        event.session_id = session_id;
        event.compression_ratio = compression_ratio;
        event.processing_time_ms = processing_time_ms;

        self.store
            .submit_feedback(&event)
            .await
            .map_err(CompressionError::Feedback)?;

        let mut adjustments = Vec::new();
        let mut seen = HashSet::new();
        for rule in rules_applied {
            let Some(pattern_id) = rule.pattern_id else {
                continue;
            };
            if !seen.insert(pattern_id) {
                continue;
            }

            let (old, new) = self
                .store
                .update_confidence(pattern_id, satisfied)
                .await
                .map_err(|source| CompressionError::ConfidenceUpdate { pattern_id, source })?;
            adjustments.push(confidence::adjustment(pattern_id, old, new, satisfied));
        }

        debug!(
            satisfied,
            adjusted = adjustments.len(),
            "feedback processed"
        );
        Ok(adjustments)
    }

    /// Manual confidence override with an audit reason.
    pub async fn override_confidence(
        &self,
        pattern_id: i64,
        value: f64,
        reason: &str,
    ) -> CompressionResult<()> {
        self.store
            .set_confidence(pattern_id, value, reason)
            .await
            .map_err(|source| CompressionError::ConfidenceUpdate { pattern_id, source })
    }

    /// Sweep patterns below the disable threshold to 0.0.
    pub async fn disable_low_confidence_patterns(&self) -> CompressionResult<u64> {
        self.store
            .disable_patterns_below(DISABLE_THRESHOLD)
            .await
            .map_err(CompressionError::PatternLoad)
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    fn validate(&self, text: &str) -> CompressionResult<()> {
        if text.chars().count() > self.config.engine.max_input_chars {
            return Err(CompressionError::validation(format!(
                "input exceeds {} characters",
                self.config.engine.max_input_chars
            )));
        }
        if text.contains('\0') {
            return Err(CompressionError::validation("input contains NUL bytes"));
        }
        Ok(())
    }
}
