//! Row records for the SQLite tables and conversions to domain types.

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::FromRow;

use crate::core::models::{CompressionPattern, MissEntry, MissKind, PassPriority};

/// Parse SQLite's `datetime('now')` text into a UTC timestamp.
/// Falls back to the current time on malformed rows.
fn parse_sqlite_datetime(raw: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc)))
        .unwrap_or_else(|_| Utc::now())
}

/// Row in `compression_patterns`.
#[derive(Debug, Clone, FromRow)]
pub struct PatternRecord {
    pub id: i64,
    pub original_text: String,
    pub compressed_form: String,
    pub word_count: i64,
    pub pass_priority: i64,
    pub confidence: f64,
    pub usage_count: i64,
}

impl PatternRecord {
    /// Convert to the domain type; rows with an unknown priority are
    /// dropped by callers rather than surfaced.
    pub fn into_domain(self) -> Option<CompressionPattern> {
        Some(CompressionPattern {
            id: self.id,
            original_text: self.original_text,
            compressed_form: self.compressed_form,
            word_count: self.word_count.max(0) as usize,
            pass_priority: PassPriority::from_i64(self.pass_priority)?,
            confidence: self.confidence,
            usage_count: self.usage_count,
        })
    }
}

/// Row in `miss_log`.
#[derive(Debug, Clone, FromRow)]
pub struct MissRecord {
    pub text: String,
    pub kind: String,
    pub frequency: i64,
    pub first_seen: String,
    pub last_seen: String,
    pub reviewed: i64,
}

impl MissRecord {
    pub fn into_domain(self) -> MissEntry {
        let kind = if self.kind == "phrase" {
            MissKind::Phrase
        } else {
            MissKind::Word
        };
        MissEntry {
            text: self.text,
            frequency: self.frequency,
            kind,
            first_seen: parse_sqlite_datetime(&self.first_seen),
            last_seen: parse_sqlite_datetime(&self.last_seen),
            reviewed: self.reviewed != 0,
        }
    }
}
