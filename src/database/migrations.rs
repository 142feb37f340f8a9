//! Database Migrations
//!
//! Handles schema creation and versioned migrations.

use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use tracing::info;

/// Current database schema version
const SCHEMA_VERSION: i32 = 2;

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Create migrations table if it doesn't exist
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    let current_version = get_current_version(pool).await?;

    info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    if current_version < SCHEMA_VERSION {
        info!(
            "Running database migrations from v{} to v{}",
            current_version, SCHEMA_VERSION
        );

        for version in (current_version + 1)..=SCHEMA_VERSION {
            run_migration(pool, version).await?;
        }

        info!("Database migrations completed successfully");
    }

    Ok(())
}

/// Get the current schema version
async fn get_current_version(pool: &SqlitePool) -> Result<i32, sqlx::Error> {
    let result = sqlx::query("SELECT MAX(version) as version FROM _migrations")
        .fetch_optional(pool)
        .await?;

    Ok(result
        .and_then(|row| row.try_get::<i32, _>("version").ok())
        .unwrap_or(0))
}

/// Run a specific migration version
async fn run_migration(pool: &SqlitePool, version: i32) -> Result<(), sqlx::Error> {
    let (name, sql) = match version {
        1 => ("initial_schema", MIGRATION_V1),
        2 => ("seed_default_patterns", MIGRATION_V2),
        _ => return Ok(()),
    };

    let mut tx = pool.begin().await?;

    for statement in sql.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        sqlx::query(statement).execute(&mut *tx).await?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(version)
        .bind(name)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    info!(version, name, "Applied migration");
    Ok(())
}

const MIGRATION_V1: &str = r#"
CREATE TABLE compression_patterns (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    original_text TEXT NOT NULL COLLATE NOCASE UNIQUE,
    compressed_form TEXT NOT NULL,
    word_count INTEGER NOT NULL,
    pass_priority INTEGER NOT NULL,
    confidence REAL NOT NULL DEFAULT 0.7,
    usage_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_patterns_priority_confidence
    ON compression_patterns (pass_priority, confidence);

CREATE TABLE miss_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text TEXT NOT NULL COLLATE NOCASE UNIQUE,
    kind TEXT NOT NULL CHECK (kind IN ('word', 'phrase')),
    frequency INTEGER NOT NULL DEFAULT 1,
    context_samples TEXT NOT NULL DEFAULT '[]',
    first_seen TEXT NOT NULL DEFAULT (datetime('now')),
    last_seen TEXT NOT NULL DEFAULT (datetime('now')),
    reviewed INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX idx_miss_log_reviewed_frequency
    ON miss_log (reviewed, frequency DESC);

CREATE TABLE feedback_events (
    id TEXT PRIMARY KEY,
    satisfied INTEGER NOT NULL,
    original_text TEXT NOT NULL,
    compressed_text TEXT NOT NULL,
    rules_applied TEXT NOT NULL DEFAULT '[]',
    compression_ratio INTEGER,
    processing_time_ms INTEGER,
    session_id TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE confidence_audit (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    pattern_id INTEGER NOT NULL REFERENCES compression_patterns (id),
    old_confidence REAL NOT NULL,
    new_confidence REAL NOT NULL,
    delta REAL NOT NULL,
    reason TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
"#;

const MIGRATION_V2: &str = r#"
INSERT INTO compression_patterns (original_text, compressed_form, word_count, pass_priority, confidence) VALUES
    ('i was wondering if you could', '', 6, 0, 0.95),
    ('would you be able to', '', 5, 0, 0.95),
    ('would it be possible to', '', 5, 0, 0.95),
    ('could you please', '', 3, 0, 0.95),
    ('can you please', '', 3, 0, 0.95),
    ('would you please', '', 3, 0, 0.95),
    ('will you please', '', 3, 0, 0.95),
    ('i was wondering if', '', 4, 0, 0.9),
    ('would you mind', '', 3, 0, 0.9),
    ('could you', '', 2, 0, 0.9),
    ('can you', '', 2, 0, 0.9),
    ('would you', '', 2, 0, 0.9),
    ('will you', '', 2, 0, 0.9),
    ('please', '', 1, 0, 0.85);

INSERT INTO compression_patterns (original_text, compressed_form, word_count, pass_priority, confidence) VALUES
    ('as soon as possible', 'ASAP', 4, 1, 0.9),
    ('machine learning', 'ML', 2, 1, 0.9),
    ('artificial intelligence', 'AI', 2, 1, 0.9),
    ('by the way', 'BTW', 3, 1, 0.85),
    ('for your information', 'FYI', 3, 1, 0.85),
    ('let me know', 'LMK', 3, 1, 0.8),
    ('in my opinion', 'IMO', 3, 1, 0.8),
    ('to be honest', 'TBH', 3, 1, 0.75);

INSERT INTO compression_patterns (original_text, compressed_form, word_count, pass_priority, confidence) VALUES
    ('message', 'msg', 1, 2, 0.85),
    ('tomorrow', 'tmrw', 1, 2, 0.8),
    ('tonight', '2nite', 1, 2, 0.7),
    ('because', 'bc', 1, 2, 0.8),
    ('thanks', 'thx', 1, 2, 0.85),
    ('people', 'ppl', 1, 2, 0.8),
    ('probably', 'prob', 1, 2, 0.75),
    ('minutes', 'mins', 1, 2, 0.85),
    ('weekend', 'wknd', 1, 2, 0.7)
"#;
