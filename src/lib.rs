/// Textpress - Rule-Driven Text Compression Engine
///
/// Core library providing a deterministic compression pipeline (prefix
/// elision, phrase substitution, word substitution) with case and
/// punctuation preservation, miss discovery for rule curation, and a
/// feedback-driven confidence loop over a SQLite-backed pattern store.

pub mod config;
pub mod core;
pub mod database;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
