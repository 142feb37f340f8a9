pub mod cache;
pub mod casing;
pub mod confidence;
pub mod engine;
pub mod error;
pub mod miss;
pub mod models;
pub mod phrase;
pub mod prefix;
pub mod reassemble;
pub mod store;
pub mod tokenizer;
pub mod word;

pub use engine::CompressionEngine;
pub use error::{CompressionError, CompressionResult};
pub use models::{
    AppliedRule, CompressedText, CompressionPattern, ConfidenceAdjustment, FeedbackEvent,
    MissKind, PassPriority, PassResults, PassStats,
};
pub use store::{MemoryPatternStore, PatternStore};
