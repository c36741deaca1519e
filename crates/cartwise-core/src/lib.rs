//! Cartwise Core Library
//!
//! Shared functionality for the Cartwise grocery substitution finder:
//! - Product catalog loading and lookup
//! - Substitution engine (tokenizer, Jaccard matcher, preference rules, ranking)
//! - Pluggable vision backends for reading receipts (OpenAI-compatible, Ollama)
//! - Prompt library for customizable extraction prompts
//! - Engine configuration

pub mod ai;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod prompts;
pub mod substitution;

/// Test utilities including mock vision server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{
    parse_extraction_response, AIBackend, AIClient, ExtractedReceipt, MockBackend, OllamaBackend,
    OpenAICompatibleBackend,
};
pub use catalog::{Catalog, CatalogEntry, CatalogStats, StorePrice};
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use models::{
    AnalysisResult, ItemSnapshot, MalformedItem, PreferenceFlag, PurchasedItem, Substitution,
    UserPreferences,
};
pub use prompts::{Prompt, PromptId, PromptLibrary};
pub use substitution::{
    find_matches, jaccard_similarity, tokenize, Match, SubstitutionEngine,
    CONFIDENT_MATCH_THRESHOLD, DEFAULT_MAX_ALTERNATIVES, DEFAULT_SUBSTITUTION_THRESHOLD,
};
