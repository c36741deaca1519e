//! Error types for Cartwise

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Prompt frontmatter error: {0}")]
    Frontmatter(#[from] serde_yaml::Error),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Non-success response from an AI backend
    #[error("AI API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The model answered, but not with the JSON we asked for
    #[error("Unparsable AI response: {0}")]
    AiResponse(String),
}

pub type Result<T> = std::result::Result<T, Error>;
