use thiserror::Error;

/// Crate-wide error type.
///
/// Storage errors are wrapped transparently: a failed fetch or save surfaces
/// the underlying `rusqlite`/`tokio_rusqlite` error unmodified, and a failed
/// housekeeping pass is simply reported to the caller and retried on the next
/// scheduled run.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Database(#[from] tokio_rusqlite::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("not a valid article url: {0}")]
    InvalidArticleUrl(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
