use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("scan root not found or unreadable: {path}")]
    RootNotFound { path: String },

    #[error("cannot read directory {path}: {detail}")]
    Traversal { path: String, detail: String },

    #[error("stored record set is malformed: {detail}")]
    MalformedPriorState { detail: String },

    #[error("not an importable record document: {detail}")]
    InvalidImport { detail: String },

    #[error("record not found: {id}")]
    RecordNotFound { id: String },

    #[error("id collision between {first} and {second}")]
    IdCollision { first: String, second: String },

    #[error("unknown sort key: {key} (expected name, path or status)")]
    InvalidSortKey { key: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
