//! Error types for crashout-core

use thiserror::Error;

/// Main error type for the crashout-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Remote text generator failed (network, HTTP status, envelope)
    #[error("generator error: {0}")]
    Generator(String),

    /// No credential configured; the offline generator never reaches the network
    #[error("text generator is not configured")]
    GeneratorUnavailable,

    /// Generator reply could not be read as the requested shape
    #[error("malformed generator response: {0}")]
    MalformedResponse(String),

    /// Snapshot store failure not covered by the database variant
    #[error("storage error: {0}")]
    Storage(String),

    /// Entry description was blank
    #[error("entry description must not be empty")]
    EmptyDescription,

    /// Login form was incomplete
    #[error("invalid user: {0}")]
    InvalidUser(String),

    /// Category label not in the closed set
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    /// Friend handle already in the circle
    #[error("friend already added: @{0}")]
    DuplicateFriend(String),

    /// Friend not found
    #[error("friend not found: @{0}")]
    FriendNotFound(String),

    /// Entry not found (or prefix is ambiguous)
    #[error("entry not found: {0}")]
    EntryNotFound(String),
}

/// Result type alias for crashout-core
pub type Result<T> = std::result::Result<T, Error>;
