use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    /// The player state failed validation. The message lists every dotted
    /// path holding a NaN value, comma-joined.
    #[error("save file invalid: {0}")]
    SaveFileInvalid(String),

    /// A stored save envelope could not be decoded. Callers at the load
    /// boundary treat this as "no save present".
    #[error("could not decode save envelope: {0}")]
    DecodeFailed(String),

    /// A loaded save carries a version tag newer than this build supports.
    #[error("save version '{found}' is newer than supported '{supported}'")]
    UnsupportedSaveVersion { found: String, supported: String },

    /// A configured calculation type or reset path has no implementation
    /// yet. Fatal to the calling operation; signals unfinished content.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    /// Programmer error: a periodic interval was started twice.
    #[error("interval '{0}' cannot be started again while running")]
    IntervalAlreadyStarted(&'static str),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type GameResult<T> = Result<T, GameError>;
