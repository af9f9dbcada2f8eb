use thiserror::Error;

/// Errors returned by the query layer and the model wrapper.
///
/// A row that does not exist is not an error: lookups return `Ok(None)`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("model `{model}` has no filter named `{filter}`")]
    UnknownFilter { model: String, filter: String },

    #[error("filter `{filter}`: {message}")]
    FilterArgument { filter: String, message: String },

    #[error("record in table `{table}` has no id")]
    MissingId { table: String },

    #[error("no connection registered as `{0}`")]
    UnknownConnection(String),

    #[error("database connection lock poisoned")]
    ConnectionPoisoned,

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
