use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(String),

    /// A statement failed while the runner was set to abort on error.
    #[error("statement {index} in {file} failed: {cause}\n  statement: {statement}")]
    Statement {
        file: String,
        index: usize,
        statement: String,
        cause: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
