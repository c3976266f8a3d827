use answerdb_index::IndexError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Question is required")]
    EmptyQuestion,

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Corpus(#[from] answerdb_core::error::Error),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl QueryError {
    /// Caller mistakes, as opposed to failures inside the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, QueryError::EmptyQuestion)
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;
