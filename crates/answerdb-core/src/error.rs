use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid corpus layout: {0}")]
    InvalidLayout(String),

    #[error("Corpus root not found: {}", .0.display())]
    RootNotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
