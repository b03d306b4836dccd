use thiserror::Error;

use crate::import::ImportError;
use crate::source::RetrievalError;
use tango_algo::{SessionError, StoreError};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Word list error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    #[error("Progress store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
