use crate::fsutil;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read mount table: {0}")]
    Read(#[from] fsutil::FileReadError),
    #[error("mount table reader task failed: {0}")]
    Task(#[source] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, Error>;
