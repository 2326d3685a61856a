use thiserror::Error;

/// Errors reported by a [`ChunkStore`](crate::ChunkStore) backend.
///
/// `Write`, `Read` and `Connect` carry the driver's message unchanged so the
/// HTTP layer can pass it through verbatim.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Write(String),

    #[error("{0}")]
    Read(String),

    #[error("{0}")]
    Connect(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
