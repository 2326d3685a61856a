//! `grid-store` — chunked object storage for uploaded files.
//!
//! Provides:
//! - The [`ChunkStore`] trait: streaming write-by-key and read-by-key
//! - [`GridFsStore`], backed by a MongoDB GridFS bucket
//! - [`MemoryChunkStore`], a process-local store with the same chunking semantics

pub mod error;
pub mod gridfs;
pub mod memory;

pub use error::StoreError;
pub use gridfs::{GridFsStore, DEFAULT_BUCKET};
pub use memory::{MemoryChunkStore, DEFAULT_CHUNK_SIZE};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::fmt;

/// Byte payload of a stored file, yielded chunk by chunk as the store reads it.
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Opaque identifier the store assigns to a single write.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileId(String);

impl FileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A store that persists byte payloads under a string key, split into chunks.
///
/// Implementations own the atomicity of a single write. Keys are not required
/// to be unique: when several payloads share a name, reads return the newest.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    /// Write the entire payload under `filename` and return the id of that write.
    async fn put(&self, filename: &str, data: Bytes) -> Result<FileId, StoreError>;

    /// Open a read stream for the newest payload stored under `filename`.
    async fn open(&self, filename: &str) -> Result<ByteStream, StoreError>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}
