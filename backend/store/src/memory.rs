//! In-memory chunk store.
//!
//! Mirrors GridFS behaviour closely enough for tests and local development:
//! payloads are split into fixed-size chunks, reads stream one chunk at a
//! time, and a later write under an existing name shadows the earlier one.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use tokio::sync::RwLock;
use tracing::debug;

use crate::{ByteStream, ChunkStore, FileId, StoreError};

/// GridFS default chunk size (255 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 255 * 1024;

struct StoredObject {
    id: FileId,
    chunks: Vec<Bytes>,
}

pub struct MemoryChunkStore {
    chunk_size: usize,
    // filename -> revisions, oldest first
    objects: RwLock<HashMap<String, Vec<StoredObject>>>,
    next_id: AtomicU64,
}

impl Default for MemoryChunkStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryChunkStore {
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    /// A chunk size of zero is treated as one byte.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            objects: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of distinct filenames stored.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of revisions stored under `filename`.
    pub async fn revisions(&self, filename: &str) -> usize {
        self.objects
            .read()
            .await
            .get(filename)
            .map_or(0, |revisions| revisions.len())
    }

    /// Number of chunks in the newest revision of `filename`.
    pub async fn chunk_count(&self, filename: &str) -> Option<usize> {
        self.objects
            .read()
            .await
            .get(filename)
            .and_then(|revisions| revisions.last())
            .map(|object| object.chunks.len())
    }

    fn split(&self, data: Bytes) -> Vec<Bytes> {
        let mut chunks = Vec::with_capacity(data.len().div_ceil(self.chunk_size));
        let mut offset = 0;
        while offset < data.len() {
            let end = (offset + self.chunk_size).min(data.len());
            chunks.push(data.slice(offset..end));
            offset = end;
        }
        chunks
    }

    fn allocate_id(&self) -> FileId {
        // 24 hex digits, same shape as an ObjectId
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        FileId::new(format!("{n:024x}"))
    }
}

#[async_trait]
impl ChunkStore for MemoryChunkStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn put(&self, filename: &str, data: Bytes) -> Result<FileId, StoreError> {
        let id = self.allocate_id();
        let chunks = self.split(data);
        debug!(filename = %filename, chunks = chunks.len(), id = %id, "Stored payload in memory");

        self.objects
            .write()
            .await
            .entry(filename.to_string())
            .or_default()
            .push(StoredObject {
                id: id.clone(),
                chunks,
            });
        Ok(id)
    }

    async fn open(&self, filename: &str) -> Result<ByteStream, StoreError> {
        let objects = self.objects.read().await;
        let object = objects
            .get(filename)
            .and_then(|revisions| revisions.last())
            .ok_or_else(|| StoreError::NotFound(filename.to_string()))?;

        debug!(filename = %filename, id = %object.id, "Opening in-memory read stream");
        let chunks = object.chunks.clone();
        Ok(stream::iter(chunks.into_iter().map(Ok)).boxed())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    async fn read_all(store: &MemoryChunkStore, filename: &str) -> Vec<u8> {
        let chunks: Vec<Bytes> = store
            .open(filename)
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        chunks.concat()
    }

    #[tokio::test]
    async fn stores_and_streams_back_payload() {
        let store = MemoryChunkStore::with_chunk_size(4);
        let payload = Bytes::from_static(b"hello chunked world");

        store.put("greeting.txt", payload.clone()).await.unwrap();

        assert_eq!(store.chunk_count("greeting.txt").await, Some(5));
        assert_eq!(read_all(&store, "greeting.txt").await, payload.to_vec());
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let store = MemoryChunkStore::new();
        let err = match store.open("nope.png").await {
            Err(e) => e,
            Ok(_) => panic!("expected an error"),
        };
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn empty_payload_has_no_chunks() {
        let store = MemoryChunkStore::new();
        store.put("empty.bin", Bytes::new()).await.unwrap();

        assert_eq!(store.chunk_count("empty.bin").await, Some(0));
        assert!(read_all(&store, "empty.bin").await.is_empty());
    }

    #[tokio::test]
    async fn newest_revision_wins() {
        let store = MemoryChunkStore::new();
        let first = store.put("a.txt", Bytes::from_static(b"one")).await.unwrap();
        let second = store.put("a.txt", Bytes::from_static(b"two")).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(store.revisions("a.txt").await, 2);
        assert_eq!(read_all(&store, "a.txt").await, b"two");
    }

    #[tokio::test]
    async fn ids_look_like_object_ids() {
        let store = MemoryChunkStore::new();
        let id = store.put("x", Bytes::from_static(b"x")).await.unwrap();
        assert_eq!(id.as_str().len(), 24);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
