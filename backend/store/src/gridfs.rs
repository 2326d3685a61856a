//! MongoDB GridFS backend.
//!
//! Files land in the `uploads` bucket (`uploads.files` / `uploads.chunks`) of
//! the database named in the connection string.

use async_trait::async_trait;
use bytes::Bytes;
use futures::io::AsyncWriteExt;
use futures::StreamExt;
use mongodb::bson::{doc, Bson};
use mongodb::error::{Error as MongoError, ErrorKind, GridFsErrorKind};
use mongodb::gridfs::GridFsBucket;
use mongodb::options::{ConnectionString, GridFsBucketOptions};
use mongodb::{Client, Database};
use tokio::sync::OnceCell;
use tokio_util::compat::FuturesAsyncReadCompatExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info};

use crate::{ByteStream, ChunkStore, FileId, StoreError};

/// Bucket namespace for uploaded files.
pub const DEFAULT_BUCKET: &str = "uploads";

/// Database used when the connection string does not name one.
const FALLBACK_DATABASE: &str = "test";

struct Handle {
    db: Database,
    bucket: GridFsBucket,
}

impl Handle {
    fn new(db: Database) -> Self {
        let options = GridFsBucketOptions::builder()
            .bucket_name(DEFAULT_BUCKET.to_string())
            .build();
        let bucket = db.gridfs_bucket(options);
        Self { db, bucket }
    }
}

pub struct GridFsStore {
    uri: String,
    handle: OnceCell<Handle>,
}

impl GridFsStore {
    /// Build a store from a connection string.
    ///
    /// Only a malformed URI is an error. Client setup can also fail on host
    /// resolution (`mongodb+srv://` looks up SRV records); that failure is
    /// logged and setup is retried on each later call until it succeeds.
    pub async fn connect(uri: &str) -> Result<Self, StoreError> {
        ConnectionString::parse(uri).map_err(|e| StoreError::Connect(e.to_string()))?;

        let store = Self {
            uri: uri.to_string(),
            handle: OnceCell::new(),
        };
        if let Err(e) = store.handle().await {
            error!(error = %e, "GridFS client setup failed; retrying on first use");
        }
        Ok(store)
    }

    pub fn from_database(db: Database) -> Self {
        Self {
            uri: String::new(),
            handle: OnceCell::new_with(Some(Handle::new(db))),
        }
    }

    async fn handle(&self) -> Result<&Handle, StoreError> {
        self.handle
            .get_or_try_init(|| async {
                let client = Client::with_uri_str(&self.uri)
                    .await
                    .map_err(|e| StoreError::Connect(e.to_string()))?;
                let db = client
                    .default_database()
                    .unwrap_or_else(|| client.database(FALLBACK_DATABASE));
                info!(database = %db.name(), bucket = DEFAULT_BUCKET, "GridFS client configured");
                Ok(Handle::new(db))
            })
            .await
    }
}

#[async_trait]
impl ChunkStore for GridFsStore {
    fn name(&self) -> &str {
        "gridfs"
    }

    async fn put(&self, filename: &str, data: Bytes) -> Result<FileId, StoreError> {
        let write_err = |e: std::io::Error| StoreError::Write(e.to_string());

        let mut upload = self
            .handle()
            .await?
            .bucket
            .open_upload_stream(filename)
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;
        upload.write_all(&data).await.map_err(write_err)?;
        upload.close().await.map_err(write_err)?;

        let id = object_id_string(upload.id());
        debug!(filename = %filename, id = %id, bytes = data.len(), "GridFS upload finished");
        Ok(FileId::new(id))
    }

    async fn open(&self, filename: &str) -> Result<ByteStream, StoreError> {
        let download = self
            .handle()
            .await?
            .bucket
            .open_download_stream_by_name(filename)
            .await
            .map_err(|e| read_error(filename, e))?;

        Ok(ReaderStream::new(download.compat()).boxed())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.handle()
            .await?
            .db
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Connect(e.to_string()))
    }
}

fn object_id_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        other => other.to_string(),
    }
}

fn read_error(filename: &str, err: MongoError) -> StoreError {
    match err.kind.as_ref() {
        ErrorKind::GridFs(GridFsErrorKind::FileNotFound { .. }) => {
            StoreError::NotFound(filename.to_string())
        }
        _ => StoreError::Read(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    #[test]
    fn object_ids_render_as_hex() {
        let oid = ObjectId::new();
        let rendered = object_id_string(&Bson::ObjectId(oid));
        assert_eq!(rendered, oid.to_hex());
        assert_eq!(rendered.len(), 24);
    }

    #[test]
    fn non_object_ids_fall_back_to_display() {
        assert_eq!(object_id_string(&Bson::Int32(7)), "7");
    }

    #[test]
    fn other_driver_errors_map_to_read() {
        let err = read_error("a.png", MongoError::custom("cursor killed"));
        assert!(matches!(err, StoreError::Read(_)));
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn malformed_uri_is_a_connect_error() {
        let err = match GridFsStore::connect("not-a-mongo-uri").await {
            Err(e) => e,
            Ok(_) => panic!("expected an error"),
        };
        assert!(matches!(err, StoreError::Connect(_)));
    }

    #[tokio::test]
    async fn unresolvable_srv_host_is_deferred_to_first_use() {
        let store = GridFsStore::connect(
            "mongodb+srv://user:pw@cluster0.nonexistent-host.invalid/photos",
        )
        .await
        .unwrap();

        assert!(matches!(store.ping().await, Err(StoreError::Connect(_))));
        assert!(store.open("a.png").await.is_err());
    }
}
