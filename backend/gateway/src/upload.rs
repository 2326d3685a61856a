//! File upload endpoint.
//!
//! Reads the `file` part of a multipart body into memory, assigns it a random
//! name and writes it to the chunk store under that name.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::error::GatewayError;
use crate::filename::generate_filename;
use crate::server::GatewayState;

/// Multipart field that carries the payload.
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    #[serde(rename = "fileID")]
    pub file_id: String,
    pub filename: String,
}

/// A file part buffered from the request.
#[derive(Debug)]
pub struct FilePart {
    pub original_name: String,
    pub data: Bytes,
}

/// Endpoint: `POST /upload`
pub async fn upload_file(
    State(state): State<GatewayState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadResponse>), GatewayError> {
    let mut multipart = multipart.map_err(|rejection| {
        debug!(reason = %rejection, "Upload without a multipart body");
        GatewayError::NoFile
    })?;

    let part = read_file_part(&mut multipart)
        .await?
        .ok_or(GatewayError::NoFile)?;

    let filename = generate_filename(&part.original_name)?;
    let size = part.data.len();

    let file_id = state.store.put(&filename, part.data).await.map_err(|e| {
        error!(filename = %filename, error = %e, "Store write failed");
        GatewayError::StoreWrite(e)
    })?;

    info!(
        filename = %filename,
        file_id = %file_id,
        original = %part.original_name,
        bytes = size,
        "Stored upload"
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            file_id: file_id.into_string(),
            filename,
        }),
    ))
}

/// Buffer the single `file` part of the body.
///
/// Parts without a filename (or with an empty one, as browsers send for an
/// empty file input) are form fields, not files, and are skipped along with
/// parts under other names. A second file under `file` is rejected.
async fn read_file_part(multipart: &mut Multipart) -> Result<Option<FilePart>, GatewayError> {
    let mut found: Option<FilePart> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        let Some(original_name) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
        else {
            debug!(field = %name, "Skipping non-file multipart field");
            continue;
        };

        if name != FILE_FIELD {
            debug!(field = %name, "Skipping unexpected file field");
            continue;
        }
        if found.is_some() {
            return Err(GatewayError::UnexpectedField(name));
        }

        let data = field.bytes().await?;
        found = Some(FilePart {
            original_name,
            data,
        });
    }

    Ok(found)
}
