//! File download endpoint.
//!
//! Streams a stored payload back chunk by chunk, without buffering the whole
//! file in memory.

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;
use tracing::{debug, warn};

use crate::error::GatewayError;
use crate::server::GatewayState;

/// Every download is labelled as JPEG, whatever was uploaded.
pub const DOWNLOAD_CONTENT_TYPE: &str = "image/jpeg";

/// Endpoint: `GET /file/:filename`
pub async fn download_file(
    State(state): State<GatewayState>,
    Path(filename): Path<String>,
) -> Result<Response, GatewayError> {
    let stream = state.store.open(&filename).await.map_err(|e| {
        // every open failure is reported as 404
        warn!(filename = %filename, error = %e, "Failed to open read stream");
        GatewayError::NotFound
    })?;

    debug!(filename = %filename, "Streaming stored file");

    let stream = stream.inspect_err(move |e| {
        warn!(filename = %filename, error = %e, "Read stream failed mid-transfer");
    });

    Ok((
        [(header::CONTENT_TYPE, DOWNLOAD_CONTENT_TYPE)],
        Body::from_stream(stream),
    )
        .into_response())
}
