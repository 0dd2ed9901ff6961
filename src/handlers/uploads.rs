use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, Response, StatusCode},
};
use mime_guess::MimeGuess;

use crate::error::{AppError, Result};
use crate::AppState;

/// Serve a stored object; the content type follows the key's extension
/// GET /uploads/*key
pub async fn serve(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response<Body>> {
    let bytes = state.storage.get(&key).await?;
    let mime = MimeGuess::from_path(&key).first_or_octet_stream();
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(Body::from(bytes))
        .map_err(|e| AppError::Internal(e.to_string()))
}
