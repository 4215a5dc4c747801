//! Attachment download.

use axum::{
    extract::{Extension, Query},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::IntoResponse,
};
use std::io::ErrorKind;
use std::sync::Arc;
use tracing::{error, info};

use super::{state::TicketState, types::AttachmentQuery};
use crate::api::handlers::auth::RequirePrincipal;
use crate::error::{ErrorBody, ServiceError};

/// Content type from the file extension; unknown types are sent as bytes.
#[must_use]
pub fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "txt" | "log" => "text/plain; charset=utf-8",
        "csv" => "text/csv",
        "json" => "application/json",
        "zip" => "application/zip",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}

#[utoipa::path(
    get,
    path = "/v1/attachments",
    params(AttachmentQuery),
    responses(
        (status = 200, description = "Attachment content"),
        (status = 401, description = "No session", body = ErrorBody),
        (status = 403, description = "Attachment belongs to someone else's ticket", body = ErrorBody),
        (status = 404, description = "Invalid path or missing file", body = ErrorBody)
    ),
    tag = "tickets"
)]
pub async fn download_attachment(
    RequirePrincipal(principal): RequirePrincipal,
    state: Extension<Arc<TicketState>>,
    Query(query): Query<AttachmentQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let path = state
        .guard()
        .authorize_download(&principal, &query.path)
        .await
        .inspect_err(|err| {
            if let ServiceError::StoreUnavailable(source) = err {
                error!("Ticket store failed: {source}");
            }
        })?;

    let full_path = state.uploads_root().join(path.relative_path());
    let bytes = match tokio::fs::read(&full_path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Err(ServiceError::NotFound),
        Err(err) => {
            error!("Failed to read attachment {}: {err}", path.canonical());
            return Err(ServiceError::NotFound);
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(path.file_name())),
    );
    let disposition = format!(
        "attachment; filename=\"{}\"",
        path.file_name().replace(['"', '\\'], "_")
    );
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(CONTENT_DISPOSITION, value);
    }

    info!(attachment = %path.canonical(), "attachment served");
    Ok((StatusCode::OK, headers, bytes))
}
