use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use tracing::{error, warn};

use crate::{
    interaction::validation::{ALLOWED_MIME_TYPES, MAX_FILE_SIZE},
    web::{
        ApiMessage, AppState, json_error,
        uploads::{
            StoredUpload, content_type_for, is_plain_name, list_uploads, receive_upload,
            remove_upload,
        },
    },
};

#[derive(Serialize)]
pub struct UploadListing {
    uploads: Vec<StoredUpload>,
    max_file_size: u64,
    allowed_types: &'static [&'static str],
}

pub async fn upload_file(State(state): State<AppState>, multipart: Multipart) -> Redirect {
    match receive_upload(multipart, state.upload_dir(), state.numbering()).await {
        Ok(_) => Redirect::to("/?status=uploaded"),
        Err(err) => {
            if err.code() == "upload_failed" {
                error!(%err, "upload failed");
            } else {
                warn!(code = err.code(), "upload rejected");
            }
            Redirect::to(&format!("/?error={}", err.code()))
        }
    }
}

pub async fn serve_upload(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, (StatusCode, Json<ApiMessage>)> {
    if !is_plain_name(&name) {
        return Err(json_error(StatusCode::NOT_FOUND, "File not found."));
    }

    let path = state.upload_dir().join(&name);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(json_error(StatusCode::NOT_FOUND, "File not found."));
        }
        Err(err) => {
            error!(?err, file = %path.display(), "failed to read upload");
            return Err(json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read file.",
            ));
        }
    };

    let content_type = HeaderValue::from_str(content_type_for(&name).as_ref())
        .map_err(|_| json_error(StatusCode::INTERNAL_SERVER_ERROR, "Invalid content type."))?;
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

pub async fn delete_upload(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ApiMessage>, (StatusCode, Json<ApiMessage>)> {
    match remove_upload(state.upload_dir(), &name).await {
        Ok(true) => Ok(Json(ApiMessage::new(format!("Deleted {name}.")))),
        Ok(false) => Err(json_error(StatusCode::NOT_FOUND, "File not found.")),
        Err(err) => {
            error!(%err, file = %name, "failed to delete upload");
            Err(json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to delete file.",
            ))
        }
    }
}

pub async fn list_uploads_json(
    State(state): State<AppState>,
) -> Result<Json<UploadListing>, (StatusCode, Json<ApiMessage>)> {
    let uploads = list_uploads(state.upload_dir()).await.map_err(|err| {
        error!(%err, "failed to list uploads");
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to list uploads.")
    })?;

    Ok(Json(UploadListing {
        uploads,
        max_file_size: MAX_FILE_SIZE,
        allowed_types: &ALLOWED_MIME_TYPES,
    }))
}
