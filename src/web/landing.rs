use axum::{
    extract::{Query, State},
    response::Html,
};
use serde::Deserialize;
use tracing::error;

use crate::{
    interaction::{notify::Severity, validation::FileRejection},
    web::{
        AppState,
        templates::{Flash, render_upload_page},
        uploads::{NO_FILE_MESSAGE, list_uploads},
    },
};

pub const UPLOADED_MESSAGE: &str = "File uploaded successfully!";

#[derive(Default, Deserialize)]
pub struct LandingQuery {
    pub status: Option<String>,
    pub error: Option<String>,
}

pub async fn landing_page(
    State(state): State<AppState>,
    Query(params): Query<LandingQuery>,
) -> Html<String> {
    let uploads = match list_uploads(state.upload_dir()).await {
        Ok(uploads) => uploads,
        Err(err) => {
            error!(?err, "failed to list uploads for landing page");
            Vec::new()
        }
    };

    let flash = compose_landing_flash(&params);
    Html(render_upload_page(&uploads, flash.as_ref()))
}

/// Maps the redirect query back to a user-facing message.
fn compose_landing_flash(params: &LandingQuery) -> Option<Flash> {
    if let Some(error) = params.error.as_deref() {
        let message = match error {
            "no_file" => NO_FILE_MESSAGE,
            "invalid_type" => FileRejection::UnsupportedType.message(),
            "too_large" => FileRejection::TooLarge.message(),
            _ => "Upload failed. Please try again.",
        };
        return Some(Flash::new(Severity::Error, message));
    }

    match params.status.as_deref() {
        Some("uploaded") => Some(Flash::new(Severity::Success, UPLOADED_MESSAGE)),
        _ => None,
    }
}
