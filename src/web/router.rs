use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use crate::{
    interaction::validation::MAX_FILE_SIZE,
    web::{AppState, files, landing},
};

/// Room for multipart headers on top of the largest accepted file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing::landing_page))
        .route(
            "/upload",
            post(files::upload_file)
                .layer(DefaultBodyLimit::max(MAX_FILE_SIZE as usize + MULTIPART_OVERHEAD)),
        )
        .route("/uploads/:name", get(files::serve_upload))
        .route("/uploads/:name/delete", post(files::delete_upload))
        .route("/api/uploads", get(files::list_uploads_json))
        .route("/healthz", get(healthz))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}
