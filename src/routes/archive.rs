use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::archive::ArchivedMatch, error::AppError, services::archive_service, state::SharedState,
};

/// Read-only access to saved matches.
pub fn router() -> Router<SharedState> {
    Router::new().route("/archive", get(list_archive))
}

#[utoipa::path(
    get,
    path = "/archive",
    tag = "archive",
    responses(
        (status = 200, description = "Saved matches, oldest first", body = [ArchivedMatch]),
        (status = 503, description = "Archive store unavailable")
    )
)]
/// List every saved match.
pub async fn list_archive(
    State(state): State<SharedState>,
) -> Result<Json<Vec<ArchivedMatch>>, AppError> {
    Ok(Json(archive_service::list_archive(&state).await?))
}
