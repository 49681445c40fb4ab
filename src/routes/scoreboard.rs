use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use validator::Validate;

use crate::{
    dto::scoreboard::{HistoryPoint, MatchSnapshot, UpdateSetupRequest},
    dto::archive::ArchivedMatch,
    error::AppError,
    services::{archive_service, match_service},
    state::SharedState,
};

/// Live match endpoints: one button of the scoring UI maps to one route.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/match", get(get_match))
        .route("/match/setup", put(update_setup))
        .route("/match/counters/{key}/increment", post(increment_counter))
        .route("/match/counters/{key}/decrement", post(decrement_counter))
        .route("/match/teams/{team}/point", post(score_point))
        .route("/match/teams/{team}/undo", post(undo_point))
        .route("/match/history", get(get_history))
        .route("/match/reset", post(reset_match))
        .route("/match/archive", post(archive_match))
}

#[utoipa::path(
    get,
    path = "/match",
    tag = "match",
    responses((status = 200, description = "Current match", body = MatchSnapshot))
)]
/// Return the live match: names, stage, every counter and the momentum history.
pub async fn get_match(State(state): State<SharedState>) -> Json<MatchSnapshot> {
    Json(match_service::current_match(&state).await)
}

#[utoipa::path(
    put,
    path = "/match/setup",
    tag = "match",
    request_body = UpdateSetupRequest,
    responses(
        (status = 200, description = "Setup updated", body = MatchSnapshot),
        (status = 400, description = "Invalid team name")
    )
)]
/// Rename teams and/or change the stage.
pub async fn update_setup(
    State(state): State<SharedState>,
    Json(payload): Json<UpdateSetupRequest>,
) -> Result<Json<MatchSnapshot>, AppError> {
    payload.validate()?;
    Ok(Json(match_service::update_setup(&state, payload).await))
}

#[utoipa::path(
    post,
    path = "/match/counters/{key}/increment",
    tag = "match",
    params(("key" = String, Path, description = "Counter name, e.g. `T1_P2_atk` or `Score_T1`")),
    responses(
        (status = 200, description = "Counter incremented", body = MatchSnapshot),
        (status = 404, description = "Unknown counter")
    )
)]
/// Add one to a counter. Scoring counters also extend the momentum history.
pub async fn increment_counter(
    State(state): State<SharedState>,
    Path(key): Path<String>,
) -> Result<Json<MatchSnapshot>, AppError> {
    Ok(Json(match_service::increment_counter(&state, &key).await?))
}

#[utoipa::path(
    post,
    path = "/match/counters/{key}/decrement",
    tag = "match",
    params(("key" = String, Path, description = "Counter name, e.g. `T1_P2_atk` or `Score_T1`")),
    responses(
        (status = 200, description = "Counter decremented (unchanged at zero)", body = MatchSnapshot),
        (status = 404, description = "Unknown counter")
    )
)]
/// Remove one from a counter unless it is already zero.
pub async fn decrement_counter(
    State(state): State<SharedState>,
    Path(key): Path<String>,
) -> Result<Json<MatchSnapshot>, AppError> {
    Ok(Json(match_service::decrement_counter(&state, &key).await?))
}

#[utoipa::path(
    post,
    path = "/match/teams/{team}/point",
    tag = "match",
    params(("team" = u8, Path, description = "Team number (1 or 2)")),
    responses(
        (status = 200, description = "Point awarded", body = MatchSnapshot),
        (status = 404, description = "Unknown team")
    )
)]
/// Award a point to a team.
pub async fn score_point(
    State(state): State<SharedState>,
    Path(team): Path<u8>,
) -> Result<Json<MatchSnapshot>, AppError> {
    Ok(Json(match_service::score_point(&state, team).await?))
}

#[utoipa::path(
    post,
    path = "/match/teams/{team}/undo",
    tag = "match",
    params(("team" = u8, Path, description = "Team number (1 or 2)")),
    responses(
        (status = 200, description = "Point taken back", body = MatchSnapshot),
        (status = 404, description = "Unknown team")
    )
)]
/// Take back the last point of a team. The momentum history is not rewritten.
pub async fn undo_point(
    State(state): State<SharedState>,
    Path(team): Path<u8>,
) -> Result<Json<MatchSnapshot>, AppError> {
    Ok(Json(match_service::undo_point(&state, team).await?))
}

#[utoipa::path(
    get,
    path = "/match/history",
    tag = "match",
    responses((status = 200, description = "Score snapshots, oldest first", body = [HistoryPoint]))
)]
/// Return the data points of the momentum chart.
pub async fn get_history(State(state): State<SharedState>) -> Json<Vec<HistoryPoint>> {
    Json(match_service::history(&state).await)
}

#[utoipa::path(
    post,
    path = "/match/reset",
    tag = "match",
    responses((status = 200, description = "New match started", body = MatchSnapshot))
)]
/// Start a new match with the same teams and stage.
pub async fn reset_match(State(state): State<SharedState>) -> Json<MatchSnapshot> {
    Json(match_service::reset_match(&state).await)
}

#[utoipa::path(
    post,
    path = "/match/archive",
    tag = "match",
    responses(
        (status = 200, description = "Match saved", body = ArchivedMatch),
        (status = 503, description = "Archive store unavailable; nothing was saved")
    )
)]
/// Save the live match as a new archive row.
pub async fn archive_match(
    State(state): State<SharedState>,
) -> Result<Json<ArchivedMatch>, AppError> {
    Ok(Json(archive_service::archive_match(&state).await?))
}
