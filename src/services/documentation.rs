use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the beach scoreboard.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::match_stream,
        crate::routes::scoreboard::get_match,
        crate::routes::scoreboard::update_setup,
        crate::routes::scoreboard::increment_counter,
        crate::routes::scoreboard::decrement_counter,
        crate::routes::scoreboard::score_point,
        crate::routes::scoreboard::undo_point,
        crate::routes::scoreboard::get_history,
        crate::routes::scoreboard::reset_match,
        crate::routes::scoreboard::archive_match,
        crate::routes::archive::list_archive,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::scoreboard::MatchSnapshot,
            crate::dto::scoreboard::TeamSummary,
            crate::dto::scoreboard::HistoryPoint,
            crate::dto::scoreboard::StageDto,
            crate::dto::scoreboard::UpdateSetupRequest,
            crate::dto::archive::ArchivedMatch,
            crate::dto::sse::SystemStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "match", description = "Live match scoring"),
        (name = "archive", description = "Saved matches"),
    )
)]
pub struct ApiDoc;
