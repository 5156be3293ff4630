use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the battle orchestrator.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::battle::start_battle,
        crate::routes::battle::stop_battle,
        crate::routes::public::get_stats,
        crate::routes::public::get_leaderboard,
        crate::routes::public::get_participants,
        crate::routes::public::get_status,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::battle::StartBattleResponse,
            crate::dto::battle::StopBattleResponse,
            crate::dto::battle::BattleStatusView,
            crate::dto::broadcast::BattleEvent,
            crate::dao::models::BattleStatus,
            crate::dao::models::Question,
            crate::dao::models::QuestionStats,
            crate::dao::models::Leaderboard,
            crate::dao::models::RowSet,
            crate::dao::models::Participant,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "battle", description = "Battle start and stop control"),
        (name = "public", description = "Pull endpoints mirroring broadcast data"),
    )
)]
pub struct ApiDoc;
