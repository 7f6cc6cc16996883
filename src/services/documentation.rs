use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document for the game night board.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::board::get_board,
        crate::routes::board::set_range,
        crate::routes::roster::list_players,
        crate::routes::roster::add_player,
        crate::routes::roster::list_games,
        crate::routes::roster::add_game,
        crate::routes::forms::get_form,
        crate::routes::forms::add_row,
        crate::routes::forms::remove_row,
        crate::routes::forms::sync_form,
        crate::routes::plays::submit_play,
        crate::routes::plays::delete_play,
        crate::routes::picker::list_candidates,
        crate::routes::picker::pick_start_player,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::board::BoardResponse,
            crate::dto::board::RangeUpdateRequest,
            crate::dto::tables::BoardTables,
            crate::dto::tables::LeaderboardRow,
            crate::dto::tables::RecentPlayRow,
            crate::dto::tables::GameRow,
            crate::dto::tables::DeleteAction,
            crate::dto::roster::PlayerView,
            crate::dto::roster::GameView,
            crate::dto::roster::CreatePlayerRequest,
            crate::dto::roster::CreateGameRequest,
            crate::dto::form::PlayFormView,
            crate::dto::form::FormSyncRequest,
            crate::dto::form::FormFlagsView,
            crate::dto::form::SubmitPlayResponse,
            crate::dto::picker::PickRequest,
            crate::dto::picker::PickResponse,
            crate::dto::picker::PickerPlayerView,
            crate::dao::models::Tier,
            crate::services::date_range::RangeMode,
            crate::services::date_range::DateInterval,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "board", description = "Statistics tables and range selection"),
        (name = "roster", description = "Players and games"),
        (name = "forms", description = "Add-play form editing"),
        (name = "plays", description = "Play submission and deletion"),
        (name = "picker", description = "Random start-player picker"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for expected in [
            "/healthcheck",
            "/board",
            "/board/range",
            "/players",
            "/games",
            "/forms/play/rows/{index}/remove",
            "/games/{game_id}/plays/{play_id}",
            "/picker/start-player",
        ] {
            assert!(paths.contains(&expected), "missing {expected}");
        }
    }
}
