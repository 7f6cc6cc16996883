//! Pure projection of board statistics into the three display tables.

use serde::Serialize;
use time::{UtcOffset, format_description::BorrowedFormatItem, macros::format_description};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::services::stats::{BoardStats, GameStat, PlaySummary, PlayerStat};

/// Widest viewport still rendered with the compact layout.
pub const SMALL_SCREEN_MAX_WIDTH: u32 = 576;

const LEADERBOARD_NAME_BUDGET: usize = 8;
const RECENT_GAME_BUDGET: usize = 8;
const RECENT_PLAYER_BUDGET: usize = 6;
const PER_GAME_GAME_BUDGET: usize = 8;
const PER_GAME_PLAYER_BUDGET: usize = 5;

const DATE_LABEL: &[BorrowedFormatItem<'static>] =
    format_description!("[month repr:short] [day padding:none]");

/// Layout the tables are rendered for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Viewport {
    #[default]
    Regular,
    Small,
}

impl Viewport {
    /// Classify a client viewport width; unknown widths render the regular layout.
    pub fn from_width(width: Option<u32>) -> Self {
        match width {
            Some(width) if width <= SMALL_SCREEN_MAX_WIDTH => Viewport::Small,
            _ => Viewport::Regular,
        }
    }

    fn is_small(self) -> bool {
        self == Viewport::Small
    }

    fn separator(self) -> &'static str {
        if self.is_small() { "," } else { ", " }
    }

    fn fit(self, text: &str, budget: usize) -> String {
        if self.is_small() {
            truncate_for_mobile(text, budget)
        } else {
            text.to_owned()
        }
    }
}

/// Shorten `text` to at most `budget` characters, ending with an ellipsis when cut.
pub fn truncate_for_mobile(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_owned();
    }
    let mut short: String = text.chars().take(budget.saturating_sub(1)).collect();
    short.push('…');
    short
}

/// One line of the player leaderboard.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct LeaderboardRow {
    pub name: String,
    pub wins: u32,
    pub plays: u32,
    /// Whole percentage followed by `%`.
    pub win_percentage: String,
    pub players_defeated: u32,
    /// Weighted wins with one decimal.
    pub weighted_wins: String,
}

/// Identifiers carried by the delete action of a recent play.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
pub struct DeleteAction {
    pub play_id: Uuid,
    pub game_id: Uuid,
}

/// One line of the recent plays table.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct RecentPlayRow {
    /// Short `"Mon D"` label.
    pub date: String,
    pub game: String,
    pub winner: String,
    pub winning_score: String,
    pub players: String,
    pub delete: DeleteAction,
}

/// One line of the per-game table.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct GameRow {
    pub game: String,
    pub plays: u32,
    /// `"<name>:<wins>"` pairs.
    pub player_wins: String,
    pub best_score: String,
}

/// The three tables of the board.
#[derive(Debug, Clone, Default, Serialize, ToSchema, PartialEq)]
pub struct BoardTables {
    pub leaderboard: Vec<LeaderboardRow>,
    pub recent_plays: Vec<RecentPlayRow>,
    pub games: Vec<GameRow>,
}

/// Render every table; dates are labelled in `offset`.
pub fn render(stats: &BoardStats, viewport: Viewport, offset: UtcOffset) -> BoardTables {
    BoardTables {
        leaderboard: leaderboard(stats.players.values(), viewport),
        recent_plays: stats
            .plays
            .iter()
            .map(|play| recent_play(play, viewport, offset))
            .collect(),
        games: stats
            .games
            .values()
            .map(|game| game_row(game, viewport))
            .collect(),
    }
}

fn leaderboard<'a>(
    players: impl Iterator<Item = &'a PlayerStat>,
    viewport: Viewport,
) -> Vec<LeaderboardRow> {
    let mut ordered: Vec<&PlayerStat> = players.collect();
    ordered.sort_by(|a, b| b.wins.cmp(&a.wins));
    ordered
        .into_iter()
        .map(|player| LeaderboardRow {
            name: viewport.fit(&player.name, LEADERBOARD_NAME_BUDGET),
            wins: player.wins,
            plays: player.plays,
            win_percentage: format!("{}%", player.win_percentage),
            players_defeated: player.players_defeated,
            weighted_wins: player.weighted_wins_label(),
        })
        .collect()
}

fn recent_play(play: &PlaySummary, viewport: Viewport, offset: UtcOffset) -> RecentPlayRow {
    let date = play
        .date_time
        .to_offset(offset)
        .format(DATE_LABEL)
        .unwrap_or_default();
    let players = play
        .players
        .iter()
        .map(|name| viewport.fit(name, RECENT_PLAYER_BUDGET))
        .collect::<Vec<_>>()
        .join(viewport.separator());

    RecentPlayRow {
        date,
        game: viewport.fit(&play.game_name, RECENT_GAME_BUDGET),
        winner: play.winner.clone(),
        winning_score: play.winning_score.clone(),
        players,
        delete: DeleteAction {
            play_id: play.play_id,
            game_id: play.game_id,
        },
    }
}

fn game_row(game: &GameStat, viewport: Viewport) -> GameRow {
    let player_wins = game
        .player_wins
        .iter()
        .map(|tally| {
            format!(
                "{}:{}",
                viewport.fit(&tally.player_name, PER_GAME_PLAYER_BUDGET),
                tally.wins
            )
        })
        .collect::<Vec<_>>()
        .join(viewport.separator());

    GameRow {
        game: viewport.fit(&game.name, PER_GAME_GAME_BUDGET),
        plays: game.plays,
        player_wins,
        best_score: game.best_score.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::stats::WinTally;
    use indexmap::IndexMap;
    use time::macros::{datetime, offset};

    fn player(name: &str, wins: u32) -> PlayerStat {
        PlayerStat {
            name: name.into(),
            wins,
            plays: 3,
            players_defeated: 4,
            weighted_wins: 1.5,
            win_percentage: 67,
        }
    }

    fn stats() -> BoardStats {
        let play_id = Uuid::new_v4();
        let game_id = Uuid::new_v4();
        let alexandra = Uuid::new_v4();
        BoardStats {
            players: IndexMap::from([
                (Uuid::new_v4(), player("Bob", 1)),
                (alexandra, player("Alexandra", 2)),
                (Uuid::new_v4(), player("Cy", 1)),
            ]),
            plays: vec![PlaySummary {
                play_id,
                game_id,
                date_time: datetime!(2025-03-04 23:30 UTC),
                game_name: "Terraforming Mars".into(),
                players: vec!["Alexandra".into(), "Bob".into()],
                winner: "Alexandra/Bob".into(),
                winning_score: "88".into(),
            }],
            games: IndexMap::from([(
                game_id,
                GameStat {
                    name: "Terraforming Mars".into(),
                    plays: 1,
                    player_wins: vec![WinTally {
                        player_id: alexandra,
                        player_name: "Alexandra".into(),
                        wins: 1,
                    }],
                    best_score: "Alexandra:88".into(),
                },
            )]),
        }
    }

    #[test]
    fn truncation_respects_the_budget() {
        assert_eq!(truncate_for_mobile("Azul", 8), "Azul");
        assert_eq!(truncate_for_mobile("Carcasso", 8), "Carcasso");
        assert_eq!(truncate_for_mobile("Carcassonne", 8), "Carcass…");
        assert_eq!(truncate_for_mobile("Éléonore", 5), "Éléo…");
    }

    #[test]
    fn small_screen_threshold_is_inclusive() {
        assert_eq!(Viewport::from_width(Some(576)), Viewport::Small);
        assert_eq!(Viewport::from_width(Some(577)), Viewport::Regular);
        assert_eq!(Viewport::from_width(None), Viewport::Regular);
    }

    #[test]
    fn regular_layout_keeps_full_text() {
        let tables = render(&stats(), Viewport::Regular, UtcOffset::UTC);

        let names: Vec<_> = tables.leaderboard.iter().map(|row| row.name.as_str()).collect();
        assert_eq!(names, vec!["Alexandra", "Bob", "Cy"]);
        assert_eq!(tables.leaderboard[0].win_percentage, "67%");
        assert_eq!(tables.leaderboard[0].weighted_wins, "1.5");

        let play = &tables.recent_plays[0];
        assert_eq!(play.date, "Mar 4");
        assert_eq!(play.game, "Terraforming Mars");
        assert_eq!(play.players, "Alexandra, Bob");
        assert_eq!(play.winner, "Alexandra/Bob");

        assert_eq!(tables.games[0].player_wins, "Alexandra:1");
        assert_eq!(tables.games[0].best_score, "Alexandra:88");
    }

    #[test]
    fn small_layout_truncates_and_tightens_joins() {
        let tables = render(&stats(), Viewport::Small, offset!(+2));

        assert_eq!(tables.leaderboard[0].name, "Alexand…");
        let play = &tables.recent_plays[0];
        assert_eq!(play.date, "Mar 5");
        assert_eq!(play.game, "Terrafo…");
        assert_eq!(play.players, "Alexa…,Bob");
        assert_eq!(tables.games[0].game, "Terrafo…");
        assert_eq!(tables.games[0].player_wins, "Alex…:1");
    }
}
