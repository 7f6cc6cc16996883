//! Statistics engine folding the records of a date window into leaderboard, play log and
//! per-game summaries.

use std::cmp::Ordering;

use indexmap::IndexMap;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::{
    dao::{
        models::{GameEntity, PlayEntity, PlayerEntity},
        record_store::RecordStore,
        storage::StorageError,
    },
    services::{best_score::NO_BEST_SCORE, date_range::DateInterval},
};

/// Name shown for a player id missing from the roster.
pub const UNKNOWN_PLAYER: &str = "Unknown";

/// Aggregated results of one player over the window.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStat {
    pub name: String,
    pub wins: u32,
    pub plays: u32,
    pub players_defeated: u32,
    pub weighted_wins: f64,
    pub win_percentage: u32,
}

impl PlayerStat {
    fn new(name: String) -> Self {
        Self {
            name,
            wins: 0,
            plays: 0,
            players_defeated: 0,
            weighted_wins: 0.0,
            win_percentage: 0,
        }
    }

    /// Weighted wins with exactly one decimal.
    pub fn weighted_wins_label(&self) -> String {
        format!("{:.1}", self.weighted_wins)
    }
}

/// One line of the play log.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaySummary {
    pub play_id: Uuid,
    pub game_id: Uuid,
    pub date_time: OffsetDateTime,
    pub game_name: String,
    /// Names of the known participants, in entry order.
    pub players: Vec<String>,
    /// `"<winner>/<loser>"`, or `"N/A / <loser>"` without a rank-1 entry.
    pub winner: String,
    pub winning_score: String,
}

/// Rank-1 finishes of one player in one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinTally {
    pub player_id: Uuid,
    pub player_name: String,
    pub wins: u32,
}

/// Aggregated results of one game over the window.
#[derive(Debug, Clone, PartialEq)]
pub struct GameStat {
    pub name: String,
    pub plays: u32,
    /// Sorted by descending wins, then by player name.
    pub player_wins: Vec<WinTally>,
    pub best_score: String,
}

/// Everything the board tables are rendered from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardStats {
    /// Players with at least one play, in roster order.
    pub players: IndexMap<Uuid, PlayerStat>,
    /// Most recent play first.
    pub plays: Vec<PlaySummary>,
    /// Sorted by descending play count.
    pub games: IndexMap<Uuid, GameStat>,
}

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("play `{play_id}` references unknown game `{game_id}`")]
    UnknownGame { play_id: Uuid, game_id: Uuid },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Compare display names case-insensitively, falling back to an exact comparison.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Fetch the roster, the games and the plays of `interval`, then fold them.
pub async fn load(store: &dyn RecordStore, interval: DateInterval) -> Result<BoardStats, StatsError> {
    let (players, games, plays) = futures::try_join!(
        store.list_players(),
        store.list_games(),
        store.plays_between(interval.start, interval.end),
    )?;
    debug!(
        players = players.len(),
        games = games.len(),
        plays = plays.len(),
        "loaded records for statistics"
    );
    compute(&players, &games, &plays, interval)
}

/// Fold the records into board statistics. Plays outside `interval` are ignored.
pub fn compute(
    players: &[PlayerEntity],
    games: &[GameEntity],
    plays: &[PlayEntity],
    interval: DateInterval,
) -> Result<BoardStats, StatsError> {
    let games_by_id: IndexMap<Uuid, &GameEntity> =
        games.iter().map(|game| (game.id, game)).collect();
    let names: IndexMap<Uuid, &str> = players
        .iter()
        .map(|player| (player.id, player.name.as_str()))
        .collect();

    let mut player_stats: IndexMap<Uuid, PlayerStat> = players
        .iter()
        .map(|player| (player.id, PlayerStat::new(player.name.clone())))
        .collect();
    let mut game_plays: IndexMap<Uuid, (u32, IndexMap<Uuid, u32>)> = IndexMap::new();
    let mut summaries = Vec::new();

    let mut in_range: Vec<&PlayEntity> = plays
        .iter()
        .filter(|play| interval.contains(play.date_time))
        .collect();
    in_range.sort_by_key(|play| play.date_time);

    for play in in_range {
        let game = games_by_id
            .get(&play.game_id)
            .ok_or(StatsError::UnknownGame {
                play_id: play.id,
                game_id: play.game_id,
            })?;

        let (count, wins) = game_plays.entry(play.game_id).or_default();
        *count += 1;

        let mut participants = Vec::new();
        let mut winner: Option<String> = None;
        let mut winning_score = NO_BEST_SCORE.to_owned();
        let mut max_rank = 0;
        let mut loser = String::new();

        for entry in &play.entries {
            if entry.rank == 1 {
                *wins.entry(entry.player_id).or_default() += 1;
            }

            let Some(stat) = player_stats.get_mut(&entry.player_id) else {
                continue;
            };

            stat.plays += 1;
            stat.players_defeated += entry.players_beaten;
            participants.push(stat.name.clone());

            if entry.rank == 1 {
                stat.wins += 1;
                stat.weighted_wins += game.tier.win_weight();
                winner = Some(stat.name.clone());
                winning_score = entry
                    .score
                    .map_or_else(|| NO_BEST_SCORE.to_owned(), |score| score.to_string());
            }

            if entry.rank > max_rank {
                max_rank = entry.rank;
                loser = stat.name.clone();
            }
        }

        let winner = match winner {
            Some(name) => format!("{name}/{loser}"),
            None => format!("{NO_BEST_SCORE} / {loser}"),
        };

        summaries.push(PlaySummary {
            play_id: play.id,
            game_id: play.game_id,
            date_time: play.date_time,
            game_name: game.name.clone(),
            players: participants,
            winner,
            winning_score,
        });
    }

    player_stats.retain(|_, stat| stat.plays > 0);
    for stat in player_stats.values_mut() {
        stat.win_percentage = (100.0 * f64::from(stat.wins) / f64::from(stat.plays)).round() as u32;
    }

    summaries.reverse();

    let mut game_stats: IndexMap<Uuid, GameStat> = game_plays
        .into_iter()
        .filter_map(|(game_id, (plays, wins))| {
            let game = games_by_id.get(&game_id)?;
            let mut player_wins: Vec<WinTally> = wins
                .into_iter()
                .map(|(player_id, wins)| WinTally {
                    player_id,
                    player_name: names
                        .get(&player_id)
                        .copied()
                        .unwrap_or(UNKNOWN_PLAYER)
                        .to_owned(),
                    wins,
                })
                .collect();
            player_wins.sort_by(|a, b| {
                b.wins
                    .cmp(&a.wins)
                    .then_with(|| compare_names(&a.player_name, &b.player_name))
            });

            let best_score = game
                .best_score
                .clone()
                .filter(|best| !best.is_empty())
                .unwrap_or_else(|| NO_BEST_SCORE.to_owned());

            Some((
                game_id,
                GameStat {
                    name: game.name.clone(),
                    plays,
                    player_wins,
                    best_score,
                },
            ))
        })
        .collect();
    game_stats.sort_by(|_, a, _, b| b.plays.cmp(&a.plays));

    Ok(BoardStats {
        players: player_stats,
        plays: summaries,
        games: game_stats,
    })
}
