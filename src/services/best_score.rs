//! Best-score tracking for games: incremental update on new plays, full recomputation on
//! deletion.

use std::fmt;

use indexmap::IndexMap;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        models::{PlayEntity, PlayEntryEntity},
        record_store::RecordStore,
        storage::StorageResult,
    },
    services::stats::UNKNOWN_PLAYER,
};

/// Sentinel stored when a game has no scored play.
pub const NO_BEST_SCORE: &str = "N/A";

/// Which end of the score scale wins for a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreDirection {
    HigherWins,
    LowerWins,
}

impl ScoreDirection {
    pub fn from_hi_score_wins(hi_score_wins: bool) -> Self {
        if hi_score_wins {
            ScoreDirection::HigherWins
        } else {
            ScoreDirection::LowerWins
        }
    }

    /// Strict comparison: equal scores never replace the incumbent.
    pub fn is_better(self, candidate: i64, incumbent: i64) -> bool {
        match self {
            ScoreDirection::HigherWins => candidate > incumbent,
            ScoreDirection::LowerWins => candidate < incumbent,
        }
    }
}

/// Decoded `"<player name>:<score>"` best-score string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestScore {
    pub player_name: String,
    pub score: i64,
}

impl BestScore {
    /// Parse a stored best score. The sentinel and malformed values yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (name, score) = raw.rsplit_once(':')?;
        let score = score.trim().parse().ok()?;
        Some(Self {
            player_name: name.to_owned(),
            score,
        })
    }
}

impl fmt::Display for BestScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.player_name, self.score)
    }
}

fn player_name(names: &IndexMap<Uuid, String>, id: Uuid) -> String {
    names
        .get(&id)
        .cloned()
        .unwrap_or_else(|| UNKNOWN_PLAYER.to_owned())
}

/// Walk the scored entries of a new play against the recorded best. Returns the new best
/// only when at least one entry improved on it.
pub fn improve(
    recorded: Option<&str>,
    direction: ScoreDirection,
    entries: &[PlayEntryEntity],
    names: &IndexMap<Uuid, String>,
) -> Option<BestScore> {
    let mut running = recorded.and_then(BestScore::parse);
    let mut improved = false;

    for entry in entries {
        let Some(score) = entry.score else {
            continue;
        };
        let better = running
            .as_ref()
            .is_none_or(|best| direction.is_better(score, best.score));
        if better {
            running = Some(BestScore {
                player_name: player_name(names, entry.player_id),
                score,
            });
            improved = true;
        }
    }

    running.filter(|_| improved)
}

/// Extremum over every scored entry of `plays`, oldest play first.
pub fn recompute(
    direction: ScoreDirection,
    plays: &[PlayEntity],
    names: &IndexMap<Uuid, String>,
) -> Option<BestScore> {
    let mut ordered: Vec<&PlayEntity> = plays.iter().collect();
    ordered.sort_by_key(|play| play.date_time);

    let mut best: Option<(Uuid, i64)> = None;
    for entry in ordered.iter().flat_map(|play| play.entries.iter()) {
        let Some(score) = entry.score else {
            continue;
        };
        if best.is_none_or(|(_, incumbent)| direction.is_better(score, incumbent)) {
            best = Some((entry.player_id, score));
        }
    }

    best.map(|(player_id, score)| BestScore {
        player_name: player_name(names, player_id),
        score,
    })
}

async fn roster_names(store: &dyn RecordStore) -> StorageResult<IndexMap<Uuid, String>> {
    let players = store.list_players().await?;
    Ok(players
        .into_iter()
        .map(|player| (player.id, player.name))
        .collect())
}

/// Creation path: write the improved best score of the play's game, if any.
pub async fn on_play_created(store: &dyn RecordStore, play: &PlayEntity) -> StorageResult<()> {
    let Some(game) = store.find_game(play.game_id).await? else {
        warn!(game_id = %play.game_id, "game of new play not found; best score untouched");
        return Ok(());
    };

    let names = roster_names(store).await?;
    let direction = ScoreDirection::from_hi_score_wins(game.hi_score_wins);
    if let Some(best) = improve(game.best_score.as_deref(), direction, &play.entries, &names) {
        info!(game_id = %game.id, best_score = %best, "new best score");
        store.update_best_score(game.id, best.to_string()).await?;
    }
    Ok(())
}

/// Deletion path: recompute the best score of a game from all its surviving plays.
pub async fn on_play_deleted(store: &dyn RecordStore, game_id: Uuid) -> StorageResult<()> {
    let Some(game) = store.find_game(game_id).await? else {
        warn!(%game_id, "game of deleted play not found; best score untouched");
        return Ok(());
    };

    let plays = store.plays_for_game(game_id).await?;
    let names = roster_names(store).await?;
    let direction = ScoreDirection::from_hi_score_wins(game.hi_score_wins);
    let best = recompute(direction, &plays, &names)
        .map(|best| best.to_string())
        .unwrap_or_else(|| NO_BEST_SCORE.to_owned());

    info!(%game_id, best_score = %best, plays = plays.len(), "best score recomputed");
    store.update_best_score(game_id, best).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::{
        models::{NewGame, NewPlay, NewPlayer, Tier},
        record_store::memory::MemoryRecordStore,
    };
    use time::macros::datetime;

    fn scored(player_id: Uuid, score: Option<i64>) -> PlayEntryEntity {
        PlayEntryEntity {
            player_id,
            rank: 1,
            score,
            players_beaten: 0,
        }
    }

    #[test]
    fn parses_and_formats() {
        let best = BestScore::parse("Ann:42").unwrap();
        assert_eq!(best.player_name, "Ann");
        assert_eq!(best.score, 42);
        assert_eq!(best.to_string(), "Ann:42");
        assert_eq!(BestScore::parse("A:B:-3").unwrap().player_name, "A:B");
        assert!(BestScore::parse(NO_BEST_SCORE).is_none());
        assert!(BestScore::parse("Ann:lots").is_none());
    }

    #[test]
    fn improve_uses_strict_comparison() {
        let ann = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let names = IndexMap::from([(ann, "Ann".to_owned()), (bob, "Bob".to_owned())]);

        let same = improve(
            Some("Ann:50"),
            ScoreDirection::HigherWins,
            &[scored(bob, Some(50))],
            &names,
        );
        assert!(same.is_none());

        let better = improve(
            Some("Ann:50"),
            ScoreDirection::HigherWins,
            &[scored(ann, Some(40)), scored(bob, Some(51))],
            &names,
        );
        assert_eq!(better.unwrap().to_string(), "Bob:51");

        let low = improve(
            Some("Ann:50"),
            ScoreDirection::LowerWins,
            &[scored(bob, Some(49)), scored(ann, Some(45))],
            &names,
        );
        assert_eq!(low.unwrap().to_string(), "Ann:45");
    }

    #[test]
    fn sentinel_counts_as_no_prior_best() {
        let ghost = Uuid::new_v4();
        let best = improve(
            Some(NO_BEST_SCORE),
            ScoreDirection::LowerWins,
            &[scored(ghost, None), scored(ghost, Some(300))],
            &IndexMap::new(),
        );
        assert_eq!(best.unwrap().to_string(), "Unknown:300");
    }

    #[test]
    fn recompute_without_scores_is_none() {
        let play = PlayEntity {
            id: Uuid::new_v4(),
            game_id: Uuid::new_v4(),
            date_time: datetime!(2025-03-01 20:00 UTC),
            entries: vec![scored(Uuid::new_v4(), None)],
        };
        assert!(recompute(ScoreDirection::HigherWins, &[play], &IndexMap::new()).is_none());
    }

    #[tokio::test]
    async fn add_add_delete_scenario() {
        let store = MemoryRecordStore::new();
        let ann = store
            .add_player(NewPlayer {
                name: "Ann".into(),
                regular: true,
            })
            .await
            .unwrap();
        let bob = store
            .add_player(NewPlayer {
                name: "Bob".into(),
                regular: false,
            })
            .await
            .unwrap();
        let game = store
            .add_game(NewGame {
                name: "Azul".into(),
                tier: Tier::Light,
                hi_score_wins: true,
            })
            .await
            .unwrap();

        let first = store
            .add_play(NewPlay {
                game_id: game.id,
                date_time: datetime!(2025-03-01 20:00 UTC),
                entries: vec![scored(ann.id, Some(80))],
            })
            .await
            .unwrap();
        on_play_created(&store, &first).await.unwrap();

        let second = store
            .add_play(NewPlay {
                game_id: game.id,
                date_time: datetime!(2025-03-02 20:00 UTC),
                entries: vec![scored(bob.id, Some(95))],
            })
            .await
            .unwrap();
        on_play_created(&store, &second).await.unwrap();
        let recorded = store.find_game(game.id).await.unwrap().unwrap();
        assert_eq!(recorded.best_score.as_deref(), Some("Bob:95"));

        store.delete_play(second.id).await.unwrap();
        on_play_deleted(&store, game.id).await.unwrap();
        let recorded = store.find_game(game.id).await.unwrap().unwrap();
        assert_eq!(recorded.best_score.as_deref(), Some("Ann:80"));

        store.delete_play(first.id).await.unwrap();
        on_play_deleted(&store, game.id).await.unwrap();
        let recorded = store.find_game(game.id).await.unwrap().unwrap();
        assert_eq!(recorded.best_score.as_deref(), Some(NO_BEST_SCORE));
    }
}
