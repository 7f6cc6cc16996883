//! Play entry form: participant rows, cross-row player uniqueness and validation.

use std::collections::HashSet;

use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dao::models::{NewPlay, PlayEntryEntity, PlayerEntity};

/// One participant line of the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantRow {
    pub player_id: Option<Uuid>,
    pub rank: Option<u32>,
    pub score: Option<i64>,
}

/// Roster entry as offered in one row's player selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerOption {
    pub player_id: Uuid,
    pub name: String,
    pub disabled: bool,
    pub hidden: bool,
}

/// Invalid markers of one row; `true` means the field needs attention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowFlags {
    pub player: bool,
    pub rank: bool,
}

/// Every invalid field of the form, collected in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFlags {
    pub game: bool,
    pub date_time: bool,
    pub rows: Vec<RowFlags>,
}

impl FormFlags {
    pub fn is_valid(&self) -> bool {
        !self.game && !self.date_time && self.rows.iter().all(|row| !row.player && !row.rank)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("row {index} does not exist (form has {rows} rows)")]
    NoSuchRow { index: usize, rows: usize },
    #[error("player `{player_id}` is already selected in row {row}")]
    PlayerTaken { player_id: Uuid, row: usize },
}

/// Add-play form state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayForm {
    pub game_id: Option<Uuid>,
    pub date_time: Option<OffsetDateTime>,
    rows: Vec<ParticipantRow>,
}

impl PlayForm {
    /// Fresh form: no game, date set to `now`, one empty row ranked first.
    pub fn new(now: OffsetDateTime) -> Self {
        let mut form = Self {
            game_id: None,
            date_time: Some(now),
            rows: Vec::new(),
        };
        form.add_row();
        form
    }

    pub fn rows(&self) -> &[ParticipantRow] {
        &self.rows
    }

    /// Append a row whose default rank follows the current row count. Returns its index.
    pub fn add_row(&mut self) -> usize {
        let rank = u32::try_from(self.rows.len()).map_or(u32::MAX, |len| len.saturating_add(1));
        self.rows.push(ParticipantRow {
            player_id: None,
            rank: Some(rank),
            score: None,
        });
        self.rows.len() - 1
    }

    pub fn remove_row(&mut self, index: usize) -> Result<ParticipantRow, FormError> {
        if index >= self.rows.len() {
            return Err(FormError::NoSuchRow {
                index,
                rows: self.rows.len(),
            });
        }
        Ok(self.rows.remove(index))
    }

    /// Players chosen in any row.
    pub fn taken(&self) -> HashSet<Uuid> {
        self.rows.iter().filter_map(|row| row.player_id).collect()
    }

    /// Choose (or clear) the player of a row. A player held by another row is rejected.
    pub fn select_player(&mut self, index: usize, player_id: Option<Uuid>) -> Result<(), FormError> {
        let rows = self.rows.len();
        if index >= rows {
            return Err(FormError::NoSuchRow { index, rows });
        }
        if let Some(id) = player_id {
            if let Some((row, _)) = self
                .rows
                .iter()
                .enumerate()
                .find(|(other, row)| *other != index && row.player_id == Some(id))
            {
                return Err(FormError::PlayerTaken { player_id: id, row });
            }
        }
        self.rows[index].player_id = player_id;
        Ok(())
    }

    /// Replace every field at once, applying the row uniqueness rule. The form is left
    /// untouched on error.
    pub fn sync(
        &mut self,
        game_id: Option<Uuid>,
        date_time: Option<OffsetDateTime>,
        rows: Vec<ParticipantRow>,
    ) -> Result<(), FormError> {
        let mut next = Self {
            game_id,
            date_time,
            rows: rows
                .iter()
                .map(|row| ParticipantRow {
                    player_id: None,
                    ..row.clone()
                })
                .collect(),
        };
        for (index, row) in rows.iter().enumerate() {
            next.select_player(index, row.player_id)?;
        }
        *self = next;
        Ok(())
    }

    /// Selector options of every row: a player taken elsewhere is disabled and hidden,
    /// except in the row holding it.
    pub fn player_options(&self, roster: &[PlayerEntity]) -> Vec<Vec<PlayerOption>> {
        let taken = self.taken();
        self.rows
            .iter()
            .map(|row| {
                roster
                    .iter()
                    .map(|player| {
                        let in_use =
                            taken.contains(&player.id) && row.player_id != Some(player.id);
                        PlayerOption {
                            player_id: player.id,
                            name: player.name.clone(),
                            disabled: in_use,
                            hidden: in_use,
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// Flag every missing or invalid field. Duplicate players are flagged on each
    /// repeated row.
    pub fn validate(&self) -> FormFlags {
        let mut seen = HashSet::new();
        let rows = self
            .rows
            .iter()
            .map(|row| RowFlags {
                player: match row.player_id {
                    Some(id) => !seen.insert(id),
                    None => true,
                },
                rank: !matches!(row.rank, Some(rank) if rank > 0),
            })
            .collect();

        FormFlags {
            game: self.game_id.is_none(),
            date_time: self.date_time.is_none(),
            rows,
        }
    }

    /// Normalize into a play record; `players_beaten` counts rows with a strictly worse rank.
    pub fn to_new_play(&self) -> Result<NewPlay, FormFlags> {
        let flags = self.validate();
        let (Some(game_id), Some(date_time), true) = (self.game_id, self.date_time, flags.is_valid())
        else {
            return Err(flags);
        };

        let ranks: Vec<u32> = self.rows.iter().filter_map(|row| row.rank).collect();
        let entries = self
            .rows
            .iter()
            .filter_map(|row| {
                let player_id = row.player_id?;
                let rank = row.rank?;
                let beaten = ranks.iter().filter(|other| **other > rank).count();
                Some(PlayEntryEntity {
                    player_id,
                    rank,
                    score: row.score,
                    players_beaten: u32::try_from(beaten).unwrap_or(u32::MAX),
                })
            })
            .collect();

        Ok(NewPlay {
            game_id,
            date_time,
            entries,
        })
    }

    pub fn reset(&mut self, now: OffsetDateTime) {
        *self = Self::new(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2025-05-20 20:00 UTC);

    fn roster(names: &[&str]) -> Vec<PlayerEntity> {
        names
            .iter()
            .map(|name| PlayerEntity {
                id: Uuid::new_v4(),
                name: (*name).into(),
                regular: false,
            })
            .collect()
    }

    #[test]
    fn new_rows_default_to_next_rank() {
        let mut form = PlayForm::new(NOW);
        assert_eq!(form.rows().len(), 1);
        assert_eq!(form.rows()[0].rank, Some(1));
        assert_eq!(form.date_time, Some(NOW));

        form.add_row();
        form.add_row();
        form.remove_row(0).unwrap();
        let index = form.add_row();
        assert_eq!(index, 2);
        assert_eq!(form.rows()[2].rank, Some(3));
        assert_eq!(
            form.remove_row(7),
            Err(FormError::NoSuchRow { index: 7, rows: 3 })
        );
    }

    #[test]
    fn taken_players_are_hidden_in_other_rows() {
        let players = roster(&["Ann", "Bob", "Cat"]);
        let mut form = PlayForm::new(NOW);
        form.add_row();
        form.select_player(0, Some(players[0].id)).unwrap();

        let options = form.player_options(&players);
        assert!(!options[0][0].disabled);
        assert!(options[1][0].disabled && options[1][0].hidden);
        assert!(!options[1][1].disabled);

        assert_eq!(
            form.select_player(1, Some(players[0].id)),
            Err(FormError::PlayerTaken {
                player_id: players[0].id,
                row: 0
            })
        );

        form.select_player(0, None).unwrap();
        form.select_player(1, Some(players[0].id)).unwrap();
        let options = form.player_options(&players);
        assert!(options[0][0].hidden);
        assert!(!options[1][0].hidden);
    }

    #[test]
    fn removing_a_row_releases_its_player() {
        let players = roster(&["Ann", "Bob"]);
        let mut form = PlayForm::new(NOW);
        form.add_row();
        form.select_player(1, Some(players[1].id)).unwrap();
        form.remove_row(1).unwrap();
        assert!(form.taken().is_empty());
        assert!(form.player_options(&players)[0].iter().all(|o| !o.disabled));
    }

    #[test]
    fn validation_flags_every_field_together() {
        let mut form = PlayForm::new(NOW);
        form.date_time = None;
        form.add_row();
        let mut rows = form.rows().to_vec();
        rows[1].rank = None;
        form.sync(None, None, rows).unwrap();

        let flags = form.validate();
        assert!(flags.game);
        assert!(flags.date_time);
        assert_eq!(
            flags.rows,
            vec![
                RowFlags {
                    player: true,
                    rank: false
                },
                RowFlags {
                    player: true,
                    rank: true
                },
            ]
        );
        assert_eq!(form.to_new_play(), Err(flags));
    }

    #[test]
    fn sync_rejects_duplicates_and_keeps_previous_state() {
        let players = roster(&["Ann"]);
        let mut form = PlayForm::new(NOW);
        let before = form.clone();
        let row = ParticipantRow {
            player_id: Some(players[0].id),
            rank: Some(1),
            score: None,
        };
        let result = form.sync(None, Some(NOW), vec![row.clone(), row]);
        assert!(matches!(result, Err(FormError::PlayerTaken { .. })));
        assert_eq!(form, before);
    }

    #[test]
    fn submission_counts_players_beaten() {
        let players = roster(&["Ann", "Bob", "Cat"]);
        let game_id = Uuid::new_v4();
        let mut form = PlayForm::new(NOW);
        form.sync(
            Some(game_id),
            Some(NOW),
            vec![
                ParticipantRow {
                    player_id: Some(players[0].id),
                    rank: Some(1),
                    score: Some(30),
                },
                ParticipantRow {
                    player_id: Some(players[1].id),
                    rank: Some(2),
                    score: None,
                },
                ParticipantRow {
                    player_id: Some(players[2].id),
                    rank: Some(2),
                    score: Some(10),
                },
            ],
        )
        .unwrap();

        let play = form.to_new_play().unwrap();
        assert_eq!(play.game_id, game_id);
        let beaten = play
            .entries
            .iter()
            .map(|entry| entry.players_beaten)
            .collect::<Vec<_>>();
        assert_eq!(beaten, vec![2, 0, 0]);
        assert_eq!(play.entries[0].score, Some(30));

        form.reset(NOW);
        assert_eq!(form, PlayForm::new(NOW));
    }
}
