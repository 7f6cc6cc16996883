//! Random start-player picker.

use rand::{Rng, seq::IndexedRandom};
use tracing::info;
use uuid::Uuid;

use crate::{
    dto::picker::{PickRequest, PickResponse, PickerPlayerView},
    error::ServiceError,
    services::roster_service,
    state::SharedState,
};

/// Uniform pick among `checked`, never repeating `last`.
pub fn pick<R: Rng + ?Sized>(checked: &[Uuid], last: Option<Uuid>, rng: &mut R) -> Option<Uuid> {
    let eligible: Vec<Uuid> = checked
        .iter()
        .copied()
        .filter(|id| Some(*id) != last)
        .collect();
    eligible.choose(rng).copied()
}

/// Roster sorted by name, regulars pre-checked.
pub async fn roster(state: &SharedState) -> Result<Vec<PickerPlayerView>, ServiceError> {
    let store = state.require_record_store().await?;
    let mut players = store.list_players().await?;
    roster_service::sort_players(&mut players);
    Ok(players
        .into_iter()
        .map(|player| PickerPlayerView {
            id: player.id,
            name: player.name,
            checked: player.regular,
        })
        .collect())
}

/// Pick the start player among the checked roster entries and remember the choice.
pub async fn start_player(
    state: &SharedState,
    request: PickRequest,
) -> Result<PickResponse, ServiceError> {
    let store = state.require_record_store().await?;
    let players = store.list_players().await?;
    let checked: Vec<Uuid> = players
        .iter()
        .map(|player| player.id)
        .filter(|id| request.checked.contains(id))
        .collect();

    let mut controller = state.controller().write().await;
    let chosen = pick(&checked, controller.last_pick(), &mut rand::rng());
    let Some(player_id) = chosen else {
        info!(checked = checked.len(), "no eligible start player");
        return Ok(PickResponse::nobody());
    };
    controller.record_pick(player_id);

    let name = players
        .into_iter()
        .find(|player| player.id == player_id)
        .map(|player| player.name)
        .unwrap_or_default();
    info!(%player_id, %name, "start player picked");
    Ok(PickResponse::picked(player_id, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn never_repeats_the_last_pick() {
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let chosen = pick(&ids, Some(ids[1]), &mut rng).unwrap();
            assert_ne!(chosen, ids[1]);
            assert!(ids.contains(&chosen));
        }
    }

    #[test]
    fn nobody_eligible_yields_none() {
        let only = Uuid::new_v4();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(pick(&[], None, &mut rng), None);
        assert_eq!(pick(&[only], Some(only), &mut rng), None);
        assert_eq!(pick(&[only], None, &mut rng), Some(only));
    }
}
