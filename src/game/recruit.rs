//! Recruitment: players come into being the first time they are observed
//! participating, and are never destroyed.

use crate::config::{Assignment, GameConfig};
use crate::error::{GameError, GameResult};
use crate::player::{base36_decode, Player};
use crate::store::Tx;
use crate::team::Team;
use crate::time::Timestamp;
use rand::{Rng, RngCore};

/// Starting force for every recruit.
pub const STARTING_LOYALISTS: i64 = 100;

/// Create a player for `name` unless one already exists. Returns `None` for
/// known players.
pub fn recruit(
    tx: &Tx<'_>,
    cfg: &GameConfig,
    rng: &mut dyn RngCore,
    now: Timestamp,
    name: &str,
    external_id: Option<&str>,
) -> GameResult<Option<Player>> {
    let name = name.to_lowercase();
    if tx.player_by_name(&name)?.is_some() {
        return Ok(None);
    }

    let team = assign_team(cfg, rng, external_id);
    let capital = tx
        .capital_for(team)?
        .ok_or_else(|| GameError::UnknownRegion(format!("{} capital", team)))?;
    let leader = cfg
        .leaders
        .iter()
        .any(|leader| leader.to_lowercase() == name);

    let player = tx.insert_player(&name, team, STARTING_LOYALISTS, capital.id, leader, now)?;
    tracing::info!(player = %player.name, team = %team, leader, "created combatant");
    Ok(Some(player))
}

fn assign_team(cfg: &GameConfig, rng: &mut dyn RngCore, external_id: Option<&str>) -> Team {
    match cfg.assignment {
        Assignment::Uid => external_id
            .and_then(base36_decode)
            .and_then(|uid| Team::from_index((uid % 2) as i64))
            .unwrap_or(Team::Orangered),
        Assignment::Random => {
            if rng.gen::<bool>() {
                Team::Periwinkle
            } else {
                Team::Orangered
            }
        }
        Assignment::Fixed => Team::Orangered,
    }
}
