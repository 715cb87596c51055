//! The movement subsystem: scheduling marching orders, cancelling them, and
//! applying arrivals at tick time.
//!
//! A player's "is moving" state is their ordered chain of live orders; only
//! the head is actionable, and invalidating any hop cancels the whole chain.

use crate::config::GameConfig;
use crate::error::{Conflict, GameError, GameResult};
use crate::geo::{Region, RegionId};
use crate::player::{Player, PlayerId};
use crate::store::Tx;
use crate::time::Timestamp;

/// One scheduled hop of a march. `source == dest` marks an intra-region
/// sector change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarchingOrder {
    pub id: i64,
    pub leader: PlayerId,
    pub source: RegionId,
    pub dest: RegionId,
    pub dest_sector: i64,
    pub arrival: Timestamp,
}

impl MarchingOrder {
    pub fn has_arrived(&self, now: Timestamp) -> bool {
        self.arrival <= now
    }
}

/// A hop that landed during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arrival {
    pub player: PlayerId,
    pub region: RegionId,
}

/// Lead `count` loyalists along `path` (region ids, each adjacent to the
/// last). The whole chain is validated before anything is scheduled; a
/// single adjacent hop with zero delay moves the player immediately.
pub fn march(
    tx: &Tx<'_>,
    cfg: &GameConfig,
    now: Timestamp,
    player: &mut Player,
    count: i64,
    path: &[RegionId],
    per_hop_delay: i64,
    dest_sector: i64,
) -> GameResult<Vec<MarchingOrder>> {
    if let Some(order) = tx.marches_for(player.id)?.into_iter().next() {
        let dest = tx.region_by_id(order.dest)?;
        return Err(GameError::InProgress(Conflict::March {
            dest: dest.name,
            arrival: order.arrival,
        }));
    }
    if let Some(skirmish) = tx.open_skirmishes_for(player.id)?.first() {
        return Err(GameError::InProgress(Conflict::Fighting { id: skirmish.id }));
    }

    let count = if count == -1 { player.loyalists } else { count };
    if count <= 0 || count > player.loyalists {
        return Err(GameError::insufficient_loyalists(count, player.loyalists));
    }
    if dest_sector < 0 || dest_sector >= cfg.num_sectors {
        return Err(GameError::NoSuchSector {
            sector: dest_sector,
            count: cfg.num_sectors,
        });
    }
    if path.is_empty() {
        return Err(GameError::NoPath {
            src: tx.region_by_id(player.region)?.name,
            dest: "anywhere".to_string(),
        });
    }

    // A path consisting of the current region is a sector change; it skips
    // adjacency checks and travels at the flat intrasector rate.
    if path.len() == 1 && path[0] == player.region {
        player.defectable = false;
        if cfg.intrasector_travel <= 0 {
            player.sector = dest_sector;
            tx.save_player(player)?;
            return Ok(Vec::new());
        }
        let order = tx.insert_march(
            player.id,
            player.region,
            player.region,
            dest_sector,
            now + cfg.intrasector_travel,
        )?;
        tx.save_player(player)?;
        return Ok(vec![order]);
    }

    let hops = validate_chain(tx, cfg, player, path)?;

    if per_hop_delay == 0 && hops.len() == 1 {
        player.region = hops[0].id;
        player.sector = dest_sector;
        player.defectable = false;
        tx.save_player(player)?;
        return Ok(Vec::new());
    }

    let mut orders = Vec::new();
    let mut arrival = now;
    let mut source = player.region;
    let last = hops.len() - 1;
    for (i, dest) in hops.iter().enumerate() {
        arrival += (per_hop_delay as f64 * dest.travel_multiplier) as i64;
        let sector = if i == last { dest_sector } else { 0 };
        orders.push(tx.insert_march(player.id, source, dest.id, sector, arrival)?);
        source = dest.id;
    }
    player.defectable = false;
    tx.save_player(player)?;
    Ok(orders)
}

fn validate_chain(
    tx: &Tx<'_>,
    cfg: &GameConfig,
    player: &Player,
    path: &[RegionId],
) -> GameResult<Vec<Region>> {
    let mut hops = Vec::with_capacity(path.len());
    let mut source = tx.region_by_id(player.region)?;
    for &dest_id in path {
        let dest = tx.region_by_id(dest_id)?;
        if !tx.are_adjacent(source.id, dest.id)? {
            return Err(GameError::NonAdjacent {
                src: source.name,
                dest: dest.name,
            });
        }
        let embattled = tx.battle_for_region(dest.id)?.is_some();
        if !dest.enterable_by(player.team, embattled, cfg.traversable_neutrals) {
            return Err(GameError::Team {
                what: dest.name,
                friendly: false,
            });
        }
        hops.push(dest.clone());
        source = dest;
    }
    Ok(hops)
}

/// Cancel every pending order; the player stays in their record-keeping
/// region.
pub fn cancel(tx: &Tx<'_>, player: &Player) -> GameResult<usize> {
    tx.delete_marches_for(player.id)
}

/// Emergency evacuation to the team capital. Refused while the player has
/// any unresolved skirmish.
pub fn extract(tx: &Tx<'_>, player: &mut Player) -> GameResult<Region> {
    if let Some(skirmish) = tx.open_skirmishes_for(player.id)?.first() {
        return Err(GameError::InProgress(Conflict::Fighting { id: skirmish.id }));
    }
    tx.delete_marches_for(player.id)?;
    let capital = tx
        .capital_for(player.team)?
        .ok_or_else(|| GameError::UnknownRegion(format!("{} capital", player.team)))?;
    player.region = capital.id;
    player.sector = 0;
    tx.save_player(player)?;
    Ok(capital)
}

/// Tick phase: land every due hop, in arrival order. A hop whose source no
/// longer matches the player's region, or whose destination is no longer
/// enterable, cancels the player's whole chain.
pub fn advance(tx: &Tx<'_>, cfg: &GameConfig, now: Timestamp) -> GameResult<Vec<Arrival>> {
    let mut arrivals = Vec::new();
    for order in tx.due_marches(now)? {
        let mut player = tx.player_by_id(order.leader)?;
        if player.region != order.source {
            cancel_chain(tx, &player)?;
            continue;
        }
        let dest = tx.region_by_id(order.dest)?;
        let embattled = tx.battle_for_region(dest.id)?.is_some();
        let sector_change = order.source == order.dest;
        if !sector_change && !dest.enterable_by(player.team, embattled, cfg.traversable_neutrals) {
            cancel_chain(tx, &player)?;
            continue;
        }
        player.region = dest.id;
        player.sector = order.dest_sector;
        tx.save_player(&player)?;
        tx.delete_march(order.id)?;
        arrivals.push(Arrival {
            player: player.id,
            region: dest.id,
        });
    }
    Ok(arrivals)
}

fn cancel_chain(tx: &Tx<'_>, player: &Player) -> GameResult<()> {
    tracing::info!(player = %player.name, "marching orders invalidated; cancelling chain");
    tx.delete_marches_for(player.id)?;
    Ok(())
}
