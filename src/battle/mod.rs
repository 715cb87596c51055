//! The battle engine: invasion scheduling, the battle lifecycle, skirmish
//! expiry, and resolution with its ownership, reward, and ejection
//! side-effects.

use crate::config::GameConfig;
use crate::error::{Conflict, GameError, GameResult};
use crate::geo::{self, Atlas, Region, RegionId};
use crate::player::Player;
use crate::store::{BuffSpec, BuffTarget, Tx};
use crate::team::Team;
use crate::time::Timestamp;
use crate::unit::{adjusted, TroopType};
use rand::{Rng, RngCore};
use std::collections::{BTreeMap, HashSet};

pub mod resolve;
mod skirmish;

pub use self::resolve::{Outcome, ResolveNode};
pub use self::skirmish::{create_root, get_root, react, SkirmishAction, SkirmishId};

pub type BattleId = i64;

/// A scheduled contest over one region.
///
/// Battles are `Scheduled` until their begin time passes and a thread
/// exists to fight in, `Open` until their hidden end time, and destroyed
/// once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Battle {
    pub id: BattleId,
    pub region: RegionId,
    pub begins: Timestamp,
    /// The advertised end; the real end is jittered inside the lockout
    /// window so nobody can snipe the closing bell.
    pub display_ends: Option<Timestamp>,
    pub ends: Option<Timestamp>,
    /// Forum thread the battle is fought in.
    pub submission_id: Option<String>,
    pub lockout: i64,
    pub score0: Option<i64>,
    pub score1: Option<i64>,
    pub victor: Option<Team>,
}

impl Battle {
    /// The begin time has passed.
    pub fn is_ready(&self, now: Timestamp) -> bool {
        now >= self.begins
    }

    /// A battle has started once its time has come, there is a thread to do
    /// battle in, and its end has been fixed.
    pub fn has_started(&self, now: Timestamp) -> bool {
        self.is_ready(now) && self.submission_id.is_some() && self.ends.map_or(false, |e| e > self.begins)
    }

    pub fn past_end(&self, now: Timestamp) -> bool {
        self.ends.map_or(false, |e| now >= e)
    }
}

/// Schedule an invasion of `region`, to begin at `begins`.
pub fn invade(
    tx: &Tx<'_>,
    cfg: &GameConfig,
    now: Timestamp,
    invader: &mut Player,
    region: &Region,
    begins: Timestamp,
) -> GameResult<Battle> {
    if !invader.leader {
        return Err(GameError::Rank);
    }
    if region.owner == Some(invader.team) {
        return Err(GameError::Team {
            what: region.name.clone(),
            friendly: true,
        });
    }
    if tx.battle_for_region(region.id)?.is_some() {
        return Err(GameError::InProgress(Conflict::Battle {
            region: region.name.clone(),
        }));
    }

    let mut borders_friendly_land = false;
    for neighbor in tx.borders_of(region.id)? {
        if tx.region_by_id(neighbor)?.owner == Some(invader.team) {
            borders_friendly_land = true;
            break;
        }
    }
    if !borders_friendly_land {
        return Err(GameError::NonAdjacent {
            src: region.name.clone(),
            dest: "your territory".to_string(),
        });
    }

    if let Some(fortified) = tx.region_buff(region.id, "fortified", now)? {
        return Err(GameError::too_soon(fortified.expires));
    }

    if region.capital.is_some() && !cfg.capital_invasion_allowed() {
        return Err(GameError::Disabled("capital invasion"));
    }

    let battle = tx.insert_battle(region.id, begins, cfg.battle_lockout)?;
    invader.defectable = false;
    tx.save_player(invader)?;
    Ok(battle)
}

/// Tick transition: fix the end times of every ready battle that has a
/// thread, opening it for skirmishes. The real end lands somewhere inside
/// the lockout window around the advertised end.
pub fn open_ready_battles(
    tx: &Tx<'_>,
    cfg: &GameConfig,
    now: Timestamp,
    rng: &mut dyn RngCore,
) -> GameResult<Vec<Battle>> {
    let mut opened = Vec::new();
    for battle in tx.battles_all()? {
        if battle.ends.is_some() || !battle.is_ready(now) || battle.submission_id.is_none() {
            continue;
        }
        let display_ends = battle.begins + cfg.battle_time;
        let jitter = if battle.lockout > 0 {
            rng.gen_range(0..battle.lockout)
        } else {
            0
        };
        let ends = display_ends - battle.lockout / 2 + jitter;
        tx.set_battle_times(battle.id, display_ends, ends)?;
        opened.push(tx.battle_by_id(battle.id)?);
    }
    Ok(opened)
}

/// Tick transition: resolve every spearhead whose hidden end has passed,
/// along with its whole subtree. The battle itself stays open.
pub fn resolve_due_skirmishes(tx: &Tx<'_>, now: Timestamp) -> GameResult<Vec<SkirmishId>> {
    let due = tx.due_skirmishes(now)?;
    if due.is_empty() {
        return Ok(Vec::new());
    }

    let mut by_battle: BTreeMap<BattleId, Vec<SkirmishId>> = BTreeMap::new();
    for root in &due {
        by_battle.entry(root.battle).or_default().push(root.id);
    }

    let mut resolved = Vec::new();
    for (battle, roots) in by_battle {
        let mut forest = load_forest(tx, battle, now)?;
        for root in roots {
            resolve::resolve_root(&mut forest.nodes, root);
            resolved.push(root);
        }
        persist_outcomes(tx, &forest)?;
    }
    Ok(resolved)
}

/// Summary of one spearhead for the final battle report.
#[derive(Debug, Clone, PartialEq)]
pub struct RootSummary {
    pub id: SkirmishId,
    pub participant: String,
    pub team: Team,
    pub amount: i64,
    pub troops: TroopType,
    pub outcome: Outcome,
}

/// Everything the driver needs to announce a finished battle.
#[derive(Debug, Clone, PartialEq)]
pub struct BattleReport {
    pub battle: BattleId,
    pub region: String,
    pub submission_id: Option<String>,
    pub score: [i64; 2],
    pub victor: Option<Team>,
    pub previous_owner: Option<Team>,
    pub roots: Vec<RootSummary>,
}

/// Resolve a battle whose end has passed: score the forest, apply region
/// buffs and homeland defense, settle ownership, hand out rewards, eject
/// the losers, and delete the battle.
pub fn resolve_battle(
    tx: &Tx<'_>,
    cfg: &GameConfig,
    now: Timestamp,
    battle: &Battle,
) -> GameResult<BattleReport> {
    let region = tx.region_by_id(battle.region)?;
    let mut forest = load_forest(tx, battle.id, now)?;
    resolve::resolve_forest(&mut forest.nodes);
    persist_outcomes(tx, &forest)?;

    let mut score = [0i64; 2];
    let mut roots = Vec::new();
    for (row, node) in forest.rows.iter().zip(&forest.nodes) {
        if row.parent.is_some() {
            continue;
        }
        let outcome = node.outcome.expect("forest resolution covers every root");
        if let Some(victor) = outcome.victor {
            score[victor.index()] += outcome.vp;
        }
        roots.push(RootSummary {
            id: row.id,
            participant: tx.player_by_id(row.participant)?.name,
            team: row.team,
            amount: row.amount,
            troops: row.troops,
            outcome,
        });
    }

    // Standing buffs pay out to whoever holds the ground.
    if let Some(owner) = region.owner {
        for buff in tx.region_buffs(region.id, now)? {
            score[owner.index()] += adjusted(score[owner.index()], buff.value);
        }
    }

    apply_homeland_defense(tx, cfg, &region, &mut score)?;

    let victor = match score[0].cmp(&score[1]) {
        std::cmp::Ordering::Greater => Some(Team::Orangered),
        std::cmp::Ordering::Less => Some(Team::Periwinkle),
        std::cmp::Ordering::Equal => None,
    };
    tx.set_battle_outcome(battle.id, score[0], score[1], victor)?;

    let previous_owner = region.owner;
    if let Some(victor) = victor {
        tx.set_region_owner(region.id, Some(victor))?;
        let expires = cfg.defense_buff_expiry(now);
        let reward = if previous_owner == Some(victor) {
            BuffSpec::fortified(expires)
        } else {
            BuffSpec::on_the_defensive(expires)
        };
        tx.attach_buff(BuffTarget::Region(region.id), &reward)?;
    }

    settle_players(tx, cfg, &region, victor, &forest)?;
    tx.delete_battle(battle.id)?;

    Ok(BattleReport {
        battle: battle.id,
        region: region.name,
        submission_id: battle.submission_id.clone(),
        score,
        victor,
        previous_owner,
        roots,
    })
}

/// Distance-based defense bonus: the closer the battle sits to a team's
/// capital, the bigger the boost from the configured percent chain.
fn apply_homeland_defense(
    tx: &Tx<'_>,
    cfg: &GameConfig,
    region: &Region,
    score: &mut [i64; 2],
) -> GameResult<()> {
    let chain = cfg.homeland_chain();
    if chain.is_empty() {
        return Ok(());
    }
    let atlas = Atlas::load(tx)?;
    for team in Team::BOTH {
        let Some(capital) = tx.capital_for(team)? else {
            continue;
        };
        let Some(hops) = geo::distance(&atlas, capital.id, region.id) else {
            continue;
        };
        let bonus = match hops {
            0 => chain.first().copied(),
            d if d <= chain.len() => Some(chain[d - 1]),
            _ => None,
        };
        if let Some(bonus) = bonus {
            score[team.index()] += adjusted(score[team.index()], bonus);
        }
    }
    Ok(())
}

/// Rewards, decommit, and ejection. Everyone in the region collects a cut of
/// their committed force (the victors a bigger one); participants who
/// already marched off still get their committed loyalists released.
fn settle_players(
    tx: &Tx<'_>,
    cfg: &GameConfig,
    region: &Region,
    victor: Option<Team>,
    forest: &Forest,
) -> GameResult<()> {
    let mut present = HashSet::new();
    for mut player in tx.players_in_region(region.id)? {
        present.insert(player.id);
        let percent = if Some(player.team) == victor {
            cfg.winreward
        } else {
            cfg.losereward
        };
        player.loyalists += player.committed * percent / 100;
        if let Some(cap) = cfg.troopcap {
            player.loyalists = player.loyalists.min(cap);
        }
        player.committed = 0;
        if let Some(victor) = victor {
            if player.team != victor {
                if let Some(capital) = tx.capital_for(player.team)? {
                    player.region = capital.id;
                    player.sector = 0;
                }
            }
        }
        tx.save_player(&player)?;
    }

    for row in &forest.rows {
        if present.contains(&row.participant) {
            continue;
        }
        let mut player = tx.player_by_id(row.participant)?;
        if player.committed != 0 {
            player.committed = 0;
            tx.save_player(&player)?;
        }
        present.insert(row.participant);
    }
    Ok(())
}

struct Forest {
    rows: Vec<SkirmishAction>,
    nodes: Vec<ResolveNode>,
}

fn load_forest(tx: &Tx<'_>, battle: BattleId, now: Timestamp) -> GameResult<Forest> {
    let rows = tx.skirmishes_for_battle(battle)?;
    let buff_values = tx.skirmish_buff_values(battle, now)?;
    let nodes = rows
        .iter()
        .map(|row| ResolveNode {
            id: row.id,
            parent: row.parent,
            team: row.team,
            amount: row.amount,
            troops: row.troops,
            hinder: row.hinder,
            buff_value: buff_values.get(&row.id).copied().unwrap_or_default(),
            outcome: row.outcome(),
        })
        .collect();
    Ok(Forest { rows, nodes })
}

fn persist_outcomes(tx: &Tx<'_>, forest: &Forest) -> GameResult<()> {
    for (row, node) in forest.rows.iter().zip(&forest.nodes) {
        if row.resolved {
            continue;
        }
        let Some(outcome) = node.outcome else {
            continue;
        };
        let mut updated = row.clone();
        updated.resolved = true;
        updated.victor = outcome.victor;
        updated.margin = outcome.margin;
        updated.vp = outcome.vp;
        updated.unopposed = outcome.unopposed;
        tx.save_skirmish_outcome(&updated)?;
    }
    Ok(())
}
