//! Skirmish creation: spearheads (roots) and reactions. All the guard
//! conditions live here; scoring is in [`super::resolve`].

use crate::battle::resolve::Outcome;
use crate::battle::{Battle, BattleId};
use crate::config::GameConfig;
use crate::error::{Conflict, GameError, GameResult};
use crate::player::{Player, PlayerId};
use crate::store::{BuffSpec, BuffTarget, Tx};
use crate::team::Team;
use crate::time::Timestamp;
use crate::unit::TroopType;
use rand::{Rng, RngCore};

pub type SkirmishId = i64;

/// A node in a battle's resolution forest. Spearheads have no parent and
/// carry `hinder = true`; reactions hinder exactly when their participant is
/// on the other team from the parent's.
#[derive(Debug, Clone, PartialEq)]
pub struct SkirmishAction {
    pub id: SkirmishId,
    pub battle: BattleId,
    pub parent: Option<SkirmishId>,
    pub participant: PlayerId,
    /// The participant's team at the time of the action.
    pub team: Team,
    pub amount: i64,
    pub troops: TroopType,
    pub hinder: bool,
    /// The sector the action was taken from; reactions must come from the
    /// same sector.
    pub sector: i64,
    /// Hidden early end; only spearheads expire on their own.
    pub ends: Option<Timestamp>,
    pub display_ends: Option<Timestamp>,
    /// The forum comment that issued this action, used to resolve replies.
    pub comment_id: Option<String>,
    pub resolved: bool,
    pub victor: Option<Team>,
    pub margin: i64,
    pub vp: i64,
    pub unopposed: bool,
}

impl SkirmishAction {
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn outcome(&self) -> Option<Outcome> {
        if self.resolved {
            Some(Outcome {
                victor: self.victor,
                margin: self.margin,
                vp: self.vp,
                unopposed: self.unopposed,
            })
        } else {
            None
        }
    }
}

/// Walk the parent chain up to the spearhead.
pub fn get_root(tx: &Tx<'_>, action: &SkirmishAction) -> GameResult<SkirmishAction> {
    let mut current = action.clone();
    while let Some(parent) = current.parent {
        current = tx
            .skirmish_by_id(parent)?
            .ok_or(GameError::UnknownSkirmish(parent))?;
    }
    Ok(current)
}

/// Open a spearhead skirmish in a battle.
#[allow(clippy::too_many_arguments)]
pub fn create_root(
    tx: &Tx<'_>,
    cfg: &GameConfig,
    now: Timestamp,
    rng: &mut dyn RngCore,
    battle: &Battle,
    player: &mut Player,
    amount: i64,
    troops: Option<&str>,
    comment_id: Option<&str>,
    enforce_noob: bool,
) -> GameResult<SkirmishAction> {
    guard_common(tx, battle, player, now, enforce_noob)?;

    // No spearheads inside the lockout window at the end of a battle.
    if battle.lockout > 0 {
        if let Some(display_ends) = battle.display_ends {
            if now >= display_ends - battle.lockout {
                return Err(GameError::too_late(Some(display_ends)));
            }
        }
    }

    if let Some(existing) = tx.root_skirmish_for(battle.id, player.id)? {
        return Err(GameError::InProgress(Conflict::RootSkirmish {
            id: existing.id,
        }));
    }

    guard_amount(player, amount)?;

    let first_strike = qualifies_for_first_strike(tx, cfg, now, battle, player.id)?;
    let troops = resolve_troops(tx, player.id, troops)?;

    let (ends, display_ends) = if cfg.skirmish_time > 0 {
        let display = now + cfg.skirmish_time;
        let ends = if cfg.skirmish_variability > 0 {
            display - cfg.skirmish_variability / 2 + rng.gen_range(0..cfg.skirmish_variability)
        } else {
            display
        };
        (Some(ends), Some(display))
    } else {
        (None, None)
    };

    let action = tx.insert_skirmish(&SkirmishAction {
        id: 0,
        battle: battle.id,
        parent: None,
        participant: player.id,
        team: player.team,
        amount,
        troops,
        hinder: true,
        sector: player.sector,
        ends,
        display_ends,
        comment_id: comment_id.map(str::to_string),
        resolved: false,
        victor: None,
        margin: 0,
        vp: 0,
        unopposed: false,
    })?;

    if first_strike {
        tx.attach_buff(BuffTarget::Skirmish(action.id), &BuffSpec::first_strike())?;
    }

    commit_player(tx, player, amount)?;
    Ok(action)
}

/// React to an existing skirmish, supporting or hindering it.
#[allow(clippy::too_many_arguments)]
pub fn react(
    tx: &Tx<'_>,
    cfg: &GameConfig,
    now: Timestamp,
    parent: &SkirmishAction,
    player: &mut Player,
    amount: i64,
    troops: Option<&str>,
    hinder: bool,
    comment_id: Option<&str>,
    enforce_noob: bool,
) -> GameResult<SkirmishAction> {
    let battle = tx.battle_by_id(parent.battle)?;

    if parent.is_resolved() {
        return Err(GameError::too_late(parent.ends));
    }

    guard_common(tx, &battle, player, now, enforce_noob)?;

    if player.sector != parent.sector {
        return Err(GameError::WrongSector {
            expected: parent.sector,
            actual: player.sector,
        });
    }

    // Hindering is fighting the enemy; supporting is helping your own.
    if hinder == (player.team == parent.team) {
        let target = tx.player_by_id(parent.participant)?;
        return Err(GameError::Team {
            what: target.name,
            friendly: player.team == parent.team,
        });
    }

    if let Some(existing) = tx.child_skirmish_for(parent.id, player.id)? {
        return Err(GameError::InProgress(Conflict::Reaction { id: existing.id }));
    }

    guard_amount(player, amount)?;

    // Reactions cannot outnumber the fight they joined.
    let root = get_root(tx, parent)?;
    if amount > root.amount {
        return Err(GameError::TooMany {
            requested: amount,
            max: root.amount,
            ofwhat: "loyalists",
        });
    }

    let first_strike = qualifies_for_first_strike(tx, cfg, now, &battle, player.id)?;
    let troops = resolve_troops(tx, player.id, troops)?;

    let action = tx.insert_skirmish(&SkirmishAction {
        id: 0,
        battle: battle.id,
        parent: Some(parent.id),
        participant: player.id,
        team: player.team,
        amount,
        troops,
        hinder,
        sector: player.sector,
        ends: None,
        display_ends: None,
        comment_id: comment_id.map(str::to_string),
        resolved: false,
        victor: None,
        margin: 0,
        vp: 0,
        unopposed: false,
    })?;

    if first_strike {
        tx.attach_buff(BuffTarget::Skirmish(action.id), &BuffSpec::first_strike())?;
    }

    commit_player(tx, player, amount)?;
    Ok(action)
}

fn guard_common(
    tx: &Tx<'_>,
    battle: &Battle,
    player: &Player,
    now: Timestamp,
    enforce_noob: bool,
) -> GameResult<()> {
    if battle.past_end(now) {
        return Err(GameError::too_late(battle.ends));
    }
    if !battle.has_started(now) {
        return Err(GameError::too_soon(Some(battle.begins)));
    }

    if player.region != battle.region {
        let need = tx.region_by_id(battle.region)?;
        let actually = tx.region_by_id(player.region)?;
        return Err(GameError::NotPresent {
            need: need.name,
            actually: actually.name,
        });
    }

    if let Some(order) = tx.marches_for(player.id)?.into_iter().next() {
        let dest = tx.region_by_id(order.dest)?;
        return Err(GameError::InProgress(Conflict::March {
            dest: dest.name,
            arrival: order.arrival,
        }));
    }

    // Rookies recruited after the drums sounded sit this one out.
    if enforce_noob && player.recruited > battle.begins {
        return Err(GameError::too_soon(None));
    }

    Ok(())
}

fn guard_amount(player: &Player, amount: i64) -> GameResult<()> {
    if amount <= 0 {
        return Err(GameError::Insufficient {
            requested: amount,
            available: 1,
            ofwhat: "argument",
        });
    }
    if amount > player.free_loyalists() {
        return Err(GameError::insufficient_loyalists(
            amount,
            player.free_loyalists(),
        ));
    }
    Ok(())
}

/// The first-strike buff goes to a player's first two actions of a battle,
/// taken inside the grace window. Reactions count as actions too.
fn qualifies_for_first_strike(
    tx: &Tx<'_>,
    cfg: &GameConfig,
    now: Timestamp,
    battle: &Battle,
    player: PlayerId,
) -> GameResult<bool> {
    if cfg.fftb_time <= 0 || now > battle.begins + cfg.fftb_time {
        return Ok(false);
    }
    Ok(tx.skirmish_action_count(battle.id, player)? <= 1)
}

/// Translate through the player's codewords; anything that still isn't a
/// troop type fights as infantry.
fn resolve_troops(tx: &Tx<'_>, player: PlayerId, troops: Option<&str>) -> GameResult<TroopType> {
    match troops {
        None => Ok(TroopType::Infantry),
        Some(word) => {
            let translated = tx.translate_codeword(player, word)?;
            Ok(TroopType::from_word(&translated).unwrap_or(TroopType::Infantry))
        }
    }
}

fn commit_player(tx: &Tx<'_>, player: &mut Player, amount: i64) -> GameResult<()> {
    player.committed += amount;
    player.defectable = false;
    tx.save_player(player)
}
