//! The world tick: one pass that advances movement, keeps eternal regions at
//! war, transitions battles, and sweeps expired buffs. Phases run in a fixed
//! order, each in its own transaction, with movement always landing before
//! any battle transition.

use crate::battle::{self, Battle, BattleId, BattleReport, SkirmishId};
use crate::error::GameResult;
use crate::game::{report, Engine};
use crate::geo::Region;
use crate::host::Host;
use crate::march::{self, Arrival};
use crate::time::Clock;

/// What one tick changed, for driver logging and tests.
#[derive(Debug, Default)]
pub struct TickSummary {
    pub arrivals: Vec<Arrival>,
    /// Battles spawned for eternal regions.
    pub spawned: Vec<BattleId>,
    /// Battles that got their thread posted this tick.
    pub announced: Vec<BattleId>,
    /// Battles that transitioned from scheduled to open.
    pub opened: Vec<BattleId>,
    /// Spearheads resolved early because their hidden end passed.
    pub expired_skirmishes: Vec<SkirmishId>,
    pub resolved: Vec<BattleReport>,
    pub expired_buffs: usize,
}

pub(super) fn run<C: Clock>(
    engine: &mut Engine<C>,
    host: &mut dyn Host,
) -> GameResult<TickSummary> {
    let now = engine.clock.now();
    let cfg = &engine.config.game;
    let mut summary = TickSummary::default();

    // Phase 1: movement arrivals.
    summary.arrivals = engine.store.transaction(|tx| march::advance(tx, cfg, now))?;

    // Phase 2: eternal regions always carry a battle.
    summary.spawned = engine.store.transaction(|tx| {
        let mut spawned = Vec::new();
        for region in tx.eternal_regions()? {
            if tx.battle_for_region(region.id)?.is_none() {
                let created =
                    tx.insert_battle(region.id, now + cfg.battle_delay, cfg.battle_lockout)?;
                tracing::info!(region = %region.name, battle = created.id, "eternal region rearmed");
                spawned.push(created.id);
            }
        }
        Ok(spawned)
    })?;

    // Phase 3: battle updates. First make sure every battle has a thread to
    // be fought in; posting is best-effort and retried next tick.
    let threadless: Vec<(BattleId, Region, i64)> = engine.store.read(|tx| {
        let mut out = Vec::new();
        for found in tx.battles_all()? {
            if found.submission_id.is_none() {
                out.push((found.id, tx.region_by_id(found.region)?, found.begins));
            }
        }
        Ok(out)
    })?;
    for (battle_id, region, begins) in threadless {
        let (title, body) = report::eternal_announcement(&region.name, begins);
        match host.submit_post(&region.srname, &title, &body) {
            Ok(submission) => {
                engine
                    .store
                    .transaction(|tx| tx.set_battle_submission(battle_id, &submission))?;
                summary.announced.push(battle_id);
            }
            Err(err) => {
                tracing::warn!(error = %err, region = %region.name, "battle thread creation failed");
            }
        }
    }

    // Scheduled -> Open, fixing the advertised and hidden end times.
    let rng = &mut engine.rng;
    let opened: Vec<Battle> = engine
        .store
        .transaction(|tx| battle::open_ready_battles(tx, cfg, now, rng))?;
    for battle in &opened {
        if let Some(submission) = &battle.submission_id {
            if let Err(err) = host.edit_post(submission, &report::battle_open_text(battle)) {
                tracing::warn!(error = %err, battle = battle.id, "could not publish battle opening");
            }
        }
        summary.opened.push(battle.id);
    }

    // Spearheads whose hidden end has passed resolve while the battle
    // continues around them.
    summary.expired_skirmishes = engine
        .store
        .transaction(|tx| battle::resolve_due_skirmishes(tx, now))?;

    // Open -> Resolved.
    let finished: Vec<Battle> = engine.store.read(|tx| {
        Ok(tx
            .battles_all()?
            .into_iter()
            .filter(|b| b.past_end(now))
            .collect())
    })?;
    for battle in finished {
        let outcome = engine
            .store
            .transaction(|tx| battle::resolve_battle(tx, cfg, now, &battle))?;
        if let Some(submission) = &outcome.submission_id {
            let text = report::battle_report_text(cfg, &outcome);
            if let Err(err) = host.edit_post(submission, &text) {
                tracing::warn!(error = %err, battle = outcome.battle, "could not publish battle report");
            }
        }
        summary.resolved.push(outcome);
    }

    // Phase 4: buff expiry.
    summary.expired_buffs = engine.store.transaction(|tx| tx.delete_expired_buffs(now))?;

    Ok(summary)
}
