//! The interpreter: the engine that owns the store, dispatches parsed
//! commands against a player and origin, and drives the world tick.

use crate::battle;
use crate::config::Config;
use crate::error::{GameError, GameResult};
use crate::geo::{self, Atlas, RegionId, TraversalPolicy};
use crate::host::{CommandEvent, Host, Origin};
use crate::march;
use crate::order::{
    Command, CodewordOrder, DefectOrder, Destination, InvadeOrder, LeadOrder, RankOrder,
    SkirmishOrder, SkirmishVerb,
};
use crate::parser;
use crate::player::Player;
use crate::store::{Store, Tx};
use crate::time::{timestr, Clock, Timestamp};
use crate::Markdown;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

mod recruit;
pub mod report;
mod tick;

pub use self::tick::TickSummary;

/// The game engine: world store, configuration, clock, and the only dice the
/// game ever rolls.
pub struct Engine<C: Clock> {
    store: Store,
    config: Config,
    clock: C,
    rng: ChaCha8Rng,
}

impl<C: Clock> Engine<C> {
    pub fn new(store: Store, config: Config, clock: C) -> Engine<C> {
        Engine {
            store,
            config,
            clock,
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Deterministic engine for tests and replays.
    pub fn with_seed(store: Store, config: Config, clock: C, seed: u64) -> Engine<C> {
        Engine {
            store,
            config,
            clock,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Create a player on first observed participation and welcome them.
    pub fn recruit_player(
        &mut self,
        host: &mut dyn Host,
        origin: Option<&Origin>,
        name: &str,
        external_id: Option<&str>,
    ) -> GameResult<Option<Player>> {
        let now = self.clock.now();
        let cfg = &self.config.game;
        let rng = &mut self.rng;
        let created = self
            .store
            .transaction(|tx| recruit::recruit(tx, cfg, rng, now, name, external_id))?;
        if let (Some(player), Some(origin)) = (&created, origin) {
            let welcome = self.store.read(|tx| report::welcome(tx, cfg, player))?;
            best_effort_reply(host, origin, &welcome);
        }
        Ok(created)
    }

    /// Handle one command event: dedupe, identify the player, parse, and
    /// execute inside a transaction. Game-rule failures become replies; only
    /// storage trouble surfaces as an error.
    pub fn handle_event(&mut self, host: &mut dyn Host, event: &CommandEvent) -> GameResult<()> {
        let now = self.clock.now();

        // Battle-thread comments are deduplicated through processed markers,
        // giving at-most-once effects under at-least-once delivery.
        let marker = match &event.origin {
            Origin::BattleThread {
                submission_id,
                comment_id,
                ..
            } => match self
                .store
                .read(|tx| tx.battle_by_submission(submission_id))?
            {
                Some(thread_battle) => {
                    if self
                        .store
                        .read(|tx| tx.is_processed(thread_battle.id, comment_id))?
                    {
                        return Ok(());
                    }
                    Some((thread_battle.id, comment_id.clone()))
                }
                None => None,
            },
            Origin::PrivateMessage { .. } => None,
        };

        let outcome = self.dispatch(host, event, now);

        if let Some((battle_id, comment_id)) = marker {
            self.store
                .transaction(|tx| tx.mark_processed(battle_id, &comment_id).map(|_| ()))?;
        }

        match outcome {
            Ok(()) => {}
            Err(GameError::HostFailure(failure)) => {
                tracing::warn!(error = %failure, "confirmation could not be posted; rolled back");
                let _ = host.send_pm(
                    &event.author,
                    "Apologies",
                    "I couldn't post the confirmation for your command, so it has been rolled \
                     back. Please try again in a little while.",
                );
            }
            Err(GameError::Store(failure)) => {
                tracing::error!(error = %failure, "storage failure while handling command");
                best_effort_reply(
                    host,
                    &event.origin,
                    &report::describe_error(&GameError::Store(failure)),
                );
            }
            Err(err) => best_effort_reply(host, &event.origin, &report::describe_error(&err)),
        }
        Ok(())
    }

    /// Advance the world: movement arrivals, eternal battles, battle
    /// transitions, skirmish expiry, buff expiry. Each phase is its own
    /// transaction.
    pub fn tick(&mut self, host: &mut dyn Host) -> GameResult<TickSummary> {
        tick::run(self, host)
    }

    fn dispatch(
        &mut self,
        host: &mut dyn Host,
        event: &CommandEvent,
        now: Timestamp,
    ) -> GameResult<()> {
        let author = event.author.to_lowercase();
        let Some(player) = self.store.read(|tx| tx.player_by_name(&author))? else {
            best_effort_reply(host, &event.origin, report::NOT_PLAYER);
            return Ok(());
        };

        let text = match &event.origin {
            // In a battle thread only quote lines are commands; everything
            // else is table talk.
            Origin::BattleThread { .. } => match parser::extract_command(&event.body) {
                Some(text) => text,
                None => return Ok(()),
            },
            Origin::PrivateMessage { .. } => parser::extract_command(&event.body)
                .unwrap_or_else(|| event.body.trim().to_string()),
        };

        let command = match parser::parse(&text) {
            Ok(command) => command,
            Err(err) => {
                let reply = format!(
                    "I'm sorry, I couldn't understand your command:\n\n> {}\n\nThe parsing \
                     error is below:\n\n    {}",
                    text, err
                );
                best_effort_reply(host, &event.origin, &reply);
                return Ok(());
            }
        };

        tracing::info!(player = %player.name, %command, "processing command");
        self.execute(host, event, now, &player.name, &command)
    }

    fn execute(
        &mut self,
        host: &mut dyn Host,
        event: &CommandEvent,
        now: Timestamp,
        name: &str,
        command: &Command,
    ) -> GameResult<()> {
        let cfg = &self.config.game;
        match command {
            Command::Status => {
                let text = self.store.read(|tx| {
                    let player = require_player(tx, name)?;
                    report::personal_status(tx, cfg, &player)
                })?;
                best_effort_reply(host, &event.origin, &text);
                Ok(())
            }
            Command::Lands => {
                let text = self.store.read(|tx| report::lands_status(tx, cfg, now))?;
                best_effort_reply(host, &event.origin, &text);
                Ok(())
            }
            Command::Time => {
                best_effort_reply(
                    host,
                    &event.origin,
                    &format!("Server time is {}", timestr(now)),
                );
                Ok(())
            }
            Command::Lead(lead) => self.execute_lead(host, event, now, name, lead),
            Command::Invade(invade) => self.execute_invade(host, event, now, name, invade),
            Command::Skirmish(order) => self.execute_skirmish(host, event, now, name, order),
            Command::Defect(defect) => self.execute_defect(host, event, name, defect),
            Command::Rank(rank) => self.execute_rank(host, event, name, rank),
            Command::Codeword(codeword) => self.execute_codeword(host, event, name, codeword),
            Command::Extract => {
                let reply = self.store.transaction(|tx| {
                    let mut player = require_player(tx, name)?;
                    let capital = march::extract(tx, &mut player)?;
                    Ok(format!(
                        "You have fallen back to {}.",
                        capital.markdown()
                    ))
                })?;
                best_effort_reply(host, &event.origin, &reply);
                Ok(())
            }
            Command::Stop => {
                let reply = self.store.transaction(|tx| {
                    let player = require_player(tx, name)?;
                    let cancelled = march::cancel(tx, &player)?;
                    let region = tx.region_by_id(player.region)?;
                    Ok(if cancelled > 0 {
                        format!(
                            "Your marching orders are torn up; your forces hold at {}.",
                            region.markdown()
                        )
                    } else {
                        "You have no marching orders to cancel.".to_string()
                    })
                })?;
                best_effort_reply(host, &event.origin, &reply);
                Ok(())
            }
        }
    }

    fn execute_lead(
        &mut self,
        host: &mut dyn Host,
        event: &CommandEvent,
        now: Timestamp,
        name: &str,
        lead: &LeadOrder,
    ) -> GameResult<()> {
        let cfg = &self.config.game;
        let reply = self.store.transaction(|tx| {
            let mut player = require_player(tx, name)?;
            let (path, dest_sector) = expand_path(tx, cfg, &player, lead)?;
            let count = if lead.amount == -1 {
                player.loyalists
            } else {
                lead.amount
            };
            let per_hop = cfg.per_hop_delay(count);
            let orders = march::march(
                tx,
                cfg,
                now,
                &mut player,
                lead.amount,
                &path,
                per_hop,
                dest_sector,
            )?;
            let dest = tx.region_by_id(*path.last().expect("march validated a non-empty path"))?;
            Ok(match orders.last() {
                Some(last) => format!(
                    "**Confirmed**: You are leading {} of your people to {}. You will arrive \
                     at {}.",
                    count,
                    dest.markdown(),
                    timestr(last.arrival)
                ),
                None => format!(
                    "**Confirmed**: You have led {} of your people to {}.",
                    count,
                    dest.markdown()
                ),
            })
        })?;
        best_effort_reply(host, &event.origin, &reply);
        Ok(())
    }

    fn execute_invade(
        &mut self,
        host: &mut dyn Host,
        event: &CommandEvent,
        now: Timestamp,
        name: &str,
        invade: &InvadeOrder,
    ) -> GameResult<()> {
        let cfg = &self.config.game;
        let begins = now + cfg.battle_delay;
        let (battle_id, region, team) = self.store.transaction(|tx| {
            let mut player = require_player(tx, name)?;
            let region = tx
                .region_by_name(&invade.region)?
                .ok_or_else(|| GameError::UnknownRegion(invade.region.clone()))?;
            let created = battle::invade(tx, cfg, now, &mut player, &region, begins)?;
            Ok((created.id, region, player.team))
        })?;

        // The announcement post becomes the battle thread. If it cannot be
        // created now, the battle stays scheduled and the tick retries.
        let (title, body) = report::invasion_announcement(cfg, team, begins);
        match host.submit_post(&region.srname, &title, &body) {
            Ok(submission) => {
                self.store
                    .transaction(|tx| tx.set_battle_submission(battle_id, &submission))?;
            }
            Err(err) => {
                tracing::warn!(error = %err, region = %region.name, "invasion announcement failed; tick will retry");
            }
        }

        best_effort_reply(
            host,
            &event.origin,
            &format!("**Confirmed**  Battle will begin at {}", timestr(begins)),
        );
        Ok(())
    }

    fn execute_skirmish(
        &mut self,
        host: &mut dyn Host,
        event: &CommandEvent,
        now: Timestamp,
        name: &str,
        order: &SkirmishOrder,
    ) -> GameResult<()> {
        let cfg = &self.config.game;
        let rng = &mut self.rng;
        let hinder = order.verb == SkirmishVerb::Attack;

        match &event.origin {
            Origin::PrivateMessage { .. } => {
                if !cfg.battle_pm {
                    return Err(GameError::Disabled("skirmishing by private message"));
                }
                let Some(target) = order.target else {
                    best_effort_reply(
                        host,
                        &event.origin,
                        "By private message you must name your target, e.g. 'attack #12 with 30'.",
                    );
                    return Ok(());
                };
                let reply = self.store.transaction(|tx| {
                    let mut player = require_player(tx, name)?;
                    let parent = tx
                        .skirmish_by_id(target)?
                        .ok_or(GameError::UnknownSkirmish(target))?;
                    let action = battle::react(
                        tx,
                        cfg,
                        now,
                        &parent,
                        &mut player,
                        order.amount,
                        order.troops.as_deref(),
                        hinder,
                        None,
                        true,
                    )?;
                    Ok(reaction_confirmation(&action, hinder, parent.id))
                })?;
                best_effort_reply(host, &event.origin, &reply);
                Ok(())
            }
            Origin::BattleThread {
                submission_id,
                comment_id,
                parent_comment_id,
                parent_body,
            } => {
                let Some(thread_battle) = self
                    .store
                    .read(|tx| tx.battle_by_submission(submission_id))?
                else {
                    best_effort_reply(
                        host,
                        &event.origin,
                        "There doesn't seem to be a battle attached to this thread.",
                    );
                    return Ok(());
                };

                // Work out the target: an explicit id beats everything; a
                // top-level comment opens a spearhead; otherwise the parent
                // comment identifies the skirmish being answered.
                let parent = if let Some(id) = order.target {
                    Some(id)
                } else if parent_comment_id.is_none() {
                    None
                } else {
                    let parent_comment = parent_comment_id.clone().unwrap_or_default();
                    let known = self
                        .store
                        .read(|tx| tx.skirmish_by_comment(thread_battle.id, &parent_comment))?;
                    match known {
                        Some(action) => Some(action.id),
                        None => {
                            match parent_body.as_deref().and_then(parse_skirmish_marker) {
                                Some(id) => Some(id),
                                None => {
                                    best_effort_reply(
                                        host,
                                        &event.origin,
                                        "I can't tell which skirmish you are responding to - \
                                         reply to a skirmish command, or name it like \
                                         'attack #12 with 30'.",
                                    );
                                    return Ok(());
                                }
                            }
                        }
                    }
                };

                match parent {
                    None => {
                        if order.verb == SkirmishVerb::Support {
                            best_effort_reply(
                                host,
                                &event.origin,
                                "There is nothing here to support - lead your own attack, or \
                                 reply to an existing skirmish.",
                            );
                            return Ok(());
                        }
                        // The confirmation reply carries the skirmish number
                        // other players respond to, so it must post; if it
                        // cannot, the whole skirmish rolls back.
                        self.store.transaction(|tx| {
                            let mut player = require_player(tx, name)?;
                            let action = battle::create_root(
                                tx,
                                cfg,
                                now,
                                rng,
                                &thread_battle,
                                &mut player,
                                order.amount,
                                order.troops.as_deref(),
                                Some(comment_id),
                                true,
                            )?;
                            let text = format!(
                                "**Confirmed** Skirmish #{}: you attack with {} {}!\n\nOthers \
                                 may reply here to `support` or `oppose` you.",
                                action.id, action.amount, action.troops
                            );
                            host.reply(&event.origin, &text)
                                .map_err(|e| GameError::HostFailure(e.to_string()))?;
                            Ok(())
                        })
                    }
                    Some(parent_id) => {
                        let reply = self.store.transaction(|tx| {
                            let mut player = require_player(tx, name)?;
                            let parent = tx
                                .skirmish_by_id(parent_id)?
                                .filter(|action| action.battle == thread_battle.id)
                                .ok_or(GameError::UnknownSkirmish(parent_id))?;
                            let action = battle::react(
                                tx,
                                cfg,
                                now,
                                &parent,
                                &mut player,
                                order.amount,
                                order.troops.as_deref(),
                                hinder,
                                Some(comment_id),
                                true,
                            )?;
                            Ok(reaction_confirmation(&action, hinder, parent.id))
                        })?;
                        best_effort_reply(host, &event.origin, &reply);
                        Ok(())
                    }
                }
            }
        }
    }

    fn execute_defect(
        &mut self,
        host: &mut dyn Host,
        event: &CommandEvent,
        name: &str,
        defect: &DefectOrder,
    ) -> GameResult<()> {
        let cfg = &self.config.game;
        let reply = self.store.transaction(|tx| {
            if cfg.disable_defect {
                return Err(GameError::Disabled("defection"));
            }
            let mut player = require_player(tx, name)?;
            if !player.defectable {
                return Err(GameError::too_late(None));
            }
            let target = defect.team.unwrap_or_else(|| player.team.opponent());
            if target == player.team {
                return Err(GameError::Team {
                    what: cfg.side_label(target).to_string(),
                    friendly: true,
                });
            }
            player.team = target;
            if !cfg.unlimited_defect {
                player.defectable = false;
            }
            tx.save_player(&player)?;
            Ok(format!("Done - welcome to the {} army!", cfg.side_label(target)))
        })?;
        best_effort_reply(host, &event.origin, &reply);
        Ok(())
    }

    fn execute_rank(
        &mut self,
        host: &mut dyn Host,
        event: &CommandEvent,
        name: &str,
        rank: &RankOrder,
    ) -> GameResult<()> {
        let (promote, target_name) = match rank {
            RankOrder::Promote(target) => (true, target),
            RankOrder::Demote(target) => (false, target),
        };
        let reply = self.store.transaction(|tx| {
            let caller = require_player(tx, name)?;
            if !caller.leader {
                return Err(GameError::Rank);
            }
            let mut target = tx
                .player_by_name(target_name)?
                .ok_or_else(|| GameError::UnknownPlayer(target_name.clone()))?;
            if target.team != caller.team {
                return Err(GameError::Team {
                    what: target.name,
                    friendly: false,
                });
            }
            target.leader = promote;
            tx.save_player(&target)?;
            Ok(format!("{} now holds the rank of {}.", target.name, target.rank()))
        })?;
        best_effort_reply(host, &event.origin, &reply);
        Ok(())
    }

    fn execute_codeword(
        &mut self,
        host: &mut dyn Host,
        event: &CommandEvent,
        name: &str,
        order: &CodewordOrder,
    ) -> GameResult<()> {
        let reply = self.store.transaction(|tx| {
            let player = require_player(tx, name)?;
            Ok(match order {
                CodewordOrder::Add { code, word } => {
                    tx.set_codeword(player.id, code, word)?;
                    format!("Confirmed: \"{}\" now means \"{}\".", code, word)
                }
                CodewordOrder::Remove(code) => {
                    if tx.remove_codeword(player.id, code)? {
                        format!("Confirmed: \"{}\" no longer means anything.", code)
                    } else {
                        format!("You have no codeword \"{}\".", code)
                    }
                }
                CodewordOrder::RemoveAll => {
                    let removed = tx.clear_codewords(player.id)?;
                    format!("Confirmed: removed {} codeword(s).", removed)
                }
                CodewordOrder::Status(Some(code)) => {
                    let word = tx.translate_codeword(player.id, code)?;
                    if word == *code {
                        format!("\"{}\" doesn't mean anything special.", code)
                    } else {
                        format!("\"{}\" means \"{}\".", code, word)
                    }
                }
                CodewordOrder::Status(None) => {
                    let words = tx.codewords_for(player.id)?;
                    if words.is_empty() {
                        "You have no codewords.".to_string()
                    } else {
                        words
                            .into_iter()
                            .map(|(code, word)| format!("* \"{}\" means \"{}\"", code, word))
                            .collect::<Vec<_>>()
                            .join("\n")
                    }
                }
            })
        })?;

        // Vocabularies are secret; never echo one into a public thread.
        match &event.origin {
            Origin::BattleThread { .. } => {
                if let Err(err) = host.send_pm(&event.author, "Codewords", &reply) {
                    tracing::warn!(error = %err, "codeword reply failed");
                }
            }
            Origin::PrivateMessage { .. } => best_effort_reply(host, &event.origin, &reply),
        }
        Ok(())
    }
}

fn require_player(tx: &Tx<'_>, name: &str) -> GameResult<Player> {
    tx.player_by_name(name)?
        .ok_or_else(|| GameError::UnknownPlayer(name.to_string()))
}

fn best_effort_reply(host: &mut dyn Host, origin: &Origin, body: &str) {
    if let Err(err) = host.reply(origin, body) {
        tracing::warn!(error = %err, "reply failed; continuing");
    }
}

fn reaction_confirmation(
    action: &battle::SkirmishAction,
    hinder: bool,
    parent: battle::SkirmishId,
) -> String {
    format!(
        "**Confirmed** (subskirmish {}): you {} skirmish #{} with {} {}.",
        action.id,
        if hinder { "oppose" } else { "support" },
        parent,
        action.amount,
        action.troops
    )
}

/// Resolve a movement itinerary into concrete region hops plus the final
/// sector. Wildcards expand to the shortest traversable route to the next
/// named stop; a bare `#N` is only meaningful as the final destination.
fn expand_path(
    tx: &Tx<'_>,
    cfg: &crate::config::GameConfig,
    player: &Player,
    lead: &LeadOrder,
) -> GameResult<(Vec<RegionId>, i64)> {
    let atlas = Atlas::load(tx)?;
    let mut path: Vec<RegionId> = Vec::new();
    let mut dest_sector = 0;
    let mut current = player.region;
    let mut pending_wildcard = false;

    let last = lead.path.len().saturating_sub(1);
    for (i, dest) in lead.path.iter().enumerate() {
        match dest {
            Destination::Wildcard => pending_wildcard = true,
            Destination::Sector(sector) => {
                if pending_wildcard || i != last {
                    let src = tx.region_by_id(current)?;
                    return Err(GameError::NoPath {
                        src: src.name,
                        dest: format!("#{}", sector),
                    });
                }
                dest_sector = *sector;
                if path.is_empty() {
                    path.push(current);
                }
            }
            Destination::Region { name, sector } => {
                let (region_id, region_name) = match atlas.find(name) {
                    Some(region) => (region.id, region.name.clone()),
                    None => return Err(GameError::UnknownRegion(name.clone())),
                };
                if pending_wildcard {
                    pending_wildcard = false;
                    let policy = TraversalPolicy::for_team(player.team, cfg.traversable_neutrals);
                    let route =
                        geo::find_path(&atlas, current, region_id, policy).ok_or_else(|| {
                            GameError::NoPath {
                                src: atlas
                                    .region(current)
                                    .map(|r| r.name.clone())
                                    .unwrap_or_default(),
                                dest: region_name,
                            }
                        })?;
                    path.extend(route.into_iter().skip(1));
                } else {
                    path.push(region_id);
                }
                current = region_id;
                dest_sector = sector.unwrap_or(0);
            }
        }
    }

    if pending_wildcard {
        let src = tx.region_by_id(current)?;
        return Err(GameError::NoPath {
            src: src.name,
            dest: "anywhere".to_string(),
        });
    }
    Ok((path, dest_sector))
}

/// Pull a skirmish number out of a bot confirmation, either the spearhead
/// form "Skirmish #12" or the reaction form "(subskirmish 34)".
fn parse_skirmish_marker(body: &str) -> Option<i64> {
    let lowered = body.to_lowercase();
    // Reaction confirmations mention their spearhead too, so the subskirmish
    // marker must win.
    for marker in ["(subskirmish ", "skirmish #"] {
        if let Some(at) = lowered.find(marker) {
            let digits: String = lowered[at + marker.len()..]
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            if let Ok(id) = digits.parse() {
                return Some(id);
            }
        }
    }
    None
}
