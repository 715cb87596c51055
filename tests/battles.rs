mod util;

use chroma::battle;
use chroma::config::Config;
use chroma::store::{BuffSpec, BuffTarget};
use chroma::time::{DAY, HOUR, WEEK};
use chroma::{Conflict, GameError, Team, TimingSide, TroopType};
use rand::SeedableRng;
use util::*;

/// The classic four: alice and carol fight for orangered, bob and dave for
/// periwinkle, all encamped in neutral Sapphire with a battle underway.
fn battle_world(config: Config) -> (TestWorld, chroma::battle::Battle) {
    let mut world = TestWorld::with_config(config);
    world.create_player("alice", Team::Orangered);
    world.create_leader("bob", Team::Periwinkle);
    world.create_player("carol", Team::Orangered);
    world.create_player("dave", Team::Periwinkle);
    for name in ["alice", "bob", "carol", "dave"] {
        world.place(name, "Sapphire");
    }
    let battle = world.start_battle("Sapphire", "bob");
    (world, battle)
}

#[test]
fn invasion_requires_rank_adjacency_and_peace() {
    let mut world = TestWorld::new();
    world.create_player("alice", Team::Orangered);
    world.create_leader("ada", Team::Orangered);
    let now = world.now();
    let cfg = world.engine.config().game.clone();

    // A captain cannot sound the horns.
    let sapphire = world.region("Sapphire");
    let mut alice = world.player("alice");
    let err = world
        .engine
        .store_mut()
        .transaction(|tx| battle::invade(tx, &cfg, now, &mut alice, &sapphire, now))
        .unwrap_err();
    assert!(matches!(err, GameError::Rank));

    // Sapphire doesn't touch orangered land.
    let mut ada = world.player("ada");
    let err = world
        .engine
        .store_mut()
        .transaction(|tx| battle::invade(tx, &cfg, now, &mut ada, &sapphire, now))
        .unwrap_err();
    assert!(matches!(err, GameError::NonAdjacent { .. }));

    // Orange Londo is friendly territory.
    let londo = world.region("Orange Londo");
    let err = world
        .engine
        .store_mut()
        .transaction(|tx| battle::invade(tx, &cfg, now, &mut ada, &londo, now))
        .unwrap_err();
    assert!(matches!(err, GameError::Team { friendly: true, .. }));

    // Aegis borders Londo: a proper invasion.
    let aegis = world.region("Aegis");
    let created = world
        .engine
        .store_mut()
        .transaction(|tx| battle::invade(tx, &cfg, now, &mut ada, &aegis, now + DAY))
        .expect("invasion should schedule");
    assert_eq!(created.begins, now + DAY);
    assert!(!created.has_started(now));
    assert!(!world.player("ada").defectable);

    // And no double-booking the same region.
    let err = world
        .engine
        .store_mut()
        .transaction(|tx| battle::invade(tx, &cfg, now, &mut ada, &aegis, now))
        .unwrap_err();
    assert!(matches!(
        err,
        GameError::InProgress(Conflict::Battle { .. })
    ));
}

#[test]
fn capital_invasion_policy() {
    let mut config = Config::default();
    config.game.capital_invasion = "none".to_string();
    let mut world = TestWorld::with_config(config);
    world.create_leader("bob", Team::Periwinkle);

    // March periwinkle's border up to the orangered capital.
    let londo = world.region("Orange Londo");
    world.write(|tx| tx.set_region_owner(londo.id, Some(Team::Periwinkle)));

    let cap = world.region("Oraistedarg");
    let mut bob = world.player("bob");
    let now = world.now();
    let cfg = world.engine.config().game.clone();
    let err = world
        .engine
        .store_mut()
        .transaction(|tx| battle::invade(tx, &cfg, now, &mut bob, &cap, now))
        .unwrap_err();
    assert!(matches!(err, GameError::Disabled(_)));
}

#[test]
fn no_early_fights() {
    let mut world = TestWorld::new();
    world.create_leader("bob", Team::Periwinkle);
    world.create_player("alice", Team::Orangered);
    world.place("alice", "Sapphire");
    world.place("bob", "Sapphire");

    // The battle is declared but begins in twelve hours.
    let now = world.now();
    let begins = now + 12 * HOUR;
    let region = world.region("Sapphire");
    let cfg = world.engine.config().game.clone();
    let mut bob = world.player("bob");
    let scheduled = world
        .engine
        .store_mut()
        .transaction(|tx| battle::invade(tx, &cfg, now, &mut bob, &region, begins))
        .expect("invade");
    world.write(|tx| {
        tx.set_battle_times(scheduled.id, begins + DAY, begins + DAY)?;
        tx.set_battle_submission(scheduled.id, "TEST")
    });
    let scheduled = world.battle(scheduled.id);
    assert!(!scheduled.has_started(now));

    let err = world.attack(&scheduled, "alice", 1, None).unwrap_err();
    assert!(matches!(
        err,
        GameError::Timing {
            side: TimingSide::Soon,
            ..
        }
    ));
}

#[test]
fn single_toplevel_skirmish_each() {
    let (mut world, battle) = battle_world(Config::default());
    world.attack(&battle, "alice", 1, None).expect("first root");

    let err = world.attack(&battle, "alice", 1, None).unwrap_err();
    assert!(matches!(
        err,
        GameError::InProgress(Conflict::RootSkirmish { .. })
    ));
}

#[test]
fn single_response_to_skirmish() {
    let (mut world, battle) = battle_world(Config::default());
    let s1 = world.attack(&battle, "alice", 1, None).expect("root");
    world.react(&s1, "bob", 1, None, true).expect("reaction");

    let err = world.react(&s1, "bob", 1, None, true).unwrap_err();
    assert!(matches!(
        err,
        GameError::InProgress(Conflict::Reaction { .. })
    ));
}

#[test]
fn no_last_minute_ambush() {
    let (mut world, battle) = battle_world(Config::default());
    let now = world.now();
    world.write(|tx| {
        tx.set_battle_times(battle.id, now + HOUR, now + HOUR)
    });
    // A lockout wider than the remaining battle refuses new spearheads.
    let mut locked = world.battle(battle.id);
    locked.lockout = 2 * HOUR;

    let err = world.attack(&locked, "alice", 1, None).unwrap_err();
    assert!(matches!(
        err,
        GameError::Timing {
            side: TimingSide::Late,
            ..
        }
    ));
}

#[test]
fn no_rookies() {
    let (mut world, battle) = battle_world(Config::default());
    // Recruited after the drums sounded.
    let sapphire = world.region("Sapphire");
    let rookie_joined = world.now() + 6000;
    world.write(|tx| {
        tx.insert_player("newbie", Team::Periwinkle, 100, sapphire.id, false, rookie_joined)
    });

    let err = world.attack(&battle, "newbie", 1, None).unwrap_err();
    assert!(matches!(
        err,
        GameError::Timing {
            side: TimingSide::Soon,
            ..
        }
    ));

    let s1 = world.attack(&battle, "alice", 1, None).expect("root");
    let err = world.react(&s1, "newbie", 1, None, true).unwrap_err();
    assert!(matches!(
        err,
        GameError::Timing {
            side: TimingSide::Soon,
            ..
        }
    ));

    // The rookie rule can be waived.
    let now = world.now();
    let cfg = world.engine.config().game.clone();
    let mut newbie = world.player("newbie");
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(1);
    world
        .engine
        .store_mut()
        .transaction(|tx| {
            battle::create_root(
                tx, &cfg, now, &mut rng, &battle, &mut newbie, 1, None, None, false,
            )
        })
        .expect("waived rookie rule");
}

#[test]
fn commit_at_least_one() {
    let (mut world, battle) = battle_world(Config::default());
    for bad in [0, -5] {
        let err = world.attack(&battle, "alice", bad, None).unwrap_err();
        assert!(matches!(err, GameError::Insufficient { .. }), "{}", bad);
    }
    let s1 = world.attack(&battle, "alice", 1, None).expect("root");
    let err = world.react(&s1, "carol", 0, None, false).unwrap_err();
    assert!(matches!(err, GameError::Insufficient { .. }));
}

#[test]
fn no_overdraw() {
    let (mut world, battle) = battle_world(Config::default());
    let err = world.attack(&battle, "alice", 9999999, None).unwrap_err();
    assert!(matches!(err, GameError::Insufficient { .. }));

    // Committed loyalists count against the pool.
    let s1 = world.attack(&battle, "alice", 99, None).expect("root");
    let err = world.react(&s1, "alice", 2, None, false).unwrap_err();
    assert!(matches!(err, GameError::Insufficient { .. }));
}

#[test]
fn no_overkill() {
    let (mut world, battle) = battle_world(Config::default());
    let s1 = world.attack(&battle, "alice", 10, None).expect("root");
    world
        .react(&s1, "carol", 10, None, false)
        .expect("matching support is fine");
    let err = world.react(&s1, "bob", 11, None, true).unwrap_err();
    assert!(matches!(err, GameError::TooMany { .. }));
}

#[test]
fn team_discipline() {
    let (mut world, battle) = battle_world(Config::default());
    let s1 = world.attack(&battle, "alice", 1, None).expect("root");

    // Can't hinder your own team.
    let err = world.react(&s1, "carol", 1, None, true).unwrap_err();
    assert!(matches!(err, GameError::Team { friendly: true, .. }));

    // Can't help the opposing team.
    let err = world.react(&s1, "bob", 1, None, false).unwrap_err();
    assert!(matches!(err, GameError::Team { friendly: false, .. }));
}

#[test]
fn absent_fighting_forbidden() {
    let (mut world, battle) = battle_world(Config::default());
    world.place("alice", "Orange Londo");
    let err = world.attack(&battle, "alice", 1, None).unwrap_err();
    assert!(matches!(err, GameError::NotPresent { .. }));
}

#[test]
fn committed_loyalists_track_actions() {
    let (mut world, battle) = battle_world(Config::default());
    assert_eq!(world.player("alice").committed, 0);
    world.attack(&battle, "alice", 5, None).expect("root");
    assert_eq!(world.player("alice").committed, 5);
}

#[test]
fn decommit_and_reward_after_battle() {
    let (mut world, battle) = battle_world(Config::default());
    let s1 = world.attack(&battle, "alice", 50, None).expect("root");
    world
        .react(&s1, "bob", 50, Some("cavalry"), true)
        .expect("counter");

    let report = world.end_battle(&battle);
    // Bob's cavalry wins the skirmish and the battle.
    assert_eq!(report.victor, Some(Team::Periwinkle));

    // Alice gets the loser's 10%, bob the victor's 15%.
    assert_eq!(world.player("alice").loyalists, 105);
    assert_eq!(world.player("bob").loyalists, 107);
    assert_eq!(world.player("alice").committed, 0);
    assert_eq!(world.player("bob").committed, 0);

    // The battle and its skirmishes are gone.
    assert!(world
        .read(|tx| tx.battle_for_region(battle.region))
        .is_none());
    assert!(world.read(|tx| tx.skirmish_by_id(s1.id)).is_none());
}

#[test]
fn configurable_rewards() {
    let mut config = Config::default();
    config.game.winreward = 7;
    config.game.losereward = 5;
    let (mut world, battle) = battle_world(config);
    let s1 = world.attack(&battle, "alice", 50, None).expect("root");
    world
        .react(&s1, "bob", 50, Some("cavalry"), true)
        .expect("counter");
    world.end_battle(&battle);
    assert_eq!(world.player("alice").loyalists, 102);
    assert_eq!(world.player("bob").loyalists, 103);
}

#[test]
fn troopcap_holds_the_line() {
    let mut config = Config::default();
    config.game.troopcap = Some(106);
    let (mut world, battle) = battle_world(config);
    let s1 = world.attack(&battle, "alice", 50, None).expect("root");
    world
        .react(&s1, "bob", 50, Some("cavalry"), true)
        .expect("counter");
    world.end_battle(&battle);
    assert_eq!(world.player("alice").loyalists, 105);
    // Bob's 15% would land on 107 but the cap holds him to 106.
    assert_eq!(world.player("bob").loyalists, 106);
}

#[test]
fn losers_are_ejected() {
    let (mut world, battle) = battle_world(Config::default());
    world.attack(&battle, "alice", 5, None).expect("root");
    let report = world.end_battle(&battle);
    assert_eq!(report.victor, Some(Team::Orangered));

    // Sapphire changes hands and the defeated go home.
    assert_eq!(world.region("Sapphire").owner, Some(Team::Orangered));
    assert_eq!(world.player("alice").region, world.region("Sapphire").id);
    assert_eq!(world.player("bob").region, world.region("Periopolis").id);
    assert_eq!(world.player("dave").region, world.region("Periopolis").id);
}

#[test]
fn ties_change_nothing() {
    let (mut world, battle) = battle_world(Config::default());
    let s1 = world.attack(&battle, "alice", 10, None).expect("root");
    world.react(&s1, "bob", 10, None, true).expect("counter");
    let s2 = world.attack(&battle, "dave", 10, None).expect("root");
    world.react(&s2, "carol", 10, None, true).expect("counter");

    let report = world.end_battle(&battle);
    assert_eq!(report.victor, None);
    assert_eq!(report.score, [0, 0]);
    assert_eq!(world.region("Sapphire").owner, None);
    // Nobody is ejected on a tie.
    assert_eq!(world.player("alice").region, world.region("Sapphire").id);
    assert_eq!(world.player("bob").region, world.region("Sapphire").id);
}

#[test]
fn full_battle() {
    let (mut world, battle) = battle_world(Config::default());

    // Skirmish 1: orangered holds, 11 VP.
    let s1 = world.attack(&battle, "alice", 10, None).expect("s1");
    let s1a = world.react(&s1, "carol", 4, None, false).expect("support");
    world.react(&s1a, "bob", 3, None, true).expect("ambush");
    world.react(&s1, "dave", 8, None, true).expect("attack");

    // Skirmish 2: periwinkle unopposed, 30 VP.
    world.attack(&battle, "bob", 15, None).expect("s2");

    // Skirmish 3: orangered holds, 5 VP.
    let s3 = world.attack(&battle, "carol", 10, None).expect("s3");
    world.react(&s3, "bob", 5, None, true).expect("attack");

    let report = world.end_battle(&battle);
    assert_eq!(report.score, [16, 30]);
    assert_eq!(report.victor, Some(Team::Periwinkle));
    assert_eq!(world.region("Sapphire").owner, Some(Team::Periwinkle));
    assert_eq!(report.roots.len(), 3);
}

#[test]
fn codewords_translate_troops() {
    let (mut world, battle) = battle_world(Config::default());

    // Unknown words fight as infantry.
    let s1 = world
        .attack(&battle, "alice", 1, Some("muppet"))
        .expect("root");
    assert_eq!(s1.troops, TroopType::Infantry);

    // A personal codeword translates, but only for its owner.
    let alice = world.player("alice");
    world.write(|tx| tx.set_codeword(alice.id, "muppet", "ranged"));
    let s2 = world
        .attack(&battle, "carol", 1, Some("muppet"))
        .expect("carol root");
    assert_eq!(s2.troops, TroopType::Infantry);

    let s3 = world
        .react(&s2, "alice", 1, Some("muppet"), false)
        .expect("support");
    assert_eq!(s3.troops, TroopType::Ranged);

    // Removing the codeword reverts to the default.
    world.write(|tx| tx.remove_codeword(alice.id, "muppet").map(|_| ()));
    let s4 = world
        .react(&s1, "alice", 1, Some("muppet"), false)
        .expect("second support");
    assert_eq!(s4.troops, TroopType::Infantry);
}

#[test]
fn codeword_overwrite_and_translate() {
    let mut world = TestWorld::new();
    let alice = world.create_player("alice", Team::Orangered);
    world.write(|tx| tx.set_codeword(alice.id, "muppet", "ranged"));
    assert_eq!(
        world.read(|tx| tx.translate_codeword(alice.id, "muppet")),
        "ranged"
    );
    world.write(|tx| tx.set_codeword(alice.id, "muppet", "infantry"));
    assert_eq!(
        world.read(|tx| tx.translate_codeword(alice.id, "muppet")),
        "infantry"
    );
    assert_eq!(world.read(|tx| tx.codewords_for(alice.id)).len(), 1);

    // Unknown codes pass through unchanged.
    assert_eq!(
        world.read(|tx| tx.translate_codeword(alice.id, "gonzo")),
        "gonzo"
    );

    // Unicode codes are codes like any other.
    world.write(|tx| tx.set_codeword(alice.id, "ಠ_ಠ", "ranged"));
    assert_eq!(
        world.read(|tx| tx.translate_codeword(alice.id, "ಠ_ಠ")),
        "ranged"
    );
}

#[test]
fn skirmish_expiry_resolves_the_subtree() {
    let mut config = Config::default();
    config.game.skirmish_time = DAY;
    let (mut world, battle) = battle_world(config);

    let s1 = world.attack(&battle, "alice", 10, None).expect("root");
    let s2 = world.react(&s1, "bob", 9, None, true).expect("counter");
    assert!(s1.ends.is_some());

    // A mid-battle sweep doesn't end it early.
    let now = world.now();
    let resolved = world.write(|tx| battle::resolve_due_skirmishes(tx, now));
    assert!(resolved.is_empty());

    // Keep the battle itself open well past the skirmish end.
    let now = world.now();
    world.write(|tx| {
        tx.set_battle_times(battle.id, now + 10 * DAY, now + 10 * DAY)
    });
    let battle = world.battle(battle.id);

    // Past the hidden end, the whole subtree resolves.
    world.clock.advance(DAY + HOUR);
    let now = world.now();
    let resolved = world.write(|tx| battle::resolve_due_skirmishes(tx, now));
    assert_eq!(resolved, vec![s1.id]);
    let s1 = world.skirmish(s1.id);
    let s2 = world.skirmish(s2.id);
    assert!(s1.is_resolved());
    assert!(s2.is_resolved());
    assert_eq!(s1.victor, Some(Team::Orangered));

    // Expired spearheads still block a second one...
    let err = world.attack(&battle, "alice", 1, None).unwrap_err();
    assert!(matches!(
        err,
        GameError::InProgress(Conflict::RootSkirmish { .. })
    ));

    // ...keep their loyalists committed...
    assert_eq!(world.player("alice").committed, 10);

    // ...and refuse fresh reactions anywhere in the tree.
    let err = world.react(&s1, "dave", 1, None, true).unwrap_err();
    assert!(matches!(
        err,
        GameError::Timing {
            side: TimingSide::Late,
            ..
        }
    ));
    let err = world.react(&s2, "carol", 1, None, true).unwrap_err();
    assert!(matches!(
        err,
        GameError::Timing {
            side: TimingSide::Late,
            ..
        }
    ));
}

#[test]
fn skirmish_end_jitter_stays_in_window() {
    let mut config = Config::default();
    config.game.skirmish_time = DAY;
    config.game.skirmish_variability = 1800;
    let (mut world, battle) = battle_world(config);
    let s1 = world.attack(&battle, "alice", 10, None).expect("root");
    let display = s1.display_ends.expect("display end");
    let ends = s1.ends.expect("hidden end");
    assert!(ends >= display - 900);
    assert!(ends < display + 900);
}

#[test]
fn otd_buff_swings_the_score() {
    let (mut world, battle) = battle_world(Config::default());
    let sapphire = world.region("Sapphire");
    world.write(|tx| tx.set_region_owner(sapphire.id, Some(Team::Orangered)));

    // Periwinkle edges the field 30 to 29.
    let s1 = world.attack(&battle, "alice", 30, None).expect("s1");
    world
        .react(&s1, "bob", 30, Some("cavalry"), true)
        .expect("counter");
    let s2 = world.attack(&battle, "bob", 29, None).expect("s2");
    world
        .react(&s2, "alice", 29, Some("cavalry"), true)
        .expect("counter");

    // But the defenders hold buffed ground.
    let expires = world.now() + WEEK;
    world.write(|tx| {
        tx.attach_buff(
            BuffTarget::Region(sapphire.id),
            &BuffSpec::on_the_defensive(expires),
        )
        .map(|_| ())
    });

    let report = world.end_battle(&battle);
    assert_eq!(report.score, [31, 30]);
    assert_eq!(report.victor, Some(Team::Orangered));
}

#[test]
fn expired_buffs_do_not_score() {
    let (mut world, battle) = battle_world(Config::default());
    let sapphire = world.region("Sapphire");
    world.write(|tx| tx.set_region_owner(sapphire.id, Some(Team::Orangered)));

    let s1 = world.attack(&battle, "alice", 30, None).expect("s1");
    world
        .react(&s1, "bob", 30, Some("cavalry"), true)
        .expect("counter");
    let s2 = world.attack(&battle, "bob", 29, None).expect("s2");
    world
        .react(&s2, "alice", 29, Some("cavalry"), true)
        .expect("counter");

    // The buff died half a minute ago; resolution ignores it even before
    // the expiry sweep deletes the row.
    let expires = world.now() - 30;
    world.write(|tx| {
        tx.attach_buff(
            BuffTarget::Region(sapphire.id),
            &BuffSpec::on_the_defensive(expires),
        )
        .map(|_| ())
    });

    let report = world.end_battle(&battle);
    assert_eq!(report.score, [29, 30]);
    assert_eq!(report.victor, Some(Team::Periwinkle));
}

#[test]
fn conquest_grants_otd() {
    let (mut world, battle) = battle_world(Config::default());
    world.attack(&battle, "alice", 30, None).expect("root");
    assert_eq!(world.read(|tx| tx.buff_count()), 0);
    world.end_battle(&battle);

    let now = world.now();
    let sapphire = world.region("Sapphire");
    let otd = world
        .read(|tx| tx.region_buff(sapphire.id, "otd", now))
        .expect("fresh conquest should be on the defensive");
    assert_eq!(otd.value, 0.10);
    assert!(otd.expires <= Some(now + WEEK));
}

#[test]
fn defense_grants_fortified_which_blocks_invasion() {
    let (mut world, battle) = battle_world(Config::default());
    let sapphire = world.region("Sapphire");
    world.write(|tx| tx.set_region_owner(sapphire.id, Some(Team::Orangered)));
    world.attack(&battle, "alice", 30, None).expect("root");
    world.end_battle(&battle);

    let now = world.now();
    let fortified = world.read(|tx| tx.region_buff(sapphire.id, "fortified", now));
    assert!(fortified.is_some());

    let sapphire = world.region("Sapphire");
    let cfg = world.engine.config().game.clone();
    let mut bob = world.player("bob");
    let err = world
        .engine
        .store_mut()
        .transaction(|tx| battle::invade(tx, &cfg, now, &mut bob, &sapphire, now))
        .unwrap_err();
    assert!(matches!(
        err,
        GameError::Timing {
            side: TimingSide::Soon,
            ..
        }
    ));
}

#[test]
fn same_buff_never_stacks() {
    let (mut world, battle) = battle_world(Config::default());
    let s1 = world.attack(&battle, "alice", 20, None).expect("root");
    world.react(&s1, "bob", 20, None, true).expect("a");
    world.react(&s1, "dave", 6, None, true).expect("b");

    world.write(|tx| {
        let first = tx.attach_buff(BuffTarget::Skirmish(s1.id), &BuffSpec::first_strike())?;
        let second = tx.attach_buff(BuffTarget::Skirmish(s1.id), &BuffSpec::first_strike())?;
        assert!(first);
        assert!(!second);
        Ok(())
    });

    // One first-strike takes 20 to 25; the attackers total 26.
    let report = world.end_battle(&battle);
    let root = &report.roots[0];
    assert_eq!(root.outcome.victor, Some(Team::Periwinkle));
    assert_eq!(root.outcome.margin, 1);
    assert_eq!(root.outcome.vp, 20);
}

#[test]
fn first_strike_granted_in_grace_window() {
    let mut config = Config::default();
    config.game.fftb_time = HOUR;
    let (mut world, battle) = battle_world(config);

    // First and second actions qualify; the third doesn't.
    let s1 = world.attack(&battle, "alice", 20, None).expect("root");
    let s2 = world.attack(&battle, "bob", 20, None).expect("bob root");
    let second = world.react(&s2, "alice", 5, None, true).expect("second act");
    let third = world.react(&s1, "alice", 1, None, false).expect("third act");

    let values = world.read(|tx| tx.skirmish_buff_values(battle.id, world.now()));
    assert_eq!(values.get(&s1.id), Some(&0.25));
    assert_eq!(values.get(&second.id), Some(&0.25));
    assert!(values.get(&third.id).is_none());
}

#[test]
fn no_first_strike_outside_the_window() {
    let mut config = Config::default();
    config.game.fftb_time = HOUR;
    let (mut world, battle) = battle_world(config);
    world.clock.advance(2 * HOUR);
    let late = world.attack(&battle, "alice", 20, None).expect("late root");
    let values = world.read(|tx| tx.skirmish_buff_values(battle.id, world.now()));
    assert!(values.get(&late.id).is_none());
}

#[test]
fn reactions_come_from_the_same_sector() {
    let mut config = Config::default();
    config.game.num_sectors = 3;
    let (mut world, battle) = battle_world(config);
    let s1 = world.attack(&battle, "alice", 10, None).expect("root");
    assert_eq!(s1.sector, 0);

    // Bob watches from sector 2; too far away to join this fight.
    let mut bob = world.player("bob");
    bob.sector = 2;
    world.write(|tx| tx.save_player(&bob));

    let err = world.react(&s1, "bob", 5, None, true).unwrap_err();
    assert!(matches!(
        err,
        GameError::WrongSector {
            expected: 0,
            actual: 2
        }
    ));
}

#[test]
fn homeland_defense_chain() {
    let mut config = Config::default();
    config.game.homeland_defense = "25/10/5".to_string();
    let (mut world, battle) = battle_world(config);
    // Sapphire is 1 hop from Periopolis and 5 hops from Oraistedarg:
    // periwinkle collects 25%, orangered is too far for any bonus.

    let s1 = world.attack(&battle, "alice", 10, None).expect("s1");
    world.react(&s1, "bob", 10, None, true).expect("tie 1");
    let s2 = world.attack(&battle, "bob", 10, None).expect("s2");
    world.react(&s2, "alice", 10, None, true).expect("tie 2");
    world.attack(&battle, "carol", 10, None).expect("s3");
    world.attack(&battle, "dave", 10, None).expect("s4");

    // The ties wash out; carol and dave are unopposed for 20 VP each side,
    // then homeland defense tips it to (20, 25).
    let report = world.end_battle(&battle);
    assert_eq!(report.score, [20, 25]);
    assert_eq!(report.victor, Some(Team::Periwinkle));
}
