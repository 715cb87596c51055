#![allow(dead_code)]

use chroma::battle::{self, Battle, SkirmishAction};
use chroma::config::Config;
use chroma::game::Engine;
use chroma::geo::{self, Region};
use chroma::host::{Host, HostError, Origin};
use chroma::player::Player;
use chroma::store::Store;
use chroma::time::{Clock, ManualClock, Timestamp, DAY};
use chroma::{GameResult, Team};
use rand::SeedableRng;
use std::rc::Rc;

/// A fixed start time: 2013-05-01 00:00:00 GMT, in the bot's glory days.
pub const START: Timestamp = 1367366400;

pub const TEST_LANDS: &str = r#"
[
    {
        "name": "Periopolis",
        "srname": "ct_periopolis",
        "connections": ["Sapphire"],
        "capital": 1
    },
    {
        "name": "Sapphire",
        "srname": "ct_sapphire",
        "connections": ["Ameythest Cove", "Torquois Moors"]
    },
    {
        "name": "Torquois Moors",
        "srname": "ct_fortiris",
        "connections": ["Snooland"]
    },
    {
        "name": "Ameythest Cove",
        "srname": "ct_amethestcove",
        "connections": ["Snooland"],
        "aliases": ["the cove"]
    },
    {
        "name": "Snooland",
        "srname": "ct_snooland",
        "connections": ["Aegis", "Novum Persarum"]
    },
    {
        "name": "Aegis",
        "srname": "ct_aegis",
        "connections": ["Orange Londo"]
    },
    {
        "name": "Novum Persarum",
        "srname": "ct_novumpersarum",
        "connections": ["Orange Londo"],
        "travel_multiplier": 2
    },
    {
        "name": "Orange Londo",
        "srname": "ct_orangelondo",
        "connections": ["Oraistedarg"],
        "owner": 0
    },
    {
        "name": "Oraistedarg",
        "srname": "ct_oraistedarg",
        "connections": [],
        "capital": 0
    }
]
"#;

/// Clock handle that can be shared between the test and the engine.
#[derive(Clone)]
pub struct SharedClock(pub Rc<ManualClock>);

impl Clock for SharedClock {
    fn now(&self) -> Timestamp {
        self.0.now()
    }
}

/// Records every outbound forum call; failure flags let tests exercise the
/// best-effort paths.
#[derive(Default)]
pub struct MockHost {
    pub replies: Vec<(String, String)>,
    pub posts: Vec<(String, String, String)>,
    pub edits: Vec<(String, String)>,
    pub pms: Vec<(String, String, String)>,
    pub fail_replies: bool,
    pub fail_posts: bool,
    counter: u64,
}

impl MockHost {
    pub fn new() -> MockHost {
        MockHost::default()
    }

    pub fn last_reply(&self) -> &str {
        &self
            .replies
            .last()
            .expect("expected at least one reply")
            .1
    }

    pub fn reply_count(&self) -> usize {
        self.replies.len()
    }
}

impl Host for MockHost {
    fn reply(&mut self, origin: &Origin, body: &str) -> Result<String, HostError> {
        if self.fail_replies {
            return Err(HostError("reply refused".to_string()));
        }
        self.counter += 1;
        self.replies
            .push((origin.message_id().to_string(), body.to_string()));
        Ok(format!("bot_{}", self.counter))
    }

    fn submit_post(
        &mut self,
        subreddit: &str,
        title: &str,
        body: &str,
    ) -> Result<String, HostError> {
        if self.fail_posts {
            return Err(HostError("post refused".to_string()));
        }
        self.counter += 1;
        self.posts
            .push((subreddit.to_string(), title.to_string(), body.to_string()));
        Ok(format!("post_{}", self.counter))
    }

    fn edit_post(&mut self, submission_id: &str, body: &str) -> Result<(), HostError> {
        self.edits
            .push((submission_id.to_string(), body.to_string()));
        Ok(())
    }

    fn send_pm(&mut self, user: &str, subject: &str, body: &str) -> Result<(), HostError> {
        self.pms
            .push((user.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

pub struct TestWorld {
    pub clock: Rc<ManualClock>,
    pub engine: Engine<SharedClock>,
}

impl TestWorld {
    pub fn new() -> TestWorld {
        TestWorld::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> TestWorld {
        TestWorld::with_lands(config, TEST_LANDS)
    }

    pub fn with_lands(config: Config, lands: &str) -> TestWorld {
        let mut store = Store::in_memory().expect("in-memory store");
        store
            .transaction(|tx| geo::load_world(tx, lands).map(|_| ()))
            .expect("world bootstrap");
        let clock = Rc::new(ManualClock::new(START));
        let engine = Engine::with_seed(store, config, SharedClock(clock.clone()), 42);
        TestWorld { clock, engine }
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn read<T>(&self, work: impl FnOnce(&chroma::store::Tx<'_>) -> GameResult<T>) -> T {
        self.engine.store().read(work).expect("store read")
    }

    pub fn write<T>(&mut self, work: impl FnOnce(&chroma::store::Tx<'_>) -> GameResult<T>) -> T {
        self.engine
            .store_mut()
            .transaction(work)
            .expect("store write")
    }

    pub fn region(&self, name: &str) -> Region {
        self.read(|tx| tx.region_by_name(name))
            .unwrap_or_else(|| panic!("region '{}' should exist", name))
    }

    pub fn player(&self, name: &str) -> Player {
        self.read(|tx| tx.player_by_name(name))
            .unwrap_or_else(|| panic!("player '{}' should exist", name))
    }

    pub fn create_player(&mut self, name: &str, team: Team) -> Player {
        let recruited = self.now();
        self.write(|tx| {
            let capital = tx.capital_for(team)?.expect("team capital");
            tx.insert_player(name, team, 100, capital.id, false, recruited)
        })
    }

    pub fn create_leader(&mut self, name: &str, team: Team) -> Player {
        let recruited = self.now();
        self.write(|tx| {
            let capital = tx.capital_for(team)?.expect("team capital");
            tx.insert_player(name, team, 100, capital.id, true, recruited)
        })
    }

    pub fn place(&mut self, player: &str, region: &str) -> Player {
        let region = self.region(region);
        let mut player = self.player(player);
        player.region = region.id;
        self.write(|tx| tx.save_player(&player));
        self.player(&player.name)
    }

    /// Stand up an open battle the way the old regression suite did: begun
    /// now, ending in a day, with a thread to fight in.
    pub fn start_battle(&mut self, region_name: &str, invader: &str) -> Battle {
        let now = self.now();
        let region = self.region(region_name);
        let mut leader = self.player(invader);
        let cfg = self.engine.config().game.clone();
        let battle =
            self.write(|tx| battle::invade(tx, &cfg, now, &mut leader, &region, now));
        self.write(|tx| {
            tx.set_battle_times(battle.id, now + DAY, now + DAY)?;
            tx.set_battle_submission(battle.id, "TEST")
        });
        self.read(|tx| tx.battle_by_id(battle.id))
    }

    pub fn battle(&self, id: i64) -> Battle {
        self.read(|tx| tx.battle_by_id(id))
    }

    pub fn skirmish(&self, id: i64) -> SkirmishAction {
        self.read(|tx| tx.skirmish_by_id(id))
            .unwrap_or_else(|| panic!("skirmish #{} should exist", id))
    }

    pub fn attack(
        &mut self,
        battle: &Battle,
        player: &str,
        amount: i64,
        troops: Option<&str>,
    ) -> GameResult<SkirmishAction> {
        let now = self.now();
        let mut player = self.player(player);
        let battle = battle.clone();
        let cfg = self.engine.config().game.clone();
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(7);
        self.engine.store_mut().transaction(|tx| {
            battle::create_root(
                tx, &cfg, now, &mut rng, &battle, &mut player, amount, troops, None, true,
            )
        })
    }

    pub fn react(
        &mut self,
        parent: &SkirmishAction,
        player: &str,
        amount: i64,
        troops: Option<&str>,
        hinder: bool,
    ) -> GameResult<SkirmishAction> {
        let now = self.now();
        let mut player = self.player(player);
        let parent = parent.clone();
        let cfg = self.engine.config().game.clone();
        self.engine.store_mut().transaction(|tx| {
            battle::react(
                tx, &cfg, now, &parent, &mut player, amount, troops, hinder, None, true,
            )
        })
    }

    /// Force the battle past its end and resolve it.
    pub fn end_battle(&mut self, battle: &Battle) -> battle::BattleReport {
        let now = self.now();
        let cfg = self.engine.config().game.clone();
        self.write(|tx| tx.set_battle_times(battle.id, now, now));
        let battle = self.battle(battle.id);
        self.write(|tx| battle::resolve_battle(tx, &cfg, now, &battle))
    }
}
