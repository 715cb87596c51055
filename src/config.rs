//! Engine configuration. Every key has a default so an empty file (or an
//! empty `[game]` table) is a valid configuration; the live bot layers a TOML
//! file on top.

use crate::team::Team;
use crate::time::{self, Timestamp};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub game: GameConfig,
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Config, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn load(path: impl AsRef<Path>) -> io::Result<Config> {
        let text = fs::read_to_string(path)?;
        Config::from_toml_str(&text).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// Team-assignment policy for new recruits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Assignment {
    /// Base-36 decode of the recruit's external id, mod 2.
    Uid,
    /// Coin flip from the engine rng.
    Random,
    /// Everyone lands on team 0.
    Fixed,
}

impl Default for Assignment {
    fn default() -> Self {
        Assignment::Fixed
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seconds from the invade command to the battle beginning.
    pub battle_delay: i64,
    /// Displayed duration of an open battle.
    pub battle_time: i64,
    /// Window at the end of a battle during which new root skirmishes are
    /// refused; also the range of the hidden end-time jitter.
    pub battle_lockout: i64,
    /// Skirmish lifetime; 0 means skirmishes only resolve with the battle.
    pub skirmish_time: i64,
    /// Jitter range applied to the hidden skirmish end time.
    pub skirmish_variability: i64,
    /// Grace window from battle start during which a player's first two
    /// skirmish actions earn the first-strike buff.
    pub fftb_time: i64,
    /// Base per-hop travel delay for one company (100 loyalists).
    pub speed: i64,
    /// Flat delay for a sector change inside the current region.
    pub intrasector_travel: i64,
    /// Number of sectors in every region; valid indexes are `0..num_sectors`.
    pub num_sectors: i64,
    /// Whether armies may path through unowned regions.
    pub traversable_neutrals: bool,
    /// Set to "none" to forbid invading the enemy capital.
    pub capital_invasion: String,
    /// Slash-separated percent chain by capital distance, e.g. "25/10/5".
    pub homeland_defense: String,
    /// Lifetime of the otd / fortified buffs granted on battle resolution.
    pub defense_buff_time: i64,
    /// Percent of committed loyalists awarded to the winning team.
    pub winreward: i64,
    /// Percent of committed loyalists awarded to everyone else.
    pub losereward: i64,
    /// Hard ceiling on loyalists, applied after rewards.
    pub troopcap: Option<i64>,
    pub assignment: Assignment,
    /// Names granted the leader flag on recruitment.
    pub leaders: Vec<String>,
    /// Display labels for team 0 and team 1.
    pub sides: [String; 2],
    /// Allow defecting more than once.
    pub unlimited_defect: bool,
    /// Turn defection off entirely.
    pub disable_defect: bool,
    /// Allow skirmish commands by private message (with an explicit target).
    pub battle_pm: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            battle_delay: time::DAY,
            battle_time: time::DAY,
            battle_lockout: 4 * time::HOUR,
            skirmish_time: 0,
            skirmish_variability: 0,
            fftb_time: 0,
            speed: time::HOUR,
            intrasector_travel: 30 * time::MINUTE,
            num_sectors: 1,
            traversable_neutrals: false,
            capital_invasion: "allowed".to_string(),
            homeland_defense: String::new(),
            defense_buff_time: time::WEEK,
            winreward: 15,
            losereward: 10,
            troopcap: None,
            assignment: Assignment::default(),
            leaders: Vec::new(),
            sides: [Team::Orangered.name().into(), Team::Periwinkle.name().into()],
            unlimited_defect: false,
            disable_defect: false,
            battle_pm: false,
        }
    }
}

impl GameConfig {
    pub fn capital_invasion_allowed(&self) -> bool {
        self.capital_invasion != "none"
    }

    /// The homeland-defense chain as fractional bonuses indexed by
    /// `distance - 1`. Malformed entries are skipped.
    pub fn homeland_chain(&self) -> Vec<f64> {
        self.homeland_defense
            .split('/')
            .filter_map(|part| part.trim().parse::<f64>().ok())
            .map(|pct| pct / 100.0)
            .collect()
    }

    /// Display label for a team, honoring the `sides` override.
    pub fn side_label(&self, team: Team) -> &str {
        &self.sides[team.index()]
    }

    pub fn owner_label(&self, owner: Option<Team>) -> &str {
        owner.map(|t| self.side_label(t)).unwrap_or("Neutral")
    }

    /// Travel delay per hop for a force of `count` loyalists: one speed unit
    /// per full company of 100. A squad under company strength travels
    /// instantly.
    pub fn per_hop_delay(&self, count: i64) -> i64 {
        self.speed * (count.max(0) / 100)
    }

    /// Expiry for a defense buff granted at `now`.
    pub fn defense_buff_expiry(&self, now: Timestamp) -> Timestamp {
        now + self.defense_buff_time
    }
}
