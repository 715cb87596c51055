//! World bootstrap from JSON. The same seed format serves initial creation
//! and later patching; patching only ever adds missing regions, connections,
//! and aliases.

use crate::error::{GameError, GameResult};
use crate::store::Tx;
use crate::team::Team;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// One region of the bootstrap JSON array.
///
/// Names are case-insensitive; the store keeps everything lowercase.
/// `capital` implies ownership by that team unless `owner` explicitly says
/// otherwise (including an explicit `null` for contested capitals-to-be).
#[derive(Debug, Clone, Deserialize)]
pub struct RegionSeed {
    pub name: String,
    pub srname: String,
    #[serde(default)]
    pub connections: Vec<String>,
    #[serde(default)]
    pub capital: Option<u8>,
    #[serde(default, deserialize_with = "explicit_option")]
    pub owner: Option<Option<u8>>,
    #[serde(default)]
    pub eternal: bool,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub travel_multiplier: Option<f64>,
}

/// Distinguishes an absent `owner` key (outer `None`) from an explicit
/// `"owner": null` (outer `Some`, inner `None`).
fn explicit_option<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Option<u8>>, D::Error> {
    Option::<u8>::deserialize(de).map(Some)
}

impl RegionSeed {
    fn owner_team(&self) -> GameResult<Option<Team>> {
        let effective = match self.owner {
            Some(explicit) => explicit,
            None => self.capital,
        };
        match effective {
            None => Ok(None),
            Some(idx) => team_index(idx).map(Some),
        }
    }

    fn capital_team(&self) -> GameResult<Option<Team>> {
        match self.capital {
            None => Ok(None),
            Some(idx) => team_index(idx).map(Some),
        }
    }
}

fn team_index(idx: u8) -> GameResult<Team> {
    Team::from_index(idx as i64)
        .ok_or_else(|| GameError::Bootstrap(format!("no such team: {}", idx)))
}

fn parse_seeds(json: &str) -> GameResult<Vec<RegionSeed>> {
    serde_json::from_str(json).map_err(|e| GameError::Bootstrap(e.to_string()))
}

/// What a patch run changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PatchReport {
    pub regions_added: usize,
    pub connections_added: usize,
    pub aliases_added: usize,
}

impl PatchReport {
    pub fn is_noop(&self) -> bool {
        *self == PatchReport::default()
    }
}

/// Create the world from scratch. Fails if any referenced connection names a
/// region missing from the seed file.
pub fn load_world(tx: &Tx<'_>, json: &str) -> GameResult<usize> {
    let seeds = parse_seeds(json)?;
    let count = seeds.len();
    apply(tx, &seeds)?;
    Ok(count)
}

/// Additive patch: create missing regions, then fill in missing connections
/// and aliases. Existing regions are never mutated, so patching with the
/// bootstrap file is a no-op.
pub fn patch_world(tx: &Tx<'_>, json: &str) -> GameResult<PatchReport> {
    let seeds = parse_seeds(json)?;
    apply(tx, &seeds)
}

fn apply(tx: &Tx<'_>, seeds: &[RegionSeed]) -> GameResult<PatchReport> {
    let mut report = PatchReport::default();
    let mut atlas: HashMap<String, i64> = tx
        .regions_all()?
        .into_iter()
        .map(|r| (r.name, r.id))
        .collect();

    for seed in seeds {
        let name = seed.name.to_lowercase();
        if atlas.contains_key(&name) {
            continue;
        }
        let multiplier = seed.travel_multiplier.unwrap_or(1.0).max(1.0);
        let id = tx.insert_region(
            &name,
            &seed.srname.to_lowercase(),
            seed.owner_team()?,
            seed.capital_team()?,
            seed.eternal,
            multiplier,
        )?;
        atlas.insert(name, id);
        report.regions_added += 1;
    }

    // Hook up borders once every region exists, keeping them bidirectional.
    for seed in seeds {
        let id = atlas[&seed.name.to_lowercase()];
        for connection in &seed.connections {
            let other = *atlas
                .get(&connection.to_lowercase())
                .ok_or_else(|| GameError::UnknownRegion(connection.clone()))?;
            if tx.add_border(id, other)? {
                report.connections_added += 1;
            }
        }
        for alias in &seed.aliases {
            if tx.add_alias(id, &alias.to_lowercase())? {
                report.aliases_added += 1;
            }
        }
    }

    Ok(report)
}
