use crate::battle::SkirmishId;
use crate::error::GameResult;
use crate::geo::RegionId;
use crate::store::Tx;
use crate::time::Timestamp;
use rusqlite::{params, OptionalExtension, Row};

/// A named, optionally-expiring modifier attached to a region or a skirmish.
#[derive(Debug, Clone, PartialEq)]
pub struct Buff {
    pub id: i64,
    pub name: String,
    /// Stable key; the same key never occurs twice on one target.
    pub internal: String,
    pub value: f64,
    pub expires: Option<Timestamp>,
    pub region: Option<RegionId>,
    pub skirmish: Option<SkirmishId>,
}

/// What to attach a buff to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuffTarget {
    Region(RegionId),
    Skirmish(SkirmishId),
}

/// Blueprint for the well-known buffs.
#[derive(Debug, Clone, PartialEq)]
pub struct BuffSpec {
    pub name: &'static str,
    pub internal: &'static str,
    pub value: f64,
    pub expires: Option<Timestamp>,
}

impl BuffSpec {
    /// Early-bird bonus for a player's opening actions of a battle.
    pub fn first_strike() -> BuffSpec {
        BuffSpec {
            name: "first strike",
            internal: "first_strike",
            value: 0.25,
            expires: None,
        }
    }

    /// Scoring bonus for the team defending freshly-taken ground.
    pub fn on_the_defensive(expires: Timestamp) -> BuffSpec {
        BuffSpec {
            name: "on the defensive",
            internal: "otd",
            value: 0.10,
            expires: Some(expires),
        }
    }

    /// Blocks invasion of ground the owner just held onto; no score value.
    pub fn fortified(expires: Timestamp) -> BuffSpec {
        BuffSpec {
            name: "fortified",
            internal: "fortified",
            value: 0.0,
            expires: Some(expires),
        }
    }
}

fn buff_from_row(row: &Row<'_>) -> rusqlite::Result<Buff> {
    Ok(Buff {
        id: row.get("id")?,
        name: row.get("name")?,
        internal: row.get("internal")?,
        value: row.get("value")?,
        expires: row.get("expires")?,
        region: row.get("region_id")?,
        skirmish: row.get("skirmish_id")?,
    })
}

const BUFF_COLS: &str = "id, name, internal, value, expires, region_id, skirmish_id";

impl Tx<'_> {
    /// Attach a buff; same-keyed buffs never stack, so a duplicate is
    /// silently dropped and this returns false.
    pub fn attach_buff(&self, target: BuffTarget, spec: &BuffSpec) -> GameResult<bool> {
        let (region, skirmish) = match target {
            BuffTarget::Region(id) => (Some(id), None),
            BuffTarget::Skirmish(id) => (None, Some(id)),
        };
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM buffs
                 WHERE internal = ?1 AND region_id IS ?2 AND skirmish_id IS ?3",
                params![spec.internal, region, skirmish],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Ok(false);
        }
        self.conn.execute(
            "INSERT INTO buffs (name, internal, value, expires, region_id, skirmish_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![spec.name, spec.internal, spec.value, spec.expires, region, skirmish],
        )?;
        Ok(true)
    }

    /// Live (unexpired as of `now`) buffs on a region.
    pub fn region_buffs(&self, region: RegionId, now: Timestamp) -> GameResult<Vec<Buff>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM buffs
             WHERE region_id = ?1 AND (expires IS NULL OR expires > ?2)
             ORDER BY id",
            BUFF_COLS
        ))?;
        let rows = stmt.query_map(params![region, now], buff_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn region_buff(
        &self,
        region: RegionId,
        internal: &str,
        now: Timestamp,
    ) -> GameResult<Option<Buff>> {
        Ok(self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM buffs
                     WHERE region_id = ?1 AND internal = ?2
                       AND (expires IS NULL OR expires > ?3)",
                    BUFF_COLS
                ),
                params![region, internal, now],
                buff_from_row,
            )
            .optional()?)
    }

    /// Sum of live buff values per skirmish of a battle.
    pub fn skirmish_buff_values(
        &self,
        battle: crate::battle::BattleId,
        now: Timestamp,
    ) -> GameResult<std::collections::HashMap<SkirmishId, f64>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.id, SUM(b.value)
             FROM buffs b JOIN skirmishes s ON s.id = b.skirmish_id
             WHERE s.battle_id = ?1 AND (b.expires IS NULL OR b.expires > ?2)
             GROUP BY s.id",
        )?;
        let rows = stmt.query_map(params![battle, now], |row| {
            Ok((row.get::<_, SkirmishId>(0)?, row.get::<_, f64>(1)?))
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn delete_expired_buffs(&self, now: Timestamp) -> GameResult<usize> {
        Ok(self.conn.execute(
            "DELETE FROM buffs WHERE expires IS NOT NULL AND expires <= ?1",
            [now],
        )?)
    }

    pub fn buff_count(&self) -> GameResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM buffs", [], |row| row.get(0))?)
    }
}
