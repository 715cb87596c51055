use crate::error::{GameError, GameResult};
use crate::geo::{Region, RegionId};
use crate::store::Tx;
use crate::team::Team;
use rusqlite::{params, OptionalExtension, Row};
use std::collections::BTreeSet;

fn region_from_row(row: &Row<'_>) -> rusqlite::Result<Region> {
    Ok(Region {
        id: row.get("id")?,
        name: row.get("name")?,
        srname: row.get("srname")?,
        owner: row.get("owner")?,
        capital: row.get("capital")?,
        eternal: row.get("eternal")?,
        travel_multiplier: row.get("travel_multiplier")?,
    })
}

const REGION_COLS: &str = "id, name, srname, owner, capital, eternal, travel_multiplier";

impl Tx<'_> {
    pub fn insert_region(
        &self,
        name: &str,
        srname: &str,
        owner: Option<Team>,
        capital: Option<Team>,
        eternal: bool,
        travel_multiplier: f64,
    ) -> GameResult<RegionId> {
        self.conn.execute(
            "INSERT INTO regions (name, srname, owner, capital, eternal, travel_multiplier)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![name, srname, owner, capital, eternal, travel_multiplier],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn region_by_id(&self, id: RegionId) -> GameResult<Region> {
        let region = self
            .conn
            .query_row(
                &format!("SELECT {} FROM regions WHERE id = ?1", REGION_COLS),
                [id],
                region_from_row,
            )
            .optional()?;
        region.ok_or_else(|| GameError::UnknownRegion(format!("#{}", id)))
    }

    /// Find a region by canonical name, then alias, then subreddit name.
    pub fn region_by_name(&self, name: &str) -> GameResult<Option<Region>> {
        let key = name.to_lowercase();
        let direct = self
            .conn
            .query_row(
                &format!("SELECT {} FROM regions WHERE name = ?1", REGION_COLS),
                [&key],
                region_from_row,
            )
            .optional()?;
        if direct.is_some() {
            return Ok(direct);
        }

        let via_alias = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM regions
                     WHERE id = (SELECT region_id FROM aliases WHERE name = ?1)",
                    REGION_COLS
                ),
                [&key],
                region_from_row,
            )
            .optional()?;
        if via_alias.is_some() {
            return Ok(via_alias);
        }

        Ok(self
            .conn
            .query_row(
                &format!("SELECT {} FROM regions WHERE srname = ?1", REGION_COLS),
                [&key],
                region_from_row,
            )
            .optional()?)
    }

    pub fn regions_all(&self) -> GameResult<Vec<Region>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM regions ORDER BY id", REGION_COLS))?;
        let rows = stmt.query_map([], region_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn eternal_regions(&self) -> GameResult<Vec<Region>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM regions WHERE eternal = 1 ORDER BY id",
            REGION_COLS
        ))?;
        let rows = stmt.query_map([], region_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn capital_for(&self, team: Team) -> GameResult<Option<Region>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {} FROM regions WHERE capital = ?1", REGION_COLS),
                [team],
                region_from_row,
            )
            .optional()?)
    }

    pub fn set_region_owner(&self, id: RegionId, owner: Option<Team>) -> GameResult<()> {
        self.conn.execute(
            "UPDATE regions SET owner = ?2 WHERE id = ?1",
            params![id, owner],
        )?;
        Ok(())
    }

    /// Insert a bidirectional border; returns false when it already existed.
    pub fn add_border(&self, a: RegionId, b: RegionId) -> GameResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO borders (a, b) VALUES (?1, ?2)",
            params![a, b],
        )?;
        self.conn.execute(
            "INSERT OR IGNORE INTO borders (a, b) VALUES (?1, ?2)",
            params![b, a],
        )?;
        Ok(inserted > 0)
    }

    pub fn borders_of(&self, id: RegionId) -> GameResult<BTreeSet<RegionId>> {
        let mut stmt = self.conn.prepare("SELECT b FROM borders WHERE a = ?1")?;
        let rows = stmt.query_map([id], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn are_adjacent(&self, a: RegionId, b: RegionId) -> GameResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM borders WHERE a = ?1 AND b = ?2",
                params![a, b],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Register an alternate name; returns false when it already existed.
    pub fn add_alias(&self, region: RegionId, name: &str) -> GameResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO aliases (name, region_id) VALUES (?1, ?2)",
            params![name, region],
        )?;
        Ok(inserted > 0)
    }

    pub fn aliases_of(&self, region: RegionId) -> GameResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM aliases WHERE region_id = ?1 ORDER BY name")?;
        let rows = stmt.query_map([region], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }
}
