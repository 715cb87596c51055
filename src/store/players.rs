use crate::error::{GameError, GameResult};
use crate::geo::RegionId;
use crate::player::{Player, PlayerId};
use crate::store::Tx;
use crate::team::Team;
use crate::time::Timestamp;
use rusqlite::{params, OptionalExtension, Row};

fn player_from_row(row: &Row<'_>) -> rusqlite::Result<Player> {
    Ok(Player {
        id: row.get("id")?,
        name: row.get("name")?,
        team: row.get("team")?,
        loyalists: row.get("loyalists")?,
        committed: row.get("committed")?,
        region: row.get("region_id")?,
        sector: row.get("sector")?,
        leader: row.get("leader")?,
        defectable: row.get("defectable")?,
        recruited: row.get("recruited")?,
    })
}

const PLAYER_COLS: &str =
    "id, name, team, loyalists, committed, region_id, sector, leader, defectable, recruited";

impl Tx<'_> {
    #[allow(clippy::too_many_arguments)]
    pub fn insert_player(
        &self,
        name: &str,
        team: Team,
        loyalists: i64,
        region: RegionId,
        leader: bool,
        recruited: Timestamp,
    ) -> GameResult<Player> {
        self.conn.execute(
            "INSERT INTO players (name, team, loyalists, region_id, leader, recruited)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![name.to_lowercase(), team, loyalists, region, leader, recruited],
        )?;
        self.player_by_id(self.conn.last_insert_rowid())
    }

    pub fn player_by_id(&self, id: PlayerId) -> GameResult<Player> {
        let player = self
            .conn
            .query_row(
                &format!("SELECT {} FROM players WHERE id = ?1", PLAYER_COLS),
                [id],
                player_from_row,
            )
            .optional()?;
        player.ok_or_else(|| GameError::UnknownPlayer(format!("#{}", id)))
    }

    pub fn player_by_name(&self, name: &str) -> GameResult<Option<Player>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {} FROM players WHERE name = ?1", PLAYER_COLS),
                [name.to_lowercase()],
                player_from_row,
            )
            .optional()?)
    }

    pub fn players_in_region(&self, region: RegionId) -> GameResult<Vec<Player>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM players WHERE region_id = ?1 ORDER BY id",
            PLAYER_COLS
        ))?;
        let rows = stmt.query_map([region], player_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Write back every mutable column of the player row.
    pub fn save_player(&self, player: &Player) -> GameResult<()> {
        self.conn.execute(
            "UPDATE players
             SET team = ?2, loyalists = ?3, committed = ?4, region_id = ?5,
                 sector = ?6, leader = ?7, defectable = ?8
             WHERE id = ?1",
            params![
                player.id,
                player.team,
                player.loyalists,
                player.committed,
                player.region,
                player.sector,
                player.leader,
                player.defectable,
            ],
        )?;
        Ok(())
    }

    // Codewords: a per-player vocabulary mapping arbitrary text to canonical
    // troop or region terms.

    pub fn set_codeword(&self, player: PlayerId, code: &str, word: &str) -> GameResult<()> {
        self.conn.execute(
            "INSERT INTO codewords (player_id, code, word) VALUES (?1, ?2, ?3)
             ON CONFLICT (player_id, code) DO UPDATE SET word = excluded.word",
            params![player, code, word],
        )?;
        Ok(())
    }

    pub fn remove_codeword(&self, player: PlayerId, code: &str) -> GameResult<bool> {
        let removed = self.conn.execute(
            "DELETE FROM codewords WHERE player_id = ?1 AND code = ?2",
            params![player, code],
        )?;
        Ok(removed > 0)
    }

    pub fn clear_codewords(&self, player: PlayerId) -> GameResult<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM codewords WHERE player_id = ?1", [player])?)
    }

    pub fn codewords_for(&self, player: PlayerId) -> GameResult<Vec<(String, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT code, word FROM codewords WHERE player_id = ?1 ORDER BY code")?;
        let rows = stmt.query_map([player], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Translate a code in the player's vocabulary; unknown codes come back
    /// unchanged.
    pub fn translate_codeword(&self, player: PlayerId, code: &str) -> GameResult<String> {
        let word: Option<String> = self
            .conn
            .query_row(
                "SELECT word FROM codewords WHERE player_id = ?1 AND code = ?2",
                params![player, code],
                |row| row.get(0),
            )
            .optional()?;
        Ok(word.unwrap_or_else(|| code.to_string()))
    }
}
