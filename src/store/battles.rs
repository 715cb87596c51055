use crate::battle::{Battle, BattleId, SkirmishAction, SkirmishId};
use crate::error::{GameError, GameResult};
use crate::geo::RegionId;
use crate::player::PlayerId;
use crate::store::Tx;
use crate::team::Team;
use crate::time::Timestamp;
use rusqlite::{params, OptionalExtension, Row};

fn battle_from_row(row: &Row<'_>) -> rusqlite::Result<Battle> {
    Ok(Battle {
        id: row.get("id")?,
        region: row.get("region_id")?,
        begins: row.get("begins")?,
        display_ends: row.get("display_ends")?,
        ends: row.get("ends")?,
        submission_id: row.get("submission_id")?,
        lockout: row.get("lockout")?,
        score0: row.get("score0")?,
        score1: row.get("score1")?,
        victor: row.get("victor")?,
    })
}

const BATTLE_COLS: &str =
    "id, region_id, begins, display_ends, ends, submission_id, lockout, score0, score1, victor";

fn skirmish_from_row(row: &Row<'_>) -> rusqlite::Result<SkirmishAction> {
    Ok(SkirmishAction {
        id: row.get("id")?,
        battle: row.get("battle_id")?,
        parent: row.get("parent_id")?,
        participant: row.get("player_id")?,
        team: row.get("team")?,
        amount: row.get("amount")?,
        troops: row.get("troops")?,
        hinder: row.get("hinder")?,
        sector: row.get("sector")?,
        ends: row.get("ends")?,
        display_ends: row.get("display_ends")?,
        comment_id: row.get("comment_id")?,
        resolved: row.get("resolved")?,
        victor: row.get("victor")?,
        margin: row.get("margin")?,
        vp: row.get("vp")?,
        unopposed: row.get("unopposed")?,
    })
}

const SKIRMISH_COLS: &str = "id, battle_id, parent_id, player_id, team, amount, troops, hinder, \
     sector, ends, display_ends, comment_id, resolved, victor, margin, vp, unopposed";

impl Tx<'_> {
    pub fn insert_battle(
        &self,
        region: RegionId,
        begins: Timestamp,
        lockout: i64,
    ) -> GameResult<Battle> {
        self.conn.execute(
            "INSERT INTO battles (region_id, begins, lockout) VALUES (?1, ?2, ?3)",
            params![region, begins, lockout],
        )?;
        self.battle_by_id(self.conn.last_insert_rowid())
    }

    pub fn battle_by_id(&self, id: BattleId) -> GameResult<Battle> {
        let battle = self
            .conn
            .query_row(
                &format!("SELECT {} FROM battles WHERE id = ?1", BATTLE_COLS),
                [id],
                battle_from_row,
            )
            .optional()?;
        battle.ok_or(GameError::Store(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn battle_for_region(&self, region: RegionId) -> GameResult<Option<Battle>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {} FROM battles WHERE region_id = ?1", BATTLE_COLS),
                [region],
                battle_from_row,
            )
            .optional()?)
    }

    pub fn battle_by_submission(&self, submission_id: &str) -> GameResult<Option<Battle>> {
        Ok(self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM battles WHERE submission_id = ?1",
                    BATTLE_COLS
                ),
                [submission_id],
                battle_from_row,
            )
            .optional()?)
    }

    pub fn battles_all(&self) -> GameResult<Vec<Battle>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM battles ORDER BY id", BATTLE_COLS))?;
        let rows = stmt.query_map([], battle_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn set_battle_submission(&self, id: BattleId, submission_id: &str) -> GameResult<()> {
        self.conn.execute(
            "UPDATE battles SET submission_id = ?2 WHERE id = ?1",
            params![id, submission_id],
        )?;
        Ok(())
    }

    pub fn set_battle_times(
        &self,
        id: BattleId,
        display_ends: Timestamp,
        ends: Timestamp,
    ) -> GameResult<()> {
        self.conn.execute(
            "UPDATE battles SET display_ends = ?2, ends = ?3 WHERE id = ?1",
            params![id, display_ends, ends],
        )?;
        Ok(())
    }

    pub fn set_battle_outcome(
        &self,
        id: BattleId,
        score0: i64,
        score1: i64,
        victor: Option<Team>,
    ) -> GameResult<()> {
        self.conn.execute(
            "UPDATE battles SET score0 = ?2, score1 = ?3, victor = ?4 WHERE id = ?1",
            params![id, score0, score1, victor],
        )?;
        Ok(())
    }

    /// Deletes the battle and, by cascade, its skirmishes, their buffs, and
    /// its processed-message markers.
    pub fn delete_battle(&self, id: BattleId) -> GameResult<()> {
        self.conn.execute("DELETE FROM battles WHERE id = ?1", [id])?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn insert_skirmish(&self, action: &SkirmishAction) -> GameResult<SkirmishAction> {
        self.conn.execute(
            "INSERT INTO skirmishes (battle_id, parent_id, player_id, team, amount, troops,
                                     hinder, sector, ends, display_ends, comment_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                action.battle,
                action.parent,
                action.participant,
                action.team,
                action.amount,
                action.troops,
                action.hinder,
                action.sector,
                action.ends,
                action.display_ends,
                action.comment_id,
            ],
        )?;
        let mut inserted = action.clone();
        inserted.id = self.conn.last_insert_rowid();
        Ok(inserted)
    }

    pub fn skirmish_by_id(&self, id: SkirmishId) -> GameResult<Option<SkirmishAction>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {} FROM skirmishes WHERE id = ?1", SKIRMISH_COLS),
                [id],
                skirmish_from_row,
            )
            .optional()?)
    }

    pub fn skirmish_by_comment(
        &self,
        battle: BattleId,
        comment_id: &str,
    ) -> GameResult<Option<SkirmishAction>> {
        Ok(self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM skirmishes WHERE battle_id = ?1 AND comment_id = ?2",
                    SKIRMISH_COLS
                ),
                params![battle, comment_id],
                skirmish_from_row,
            )
            .optional()?)
    }

    /// The whole skirmish forest of a battle, roots and reactions alike.
    pub fn skirmishes_for_battle(&self, battle: BattleId) -> GameResult<Vec<SkirmishAction>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM skirmishes WHERE battle_id = ?1 ORDER BY id",
            SKIRMISH_COLS
        ))?;
        let rows = stmt.query_map([battle], skirmish_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// The player's root skirmish in this battle, resolved or not; an
    /// expired spearhead still blocks a second one.
    pub fn root_skirmish_for(
        &self,
        battle: BattleId,
        player: PlayerId,
    ) -> GameResult<Option<SkirmishAction>> {
        Ok(self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM skirmishes
                     WHERE battle_id = ?1 AND player_id = ?2 AND parent_id IS NULL",
                    SKIRMISH_COLS
                ),
                params![battle, player],
                skirmish_from_row,
            )
            .optional()?)
    }

    pub fn child_skirmish_for(
        &self,
        parent: SkirmishId,
        player: PlayerId,
    ) -> GameResult<Option<SkirmishAction>> {
        Ok(self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM skirmishes WHERE parent_id = ?1 AND player_id = ?2",
                    SKIRMISH_COLS
                ),
                params![parent, player],
                skirmish_from_row,
            )
            .optional()?)
    }

    /// Unresolved skirmishes pin a player in place and block movement.
    pub fn open_skirmishes_for(&self, player: PlayerId) -> GameResult<Vec<SkirmishAction>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM skirmishes WHERE player_id = ?1 AND resolved = 0 ORDER BY id",
            SKIRMISH_COLS
        ))?;
        let rows = stmt.query_map([player], skirmish_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// How many actions the player has already taken in this battle.
    pub fn skirmish_action_count(&self, battle: BattleId, player: PlayerId) -> GameResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM skirmishes WHERE battle_id = ?1 AND player_id = ?2",
            params![battle, player],
            |row| row.get(0),
        )?)
    }

    /// Root skirmishes whose hidden end time has passed.
    pub fn due_skirmishes(&self, now: Timestamp) -> GameResult<Vec<SkirmishAction>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM skirmishes
             WHERE parent_id IS NULL AND resolved = 0 AND ends IS NOT NULL AND ends < ?1
             ORDER BY id",
            SKIRMISH_COLS
        ))?;
        let rows = stmt.query_map([now], skirmish_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn save_skirmish_outcome(&self, action: &SkirmishAction) -> GameResult<()> {
        self.conn.execute(
            "UPDATE skirmishes
             SET resolved = ?2, victor = ?3, margin = ?4, vp = ?5, unopposed = ?6
             WHERE id = ?1",
            params![
                action.id,
                action.resolved,
                action.victor,
                action.margin,
                action.vp,
                action.unopposed,
            ],
        )?;
        Ok(())
    }

    pub fn delete_skirmish(&self, id: SkirmishId) -> GameResult<()> {
        self.conn
            .execute("DELETE FROM skirmishes WHERE id = ?1", [id])?;
        Ok(())
    }

    // Processed-message markers: idempotence keys for forum events.

    /// Record a handled message; returns false when it was already marked.
    pub fn mark_processed(&self, battle: BattleId, message_id: &str) -> GameResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO processed (battle_id, message_id) VALUES (?1, ?2)",
            params![battle, message_id],
        )?;
        Ok(inserted > 0)
    }

    pub fn is_processed(&self, battle: BattleId, message_id: &str) -> GameResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM processed WHERE battle_id = ?1 AND message_id = ?2",
                params![battle, message_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }
}
