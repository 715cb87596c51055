use crate::error::GameResult;
use crate::geo::RegionId;
use crate::march::MarchingOrder;
use crate::player::PlayerId;
use crate::store::Tx;
use crate::time::Timestamp;
use rusqlite::{params, Row};

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<MarchingOrder> {
    Ok(MarchingOrder {
        id: row.get("id")?,
        leader: row.get("leader_id")?,
        source: row.get("source_id")?,
        dest: row.get("dest_id")?,
        dest_sector: row.get("dest_sector")?,
        arrival: row.get("arrival")?,
    })
}

const ORDER_COLS: &str = "id, leader_id, source_id, dest_id, dest_sector, arrival";

impl Tx<'_> {
    pub fn insert_march(
        &self,
        leader: PlayerId,
        source: RegionId,
        dest: RegionId,
        dest_sector: i64,
        arrival: Timestamp,
    ) -> GameResult<MarchingOrder> {
        self.conn.execute(
            "INSERT INTO marching_orders (leader_id, source_id, dest_id, dest_sector, arrival)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![leader, source, dest, dest_sector, arrival],
        )?;
        Ok(MarchingOrder {
            id: self.conn.last_insert_rowid(),
            leader,
            source,
            dest,
            dest_sector,
            arrival,
        })
    }

    /// The player's itinerary, soonest hop first. Only the head is
    /// actionable; later hops chain off it.
    pub fn marches_for(&self, leader: PlayerId) -> GameResult<Vec<MarchingOrder>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM marching_orders WHERE leader_id = ?1 ORDER BY arrival, id",
            ORDER_COLS
        ))?;
        let rows = stmt.query_map([leader], order_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn due_marches(&self, now: Timestamp) -> GameResult<Vec<MarchingOrder>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM marching_orders WHERE arrival <= ?1 ORDER BY arrival, id",
            ORDER_COLS
        ))?;
        let rows = stmt.query_map([now], order_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn delete_march(&self, id: i64) -> GameResult<()> {
        self.conn
            .execute("DELETE FROM marching_orders WHERE id = ?1", [id])?;
        Ok(())
    }

    pub fn delete_marches_for(&self, leader: PlayerId) -> GameResult<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM marching_orders WHERE leader_id = ?1", [leader])?)
    }
}
