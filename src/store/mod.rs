//! Persistent world store. All game state lives in a single SQLite database;
//! every command and tick phase runs inside one transaction so an error
//! rolls back all of its effects.

use crate::error::{GameError, GameResult};
use rusqlite::Connection;
use std::path::Path;

mod battles;
mod buffs;
mod marches;
mod players;
mod regions;
mod schema;

pub use self::buffs::{Buff, BuffSpec, BuffTarget};

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: impl AsRef<Path>) -> GameResult<Store> {
        Store::from_connection(Connection::open(path)?)
    }

    /// Fresh throwaway database, used by tests and the bootstrap tooling.
    pub fn in_memory() -> GameResult<Store> {
        Store::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> GameResult<Store> {
        conn.pragma_update(None, "foreign_keys", true)?;
        schema::create_all(&conn)?;
        Ok(Store { conn })
    }

    /// Run `work` inside a transaction. Returning any error rolls back every
    /// mutation the closure attempted.
    pub fn transaction<T>(
        &mut self,
        work: impl FnOnce(&Tx<'_>) -> GameResult<T>,
    ) -> GameResult<T> {
        let tx = self.conn.transaction().map_err(GameError::from)?;
        let result = work(&Tx { conn: &tx });
        match result {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                // Surface the original failure even if rollback also fails.
                let _ = tx.rollback();
                Err(err)
            }
        }
    }

    /// Snapshot read for reporters and status endpoints.
    pub fn read<T>(&self, work: impl FnOnce(&Tx<'_>) -> GameResult<T>) -> GameResult<T> {
        work(&Tx { conn: &self.conn })
    }
}

/// A transactional view of the store. Entity queries hang off this type,
/// grouped by entity in the sibling modules.
pub struct Tx<'a> {
    pub(crate) conn: &'a Connection,
}
