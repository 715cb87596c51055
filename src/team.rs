use crate::parser::{Error, ErrorKind};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the two factions contesting the map. Teams are numbered 0 and 1 in
/// storage and wire formats; display labels can be overridden in config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Team {
    Orangered,
    Periwinkle,
}

impl Team {
    pub const BOTH: [Team; 2] = [Team::Orangered, Team::Periwinkle];

    /// Gets the storage index of the team.
    pub fn index(self) -> usize {
        match self {
            Team::Orangered => 0,
            Team::Periwinkle => 1,
        }
    }

    pub fn from_index(idx: i64) -> Option<Team> {
        match idx {
            0 => Some(Team::Orangered),
            1 => Some(Team::Periwinkle),
            _ => None,
        }
    }

    /// The other faction.
    pub fn opponent(self) -> Team {
        match self {
            Team::Orangered => Team::Periwinkle,
            Team::Periwinkle => Team::Orangered,
        }
    }

    /// Default display name, before any config relabelling.
    pub fn name(self) -> &'static str {
        match self {
            Team::Orangered => "Orangered",
            Team::Periwinkle => "Periwinkle",
        }
    }
}

/// Display label for a region owner, where `None` means unclaimed land.
pub fn owner_name(owner: Option<Team>) -> &'static str {
    owner.map(Team::name).unwrap_or("Neutral")
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Team {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match &s.to_lowercase()[..] {
            "orangered" | "0" => Ok(Team::Orangered),
            "periwinkle" | "1" => Ok(Team::Periwinkle),
            _ => Err(Error::new(ErrorKind::BadTeam, s)),
        }
    }
}

impl ToSql for Team {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.index() as i64))
    }
}

impl FromSql for Team {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let idx = i64::column_result(value)?;
        Team::from_index(idx).ok_or(FromSqlError::OutOfRange(idx))
    }
}
