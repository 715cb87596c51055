use crate::time::Timestamp;
use std::fmt;
use thiserror::Error;

pub type GameResult<T> = Result<T, GameError>;

/// Whether a mistimed action came too early or too late.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingSide {
    Soon,
    Late,
}

impl fmt::Display for TimingSide {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TimingSide::Soon => write!(f, "soon"),
            TimingSide::Late => write!(f, "late"),
        }
    }
}

/// The live operation a command collided with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// A marching order already on the books.
    March { dest: String, arrival: Timestamp },
    /// An open battle in the target region.
    Battle { region: String },
    /// The player's existing root skirmish in this battle.
    RootSkirmish { id: i64 },
    /// The player's existing reaction under this skirmish.
    Reaction { id: i64 },
    /// Any unresolved skirmish, which pins the player in place.
    Fighting { id: i64 },
}

/// Everything that can go wrong while applying a command to the world.
///
/// These are game-rule outcomes, not bugs: the interpreter turns each kind
/// into one user-visible message. Every command runs inside a single store
/// transaction, so returning any of these rolls back all of its effects.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("insufficient {ofwhat}: requested {requested} but only {available} available")]
    Insufficient {
        requested: i64,
        available: i64,
        ofwhat: &'static str,
    },

    #[error("requested {requested} {ofwhat} but the most allowed is {max}")]
    TooMany {
        requested: i64,
        max: i64,
        ofwhat: &'static str,
    },

    #[error("{src} and {dest} are not adjacent")]
    NonAdjacent { src: String, dest: String },

    #[error("must be in {need} but currently in {actually}")]
    NotPresent { need: String, actually: String },

    #[error("conflicting operation already underway")]
    InProgress(Conflict),

    #[error("{what} belongs to the wrong team")]
    Team { what: String, friendly: bool },

    #[error("too {side} for that")]
    Timing {
        side: TimingSide,
        until: Option<Timestamp>,
    },

    #[error("insufficient rank")]
    Rank,

    #[error("{0} is disabled by configuration")]
    Disabled(&'static str),

    #[error("no sector {sector}: sectors run from 0 to {count}")]
    NoSuchSector { sector: i64, count: i64 },

    #[error("that fight is in sector {expected}, not sector {actual}")]
    WrongSector { expected: i64, actual: i64 },

    #[error("no region or subreddit named '{0}'")]
    UnknownRegion(String),

    #[error("no player named '{0}'")]
    UnknownPlayer(String),

    #[error("no route from {src} to {dest}")]
    NoPath { src: String, dest: String },

    #[error("no skirmish #{0} in this battle")]
    UnknownSkirmish(i64),

    #[error("world bootstrap failed: {0}")]
    Bootstrap(String),

    #[error("forum call failed: {0}")]
    HostFailure(String),

    #[error("storage failure: {0}")]
    Store(#[from] rusqlite::Error),
}

impl GameError {
    /// Shorthand for the commonest insufficiency: loyalists.
    pub fn insufficient_loyalists(requested: i64, available: i64) -> Self {
        GameError::Insufficient {
            requested,
            available,
            ofwhat: "loyalists",
        }
    }

    pub fn too_soon(until: Option<Timestamp>) -> Self {
        GameError::Timing {
            side: TimingSide::Soon,
            until,
        }
    }

    pub fn too_late(until: Option<Timestamp>) -> Self {
        GameError::Timing {
            side: TimingSide::Late,
            until,
        }
    }
}
