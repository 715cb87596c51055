use crate::parser::{Error, ErrorKind};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use std::fmt;
use std::str::FromStr;

/// The class of troops committed to a skirmish. Each class is strong against
/// one other class and weak against the third, with separate rings for
/// attacking and supporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TroopType {
    Infantry,
    Cavalry,
    Ranged,
}

/// Matchup ring for hindering children: versus a defender of type T, the type
/// one position left of T scores x0.5 and one position right scores x1.5.
const ATTACK_RING: [TroopType; 3] = [TroopType::Ranged, TroopType::Infantry, TroopType::Cavalry];

/// Matchup ring for supporting children; deliberately the reverse of the
/// attack ring so no class is universally best.
const SUPPORT_RING: [TroopType; 3] = [TroopType::Cavalry, TroopType::Infantry, TroopType::Ranged];

fn ring_multiplier(ring: &[TroopType; 3], child: TroopType, defender: TroopType) -> f64 {
    let at = ring
        .iter()
        .position(|t| *t == defender)
        .expect("every troop type is in the ring");
    if child == ring[(at + 2) % 3] {
        0.5
    } else if child == ring[(at + 1) % 3] {
        1.5
    } else {
        1.0
    }
}

impl TroopType {
    pub fn name(self) -> &'static str {
        match self {
            TroopType::Infantry => "infantry",
            TroopType::Cavalry => "cavalry",
            TroopType::Ranged => "ranged",
        }
    }

    /// Parses a troop word if it names a type; unlike `FromStr` this is for
    /// callers that fall back to infantry rather than failing.
    pub fn from_word(word: &str) -> Option<TroopType> {
        TroopType::from_str(word).ok()
    }

    /// The effectiveness multiplier this type earns when hindering a
    /// skirmish whose own troops are `defender`.
    pub fn attack_multiplier(self, defender: TroopType) -> f64 {
        ring_multiplier(&ATTACK_RING, self, defender)
    }

    /// The effectiveness multiplier this type earns when supporting a
    /// skirmish whose own troops are `defender`.
    pub fn support_multiplier(self, defender: TroopType) -> f64 {
        ring_multiplier(&SUPPORT_RING, self, defender)
    }
}

/// Scale `amount` by a matchup or buff multiplier, truncating down; partial
/// soldiers never count.
pub fn adjusted(amount: i64, multiplier: f64) -> i64 {
    (amount as f64 * multiplier) as i64
}

impl fmt::Display for TroopType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for TroopType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match &s.to_lowercase()[..] {
            "infantry" => Ok(TroopType::Infantry),
            "cavalry" | "calvary" | "calvalry" => Ok(TroopType::Cavalry),
            "ranged" | "range" => Ok(TroopType::Ranged),
            _ => Err(Error::new(ErrorKind::BadTroopType, s)),
        }
    }
}

impl ToSql for TroopType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.name()))
    }
}

impl FromSql for TroopType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = String::column_result(value)?;
        TroopType::from_str(&text).map_err(|_| FromSqlError::InvalidType)
    }
}
