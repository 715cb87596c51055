use crate::geo::RegionId;
use crate::team::Team;
use crate::time::Timestamp;

pub type PlayerId = i64;

/// A combatant. Players are created on first observed participation and
/// never destroyed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    /// Lowercase account name.
    pub name: String,
    pub team: Team,
    /// Total personal force.
    pub loyalists: i64,
    /// Loyalists locked into unresolved skirmishes; never exceeds
    /// `loyalists`.
    pub committed: i64,
    /// Record-keeping region; while marching this stays the origin until
    /// each hop lands.
    pub region: RegionId,
    pub sector: i64,
    /// Leaders may invade and promote or demote others.
    pub leader: bool,
    /// Cleared by the player's first meaningful act each life; gates
    /// defection.
    pub defectable: bool,
    pub recruited: Timestamp,
}

impl Player {
    pub fn rank(&self) -> &'static str {
        if self.leader {
            "general"
        } else {
            "captain"
        }
    }

    /// Loyalists not yet committed to a skirmish.
    pub fn free_loyalists(&self) -> i64 {
        self.loyalists - self.committed
    }
}

/// Decode an external account id (base 36, lowercase) for team assignment.
pub fn base36_decode(id: &str) -> Option<u64> {
    let mut value: u64 = 0;
    for c in id.trim().chars() {
        let digit = c.to_ascii_lowercase().to_digit(36)?;
        value = value.wrapping_mul(36).wrapping_add(digit as u64);
    }
    if id.is_empty() {
        None
    } else {
        Some(value)
    }
}
