use crate::team::Team;
use crate::Markdown;

pub type RegionId = i64;

/// A node on the world graph. Regions may be owned by a team or neutral; a
/// team's capital is always owned by that team.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub id: RegionId,
    /// Canonical lowercase name, unique across names and aliases.
    pub name: String,
    /// The subreddit hosting this region's battle threads.
    pub srname: String,
    pub owner: Option<Team>,
    pub capital: Option<Team>,
    /// Eternal regions always carry an active battle.
    pub eternal: bool,
    /// Travel-time scale for marching into this region; never below 1.
    pub travel_multiplier: f64,
}

impl Region {
    /// Whether a member of `team` may enter this region. A region under an
    /// active battle is open to both sides; neutral ground is passable only
    /// under the `traverse_neutrals` policy.
    pub fn enterable_by(&self, team: Team, embattled: bool, traverse_neutrals: bool) -> bool {
        match self.owner {
            Some(owner) => owner == team || embattled,
            None => embattled || traverse_neutrals,
        }
    }
}

impl Markdown for Region {
    fn markdown(&self) -> String {
        format!("[{}](/r/{})", self.name, self.srname)
    }
}
