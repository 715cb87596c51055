//! The model for a command issued by a player. Commands are parsed from the
//! token grammar in [`crate::parser`] and dispatched by the interpreter; they
//! carry names rather than resolved entities, since resolution depends on the
//! world state at execution time.

use crate::team::Team;
use from_variants::FromVariants;
use std::fmt;

/// A parsed player command.
#[derive(Debug, Clone, PartialEq, Eq, FromVariants)]
pub enum Command {
    /// Personal status: rank, team, forces, whereabouts.
    Status,
    /// World status: region owners, battles, buffs.
    Lands,
    Lead(LeadOrder),
    Invade(InvadeOrder),
    Skirmish(SkirmishOrder),
    Defect(DefectOrder),
    Rank(RankOrder),
    Codeword(CodewordOrder),
    /// Emergency evacuation to the team capital.
    Extract,
    /// Cancel all pending marching orders.
    Stop,
    /// Echo the current server time.
    Time,
}

/// One stop on a movement itinerary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// A named region, optionally with a target sector.
    Region { name: String, sector: Option<i64> },
    /// A sector change within whatever region precedes this stop.
    Sector(i64),
    /// "*": ask the pathfinder to fill in the route to the next named stop.
    Wildcard,
}

/// `lead (NUM|all)? to DEST, DEST, ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadOrder {
    /// How many loyalists to lead; -1 means all of them.
    pub amount: i64,
    pub path: Vec<Destination>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvadeOrder {
    pub region: String,
}

/// Whether a skirmish action aids or hinders its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkirmishVerb {
    Attack,
    Support,
}

/// `(attack|oppose|support) [#N] with NUM [type]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkirmishOrder {
    pub verb: SkirmishVerb,
    /// Explicit target skirmish id; otherwise the target is inferred from
    /// the comment the command replied to.
    pub target: Option<i64>,
    pub amount: i64,
    /// Raw troop word as written; codeword translation happens at execution.
    pub troops: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefectOrder {
    /// Destination team; defaults to the opposing team when omitted.
    pub team: Option<Team>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankOrder {
    Promote(String),
    Demote(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodewordOrder {
    /// `codeword "CODE" is (TROOP|"WORD")`
    Add { code: String, word: String },
    Remove(String),
    RemoveAll,
    Status(Option<String>),
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Destination::Region { name, sector: None } => write!(f, "{}", name),
            Destination::Region {
                name,
                sector: Some(s),
            } => write!(f, "{}#{}", name, s),
            Destination::Sector(s) => write!(f, "#{}", s),
            Destination::Wildcard => write!(f, "*"),
        }
    }
}

impl fmt::Display for Command {
    /// Write the canonical form of the command, mostly for logs.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Command::Status => write!(f, "status"),
            Command::Lands => write!(f, "lands"),
            Command::Lead(lead) => {
                write!(f, "lead ")?;
                if lead.amount < 0 {
                    write!(f, "all")?;
                } else {
                    write!(f, "{}", lead.amount)?;
                }
                write!(f, " to ")?;
                for (i, dest) in lead.path.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", dest)?;
                }
                Ok(())
            }
            Command::Invade(inv) => write!(f, "invade {}", inv.region),
            Command::Skirmish(sk) => {
                match sk.verb {
                    SkirmishVerb::Attack => write!(f, "attack")?,
                    SkirmishVerb::Support => write!(f, "support")?,
                }
                if let Some(target) = sk.target {
                    write!(f, " #{}", target)?;
                }
                write!(f, " with {}", sk.amount)?;
                if let Some(troops) = &sk.troops {
                    write!(f, " {}", troops)?;
                }
                Ok(())
            }
            Command::Defect(d) => match d.team {
                Some(team) => write!(f, "defect to {}", team.name().to_lowercase()),
                None => write!(f, "defect"),
            },
            Command::Rank(RankOrder::Promote(name)) => write!(f, "promote {}", name),
            Command::Rank(RankOrder::Demote(name)) => write!(f, "demote {}", name),
            Command::Codeword(cw) => match cw {
                CodewordOrder::Add { code, word } => {
                    write!(f, "codeword \"{}\" is \"{}\"", code, word)
                }
                CodewordOrder::Remove(code) => write!(f, "codeword remove \"{}\"", code),
                CodewordOrder::RemoveAll => write!(f, "codeword remove all"),
                CodewordOrder::Status(None) => write!(f, "codeword status"),
                CodewordOrder::Status(Some(code)) => write!(f, "codeword status \"{}\"", code),
            },
            Command::Extract => write!(f, "extract"),
            Command::Stop => write!(f, "stop"),
            Command::Time => write!(f, "time"),
        }
    }
}
