//! The seam between the engine and the forum driver. The driver observes
//! recruitment posts, the inbox, and battle threads, and feeds the engine
//! [`CommandEvent`]s; the engine answers through the [`Host`] trait.
//!
//! Host calls are best-effort: the engine logs failures and carries on,
//! except for the spearhead confirmation, whose failure rolls the skirmish
//! back (see the interpreter).

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct HostError(pub String);

/// Where a command event came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// A private message to the bot.
    PrivateMessage { message_id: String },
    /// A comment inside a battle thread. Replies to the bot's own
    /// confirmation comments arrive this way too, distinguished by their
    /// parent comment.
    BattleThread {
        submission_id: String,
        comment_id: String,
        /// Absent when the comment replies to the thread itself.
        parent_comment_id: Option<String>,
        /// Body of the parent comment, used to work out which skirmish a
        /// reply addresses.
        parent_body: Option<String>,
    },
}

impl Origin {
    /// The external message id, which doubles as the idempotence key.
    pub fn message_id(&self) -> &str {
        match self {
            Origin::PrivateMessage { message_id } => message_id,
            Origin::BattleThread { comment_id, .. } => comment_id,
        }
    }
}

/// One command observed by the forum driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEvent {
    /// Account name of the author.
    pub author: String,
    /// External account id (base 36), when the driver knows it; feeds the
    /// `uid` team-assignment policy.
    pub author_id: Option<String>,
    /// Raw body text; the engine extracts the quoted command line itself.
    pub body: String,
    pub origin: Origin,
}

/// Forum operations the engine can request.
pub trait Host {
    /// Reply to the message or comment behind `origin`; returns the id of
    /// the new comment.
    fn reply(&mut self, origin: &Origin, body: &str) -> Result<String, HostError>;

    /// Create a new thread; returns its submission id.
    fn submit_post(&mut self, subreddit: &str, title: &str, body: &str)
        -> Result<String, HostError>;

    fn edit_post(&mut self, submission_id: &str, body: &str) -> Result<(), HostError>;

    fn send_pm(&mut self, user: &str, subject: &str, body: &str) -> Result<(), HostError>;
}
