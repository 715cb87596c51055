//! All user-visible text in one place: error messages, status renderings,
//! and battle announcements.

use crate::battle::{Battle, BattleReport, RootSummary};
use crate::config::GameConfig;
use crate::error::{Conflict, GameError, TimingSide};
use crate::player::Player;
use crate::store::Tx;
use crate::team::Team;
use crate::time::{remaining_str, timestr, Timestamp};
use crate::{GameResult, Markdown};
use std::fmt::Write;

/// Greeting for commands from accounts that are not playing.
pub const NOT_PLAYER: &str = "Sorry, I can't help you - first of all, you messaged a bot. \
     Secondly, you don't seem to actually be playing the game I run! If you'd like to change \
     that, comment in the latest recruitment thread.";

/// Convert an engine error into the reply a player sees.
pub fn describe_error(err: &GameError) -> String {
    match err {
        GameError::Insufficient {
            ofwhat: "argument", ..
        } => "You must commit at least 1 loyalist.".to_string(),
        GameError::Insufficient {
            requested,
            available,
            ofwhat,
        } => format!(
            "You cannot send {} {} - you only have {} available.",
            requested, ofwhat, available
        ),
        GameError::TooMany {
            requested, max, ..
        } => format!(
            "You can't pile {} loyalists into this fight - it only calls for {}.",
            requested, max
        ),
        GameError::NonAdjacent { src, dest } => {
            format!("{} is not adjacent to {}!", src, dest)
        }
        GameError::NotPresent { need, actually } => format!(
            "You can't fight here from your current region - the battle is in {} and you are in {}.",
            need, actually
        ),
        GameError::InProgress(conflict) => describe_conflict(conflict),
        GameError::Team { what, friendly } => {
            if *friendly {
                format!("{} is on your side!", what)
            } else {
                format!("You can't aid {} - they fight for the enemy.", what)
            }
        }
        GameError::Timing { side, until } => {
            let when = until.map(timestr);
            match (side, when) {
                (TimingSide::Soon, Some(when)) => {
                    format!("Too soon! Try again at {}.", when)
                }
                (TimingSide::Soon, None) => "Too soon for you to do that!".to_string(),
                (TimingSide::Late, Some(when)) => format!(
                    "Too late - the window closed in the final stretch before {}.",
                    when
                ),
                (TimingSide::Late, None) => "Too late for that now!".to_string(),
            }
        }
        GameError::Rank => "You do not have the rank required to do that!".to_string(),
        GameError::Disabled(what) => format!("Sorry, {} is disabled in this game.", what),
        GameError::NoSuchSector { sector, count } => format!(
            "There is no sector {} - sectors run from 0 to {}.",
            sector,
            count - 1
        ),
        GameError::WrongSector { expected, actual } => format!(
            "That fight is happening in sector {}, but you are in sector {}.",
            expected, actual
        ),
        GameError::UnknownRegion(name) => {
            format!("I don't know any region or subreddit named '{}'.", name)
        }
        GameError::UnknownPlayer(name) => format!("I don't know any player named '{}'.", name),
        GameError::NoPath { src, dest } => {
            format!("Your armies cannot find a route from {} to {}.", src, dest)
        }
        GameError::UnknownSkirmish(id) => {
            format!("There is no skirmish #{} in this battle.", id)
        }
        GameError::Bootstrap(_) | GameError::HostFailure(_) | GameError::Store(_) => {
            "Something went wrong on my end; your command has been rolled back.".to_string()
        }
    }
}

fn describe_conflict(conflict: &Conflict) -> String {
    match conflict {
        Conflict::March { dest, arrival } => format!(
            "You are already leading your armies to {} - you can give further orders upon your \
             arrival at {}.",
            dest,
            timestr(*arrival)
        ),
        Conflict::Battle { region } => format!("{} is already being invaded!", region),
        Conflict::RootSkirmish { id } => format!(
            "You have already spearheaded an attack in this battle (skirmish #{}).",
            id
        ),
        Conflict::Reaction { id } => format!(
            "You have already responded to that skirmish (subskirmish {}).",
            id
        ),
        Conflict::Fighting { id } => format!(
            "Your forces are committed to skirmish #{} - no marching off mid-fight.",
            id
        ),
    }
}

/// Personal status: rank, team, forces, whereabouts.
pub fn personal_status(tx: &Tx<'_>, cfg: &GameConfig, player: &Player) -> GameResult<String> {
    let mut status = format!(
        "You are a {} in the {} army.\n\nYour forces number {} loyalists strong",
        player.rank(),
        cfg.side_label(player.team),
        player.loyalists
    );
    if player.committed > 0 {
        write!(status, ", {} of them committed to battle", player.committed).ok();
    }
    status.push_str(".\n\n");

    let marches = tx.marches_for(player.id)?;
    if let Some(head) = marches.first() {
        let dest = tx.region_by_id(marches.last().unwrap_or(head).dest)?;
        write!(
            status,
            "Your forces are currently on the march to {} and will arrive at {}.",
            dest.markdown(),
            timestr(marches.last().unwrap_or(head).arrival)
        )
        .ok();
        for order in &marches {
            let leg = tx.region_by_id(order.dest)?;
            write!(status, "\n* {} at {}", leg.markdown(), timestr(order.arrival)).ok();
        }
    } else {
        let region = tx.region_by_id(player.region)?;
        write!(status, "You are currently encamped at {}", region.markdown()).ok();
        if cfg.num_sectors > 1 {
            write!(status, ", sector {}", player.sector).ok();
        }
        status.push('.');
    }
    Ok(status)
}

/// World status: every region with its owner, any active battle, and any
/// live buffs with their remaining time.
pub fn lands_status(tx: &Tx<'_>, cfg: &GameConfig, now: Timestamp) -> GameResult<String> {
    let mut table = String::from("Region | Owner | Battle | Buffs\n:--|:--|:--|:--\n");
    let mut regions = tx.regions_all()?;
    regions.sort_by(|a, b| a.name.cmp(&b.name));
    for region in regions {
        let battle = match tx.battle_for_region(region.id)? {
            Some(battle) => match &battle.submission_id {
                Some(submission) => format!(
                    "[battle](/r/{}/comments/{})",
                    region.srname, submission
                ),
                None => format!("battle begins {}", timestr(battle.begins)),
            },
            None => String::new(),
        };
        let buffs = tx
            .region_buffs(region.id, now)?
            .into_iter()
            .map(|buff| match buff.expires {
                Some(expires) => format!("{} ({})", buff.name, remaining_str(expires - now)),
                None => buff.name,
            })
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(
            table,
            "{} | {} | {} | {}",
            region.markdown(),
            cfg.owner_label(region.owner),
            battle,
            buffs
        )
        .ok();
    }
    Ok(table)
}

/// Announcement posted when an invasion is declared; the post becomes the
/// battle thread.
pub fn invasion_announcement(cfg: &GameConfig, team: Team, begins: Timestamp) -> (String, String) {
    let title = format!("[Invasion] The {} armies march!", cfg.side_label(team));
    let body = format!(
        "Negotiations have broken down, and the trumpets of war have sounded. Even now, \
         civilians are being evacuated and the able-bodied drafted. The conflict will soon be \
         upon you.\n\nGather your forces while you can, for your enemy shall arrive at {}",
        timestr(begins)
    );
    (title, body)
}

/// Announcement for a battle the world itself keeps alive.
pub fn eternal_announcement(region_name: &str, begins: Timestamp) -> (String, String) {
    let title = format!("[Battle] The war for {} rages on!", region_name);
    let body = format!(
        "This land knows no peace. The next battle begins at {}",
        timestr(begins)
    );
    (title, body)
}

/// Thread edit applied when a battle opens.
pub fn battle_open_text(battle: &Battle) -> String {
    let ends = battle.display_ends.map(timestr).unwrap_or_default();
    format!(
        "War is now at your doorstep! Mobilize your armies! The battle has begun now, and will \
         end at {}.\n\n> Enter your commands in this thread, prefixed with '>'",
        ends
    )
}

fn skirmish_line(cfg: &GameConfig, root: &RootSummary) -> String {
    let result = match root.outcome.victor {
        Some(team) => format!(
            "victory for Team {} (+{} VP{})",
            cfg.side_label(team),
            root.outcome.vp,
            if root.outcome.unopposed {
                ", unopposed"
            } else {
                ""
            }
        ),
        None => "stalemate".to_string(),
    };
    format!(
        "* Skirmish #{}: {} led {} {} - {}",
        root.id, root.participant, root.amount, root.troops, result
    )
}

/// Final report edited into the battle thread on resolution.
pub fn battle_report_text(cfg: &GameConfig, report: &BattleReport) -> String {
    let mut text = String::from("The battle is complete...\n\n");
    for root in &report.roots {
        text.push_str(&skirmish_line(cfg, root));
        text.push('\n');
    }
    write!(
        text,
        "\n## Final Score:  Team {}: {} Team {}: {}\n",
        cfg.side_label(Team::Orangered),
        report.score[0],
        cfg.side_label(Team::Periwinkle),
        report.score[1]
    )
    .ok();
    match report.victor {
        Some(victor) => {
            write!(text, "\n# The Victor:  Team {}", cfg.side_label(victor)).ok();
        }
        None => {
            text.push_str("\n# TIE");
        }
    }
    text
}

/// Welcome reply for a fresh recruit.
pub fn welcome(tx: &Tx<'_>, cfg: &GameConfig, player: &Player) -> GameResult<String> {
    let capital = tx.region_by_id(player.region)?;
    Ok(format!(
        "Welcome to Chroma! You are now a {} in the {} army, commanding a force of loyalists \
         {} people strong. You are currently encamped at {}",
        player.rank(),
        cfg.side_label(player.team),
        player.loyalists,
        capital.markdown()
    ))
}
