//! Recursive skirmish scoring. Resolution is a pure computation over a
//! loaded forest, so the whole rulebook is testable without a store.
//!
//! Each node starts out winning unopposed with a margin of its buff-adjusted
//! amount. Children either support the node (same team) or hinder it
//! (opposing team); their margins feed the parent after the troop-type
//! matchup adjustment, and whichever side of the ledger is heavier decides
//! the node's victor. Spearheads bank the victory points of their entire
//! subtree, doubled when nobody lifted a finger to oppose them.

use crate::team::Team;
use crate::unit::{adjusted, TroopType};
use std::cmp::Ordering;
use std::collections::HashMap;

/// The scoring outcome of one skirmish node. Resolution is idempotent: a
/// node that already carries an outcome keeps it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// Winning team; `None` on a dead tie.
    pub victor: Option<Team>,
    /// Surviving force, which is what feeds the parent node.
    pub margin: i64,
    /// Victory points scored here (for spearheads: the whole subtree).
    pub vp: i64,
    /// Whether no effective opposition materialized.
    pub unopposed: bool,
}

/// One skirmish flattened for resolution.
#[derive(Debug, Clone)]
pub struct ResolveNode {
    pub id: i64,
    pub parent: Option<i64>,
    pub team: Team,
    pub amount: i64,
    pub troops: TroopType,
    /// True when this node opposes its parent. Spearheads are attacks and
    /// carry true; the support-margin cap only applies to genuine supports.
    pub hinder: bool,
    /// Sum of buff values on this node.
    pub buff_value: f64,
    pub outcome: Option<Outcome>,
}

impl ResolveNode {
    /// The node's declared force scaled by its buffs.
    pub fn adjusted_amount(&self) -> i64 {
        adjusted(self.amount, 1.0 + self.buff_value)
    }
}

struct Index {
    position: HashMap<i64, usize>,
    children: HashMap<i64, Vec<i64>>,
}

impl Index {
    fn build(nodes: &[ResolveNode]) -> Index {
        let mut position = HashMap::with_capacity(nodes.len());
        let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
        for (i, node) in nodes.iter().enumerate() {
            position.insert(node.id, i);
            if let Some(parent) = node.parent {
                children.entry(parent).or_default().push(node.id);
            }
        }
        Index { position, children }
    }
}

/// Resolve every spearhead in the forest.
pub fn resolve_forest(nodes: &mut [ResolveNode]) {
    let roots: Vec<i64> = nodes
        .iter()
        .filter(|n| n.parent.is_none())
        .map(|n| n.id)
        .collect();
    let index = Index::build(nodes);
    for root in roots {
        resolve_spearhead(nodes, &index, root);
    }
}

/// Resolve one spearhead and its subtree, returning its outcome. Already
/// resolved nodes keep their stored results.
pub fn resolve_root(nodes: &mut [ResolveNode], root: i64) -> Outcome {
    let index = Index::build(nodes);
    resolve_spearhead(nodes, &index, root)
}

fn resolve_spearhead(nodes: &mut [ResolveNode], index: &Index, root: i64) -> Outcome {
    let at = index.position[&root];
    if let Some(existing) = nodes[at].outcome {
        return existing;
    }

    let fought = resolve_node(nodes, index, root);

    // The spearhead banks every point scored in its subtree, both the
    // support it wiped out and the attacks it weathered, then doubles the
    // take if nothing effective ever opposed it.
    let mut vp = subtree_vp(nodes, index, root);
    if fought.unopposed {
        vp = (vp * 2).max(nodes[at].amount * 2);
    }

    let outcome = Outcome { vp, ..fought };
    nodes[at].outcome = Some(outcome);
    outcome
}

fn subtree_vp(nodes: &[ResolveNode], index: &Index, id: i64) -> i64 {
    let own = nodes[index.position[&id]]
        .outcome
        .map(|o| o.vp)
        .unwrap_or_default();
    let kids = index.children.get(&id).into_iter().flatten();
    own + kids
        .map(|kid| subtree_vp(nodes, index, *kid))
        .sum::<i64>()
}

fn resolve_node(nodes: &mut [ResolveNode], index: &Index, id: i64) -> Outcome {
    let at = index.position[&id];
    if let Some(existing) = nodes[at].outcome {
        return existing;
    }

    let own_team = nodes[at].team;
    let own_troops = nodes[at].troops;
    let amount = nodes[at].amount;
    let adjusted_amount = nodes[at].adjusted_amount();

    let mut victor = Some(own_team);
    let mut margin = adjusted_amount;
    let mut vp = 0;
    let mut unopposed = true;

    let kids = index.children.get(&id).cloned().unwrap_or_default();
    if !kids.is_empty() {
        let mut raw_support = amount;
        let mut support = adjusted_amount;
        let mut raw_attack = 0;
        let mut attack = 0;

        for kid in kids {
            let fought = resolve_node(nodes, index, kid);
            let child = &nodes[index.position[&kid]];
            if child.hinder {
                // A beaten-back attack contributes nothing to its side.
                if fought.victor != Some(own_team) {
                    raw_attack += fought.margin;
                    attack += adjusted(fought.margin, child.troops.attack_multiplier(own_troops));
                }
            } else if fought.victor == Some(own_team) {
                raw_support += fought.margin;
                support += adjusted(fought.margin, child.troops.support_multiplier(own_troops));
            }
        }

        unopposed = attack == 0;
        match attack.cmp(&support) {
            Ordering::Greater => {
                victor = Some(own_team.opponent());
                margin = attack - support;
                vp += raw_support;
            }
            Ordering::Less => {
                victor = Some(own_team);
                margin = support - attack;
                vp += raw_attack;
            }
            Ordering::Equal => {
                victor = None;
                margin = 0;
                vp += raw_attack.max(raw_support);
            }
        }

        // Support can never deliver more than it declared, no matter how
        // much help piled up underneath it.
        if !nodes[at].hinder {
            margin = margin.min(adjusted_amount);
        }
    }

    let outcome = Outcome {
        victor,
        margin,
        vp,
        unopposed,
    };
    nodes[at].outcome = Some(outcome);
    outcome
}
