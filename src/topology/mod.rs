//! Reconstructs bracket trees from flat match records.
//!
//! Records only point forward (`next_match_id`). The builder normalizes and
//! repairs those links, then inverts them once into an explicit predecessor
//! list per node so the layout can walk backward from a final without
//! rescanning the match set.

mod double;
mod links;
mod single;

pub use double::{Converger, DoubleTopology, find_converger};
pub use links::{LinkOrigin, LinkRepair, RepairPolicy};
pub use single::SingleTopology;

use bracket_records::{BracketGroup, MatchRecord};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::error::{BracketResult, Diagnostic, note};
use crate::participants::{ParticipantSlot, resolve_slots};
use crate::sizer::SizingPolicy;
use crate::style::{BracketMode, EngineOptions};
use links::Draft;

/// Resolved sub-bracket of a node. Ordering is the vertical stacking order of
/// the sections and decides which feeder of a converging match comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    Winners,
    Losers,
    GrandFinal,
}

impl Section {
    pub fn label(&self) -> &'static str {
        match self {
            Section::Winners => "Winners",
            Section::Losers => "Losers",
            Section::GrandFinal => "Grand Final",
        }
    }

    /// Double-elimination placement of a record. Untagged records join the winners.
    pub fn of_group(group: BracketGroup) -> Self {
        match group {
            BracketGroup::Winner | BracketGroup::None => Section::Winners,
            BracketGroup::Loser => Section::Losers,
            BracketGroup::GrandFinal => Section::GrandFinal,
        }
    }
}

/// A match record with everything the layout needs resolved around it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketNode<'a> {
    pub record: &'a MatchRecord,
    pub section: Section,
    pub slots: [ParticipantSlot; 2],
    /// Up to two feeders, top first.
    pub predecessors: Vec<String>,
    /// Either `None` (a terminal) or an id present in the same node set.
    pub next_match_id: Option<String>,
    pub next_loser_match_id: Option<String>,
    /// Provenance of `next_match_id`; `None` exactly when it is `None`.
    pub link: Option<LinkOrigin>,
}

impl BracketNode<'_> {
    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn round(&self) -> u32 {
        self.record.round
    }

    pub fn is_terminal(&self) -> bool {
        self.next_match_id.is_none()
    }

    /// Predecessor feeding the top slot, if any.
    pub fn top_feeder(&self) -> Option<&str> {
        self.predecessors.first().map(String::as_str)
    }

    /// Predecessor feeding the bottom slot, if any.
    pub fn bottom_feeder(&self) -> Option<&str> {
        self.predecessors.get(1).map(String::as_str)
    }
}

/// All nodes of one build, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct NodeSet<'a> {
    nodes: Vec<BracketNode<'a>>,
    index: HashMap<String, usize>,
}

impl<'a> NodeSet<'a> {
    pub fn get(&self, id: &str) -> Option<&BracketNode<'a>> {
        self.index.get(id).map(|&idx| &self.nodes[idx])
    }

    /// Nodes in `(section, round, position)` order.
    pub fn iter(&self) -> impl Iterator<Item = &BracketNode<'a>> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn predecessors(&self, id: &str) -> &[String] {
        self.get(id).map_or(&[], |n| n.predecessors.as_slice())
    }

    /// Hand out owned nodes keyed by id, consuming the set.
    pub fn into_map(self) -> HashMap<String, BracketNode<'a>> {
        self.nodes.into_iter().map(|n| (n.record.id.clone(), n)).collect()
    }
}

/// Inputs to the topology builder besides the records and the mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TopologyOptions {
    pub player_count: Option<i64>,
    pub sizing: SizingPolicy,
    pub repair: RepairPolicy,
}

impl From<&EngineOptions> for TopologyOptions {
    fn from(options: &EngineOptions) -> Self {
        Self { player_count: options.player_count, sizing: options.sizing, repair: options.repair }
    }
}

#[derive(Debug, Clone)]
pub enum TopologyResult<'a> {
    Single(SingleTopology<'a>),
    Double(DoubleTopology<'a>),
}

impl<'a> TopologyResult<'a> {
    pub fn nodes(&self) -> &NodeSet<'a> {
        match self {
            TopologyResult::Single(t) => &t.nodes,
            TopologyResult::Double(t) => &t.nodes,
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            TopologyResult::Single(t) => &t.diagnostics,
            TopologyResult::Double(t) => &t.diagnostics,
        }
    }
}

/// Build the bracket tree(s) for `matches`.
///
/// Errors mean no bracket can be shown (empty input, ambiguous final, no
/// converging match, or a strict-mode repair refusal). Data-quality problems
/// that could be worked around are returned as diagnostics instead.
pub fn build_topology<'a>(
    matches: &'a [MatchRecord],
    mode: BracketMode,
    options: &TopologyOptions,
) -> BracketResult<TopologyResult<'a>> {
    match mode {
        BracketMode::Single => single::build(matches, options).map(TopologyResult::Single),
        BracketMode::Double => double::build(matches, options).map(TopologyResult::Double),
    }
}

/// Turn repaired drafts into nodes, inverting forward links into predecessor
/// lists. Feeders must share the target's section unless the target is listed
/// in `cross_section_targets` (the converging match).
fn assemble<'a>(
    drafts: Vec<Draft<'a>>,
    cross_section_targets: &HashSet<&str>,
    diagnostics: &mut Vec<Diagnostic>,
) -> NodeSet<'a> {
    let index: HashMap<String, usize> = drafts
        .iter()
        .enumerate()
        .map(|(idx, d)| (d.record.id.clone(), idx))
        .collect();

    // Drafts are sorted by (section, round, position), which is also the
    // top-to-bottom order of feeders.
    let mut feeders: Vec<Vec<usize>> = vec![Vec::new(); drafts.len()];
    for (idx, draft) in drafts.iter().enumerate() {
        let Some(&target) = draft.next.as_ref().and_then(|next| index.get(next)) else {
            continue;
        };
        let target_draft = &drafts[target];
        if draft.section != target_draft.section && !cross_section_targets.contains(target_draft.id()) {
            log::debug!(
                "not drawing {} -> {}: crosses from {} into {}",
                draft.id(),
                target_draft.id(),
                draft.section.label(),
                target_draft.section.label()
            );
            continue;
        }
        if feeders[target].len() == 2 {
            note(
                diagnostics,
                Diagnostic::ExcessFeeder {
                    match_id: target_draft.record.id.clone(),
                    ignored: draft.record.id.clone(),
                },
            );
            continue;
        }
        feeders[target].push(idx);
    }

    let nodes: Vec<BracketNode<'a>> = drafts
        .iter()
        .zip(&feeders)
        .map(|(draft, fed_by)| BracketNode {
            record: draft.record,
            section: draft.section,
            slots: resolve_slots(draft.record),
            predecessors: fed_by.iter().map(|&i| drafts[i].record.id.clone()).collect(),
            next_match_id: draft.next.clone(),
            next_loser_match_id: draft.next_loser.clone(),
            link: draft.link,
        })
        .collect();

    NodeSet { nodes, index }
}
