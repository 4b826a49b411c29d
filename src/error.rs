use serde::Serialize;
use std::fmt;

use crate::topology::{LinkRepair, Section};

pub type BracketResult<T> = Result<T, BracketError>;

/// Conditions that prevent a bracket from being built at all. The engine never
/// lets these escape; they become [`crate::BracketLayout::NoData`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "detail")]
pub enum BracketError {
    /// Zero, or more than one, candidate final in a section after link repair.
    AmbiguousFinal { section: Section, candidates: Vec<String> },
    /// Empty input, or no converging match could be located.
    NoBracketData(String),
    /// Strict repair mode refused to infer a successor for this match.
    RepairRejected { match_id: String, round: u32, expected_position: u32 },
}

impl fmt::Display for BracketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BracketError::AmbiguousFinal { section, candidates } if candidates.is_empty() => {
                write!(f, "No final found in {} bracket", section.label())
            }
            BracketError::AmbiguousFinal { section, candidates } => write!(
                f,
                "Ambiguous final in {} bracket: {}",
                section.label(),
                candidates.join(", ")
            ),
            BracketError::NoBracketData(msg) => write!(f, "No bracket data: {msg}"),
            BracketError::RepairRejected { match_id, round, expected_position } => write!(
                f,
                "Match {match_id} has no link to round {} and no match sits at position {expected_position}",
                round + 1
            ),
        }
    }
}

impl std::error::Error for BracketError {}

/// Data-quality findings that were worked around while building a bracket.
/// Each one is also logged at warn level when it is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Diagnostic {
    /// A second record reused an id; the first one was kept.
    DuplicateId { match_id: String },
    /// Two matches share `(round, position)` in one section; the first seen was kept.
    InvalidBracketPosition { kept: String, discarded: String, round: u32, position: u32 },
    /// Position lies beyond the number of matches the round can hold.
    OutOfRange { match_id: String, round: u32, position: u32, capacity: u32 },
    /// Forward link pointed at a match outside the node set and was cleared.
    DanglingLink { match_id: String, target: String },
    /// A missing forward link was inferred.
    RepairedLink { match_id: String, next_match_id: String, repair: LinkRepair },
    /// No successor round exists; the match stays terminal.
    UnresolvableLink { match_id: String, round: u32 },
    /// More than two matches feed the same match; extras are left out of the tree.
    ExcessFeeder { match_id: String, ignored: String },
    /// More than two grand-final matches; extras are ignored.
    ExtraGrandFinal { match_id: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DuplicateId { match_id } => write!(f, "duplicate match id {match_id}"),
            Diagnostic::InvalidBracketPosition { kept, discarded, round, position } => write!(
                f,
                "matches {kept} and {discarded} both claim round {round} position {position}; keeping {kept}"
            ),
            Diagnostic::OutOfRange { match_id, round, position, capacity } => write!(
                f,
                "match {match_id} at round {round} position {position} exceeds round capacity {capacity}"
            ),
            Diagnostic::DanglingLink { match_id, target } => {
                write!(f, "match {match_id} links to unknown match {target}")
            }
            Diagnostic::RepairedLink { match_id, next_match_id, repair } => write!(
                f,
                "match {match_id} linked to {next_match_id} ({})",
                repair.label()
            ),
            Diagnostic::UnresolvableLink { match_id, round } => write!(
                f,
                "match {match_id} has no successor in round {}",
                round + 1
            ),
            Diagnostic::ExcessFeeder { match_id, ignored } => {
                write!(f, "match {match_id} has more than two feeders; ignoring {ignored}")
            }
            Diagnostic::ExtraGrandFinal { match_id } => {
                write!(f, "ignoring extra grand final {match_id}")
            }
        }
    }
}

/// Record a diagnostic and mirror it to the log.
pub(crate) fn note(diagnostics: &mut Vec<Diagnostic>, diagnostic: Diagnostic) {
    match &diagnostic {
        Diagnostic::RepairedLink { .. } => log::debug!("{diagnostic}"),
        _ => log::warn!("{diagnostic}"),
    }
    diagnostics.push(diagnostic);
}
