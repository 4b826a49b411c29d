pub mod decode;
pub mod wire;

pub use decode::{DecodeError, DecodeResult, decode_matches};

use serde::Serialize;
use std::collections::HashSet;

// ---------------------------------------------------------------------------
// Domain types: clean model, independent of the match-store wire format
// ---------------------------------------------------------------------------

/// Opaque match identifier as handed out by the match store.
pub type MatchId = String;

/// Which sub-bracket a match belongs to. Only meaningful for double elimination;
/// single-elimination stores usually leave every match untagged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BracketGroup {
    Winner,
    Loser,
    GrandFinal,
    #[default]
    None,
}

impl BracketGroup {
    pub fn label(&self) -> &'static str {
        match self {
            BracketGroup::Winner => "Winners",
            BracketGroup::Loser => "Losers",
            BracketGroup::GrandFinal => "Grand Final",
            BracketGroup::None => "Bracket",
        }
    }

    /// Untagged matches count as winner-bracket matches.
    pub fn is_winner_side(&self) -> bool {
        matches!(self, BracketGroup::Winner | BracketGroup::None)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl MatchStatus {
    /// Started or finished.
    pub fn is_underway(&self) -> bool {
        matches!(self, MatchStatus::InProgress | MatchStatus::Completed)
    }
}

/// A participant sitting in one side of a match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SlotOccupant {
    pub id: String,
    pub name: Option<String>, // None when the store only carried the id
}

impl SlotOccupant {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: Some(name.into()) }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// One match as stored upstream. The engine only ever reads these.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub id: MatchId,
    /// 1-based.
    pub round: u32,
    /// 0-based index within the round.
    pub bracket_position: u32,
    pub bracket_group: BracketGroup,
    /// Where the winner advances to.
    pub next_match_id: Option<MatchId>,
    /// Where the loser drops to (double elimination only).
    pub next_loser_match_id: Option<MatchId>,
    pub top: Option<SlotOccupant>,
    pub bottom: Option<SlotOccupant>,
    pub winner_id: Option<String>,
    pub score: Option<(u32, u32)>, // (top_score, bottom_score)
    pub status: MatchStatus,
}

impl MatchRecord {
    /// Occupant for side 0 (top) or 1 (bottom).
    pub fn occupant(&self, side: usize) -> Option<&SlotOccupant> {
        match side {
            0 => self.top.as_ref(),
            1 => self.bottom.as_ref(),
            _ => None,
        }
    }

    pub fn occupied_sides(&self) -> usize {
        usize::from(self.top.is_some()) + usize::from(self.bottom.is_some())
    }

    pub fn occupant_ids(&self) -> impl Iterator<Item = &str> {
        self.top.iter().chain(self.bottom.iter()).map(|o| o.id.as_str())
    }

    pub fn has_occupant(&self, occupant_id: &str) -> bool {
        self.occupant_ids().any(|id| id == occupant_id)
    }

    pub fn score_for(&self, side: usize) -> Option<u32> {
        let (top, bottom) = self.score?;
        match side {
            0 => Some(top),
            1 => Some(bottom),
            _ => None,
        }
    }
}

/// Number of distinct occupant ids across a match set. Used to size a bracket
/// when the caller has no explicit player count.
pub fn distinct_occupants(matches: &[MatchRecord]) -> usize {
    matches
        .iter()
        .flat_map(MatchRecord::occupant_ids)
        .collect::<HashSet<_>>()
        .len()
}
