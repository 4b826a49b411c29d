use crate::wire::{MatchesPayload, WireId, WireMatch, WirePlayer};
use crate::{BracketGroup, MatchRecord, MatchStatus, SlotOccupant};
use log::warn;
use std::fmt;

pub type DecodeResult<T> = Result<T, DecodeError>;

#[derive(Debug)]
pub enum DecodeError {
    Parsing(serde_json::Error),
    Invalid(String),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Parsing(e) => write!(f, "Parse error: {e}"),
            DecodeError::Invalid(msg) => write!(f, "Invalid match set: {msg}"),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Parsing(e) => Some(e),
            DecodeError::Invalid(_) => None,
        }
    }
}

/// Decode a match-store JSON export into domain records.
///
/// Accepts either a bare array of matches or `{ "matches": [...] }`. Records
/// without an id or with a round below 1 cannot be placed anywhere in a bracket;
/// they are skipped with a warning rather than failing the whole set.
pub fn decode_matches(json: &str) -> DecodeResult<Vec<MatchRecord>> {
    let payload: MatchesPayload = serde_json::from_str(json).map_err(DecodeError::Parsing)?;
    let wire = payload.into_matches();
    let total = wire.len();

    let records: Vec<MatchRecord> = wire
        .into_iter()
        .enumerate()
        .filter_map(|(idx, m)| match map_match(m) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("skipping match #{idx}: {e}");
                None
            }
        })
        .collect();

    if total > 0 && records.is_empty() {
        return Err(DecodeError::Invalid(format!("none of the {total} matches could be decoded")));
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// Mapping: wire types → clean domain types
// ---------------------------------------------------------------------------

fn map_match(m: WireMatch) -> DecodeResult<MatchRecord> {
    let id = m
        .id
        .map(|id| id.into_string())
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| DecodeError::Invalid("missing id".into()))?;

    let round = m
        .round
        .and_then(|r| u32::try_from(r).ok())
        .filter(|r| *r >= 1)
        .ok_or_else(|| DecodeError::Invalid(format!("match {id} has no usable round")))?;

    let bracket_position = match m.bracket_position {
        None => 0,
        Some(p) => u32::try_from(p)
            .map_err(|_| DecodeError::Invalid(format!("match {id} has negative position {p}")))?,
    };

    let top = map_occupant(m.player1, m.player1_id);
    let bottom = map_occupant(m.player2, m.player2_id);

    let score = match (m.score1, m.score2, m.scores.as_deref()) {
        (Some(a), Some(b), _) => Some((a, b)),
        (_, _, Some([a, b, ..])) => Some((*a, *b)),
        _ => None,
    };

    Ok(MatchRecord {
        id,
        round,
        bracket_position,
        bracket_group: m.bracket_group.as_deref().map(parse_group).unwrap_or_default(),
        next_match_id: m.next_match_id.map(|id| id.into_string()),
        next_loser_match_id: m.next_loser_match_id.map(|id| id.into_string()),
        top,
        bottom,
        winner_id: m.winner_id.map(|id| id.into_string()),
        score,
        status: m.status.as_deref().map(parse_status).unwrap_or_default(),
    })
}

/// Embedded player objects win over bare foreign keys.
fn map_occupant(player: Option<WirePlayer>, player_id: Option<WireId>) -> Option<SlotOccupant> {
    if let Some(p) = player {
        return Some(SlotOccupant { id: p.id.into_string(), name: p.display_name.or(p.name) });
    }
    player_id.map(|id| SlotOccupant { id: id.into_string(), name: None })
}

fn normalize(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .collect::<String>()
        .to_lowercase()
}

fn parse_group(s: &str) -> BracketGroup {
    match normalize(s).as_str() {
        "winner" | "winners" | "w" | "upper" | "wb" => BracketGroup::Winner,
        "loser" | "losers" | "l" | "lower" | "lb" => BracketGroup::Loser,
        "grandfinal" | "grandfinals" | "gf" | "final" | "finals" => BracketGroup::GrandFinal,
        _ => BracketGroup::None,
    }
}

fn parse_status(s: &str) -> MatchStatus {
    match normalize(s).as_str() {
        "inprogress" | "live" | "running" | "underway" | "started" => MatchStatus::InProgress,
        "completed" | "complete" | "finished" | "final" | "done" => MatchStatus::Completed,
        _ => MatchStatus::Pending,
    }
}
