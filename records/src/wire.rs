/// Match-store raw wire types: serde shapes for deserializing exported match sets.
/// These map to the clean domain types via the functions in decode.rs.
use serde::Deserialize;

/// Either a bare array of matches or an object wrapping them.
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum MatchesPayload {
    List(Vec<WireMatch>),
    Wrapped { matches: Vec<WireMatch> },
}

impl MatchesPayload {
    pub fn into_matches(self) -> Vec<WireMatch> {
        match self {
            MatchesPayload::List(matches) | MatchesPayload::Wrapped { matches } => matches,
        }
    }
}

/// Stores disagree on whether ids are strings or integers.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum WireId {
    Text(String),
    Number(i64),
}

impl WireId {
    pub fn into_string(self) -> String {
        match self {
            WireId::Text(s) => s,
            WireId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WireMatch {
    pub id: Option<WireId>,
    pub round: Option<i64>,
    pub bracket_position: Option<i64>,
    pub bracket_group: Option<String>,
    pub next_match_id: Option<WireId>,
    pub next_loser_match_id: Option<WireId>,
    pub player1: Option<WirePlayer>,
    pub player2: Option<WirePlayer>,
    /// Some exports carry only the foreign keys, not the embedded players.
    pub player1_id: Option<WireId>,
    pub player2_id: Option<WireId>,
    pub winner_id: Option<WireId>,
    pub score1: Option<u32>,
    pub score2: Option<u32>,
    pub scores: Option<Vec<u32>>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WirePlayer {
    pub id: WireId,
    pub name: Option<String>,
    pub display_name: Option<String>,
}
