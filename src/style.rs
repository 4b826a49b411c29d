use serde::{Deserialize, Serialize};

use crate::sizer::SizingPolicy;
use crate::topology::RepairPolicy;

// ---------------------------------------------------------------------------
// Layout constants
// ---------------------------------------------------------------------------

/// Vertical slot reserved per first-round match.
pub const ROW_HEIGHT: f64 = 60.0;
/// Horizontal distance between the left edges of adjacent columns.
pub const COLUMN_WIDTH: f64 = 220.0;
/// Drawn width of one match box. The rest of the column is connector space.
pub const MATCH_WIDTH: f64 = 180.0;
/// Drawn height of one match box; connectors attach at its vertical center.
pub const MATCH_HEIGHT: f64 = 50.0;
pub const CANVAS_PADDING: f64 = 20.0;
pub const ROUND_HEADER_HEIGHT: f64 = 30.0;
pub const ROUND_HEADER_MARGIN: f64 = 10.0;
/// How far connector ends sit inside the match box edges.
pub const CONNECTOR_INSET: f64 = 4.0;
/// Space between the upper and lower brackets in double elimination.
pub const BRACKET_GAP: f64 = 40.0;

/// Every geometry knob the layout engine reads. Units are whatever the
/// renderer uses (pixels for SVG/canvas, cells for a terminal).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutStyle {
    pub row_height: f64,
    pub column_width: f64,
    pub match_width: f64,
    pub match_height: f64,
    pub canvas_padding: f64,
    pub round_header_height: f64,
    pub round_header_margin: f64,
    pub connector_inset: f64,
    pub bracket_gap: f64,
}

impl Default for LayoutStyle {
    fn default() -> Self {
        Self {
            row_height: ROW_HEIGHT,
            column_width: COLUMN_WIDTH,
            match_width: MATCH_WIDTH,
            match_height: MATCH_HEIGHT,
            canvas_padding: CANVAS_PADDING,
            round_header_height: ROUND_HEADER_HEIGHT,
            round_header_margin: ROUND_HEADER_MARGIN,
            connector_inset: CONNECTOR_INSET,
            bracket_gap: BRACKET_GAP,
        }
    }
}

impl LayoutStyle {
    /// Parse a style from JSON. Missing keys keep their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Height of the band above a bracket that holds its round headers.
    pub fn header_band(&self) -> f64 {
        self.round_header_height + self.round_header_margin
    }
}

/// Single or double elimination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BracketMode {
    #[default]
    Single,
    Double,
}

/// Everything one engine invocation needs besides the match records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineOptions {
    pub mode: BracketMode,
    /// Checked-in player count. Falls back to the distinct occupants in the
    /// match set when absent.
    pub player_count: Option<i64>,
    pub sizing: SizingPolicy,
    pub repair: RepairPolicy,
    pub style: LayoutStyle,
    /// Participant currently hovered by the viewer, if any.
    pub highlighted_occupant: Option<String>,
}

impl EngineOptions {
    pub fn single() -> Self {
        Self::default()
    }

    pub fn double() -> Self {
        Self { mode: BracketMode::Double, ..Self::default() }
    }

    pub fn with_player_count(mut self, count: i64) -> Self {
        self.player_count = Some(count);
        self
    }

    pub fn with_highlight(mut self, occupant_id: impl Into<String>) -> Self {
        self.highlighted_occupant = Some(occupant_id.into());
        self
    }

    pub fn with_style(mut self, style: LayoutStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_repair(mut self, repair: RepairPolicy) -> Self {
        self.repair = repair;
        self
    }
}
