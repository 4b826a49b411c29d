//! Elimination-bracket construction and layout.
//!
//! Turns a flat, unordered set of [`MatchRecord`]s into a validated bracket
//! topology and a 2-D grid with connector paths a renderer can draw directly.
//!
//! ```text
//! records ─▶ sizer ─▶ topology (repair, invert links) ─▶ grid ─▶ connectors
//! ```
//!
//! The whole pipeline is a pure function of its input. [`layout_bracket`] is
//! the usual entry point; the stages are public for callers that only need
//! part of it.

pub mod engine;
pub mod error;
pub mod layout;
pub mod participants;
pub mod sizer;
pub mod style;
pub mod topology;

pub use bracket_records::{BracketGroup, MatchRecord, MatchStatus, SlotOccupant, decode_matches};
pub use engine::{BracketLayout, DoubleBracketLayout, PlacedMatch, SingleBracketLayout, layout_bracket};
pub use error::{BracketError, BracketResult, Diagnostic};
pub use layout::{
    ColumnHeader, ConnectorPath, DualGrid, Feeder, Grid, GridCell, LayoutPosition, PathSegment, Point,
    compute_connector, layout_double, layout_single,
};
pub use participants::{ParticipantSlot, SlotState, highlight_between, is_bye, resolve_slots};
pub use sizer::{BracketSize, MIN_BRACKET_SIZE, SizingPolicy, compute_bracket_size};
pub use style::{BracketMode, EngineOptions, LayoutStyle};
pub use topology::{
    BracketNode, Converger, LinkOrigin, LinkRepair, RepairPolicy, Section, TopologyOptions, TopologyResult,
    build_topology, find_converger,
};
