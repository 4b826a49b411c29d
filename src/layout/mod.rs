//! Grid placement and connector geometry for built topologies.
//!
//! Coordinates are absolute within one canvas: canvas padding and round-header
//! bands from [`crate::LayoutStyle`] are already applied. `y` is the top edge
//! of a match box and `x` its left edge.

mod connector;
mod grid;

pub use connector::{ConnectorPath, Feeder, PathSegment, compute_connector};
pub use grid::{DualGrid, Grid, layout_detached, layout_double, layout_single};

use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Where one match sits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutPosition {
    /// Display column. Double-elimination upper brackets skip columns the
    /// lower bracket needs for its extra rounds.
    pub column: usize,
    /// Index within the column, in descent order from the final.
    pub row: usize,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    pub match_id: String,
    pub position: LayoutPosition,
}

/// Title drawn above a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnHeader {
    pub column: usize,
    pub x: f64,
    pub y: f64,
    pub title: String,
}

/// Index positions by match id, for connector lookups.
pub fn position_index<'g>(cells: impl IntoIterator<Item = &'g GridCell>) -> HashMap<&'g str, LayoutPosition> {
    cells.into_iter().map(|c| (c.match_id.as_str(), c.position)).collect()
}
