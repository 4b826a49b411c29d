use serde::Serialize;

use super::{LayoutPosition, Point};
use crate::style::LayoutStyle;

/// A predecessor to draw a connector to.
#[derive(Debug, Clone, Copy)]
pub struct Feeder<'a> {
    pub match_id: &'a str,
    pub position: &'a LayoutPosition,
    /// Whether the hovered participant played in both matches.
    pub highlighted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PathSegment {
    pub from: Point,
    pub to: Point,
}

/// Polyline from a match back to one of its feeders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorPath {
    pub predecessor_id: String,
    /// One straight segment when both boxes share a level, else three.
    pub segments: Vec<PathSegment>,
    pub highlighted: bool,
}

impl ConnectorPath {
    pub fn start(&self) -> Option<Point> {
        self.segments.first().map(|s| s.from)
    }

    pub fn end(&self) -> Option<Point> {
        self.segments.last().map(|s| s.to)
    }
}

/// Connectors from `current` to each feeder that exists, top first.
///
/// ```text
///   [pred] ─┐
///           └── [current]
/// ```
pub fn compute_connector(
    current: &LayoutPosition,
    top: Option<Feeder<'_>>,
    bottom: Option<Feeder<'_>>,
    style: &LayoutStyle,
) -> Vec<ConnectorPath> {
    [top, bottom]
        .into_iter()
        .flatten()
        .map(|feeder| path_to(current, feeder, style))
        .collect()
}

fn path_to(current: &LayoutPosition, feeder: Feeder<'_>, style: &LayoutStyle) -> ConnectorPath {
    let center = |p: &LayoutPosition| p.y + style.match_height / 2.0;
    let feeder_edge = feeder.position.x + style.match_width;

    let start = Point { x: current.x + style.connector_inset, y: center(current) };
    let end = Point { x: feeder_edge - style.connector_inset, y: center(feeder.position) };

    let segments = if start.y == end.y {
        vec![PathSegment { from: start, to: end }]
    } else {
        let mid_x = (feeder_edge + current.x) / 2.0;
        let turn = Point { x: mid_x, y: start.y };
        let back = Point { x: mid_x, y: end.y };
        vec![
            PathSegment { from: start, to: turn },
            PathSegment { from: turn, to: back },
            PathSegment { from: back, to: end },
        ]
    };

    ConnectorPath { predecessor_id: feeder.match_id.to_string(), segments, highlighted: feeder.highlighted }
}
