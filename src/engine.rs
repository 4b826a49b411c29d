use bracket_records::MatchRecord;
use log::debug;
use serde::Serialize;
use std::collections::HashMap;

use crate::error::{BracketError, Diagnostic};
use crate::layout::{
    self, ColumnHeader, ConnectorPath, Feeder, Grid, GridCell, LayoutPosition, compute_connector, position_index,
};
use crate::participants::highlight_between;
use crate::sizer::BracketSize;
use crate::style::{EngineOptions, LayoutStyle};
use crate::topology::{
    BracketNode, DoubleTopology, NodeSet, SingleTopology, TopologyOptions, TopologyResult, build_topology,
};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// A node with its place on the canvas and the connectors back to its feeders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedMatch<'a> {
    pub node: BracketNode<'a>,
    pub position: LayoutPosition,
    pub connectors: Vec<ConnectorPath>,
}

impl PlacedMatch<'_> {
    pub fn id(&self) -> &str {
        self.node.id()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleBracketLayout<'a> {
    /// Main tree column by column, then any detached subtrees below it.
    pub matches: Vec<PlacedMatch<'a>>,
    pub root: String,
    /// Columns of the main tree.
    pub column_count: usize,
    pub headers: Vec<ColumnHeader>,
    pub width: f64,
    pub height: f64,
    pub sizing: BracketSize,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoubleBracketLayout<'a> {
    pub upper: Vec<PlacedMatch<'a>>,
    pub lower: Vec<PlacedMatch<'a>>,
    /// Converger first, then the reset final if any.
    pub finals: Vec<PlacedMatch<'a>>,
    /// Subtrees cut off from their group final, below the lower bracket.
    pub detached: Vec<PlacedMatch<'a>>,
    pub converger: String,
    pub headers: Vec<ColumnHeader>,
    pub width: f64,
    pub height: f64,
    pub diagnostics: Vec<Diagnostic>,
}

/// Result of one engine pass. `NoData` is the empty-state sentinel: the input
/// was empty or no bracket could be made of it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "layout")]
pub enum BracketLayout<'a> {
    NoData(BracketError),
    Single(SingleBracketLayout<'a>),
    Double(DoubleBracketLayout<'a>),
}

impl<'a> BracketLayout<'a> {
    pub fn is_no_data(&self) -> bool {
        matches!(self, BracketLayout::NoData(_))
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            BracketLayout::NoData(_) => &[],
            BracketLayout::Single(l) => &l.diagnostics,
            BracketLayout::Double(l) => &l.diagnostics,
        }
    }

    /// Every placed match, in drawing order.
    pub fn placed(&self) -> Box<dyn Iterator<Item = &PlacedMatch<'a>> + '_> {
        match self {
            BracketLayout::NoData(_) => Box::new(std::iter::empty()),
            BracketLayout::Single(l) => Box::new(l.matches.iter()),
            BracketLayout::Double(l) => Box::new(l.upper.iter().chain(&l.lower).chain(&l.finals).chain(&l.detached)),
        }
    }

    /// Canvas `(width, height)`; zero for no data.
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            BracketLayout::NoData(_) => (0.0, 0.0),
            BracketLayout::Single(l) => (l.width, l.height),
            BracketLayout::Double(l) => (l.width, l.height),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Build and lay out a bracket from a flat match set.
///
/// Pure: the records are only read, and the same records and options always
/// give the same layout. Nothing here fails; a bracket that cannot be built
/// comes back as [`BracketLayout::NoData`] carrying the reason.
pub fn layout_bracket<'a>(matches: &'a [MatchRecord], options: &EngineOptions) -> BracketLayout<'a> {
    let topology = match build_topology(matches, options.mode, &TopologyOptions::from(options)) {
        Ok(topology) => topology,
        Err(e) => {
            debug!("no bracket for {} matches: {e}", matches.len());
            return BracketLayout::NoData(e);
        }
    };

    match topology {
        TopologyResult::Single(topo) => single_layout(topo, options),
        TopologyResult::Double(topo) => double_layout(topo, options),
    }
}

fn single_layout<'a>(topo: SingleTopology<'a>, options: &EngineOptions) -> BracketLayout<'a> {
    let style = &options.style;
    let Some(main) = layout::layout_single(&topo.nodes, &topo.root, style) else {
        return BracketLayout::NoData(BracketError::NoBracketData(format!("final {} has no columns", topo.root)));
    };
    let detached = layout::layout_detached(&topo.nodes, &topo.detached_roots, main.bottom, style);
    let grids: Vec<&Grid> = std::iter::once(&main).chain(&detached).collect();

    let mut placer = Placer::new(topo.nodes, grids.iter().flat_map(|g| g.cells()), options);
    let matches = placer.place(grids.iter().flat_map(|g| g.cells()));
    placer.report_unplaced();

    let headers = grids.iter().flat_map(|g| g.headers.iter().cloned()).collect();
    let width = grids.iter().map(|g| g.width).fold(0.0, f64::max);
    let height = grids.iter().map(|g| g.height).fold(0.0, f64::max);

    BracketLayout::Single(SingleBracketLayout {
        matches,
        root: topo.root,
        column_count: main.column_count(),
        headers,
        width,
        height,
        sizing: topo.sizing,
        diagnostics: topo.diagnostics,
    })
}

fn double_layout<'a>(topo: DoubleTopology<'a>, options: &EngineOptions) -> BracketLayout<'a> {
    let style = &options.style;
    let grid = layout::layout_double(&topo.nodes, &topo.upper_final, topo.lower_final.as_deref(), &topo.finals, style);
    let Some(grid) = grid else {
        return BracketLayout::NoData(BracketError::NoBracketData("double elimination has no columns".into()));
    };
    let detached = layout::layout_detached(&topo.nodes, &topo.detached_roots, grid.bottom, style);

    let mut placer = Placer::new(topo.nodes, grid.cells().chain(detached.iter().flat_map(Grid::cells)), options);
    let upper = grid.upper.as_ref().map(|g| placer.place(g.cells())).unwrap_or_default();
    let lower = grid.lower.as_ref().map(|g| placer.place(g.cells())).unwrap_or_default();
    let finals = placer.place(&grid.finals);
    let detached_matches = placer.place(detached.iter().flat_map(Grid::cells));
    placer.report_unplaced();

    let headers = grid
        .headers()
        .chain(detached.iter().flat_map(|g| &g.headers))
        .cloned()
        .collect();
    let width = detached.iter().map(|g| g.width).fold(grid.width, f64::max);
    let height = detached.iter().map(|g| g.height).fold(grid.height, f64::max);

    BracketLayout::Double(DoubleBracketLayout {
        upper,
        lower,
        finals,
        detached: detached_matches,
        converger: topo.converger,
        headers,
        width,
        height,
        diagnostics: topo.diagnostics,
    })
}

// ---------------------------------------------------------------------------
// Placer: pairs grid cells with their nodes and connectors
// ---------------------------------------------------------------------------

struct Placer<'a, 'p> {
    nodes: HashMap<String, BracketNode<'a>>,
    records: HashMap<&'a str, &'a MatchRecord>,
    positions: HashMap<&'p str, LayoutPosition>,
    hovered: Option<&'p str>,
    style: &'p LayoutStyle,
}

impl<'a, 'p> Placer<'a, 'p> {
    fn new(nodes: NodeSet<'a>, cells: impl IntoIterator<Item = &'p GridCell>, options: &'p EngineOptions) -> Self {
        let records = nodes
            .iter()
            .map(|n| {
                let record: &'a MatchRecord = n.record;
                (record.id.as_str(), record)
            })
            .collect();
        Self {
            nodes: nodes.into_map(),
            records,
            positions: position_index(cells),
            hovered: options.highlighted_occupant.as_deref(),
            style: &options.style,
        }
    }

    fn place<'c>(&mut self, cells: impl IntoIterator<Item = &'c GridCell>) -> Vec<PlacedMatch<'a>> {
        let mut placed = Vec::new();
        for cell in cells {
            let Some(node) = self.nodes.remove(&cell.match_id) else {
                continue;
            };
            let connectors = self.connectors(&node, &cell.position);
            placed.push(PlacedMatch { node, position: cell.position, connectors });
        }
        placed
    }

    fn connectors(&self, node: &BracketNode<'a>, position: &LayoutPosition) -> Vec<ConnectorPath> {
        let [top, bottom] = [node.top_feeder(), node.bottom_feeder()].map(|id| {
            let id = id?;
            let feeder_position = self.positions.get(id)?;
            let predecessor = self.records.get(id)?;
            Some(Feeder {
                match_id: id,
                position: feeder_position,
                highlighted: highlight_between(node.record, predecessor, self.hovered),
            })
        });
        compute_connector(position, top, bottom, self.style)
    }

    /// Nodes no tree reached, such as feeders beyond the second.
    fn report_unplaced(&self) {
        if !self.nodes.is_empty() {
            let mut ids: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
            ids.sort_unstable();
            debug!("{} matches not reachable from any final: {}", ids.len(), ids.join(", "));
        }
    }
}
