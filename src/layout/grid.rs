use log::debug;
use serde::Serialize;
use std::collections::HashSet;

use super::{ColumnHeader, GridCell, LayoutPosition};
use crate::style::LayoutStyle;
use crate::topology::{NodeSet, Section};

// ---------------------------------------------------------------------------
// Grid: one laid-out tree
// ---------------------------------------------------------------------------

/// Matches of one tree placed column by column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grid {
    /// Earliest round first; rows in descent order.
    pub columns: Vec<Vec<GridCell>>,
    pub headers: Vec<ColumnHeader>,
    /// Right edge of the furthest match box.
    pub right: f64,
    /// Bottom edge of the lowest match box.
    pub bottom: f64,
    /// Canvas size that holds this tree, padding included.
    pub width: f64,
    pub height: f64,
}

impl Grid {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Row counts per column, earliest round first.
    pub fn row_counts(&self) -> Vec<usize> {
        self.columns.iter().map(Vec::len).collect()
    }

    pub fn cells(&self) -> impl Iterator<Item = &GridCell> {
        self.columns.iter().flatten()
    }

    /// The tree's final (or finals, for a tree with several roots).
    pub fn last_column(&self) -> &[GridCell] {
        self.columns.last().map_or(&[], Vec::as_slice)
    }
}

/// Upper bracket, lower bracket and the converging match(es) on one canvas.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DualGrid {
    pub upper: Option<Grid>,
    pub lower: Option<Grid>,
    /// Converger first, then the reset final if there is one.
    pub finals: Vec<GridCell>,
    pub final_headers: Vec<ColumnHeader>,
    /// Bottom edge of the lowest match box.
    pub bottom: f64,
    pub width: f64,
    pub height: f64,
}

impl DualGrid {
    pub fn cells(&self) -> impl Iterator<Item = &GridCell> {
        self.upper
            .iter()
            .chain(&self.lower)
            .flat_map(Grid::cells)
            .chain(&self.finals)
    }

    pub fn headers(&self) -> impl Iterator<Item = &ColumnHeader> {
        self.upper
            .iter()
            .chain(&self.lower)
            .flat_map(|g| &g.headers)
            .chain(&self.final_headers)
    }
}

// ---------------------------------------------------------------------------
// Column math
// ---------------------------------------------------------------------------

/// Vertical offset of row `row` in column `column` relative to the tree top.
/// Each column doubles the spacing of the one before, which centers every
/// match between its two feeders.
pub(crate) fn row_offset(column: usize, row: usize, row_height: f64) -> f64 {
    let scale = 2f64.powi(i32::try_from(column).unwrap_or(i32::MAX));
    let vertical_start = scale * (row_height / 2.0) - row_height / 2.0;
    scale * row_height * row as f64 + vertical_start
}

/// How a tree's logical columns map onto the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fold {
    Straight,
    /// Upper bracket of a double elimination: after the first two rounds each
    /// round skips a column so it lines up with every other lower round.
    Upper,
    /// Lower bracket: rounds alternate between losers dropping in and
    /// survivors playing off, so spacing only doubles every second column.
    Lower,
}

impl Fold {
    fn display_column(self, column: usize) -> usize {
        match self {
            Fold::Upper if column > 1 => 2 * column - 1,
            _ => column,
        }
    }

    fn vertical_column(self, column: usize) -> usize {
        match self {
            Fold::Lower => (column + 1).div_ceil(2) - 1,
            _ => column,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Titles {
    Single,
    /// Subtrees cut off from the final; labeled by their actual round.
    Detached,
    Winners,
    Losers,
}

impl Titles {
    fn title(self, column: usize, count: usize, round: u32) -> String {
        let from_end = count - 1 - column;
        match self {
            Titles::Single => match from_end {
                0 => "Final".to_string(),
                1 => "Semifinals".to_string(),
                2 => "Quarterfinals".to_string(),
                _ => format!("Round {}", column + 1),
            },
            Titles::Detached => format!("Round {round}"),
            Titles::Winners if from_end == 0 => "Winners Final".to_string(),
            Titles::Winners => format!("Winners Round {}", column + 1),
            Titles::Losers if from_end == 0 => "Losers Final".to_string(),
            Titles::Losers => format!("Losers Round {}", column + 1),
        }
    }
}

/// Walk backward from `roots` through same-section predecessors, one column
/// per depth, and return the columns earliest round first.
fn unwind_columns(nodes: &NodeSet<'_>, roots: &[&str], section: Section) -> Vec<Vec<String>> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut level: Vec<&str> = roots
        .iter()
        .copied()
        .filter(|id| nodes.get(id).is_some() && seen.insert(*id))
        .collect();

    let mut depths: Vec<Vec<String>> = Vec::new();
    while !level.is_empty() {
        let next: Vec<&str> = level
            .iter()
            .flat_map(|id| nodes.predecessors(id))
            .map(String::as_str)
            .filter(|p| nodes.get(p).is_some_and(|n| n.section == section))
            .filter(|p| seen.insert(*p))
            .collect();
        depths.push(level.into_iter().map(str::to_string).collect());
        level = next;
    }

    depths.reverse();
    depths
}

/// Place one tree with its first row at `top`.
fn place_tree(
    nodes: &NodeSet<'_>,
    roots: &[&str],
    section: Section,
    fold: Fold,
    titles: Titles,
    top: f64,
    style: &LayoutStyle,
) -> Option<Grid> {
    let ids = unwind_columns(nodes, roots, section);
    if ids.is_empty() {
        return None;
    }

    let count = ids.len();
    let column_x = |display: usize| style.canvas_padding + display as f64 * style.column_width;
    let mut headers = Vec::with_capacity(count);
    let mut columns = Vec::with_capacity(count);

    for (c, column) in ids.into_iter().enumerate() {
        let display = fold.display_column(c);
        let vertical = fold.vertical_column(c);
        let round = column.first().and_then(|id| nodes.get(id)).map_or(0, |n| n.round());
        headers.push(ColumnHeader {
            column: display,
            x: column_x(display),
            y: top - style.header_band(),
            title: titles.title(c, count, round),
        });
        columns.push(
            column
                .into_iter()
                .enumerate()
                .map(|(row, match_id)| GridCell {
                    match_id,
                    position: LayoutPosition {
                        column: display,
                        row,
                        x: column_x(display),
                        y: top + row_offset(vertical, row, style.row_height),
                    },
                })
                .collect::<Vec<_>>(),
        );
    }

    let cells = columns.iter().flatten();
    let right = cells.clone().map(|c| c.position.x).fold(f64::MIN, f64::max) + style.match_width;
    let bottom = cells.map(|c| c.position.y).fold(f64::MIN, f64::max) + style.match_height;
    Some(Grid {
        columns,
        headers,
        right,
        bottom,
        width: right + style.canvas_padding,
        height: bottom + style.canvas_padding,
    })
}

// ---------------------------------------------------------------------------
// Public layouts
// ---------------------------------------------------------------------------

/// Lay out a single-elimination tree rooted at `root`. `None` when the root
/// is not in `nodes`.
pub fn layout_single(nodes: &NodeSet<'_>, root: &str, style: &LayoutStyle) -> Option<Grid> {
    let section = nodes.get(root)?.section;
    let top = style.canvas_padding + style.header_band();
    let grid = place_tree(nodes, &[root], section, Fold::Straight, Titles::Single, top, style)?;
    debug!("single layout: rows per column {:?}", grid.row_counts());
    Some(grid)
}

/// Lay out subtrees that never reach the final, stacked below `above`
/// (the bottom edge of whatever is already on the canvas).
pub fn layout_detached(nodes: &NodeSet<'_>, roots: &[String], above: f64, style: &LayoutStyle) -> Vec<Grid> {
    let mut grids = Vec::new();
    let mut bottom = above;
    for root in roots {
        let Some(section) = nodes.get(root).map(|n| n.section) else {
            continue;
        };
        let top = bottom + style.bracket_gap + style.header_band();
        if let Some(grid) = place_tree(nodes, &[root.as_str()], section, Fold::Straight, Titles::Detached, top, style) {
            bottom = grid.bottom;
            grids.push(grid);
        }
    }
    grids
}

/// Lay out a double elimination: the upper bracket on top, the lower bracket
/// below it, and `finals` in the columns after both.
///
/// When a group final is itself the converger it is listed in `finals`, and
/// its sub-bracket is rooted at its same-section feeders instead.
pub fn layout_double(
    nodes: &NodeSet<'_>,
    upper_final: &str,
    lower_final: Option<&str>,
    finals: &[String],
    style: &LayoutStyle,
) -> Option<DualGrid> {
    let band = style.header_band();
    let upper_top = style.canvas_padding + band;
    let upper = place_tree(
        nodes,
        &tree_roots(nodes, upper_final, finals, Section::Winners),
        Section::Winners,
        Fold::Upper,
        Titles::Winners,
        upper_top,
        style,
    );

    let lower_top = upper.as_ref().map_or(upper_top, |g| g.bottom + style.bracket_gap + band);
    let lower = lower_final.and_then(|id| {
        let roots = tree_roots(nodes, id, finals, Section::Losers);
        place_tree(nodes, &roots, Section::Losers, Fold::Lower, Titles::Losers, lower_top, style)
    });

    let final_ids: Vec<&String> = finals.iter().filter(|id| nodes.get(id).is_some()).collect();
    if upper.is_none() && lower.is_none() && final_ids.is_empty() {
        return None;
    }

    let converger_y = converger_y(upper.as_ref(), lower.as_ref(), upper_top, style);
    let first_final_column = upper
        .iter()
        .chain(&lower)
        .flat_map(Grid::cells)
        .map(|c| c.position.column + 1)
        .max()
        .unwrap_or(0);

    let mut final_cells = Vec::with_capacity(final_ids.len());
    let mut final_headers = Vec::with_capacity(final_ids.len());
    for (i, id) in final_ids.into_iter().enumerate() {
        let column = first_final_column + i;
        let x = style.canvas_padding + column as f64 * style.column_width;
        final_cells.push(GridCell {
            match_id: id.clone(),
            position: LayoutPosition { column, row: 0, x, y: converger_y },
        });
        final_headers.push(ColumnHeader {
            column,
            x,
            y: style.canvas_padding,
            title: if i == 0 { "Grand Final" } else { "Grand Final Reset" }.to_string(),
        });
    }

    let right = upper
        .iter()
        .chain(&lower)
        .map(|g| g.right)
        .chain(final_cells.iter().map(|c| c.position.x + style.match_width))
        .fold(f64::MIN, f64::max);
    let bottom = upper
        .iter()
        .chain(&lower)
        .map(|g| g.bottom)
        .chain(final_cells.iter().map(|c| c.position.y + style.match_height))
        .fold(f64::MIN, f64::max);

    debug!(
        "double layout: upper {:?}, lower {:?}, {} finals from column {first_final_column}",
        upper.as_ref().map(Grid::row_counts),
        lower.as_ref().map(Grid::row_counts),
        final_cells.len()
    );

    Some(DualGrid {
        upper,
        lower,
        finals: final_cells,
        final_headers,
        bottom,
        width: right + style.canvas_padding,
        height: bottom + style.canvas_padding,
    })
}

/// A group final that doubles as the converger is drawn with the finals, so
/// its tree starts one level down.
fn tree_roots<'n>(nodes: &'n NodeSet<'_>, final_id: &'n str, finals: &[String], section: Section) -> Vec<&'n str> {
    if !finals.iter().any(|f| f == final_id) {
        return vec![final_id];
    }
    nodes
        .predecessors(final_id)
        .iter()
        .map(String::as_str)
        .filter(|p| nodes.get(p).is_some_and(|n| n.section == section))
        .collect()
}

/// Proportional placement: the converger sits `lower / upper` of the way down
/// the combined height, less one row, clamped to the canvas.
fn converger_y(upper: Option<&Grid>, lower: Option<&Grid>, upper_top: f64, style: &LayoutStyle) -> f64 {
    let final_y = |grid: &Grid| grid.last_column().first().map(|c| c.position.y);
    match (upper, lower) {
        (Some(up), Some(low)) => {
            let upper_height = up.bottom - upper_top;
            let lower_top = low.cells().map(|c| c.position.y).fold(f64::MAX, f64::min);
            let lower_height = low.bottom - lower_top;
            let game_height = low.bottom - upper_top;
            let ratio = if upper_height > 0.0 { lower_height / upper_height } else { 0.0 };
            let limit = (game_height - style.match_height).max(0.0);
            upper_top + (game_height * ratio - style.row_height).clamp(0.0, limit)
        }
        (Some(grid), None) | (None, Some(grid)) => final_y(grid).unwrap_or(upper_top),
        (None, None) => upper_top,
    }
}
