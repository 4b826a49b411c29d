#![allow(dead_code)]

use anyhow::{Result, bail};
use bracket_layout::{BracketGroup, BracketLayout, DoubleBracketLayout, MatchRecord, SingleBracketLayout};

pub const SINGLE_8: &str = include_str!("../../records/fixtures/single_8.json");
pub const DOUBLE_8: &str = include_str!("../../records/fixtures/double_8.json");

pub fn rec(id: &str, round: u32, position: u32, next: Option<&str>) -> MatchRecord {
    MatchRecord {
        id: id.into(),
        round,
        bracket_position: position,
        next_match_id: next.map(Into::into),
        ..Default::default()
    }
}

pub fn grouped(group: BracketGroup, record: MatchRecord) -> MatchRecord {
    MatchRecord { bracket_group: group, ..record }
}

/// A complete single-elimination bracket with `rounds` rounds and ids
/// `r{round}p{position}`. Links are filled in when `linked` is set.
pub fn full_single(rounds: u32, linked: bool) -> Vec<MatchRecord> {
    let mut matches = Vec::new();
    for round in 1..=rounds {
        let count = 1u32 << (rounds - round);
        for position in 0..count {
            let next = (linked && round < rounds).then(|| format!("r{}p{}", round + 1, position / 2));
            matches.push(MatchRecord {
                id: format!("r{round}p{position}"),
                round,
                bracket_position: position,
                next_match_id: next,
                ..Default::default()
            });
        }
    }
    matches
}

pub fn expect_single<'l, 'a>(layout: &'l BracketLayout<'a>) -> Result<&'l SingleBracketLayout<'a>> {
    match layout {
        BracketLayout::Single(l) => Ok(l),
        other => bail!("expected a single-elimination layout, got {other:?}"),
    }
}

pub fn expect_double<'l, 'a>(layout: &'l BracketLayout<'a>) -> Result<&'l DoubleBracketLayout<'a>> {
    match layout {
        BracketLayout::Double(l) => Ok(l),
        other => bail!("expected a double-elimination layout, got {other:?}"),
    }
}

/// Matches per display column, left to right.
pub fn rows_per_column(layout: &SingleBracketLayout<'_>) -> Vec<usize> {
    let mut counts = vec![0; layout.column_count];
    for placed in &layout.matches {
        if let Some(count) = counts.get_mut(placed.position.column) {
            *count += 1;
        }
    }
    counts
}
