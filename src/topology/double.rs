use bracket_records::MatchRecord;
use log::debug;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::links::{self, Draft, LinkOrigin, LinkRepair, SuccessorRule};
use super::{NodeSet, Section, TopologyOptions, assemble};
use crate::error::{BracketError, BracketResult, Diagnostic, note};

/// At most a grand final and its reset.
const MAX_GRAND_FINALS: usize = 2;

/// The match where the two sub-brackets meet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Converger {
    pub id: String,
    /// Feeders in stacking order: the winners side first.
    pub predecessors: Vec<String>,
    /// Grand final and optional reset, chained. Just `[id]` when one of the
    /// group finals doubles as the converger.
    pub finals: Vec<String>,
}

/// Upper and lower brackets joined at a converging match.
#[derive(Debug, Clone)]
pub struct DoubleTopology<'a> {
    pub nodes: NodeSet<'a>,
    pub upper_final: String,
    /// `None` when the match set has no loser-bracket matches.
    pub lower_final: Option<String>,
    pub converger: String,
    pub finals: Vec<String>,
    /// Terminals left behind by unresolvable links in either group, in
    /// round/position order.
    pub detached_roots: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl DoubleTopology<'_> {
    pub fn converger(&self) -> Converger {
        Converger {
            id: self.converger.clone(),
            predecessors: self.nodes.predecessors(&self.converger).to_vec(),
            finals: self.finals.clone(),
        }
    }
}

/// Locate the converging match of a double-elimination match set.
pub fn find_converger(matches: &[MatchRecord]) -> BracketResult<Converger> {
    build(matches, &TopologyOptions::default()).map(|topo| topo.converger())
}

pub(super) fn build<'a>(matches: &'a [MatchRecord], options: &TopologyOptions) -> BracketResult<DoubleTopology<'a>> {
    let mut diagnostics = Vec::new();

    let mut drafts = links::prepare(
        matches.iter().map(|m| (m, Section::of_group(m.bracket_group))),
        &mut diagnostics,
    );
    drop_extra_grand_finals(&mut drafts, &mut diagnostics);

    let count = |section: Section| drafts.iter().filter(|d| d.section == section).count();
    let (winners, losers, grand) = (count(Section::Winners), count(Section::Losers), count(Section::GrandFinal));
    debug!("double elimination: {winners} winners, {losers} losers, {grand} grand final matches");
    if winners == 0 {
        return Err(BracketError::NoBracketData("no winner-bracket matches".into()));
    }

    links::normalize_links(&mut drafts, &mut diagnostics);
    links::repair_links(&mut drafts, Section::Winners, SuccessorRule::Halving, options.repair, &mut diagnostics)?;
    links::repair_links(&mut drafts, Section::Losers, SuccessorRule::Proportional, options.repair, &mut diagnostics)?;

    let upper = group_final(&drafts, Section::Winners)?
        .ok_or_else(|| BracketError::NoBracketData("no winner-bracket final".into()))?;
    let lower = group_final(&drafts, Section::Losers)?;

    let (converger, finals) = locate_converger(&mut drafts, upper, lower, &mut diagnostics)?;
    for sub_final in std::iter::once(upper).chain(lower) {
        if sub_final != converger {
            link_to(&mut drafts, sub_final, converger, &mut diagnostics);
        }
    }

    let detached_roots = stranded_terminals(&drafts, &finals);
    let upper_final = drafts[upper].record.id.clone();
    let lower_final = lower.map(|idx| drafts[idx].record.id.clone());
    let converger = drafts[converger].record.id.clone();
    let finals: Vec<String> = finals.iter().map(|&idx| drafts[idx].record.id.clone()).collect();
    debug!(
        "double elimination: upper final {upper_final}, lower final {}, converging at {converger}, {} detached",
        lower_final.as_deref().unwrap_or("-"),
        detached_roots.len()
    );

    let targets: HashSet<&str> = std::iter::once(converger.as_str())
        .chain(finals.iter().map(String::as_str))
        .collect();
    let nodes = assemble(drafts, &targets, &mut diagnostics);

    Ok(DoubleTopology { nodes, upper_final, lower_final, converger, finals, detached_roots, diagnostics })
}

/// Drafts are sorted, so the grand finals come out in round order.
fn drop_extra_grand_finals(drafts: &mut Vec<Draft<'_>>, diagnostics: &mut Vec<Diagnostic>) {
    let mut seen = 0;
    drafts.retain(|d| {
        if d.section != Section::GrandFinal {
            return true;
        }
        seen += 1;
        if seen <= MAX_GRAND_FINALS {
            return true;
        }
        note(diagnostics, Diagnostic::ExtraGrandFinal { match_id: d.record.id.clone() });
        false
    });
}

/// The section's final: the match whose link is missing or leaves the section,
/// taken from the highest round holding such matches. `None` for an empty section.
fn group_final(drafts: &[Draft<'_>], section: Section) -> BracketResult<Option<usize>> {
    let members: Vec<usize> = (0..drafts.len()).filter(|&i| drafts[i].section == section).collect();
    if members.is_empty() {
        return Ok(None);
    }

    let sections: HashMap<&str, Section> = drafts.iter().map(|d| (d.id(), d.section)).collect();
    let leaves_section = |idx: usize| match &drafts[idx].next {
        None => true,
        Some(next) => sections.get(next.as_str()).is_some_and(|s| *s != section),
    };
    let exits: Vec<usize> = members.into_iter().filter(|&i| leaves_section(i)).collect();
    let Some(last_round) = exits.iter().map(|&i| drafts[i].record.round).max() else {
        return Err(BracketError::AmbiguousFinal { section, candidates: Vec::new() });
    };

    let finals: Vec<usize> = exits.into_iter().filter(|&i| drafts[i].record.round == last_round).collect();
    match finals.as_slice() {
        [single] => Ok(Some(*single)),
        _ => Err(BracketError::AmbiguousFinal {
            section,
            candidates: finals.iter().map(|&i| drafts[i].record.id.clone()).collect(),
        }),
    }
}

/// Group matches still without a successor once the finals are linked.
/// Round gaps strand these below their group's final.
fn stranded_terminals(drafts: &[Draft<'_>], finals: &[usize]) -> Vec<String> {
    drafts
        .iter()
        .enumerate()
        .filter(|(i, d)| d.section != Section::GrandFinal && d.next.is_none() && !finals.contains(i))
        .map(|(_, d)| d.record.id.clone())
        .collect()
}

/// Returns the converger and the chained finals, as draft indices.
fn locate_converger(
    drafts: &mut [Draft<'_>],
    upper: usize,
    lower: Option<usize>,
    diagnostics: &mut Vec<Diagnostic>,
) -> BracketResult<(usize, Vec<usize>)> {
    let grand: Vec<usize> = (0..drafts.len()).filter(|&i| drafts[i].section == Section::GrandFinal).collect();
    if let Some(&first) = grand.first() {
        // Bracket reset: the first grand final feeds the second.
        if let Some(&reset) = grand.get(1) {
            link_to(drafts, first, reset, diagnostics);
        }
        return Ok((first, grand));
    }

    let Some(lower) = lower else {
        return Err(BracketError::NoBracketData("no grand final and no loser bracket".into()));
    };
    let targets = |from: usize, to: usize| drafts[from].next.as_deref() == Some(drafts[to].id());
    if targets(upper, lower) {
        Ok((lower, vec![lower]))
    } else if targets(lower, upper) {
        Ok((upper, vec![upper]))
    } else {
        Err(BracketError::NoBracketData("winner and loser finals never meet".into()))
    }
}

/// Point `from` at `to` unless it already links somewhere.
fn link_to(drafts: &mut [Draft<'_>], from: usize, to: usize, diagnostics: &mut Vec<Diagnostic>) {
    if drafts[from].next.is_some() {
        return;
    }
    let target = drafts[to].record.id.clone();
    note(
        diagnostics,
        Diagnostic::RepairedLink {
            match_id: drafts[from].record.id.clone(),
            next_match_id: target.clone(),
            repair: LinkRepair::Converger,
        },
    );
    drafts[from].next = Some(target);
    drafts[from].link = Some(LinkOrigin::Repaired(LinkRepair::Converger));
}
