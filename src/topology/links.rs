use bracket_records::MatchRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use super::Section;
use crate::error::{BracketError, BracketResult, Diagnostic, note};

/// How hard the builder tries to fill in missing forward links.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RepairPolicy {
    /// Exact arithmetic successor, else the nearest position at or after it,
    /// else the last match of the next round.
    #[default]
    Lenient,
    /// Exact arithmetic successor only. Anything else rejects the match set.
    Strict,
}

/// Which heuristic produced an inferred link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LinkRepair {
    /// Match at the arithmetic successor position.
    Exact,
    /// Smallest position at or after the expected one.
    Nearest,
    /// Highest position in the next round; nothing sat at or after the expected one.
    Highest,
    /// Sub-bracket final wired to the converging match.
    Converger,
}

impl LinkRepair {
    pub fn label(&self) -> &'static str {
        match self {
            LinkRepair::Exact => "exact successor",
            LinkRepair::Nearest => "nearest successor",
            LinkRepair::Highest => "last match of next round",
            LinkRepair::Converger => "converging match",
        }
    }
}

/// Provenance of a node's forward link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "repair")]
pub enum LinkOrigin {
    /// Taken as-is from the match record.
    Explicit,
    /// Inferred by the builder.
    Repaired(LinkRepair),
}

impl LinkOrigin {
    pub fn is_repaired(&self) -> bool {
        matches!(self, LinkOrigin::Repaired(_))
    }
}

/// Where a match in round `r` is expected to advance to in round `r + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SuccessorRule {
    /// `floor(position / 2)`; every round halves.
    Halving,
    /// `position * next_count / this_count`; identity across rounds of equal
    /// size, halving across consolidation rounds.
    Proportional,
}

impl SuccessorRule {
    fn expected_position(self, position: u32, this_count: usize, next_count: usize) -> u32 {
        match self {
            SuccessorRule::Halving => position / 2,
            SuccessorRule::Proportional => {
                let scaled = u64::from(position) * next_count as u64 / this_count.max(1) as u64;
                u32::try_from(scaled).unwrap_or(u32::MAX)
            }
        }
    }
}

/// Working copy of one record's forward links while a topology is built. The
/// record itself is never touched.
#[derive(Debug, Clone)]
pub(crate) struct Draft<'a> {
    pub record: &'a MatchRecord,
    pub section: Section,
    pub next: Option<String>,
    pub next_loser: Option<String>,
    pub link: Option<LinkOrigin>,
}

impl Draft<'_> {
    pub fn id(&self) -> &str {
        &self.record.id
    }

    fn sort_key(&self) -> (Section, u32, u32) {
        (self.section, self.record.round, self.record.bracket_position)
    }
}

/// Deduplicate and order records. First-seen wins on both id and
/// `(section, round, position)` collisions.
pub(crate) fn prepare<'a>(
    records: impl IntoIterator<Item = (&'a MatchRecord, Section)>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Draft<'a>> {
    let mut seen_ids: HashSet<&str> = HashSet::new();
    let mut seen_slots: HashMap<(Section, u32, u32), &str> = HashMap::new();
    let mut drafts = Vec::new();

    for (record, section) in records {
        if !seen_ids.insert(record.id.as_str()) {
            note(diagnostics, Diagnostic::DuplicateId { match_id: record.id.clone() });
            continue;
        }
        let key = (section, record.round, record.bracket_position);
        if let Some(kept) = seen_slots.get(&key) {
            note(
                diagnostics,
                Diagnostic::InvalidBracketPosition {
                    kept: kept.to_string(),
                    discarded: record.id.clone(),
                    round: record.round,
                    position: record.bracket_position,
                },
            );
            continue;
        }
        seen_slots.insert(key, record.id.as_str());
        drafts.push(Draft {
            record,
            section,
            next: record.next_match_id.clone(),
            next_loser: record.next_loser_match_id.clone(),
            link: None,
        });
    }

    drafts.sort_by_key(Draft::sort_key);
    drafts
}

/// Clear links that leave the node set (or point back at their own match) and
/// tag the surviving ones as explicit.
pub(crate) fn normalize_links(drafts: &mut [Draft<'_>], diagnostics: &mut Vec<Diagnostic>) {
    let ids: HashSet<String> = drafts.iter().map(|d| d.record.id.clone()).collect();

    for draft in drafts.iter_mut() {
        if let Some(target) = draft.next.take() {
            if target != draft.record.id && ids.contains(&target) {
                draft.next = Some(target);
                draft.link = Some(LinkOrigin::Explicit);
            } else {
                note(
                    diagnostics,
                    Diagnostic::DanglingLink { match_id: draft.record.id.clone(), target },
                );
            }
        }
        if draft.next_loser.as_ref().is_some_and(|t| !ids.contains(t)) {
            log::debug!("clearing loser link of {} to unknown match", draft.record.id);
            draft.next_loser = None;
        }
    }
}

/// Fill in missing forward links inside one section using round/position
/// arithmetic. Best-effort and deterministic: the same drafts always produce
/// the same links.
pub(crate) fn repair_links(
    drafts: &mut [Draft<'_>],
    section: Section,
    rule: SuccessorRule,
    policy: RepairPolicy,
    diagnostics: &mut Vec<Diagnostic>,
) -> BracketResult<()> {
    // Drafts are sorted, so each round's entries come out in position order.
    let mut by_round: BTreeMap<u32, Vec<(u32, usize)>> = BTreeMap::new();
    for (idx, draft) in drafts.iter().enumerate().filter(|(_, d)| d.section == section) {
        by_round
            .entry(draft.record.round)
            .or_default()
            .push((draft.record.bracket_position, idx));
    }
    let Some(&max_round) = by_round.keys().next_back() else {
        return Ok(());
    };

    let members: Vec<usize> = by_round.values().flatten().map(|(_, idx)| *idx).collect();
    for idx in members {
        let (round, position) = (drafts[idx].record.round, drafts[idx].record.bracket_position);
        if drafts[idx].next.is_some() || round >= max_round {
            continue;
        }

        let this_count = by_round.get(&round).map_or(1, Vec::len);
        let Some(candidates) = by_round.get(&(round + 1)).filter(|c| !c.is_empty()) else {
            note(
                diagnostics,
                Diagnostic::UnresolvableLink { match_id: drafts[idx].record.id.clone(), round },
            );
            continue;
        };

        let expected = rule.expected_position(position, this_count, candidates.len());
        let (target, repair) = pick_successor(candidates, expected);
        if policy == RepairPolicy::Strict && repair != LinkRepair::Exact {
            return Err(BracketError::RepairRejected {
                match_id: drafts[idx].record.id.clone(),
                round,
                expected_position: expected,
            });
        }

        let next_match_id = drafts[target].record.id.clone();
        note(
            diagnostics,
            Diagnostic::RepairedLink {
                match_id: drafts[idx].record.id.clone(),
                next_match_id: next_match_id.clone(),
                repair,
            },
        );
        drafts[idx].next = Some(next_match_id);
        drafts[idx].link = Some(LinkOrigin::Repaired(repair));
    }
    Ok(())
}

/// `candidates` is non-empty and sorted by position.
fn pick_successor(candidates: &[(u32, usize)], expected: u32) -> (usize, LinkRepair) {
    if let Some((_, idx)) = candidates.iter().find(|(pos, _)| *pos == expected) {
        return (*idx, LinkRepair::Exact);
    }
    if let Some((_, idx)) = candidates.iter().find(|(pos, _)| *pos > expected) {
        return (*idx, LinkRepair::Nearest);
    }
    let (_, idx) = candidates[candidates.len() - 1];
    (idx, LinkRepair::Highest)
}
