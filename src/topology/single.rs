use bracket_records::{MatchRecord, distinct_occupants};
use log::debug;
use std::collections::HashSet;

use super::links::{self, Draft, SuccessorRule};
use super::{NodeSet, Section, TopologyOptions, assemble};
use crate::error::{BracketError, BracketResult, Diagnostic, note};
use crate::sizer::BracketSize;

/// A single-elimination tree.
#[derive(Debug, Clone)]
pub struct SingleTopology<'a> {
    pub nodes: NodeSet<'a>,
    /// The final.
    pub root: String,
    /// Terminals left behind by unresolvable links, in round/position order.
    pub detached_roots: Vec<String>,
    pub sizing: BracketSize,
    pub diagnostics: Vec<Diagnostic>,
}

pub(super) fn build<'a>(matches: &'a [MatchRecord], options: &TopologyOptions) -> BracketResult<SingleTopology<'a>> {
    let mut diagnostics = Vec::new();

    let player_count = options
        .player_count
        .unwrap_or_else(|| i64::try_from(distinct_occupants(matches)).unwrap_or(i64::MAX));
    let sizing = options.sizing.size_for(player_count);

    let mut drafts = links::prepare(
        matches
            .iter()
            .filter(|m| m.bracket_group.is_winner_side())
            .map(|m| (m, Section::Winners)),
        &mut diagnostics,
    );

    // Guards against stray records beyond what each round can hold.
    drafts.retain(|d| {
        let capacity = sizing.expected_matches(d.record.round);
        if d.record.bracket_position < capacity {
            return true;
        }
        note(
            &mut diagnostics,
            Diagnostic::OutOfRange {
                match_id: d.record.id.clone(),
                round: d.record.round,
                position: d.record.bracket_position,
                capacity,
            },
        );
        false
    });

    if drafts.is_empty() {
        return Err(BracketError::NoBracketData("no single-elimination matches".into()));
    }

    links::normalize_links(&mut drafts, &mut diagnostics);
    links::repair_links(&mut drafts, Section::Winners, SuccessorRule::Halving, options.repair, &mut diagnostics)?;

    let (root, detached_roots) = pick_root(&drafts)?;
    debug!(
        "single elimination: {} matches, root {root}, {} detached, bracket size {}",
        drafts.len(),
        detached_roots.len(),
        sizing.bracket_size
    );

    let nodes = assemble(drafts, &HashSet::new(), &mut diagnostics);
    Ok(SingleTopology { nodes, root, detached_roots, sizing, diagnostics })
}

/// The final is the only terminal in the latest round that has terminals.
/// Terminals in earlier rounds were stranded by round gaps.
fn pick_root(drafts: &[Draft<'_>]) -> BracketResult<(String, Vec<String>)> {
    let terminals: Vec<&Draft<'_>> = drafts.iter().filter(|d| d.next.is_none()).collect();
    let Some(last_round) = terminals.iter().map(|d| d.record.round).max() else {
        return Err(BracketError::AmbiguousFinal { section: Section::Winners, candidates: Vec::new() });
    };

    let (finals, detached): (Vec<&Draft<'_>>, Vec<&Draft<'_>>) =
        terminals.into_iter().partition(|d| d.record.round == last_round);
    if finals.len() != 1 {
        return Err(BracketError::AmbiguousFinal {
            section: Section::Winners,
            candidates: finals.iter().map(|d| d.record.id.clone()).collect(),
        });
    }

    Ok((
        finals[0].record.id.clone(),
        detached.iter().map(|d| d.record.id.clone()).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bracket_records::{BracketGroup, SlotOccupant};

    fn rec(id: &str, round: u32, position: u32, next: Option<&str>) -> MatchRecord {
        MatchRecord {
            id: id.into(),
            round,
            bracket_position: position,
            next_match_id: next.map(Into::into),
            ..Default::default()
        }
    }

    fn eight_player_linked() -> Vec<MatchRecord> {
        vec![
            rec("m1", 1, 0, Some("m5")),
            rec("m2", 1, 1, Some("m5")),
            rec("m3", 1, 2, Some("m6")),
            rec("m4", 1, 3, Some("m6")),
            rec("m5", 2, 0, Some("m7")),
            rec("m6", 2, 1, Some("m7")),
            rec("m7", 3, 0, None),
        ]
    }

    #[test]
    fn test_well_formed_bracket_has_one_terminal() {
        let matches = eight_player_linked();
        let topo = build(&matches, &TopologyOptions::default()).unwrap();
        assert_eq!(topo.root, "m7");
        assert!(topo.detached_roots.is_empty());
        let terminals: Vec<_> = topo.nodes.iter().filter(|n| n.is_terminal()).collect();
        assert_eq!(terminals.len(), 1);
        assert_eq!(topo.nodes.predecessors("m7"), ["m5".to_string(), "m6".to_string()]);
        assert!(topo.diagnostics.is_empty());
    }

    #[test]
    fn test_unlinked_bracket_is_repaired_into_one_tree() {
        let mut matches = eight_player_linked();
        for m in &mut matches {
            m.next_match_id = None;
        }
        let topo = build(&matches, &TopologyOptions::default()).unwrap();
        assert_eq!(topo.root, "m7");
        assert_eq!(topo.nodes.get("m3").unwrap().next_match_id.as_deref(), Some("m6"));
        assert!(topo.nodes.get("m3").unwrap().link.unwrap().is_repaired());
        assert_eq!(topo.nodes.iter().filter(|n| n.is_terminal()).count(), 1);
    }

    #[test]
    fn test_loser_bracket_records_are_ignored() {
        let mut matches = eight_player_linked();
        matches.push(MatchRecord {
            bracket_group: BracketGroup::Loser,
            ..rec("l1", 1, 0, None)
        });
        let topo = build(&matches, &TopologyOptions::default()).unwrap();
        assert!(topo.nodes.get("l1").is_none());
        assert_eq!(topo.nodes.len(), 7);
    }

    #[test]
    fn test_positions_beyond_round_capacity_are_dropped() {
        let mut matches = eight_player_linked();
        // Round 3 of a 16-bracket holds two matches, round 4 only one.
        matches.push(rec("stray", 3, 2, None));
        let topo = build(&matches, &TopologyOptions::default()).unwrap();
        assert!(topo.nodes.get("stray").is_none());
        assert!(matches!(
            &topo.diagnostics[0],
            Diagnostic::OutOfRange { match_id, capacity: 2, .. } if match_id == "stray"
        ));
    }

    #[test]
    fn test_explicit_player_count_shrinks_first_round() {
        let mut matches = eight_player_linked();
        matches.push(rec("late", 1, 9, None));
        let options = TopologyOptions { player_count: Some(16), ..Default::default() };
        let topo = build(&matches, &options).unwrap();
        assert_eq!(topo.sizing.first_round_slots, 8);
        assert!(topo.nodes.get("late").is_none());

        let options = TopologyOptions { player_count: Some(20), ..Default::default() };
        let topo = build(&matches, &options).unwrap();
        assert_eq!(topo.sizing.first_round_slots, 16);
        assert!(topo.nodes.get("late").is_some());
    }

    #[test]
    fn test_occupant_count_sizes_when_no_player_count() {
        let matches: Vec<MatchRecord> = (0..20u32)
            .map(|i| MatchRecord {
                top: Some(SlotOccupant::new(format!("a{i}"), "A")),
                bottom: Some(SlotOccupant::new(format!("b{i}"), "B")),
                ..rec(&format!("r{i}"), 1, i, None)
            })
            .chain(std::iter::once(rec("f", 2, 0, None)))
            .collect();
        let topo = build(&matches, &TopologyOptions::default()).unwrap();
        // 40 distinct occupants -> bracket of 64 -> 32 first-round slots.
        assert_eq!(topo.sizing.bracket_size, 64);
        assert_eq!(topo.nodes.iter().filter(|n| n.round() == 1).count(), 20);
    }

    #[test]
    fn test_two_finals_in_the_last_round_is_ambiguous() {
        let matches = vec![rec("a", 1, 0, None), rec("b", 1, 1, None)];
        let err = build(&matches, &TopologyOptions::default()).unwrap_err();
        assert_eq!(
            err,
            BracketError::AmbiguousFinal { section: Section::Winners, candidates: vec!["a".into(), "b".into()] }
        );
    }

    #[test]
    fn test_cycle_has_no_final() {
        let matches = vec![rec("a", 1, 0, Some("b")), rec("b", 2, 0, Some("a"))];
        let err = build(&matches, &TopologyOptions::default()).unwrap_err();
        assert!(matches!(err, BracketError::AmbiguousFinal { ref candidates, .. } if candidates.is_empty()));
    }

    #[test]
    fn test_round_gap_produces_detached_root() {
        let matches = vec![
            rec("a", 1, 0, None),
            rec("b", 1, 1, None),
            rec("c", 2, 0, None),
            rec("z", 4, 0, None),
        ];
        let topo = build(&matches, &TopologyOptions::default()).unwrap();
        assert_eq!(topo.root, "z");
        assert_eq!(topo.detached_roots, vec!["c".to_string()]);
        assert!(topo
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::UnresolvableLink { match_id, .. } if match_id == "c")));
    }

    #[test]
    fn test_empty_input_is_no_data() {
        let err = build(&[], &TopologyOptions::default()).unwrap_err();
        assert!(matches!(err, BracketError::NoBracketData(_)));
    }
}
