mod common;

use bracket_layout::{
    BracketMode, EngineOptions, LinkOrigin, MatchRecord, SlotOccupant, TopologyOptions, build_topology,
    compute_bracket_size, layout_bracket,
};
use common::{expect_single, full_single, rows_per_column};
use proptest::prelude::*;

const PLAYERS: usize = 6;

fn occupant_strategy() -> impl Strategy<Value = Option<SlotOccupant>> {
    prop::option::of((0..PLAYERS).prop_map(|p| SlotOccupant::new(format!("p{p}"), format!("Player {p}"))))
}

// Loosely shaped match sets: random rounds, positions and forward links,
// including dangling ones and self links. Occupants come from a small pool so
// the same player shows up in consecutive matches.
fn match_set_strategy() -> impl Strategy<Value = Vec<MatchRecord>> {
    let raw = (1u32..=4, 0u32..8, prop::option::of(0usize..14), occupant_strategy(), occupant_strategy());
    prop::collection::vec(raw, 1..14).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, (round, position, next, top, bottom))| MatchRecord {
                id: format!("m{i}"),
                round,
                bracket_position: position,
                next_match_id: next.map(|n| format!("m{n}")),
                top,
                bottom,
                ..Default::default()
            })
            .collect()
    })
}

fn hovered_strategy() -> impl Strategy<Value = Option<String>> {
    prop::option::of((0..PLAYERS).prop_map(|p| format!("p{p}")))
}

type Links = Vec<(String, Option<String>, Option<LinkOrigin>)>;

fn links_of(matches: &[MatchRecord]) -> Result<Links, String> {
    build_topology(matches, BracketMode::Single, &TopologyOptions::default())
        .map(|topo| {
            topo.nodes()
                .iter()
                .map(|n| (n.id().to_string(), n.next_match_id.clone(), n.link))
                .collect()
        })
        .map_err(|e| e.to_string())
}

proptest! {
    #[test]
    fn test_bracket_size_is_monotonic(n in -100i64..5_000, delta in 0i64..5_000) {
        let smaller = compute_bracket_size(n);
        let larger = compute_bracket_size(n + delta);
        prop_assert!(smaller.bracket_size <= larger.bracket_size);
        prop_assert!(smaller.bracket_size >= 16);
        prop_assert!(smaller.bracket_size.is_power_of_two());
        prop_assert_eq!(smaller.first_round_slots * 2, smaller.bracket_size);
    }

    #[test]
    fn test_link_repair_is_deterministic(matches in match_set_strategy()) {
        prop_assert_eq!(links_of(&matches), links_of(&matches));
    }

    #[test]
    fn test_repaired_links_stay_inside_the_node_set(matches in match_set_strategy()) {
        if let Ok(topo) = build_topology(&matches, BracketMode::Single, &TopologyOptions::default()) {
            let nodes = topo.nodes();
            for node in nodes.iter() {
                if let Some(next) = &node.next_match_id {
                    prop_assert!(nodes.get(next).is_some(), "{} -> {}", node.id(), next);
                    prop_assert_ne!(next.as_str(), node.id());
                }
                prop_assert_eq!(node.link.is_some(), node.next_match_id.is_some());
                prop_assert!(node.predecessors.len() <= 2);
            }
        }
    }

    #[test]
    fn test_layout_is_idempotent(matches in match_set_strategy(), hovered in hovered_strategy()) {
        let mut options = EngineOptions::single();
        options.highlighted_occupant = hovered;
        let first = layout_bracket(&matches, &options).to_json().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let second = layout_bracket(&matches, &options).to_json().map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_highlight_needs_hovered_player_on_both_ends(matches in match_set_strategy(), hovered in hovered_strategy()) {
        let mut options = EngineOptions::single();
        options.highlighted_occupant = hovered.clone();
        let layout = layout_bracket(&matches, &options);
        let placed: Vec<_> = layout.placed().collect();
        for current in &placed {
            for connector in current.connectors.iter().filter(|c| c.highlighted) {
                let Some(player) = hovered.as_deref() else {
                    return Err(TestCaseError::fail("highlight without a hovered player"));
                };
                let feeder = placed.iter().find(|p| p.id() == connector.predecessor_id);
                prop_assert!(current.node.record.has_occupant(player));
                prop_assert!(feeder.is_some_and(|f| f.node.record.has_occupant(player)));
            }
        }
    }

    #[test]
    fn test_full_brackets_have_one_final_and_halving_columns(rounds in 1u32..=4, linked in any::<bool>()) {
        let matches = full_single(rounds, linked);
        let layout = layout_bracket(&matches, &EngineOptions::single());
        let single = expect_single(&layout).map_err(|e| TestCaseError::fail(e.to_string()))?;

        prop_assert_eq!(single.matches.iter().filter(|p| p.node.is_terminal()).count(), 1);
        let expected: Vec<usize> = (0..rounds).rev().map(|k| 1usize << k).collect();
        prop_assert_eq!(rows_per_column(single), expected);
    }
}
