use bracket_records::{MatchRecord, MatchStatus};
use serde::Serialize;

/// Display text for the empty side of a bye.
pub const BYE_LABEL: &str = "BYE";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SlotState {
    #[default]
    None,
    Played,
    Walkover,
    NoParty,
}

/// One side of a match as the renderer should show it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantSlot {
    /// Real occupant id, or `"{match_id}:slot{n}"` for an empty side.
    pub occupant_id: String,
    pub display_name: String,
    pub is_winner: bool,
    pub state: SlotState,
    pub result_text: Option<String>,
    /// True when `occupant_id` is synthetic.
    pub is_placeholder: bool,
}

/// A bye is a completed match with exactly one occupied side.
pub fn is_bye(record: &MatchRecord) -> bool {
    record.status == MatchStatus::Completed && record.occupied_sides() == 1
}

/// Derive both display slots of a match. Pure: the same record always yields
/// the same pair.
pub fn resolve_slots(record: &MatchRecord) -> [ParticipantSlot; 2] {
    let bye = is_bye(record);
    [resolve_side(record, 0, bye), resolve_side(record, 1, bye)]
}

fn resolve_side(record: &MatchRecord, side: usize, bye: bool) -> ParticipantSlot {
    let completed = record.status == MatchStatus::Completed;

    let Some(occupant) = record.occupant(side) else {
        let (display_name, state) = if bye {
            (BYE_LABEL.to_string(), SlotState::NoParty)
        } else {
            (String::new(), played_state(record))
        };
        return ParticipantSlot {
            occupant_id: placeholder_id(&record.id, side),
            display_name,
            is_winner: false,
            state,
            result_text: None,
            is_placeholder: true,
        };
    };

    let is_winner = completed && record.winner_id.as_deref() == Some(occupant.id.as_str());
    let (state, result_text) = if bye {
        (SlotState::Walkover, None)
    } else {
        let text = if completed {
            record.score_for(side).map(|s| s.to_string())
        } else {
            None
        };
        (played_state(record), text)
    };

    ParticipantSlot {
        occupant_id: occupant.id.clone(),
        display_name: occupant.display_name().to_string(),
        is_winner,
        state,
        result_text,
        is_placeholder: false,
    }
}

fn played_state(record: &MatchRecord) -> SlotState {
    if record.status.is_underway() {
        SlotState::Played
    } else {
        SlotState::None
    }
}

fn placeholder_id(match_id: &str, side: usize) -> String {
    format!("{match_id}:slot{side}")
}

/// Whether the connector between `current` and `predecessor` should be
/// highlighted: the hovered participant must appear in both matches.
pub fn highlight_between(current: &MatchRecord, predecessor: &MatchRecord, hovered: Option<&str>) -> bool {
    hovered.is_some_and(|id| current.has_occupant(id) && predecessor.has_occupant(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bracket_records::SlotOccupant;

    fn played(status: MatchStatus) -> MatchRecord {
        MatchRecord {
            id: "m1".into(),
            round: 1,
            top: Some(SlotOccupant::new("p1", "Ana")),
            bottom: Some(SlotOccupant::new("p2", "Bo")),
            winner_id: Some("p2".into()),
            score: Some((1, 3)),
            status,
            ..Default::default()
        }
    }

    #[test]
    fn test_bye_resolves_to_walkover_and_no_party() {
        let m = MatchRecord {
            id: "m9".into(),
            round: 1,
            top: Some(SlotOccupant::new("p1", "Ana")),
            winner_id: Some("p1".into()),
            score: Some((1, 0)),
            status: MatchStatus::Completed,
            ..Default::default()
        };
        assert!(is_bye(&m));
        let [top, bottom] = resolve_slots(&m);
        assert_eq!(top.state, SlotState::Walkover);
        assert!(top.is_winner);
        assert!(top.result_text.is_none());
        assert_eq!(bottom.display_name, "BYE");
        assert_eq!(bottom.state, SlotState::NoParty);
        assert!(bottom.result_text.is_none());
        assert!(bottom.is_placeholder);
        assert_eq!(bottom.occupant_id, "m9:slot1");
    }

    #[test]
    fn test_bye_on_the_top_side() {
        let m = MatchRecord {
            id: "m2".into(),
            round: 1,
            bottom: Some(SlotOccupant::new("p4", "Dee")),
            status: MatchStatus::Completed,
            ..Default::default()
        };
        let [top, bottom] = resolve_slots(&m);
        assert_eq!(top.display_name, BYE_LABEL);
        assert_eq!(top.state, SlotState::NoParty);
        assert_eq!(bottom.state, SlotState::Walkover);
        assert!(!bottom.is_winner, "no recorded winner means no winner flag");
    }

    #[test]
    fn test_pending_single_occupant_is_not_a_bye() {
        let m = MatchRecord {
            id: "m3".into(),
            round: 2,
            top: Some(SlotOccupant::new("p1", "Ana")),
            ..Default::default()
        };
        assert!(!is_bye(&m));
        let [top, bottom] = resolve_slots(&m);
        assert_eq!(top.state, SlotState::None);
        assert_eq!(bottom.display_name, "");
        assert_eq!(bottom.state, SlotState::None);
    }

    #[test]
    fn test_completed_with_nobody_is_not_a_bye() {
        let m = MatchRecord { id: "m4".into(), status: MatchStatus::Completed, ..Default::default() };
        assert!(!is_bye(&m));
        let [top, bottom] = resolve_slots(&m);
        assert_eq!(top.state, SlotState::Played);
        assert_eq!(bottom.state, SlotState::Played);
    }

    #[test]
    fn test_completed_match_carries_scores_and_winner() {
        let [top, bottom] = resolve_slots(&played(MatchStatus::Completed));
        assert_eq!(top.state, SlotState::Played);
        assert_eq!(top.result_text.as_deref(), Some("1"));
        assert_eq!(bottom.result_text.as_deref(), Some("3"));
        assert!(!top.is_winner);
        assert!(bottom.is_winner);
        assert_eq!(bottom.display_name, "Bo");
    }

    #[test]
    fn test_in_progress_match_has_no_result_or_winner() {
        let [top, bottom] = resolve_slots(&played(MatchStatus::InProgress));
        assert_eq!(top.state, SlotState::Played);
        assert!(top.result_text.is_none());
        assert!(!bottom.is_winner, "winner only counts once completed");
    }

    #[test]
    fn test_pending_match_state_is_none() {
        let [top, _] = resolve_slots(&played(MatchStatus::Pending));
        assert_eq!(top.state, SlotState::None);
    }

    #[test]
    fn test_highlight_requires_occupant_in_both() {
        let current = played(MatchStatus::Pending);
        let feeder = MatchRecord {
            id: "m0".into(),
            top: Some(SlotOccupant::new("p2", "Bo")),
            bottom: Some(SlotOccupant::new("p7", "Gus")),
            ..Default::default()
        };
        assert!(highlight_between(&current, &feeder, Some("p2")));
        assert!(!highlight_between(&current, &feeder, Some("p1")));
        assert!(!highlight_between(&current, &feeder, Some("p7")));
        assert!(!highlight_between(&current, &feeder, None));
    }
}
