use serde::{Deserialize, Serialize};

/// Smallest bracket the engine will lay out. Product policy: the full first
/// round is reserved even while registrations are incomplete.
pub const MIN_BRACKET_SIZE: u32 = 16;

/// Canonical bracket dimensions for a player count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketSize {
    /// Total first-round participant slots; always a power of two.
    pub bracket_size: u32,
    /// Matches in the first round (`bracket_size / 2`).
    pub first_round_slots: u32,
}

impl BracketSize {
    /// Number of rounds in a full single-elimination bracket of this size.
    pub fn round_count(&self) -> u32 {
        self.bracket_size.trailing_zeros()
    }

    /// How many matches round `round` (1-based) can hold. Halves per round and
    /// bottoms out at one.
    pub fn expected_matches(&self, round: u32) -> u32 {
        let halvings = round.saturating_sub(1);
        if halvings >= u32::BITS {
            return 1;
        }
        (self.first_round_slots >> halvings).max(1)
    }
}

/// Sizing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SizingPolicy {
    pub min_bracket_size: u32,
}

impl Default for SizingPolicy {
    fn default() -> Self {
        Self { min_bracket_size: MIN_BRACKET_SIZE }
    }
}

impl SizingPolicy {
    pub fn size_for(&self, player_count: i64) -> BracketSize {
        compute_bracket_size_with_floor(player_count, self.min_bracket_size)
    }
}

/// `max(16, 2^ceil(log2(max(player_count, 2))))`.
pub fn compute_bracket_size(player_count: i64) -> BracketSize {
    compute_bracket_size_with_floor(player_count, MIN_BRACKET_SIZE)
}

/// Same as [`compute_bracket_size`] with a caller-chosen floor. The floor is
/// rounded up to a power of two so the result always is one.
pub fn compute_bracket_size_with_floor(player_count: i64, floor: u32) -> BracketSize {
    let players = u32::try_from(player_count.max(2)).unwrap_or(u32::MAX);
    let needed = next_power_of_two(players);
    let floor = next_power_of_two(floor.max(2));
    let bracket_size = needed.max(floor);
    BracketSize { bracket_size, first_round_slots: bracket_size / 2 }
}

fn next_power_of_two(n: u32) -> u32 {
    n.checked_next_power_of_two().unwrap_or(1 << (u32::BITS - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_counts_hit_the_floor() {
        for n in [-5, 0, 1, 2, 9, 16] {
            assert_eq!(compute_bracket_size(n).bracket_size, 16, "n={n}");
        }
    }

    #[test]
    fn test_sizes_above_the_floor_round_up() {
        assert_eq!(compute_bracket_size(17).bracket_size, 32);
        assert_eq!(compute_bracket_size(32).bracket_size, 32);
        assert_eq!(compute_bracket_size(33).bracket_size, 64);
        assert_eq!(compute_bracket_size(100).bracket_size, 128);
    }

    #[test]
    fn test_first_round_slots_is_half() {
        let size = compute_bracket_size(20);
        assert_eq!(size.first_round_slots, 16);
    }

    #[test]
    fn test_sixteen_has_four_rounds() {
        let size = compute_bracket_size(16);
        assert_eq!(size.round_count(), 4);
        let counts: Vec<u32> = (1..=4).map(|r| size.expected_matches(r)).collect();
        assert_eq!(counts, vec![8, 4, 2, 1]);
    }

    #[test]
    fn test_thirty_two_has_five_rounds() {
        let size = compute_bracket_size(32);
        assert_eq!(size.round_count(), 5);
        assert_eq!(size.expected_matches(5), 1);
    }

    #[test]
    fn test_expected_matches_never_drops_below_one() {
        let size = compute_bracket_size(16);
        assert_eq!(size.expected_matches(9), 1);
        assert_eq!(size.expected_matches(200), 1);
    }

    #[test]
    fn test_custom_floor_is_respected() {
        assert_eq!(compute_bracket_size_with_floor(3, 4).bracket_size, 4);
        assert_eq!(compute_bracket_size_with_floor(3, 1).bracket_size, 4);
        assert_eq!(compute_bracket_size_with_floor(5, 6).bracket_size, 8);
        assert_eq!(compute_bracket_size_with_floor(0, 2).bracket_size, 2);
    }

    #[test]
    fn test_policy_defaults_to_sixteen() {
        assert_eq!(SizingPolicy::default().size_for(4).bracket_size, 16);
    }
}
