//! Ordered room list rebuilt from streamed `(maxList, index, id, name)` fragments
//!
//! Fragments may arrive in any order. Each one fills its slot; the list is
//! considered complete only when the slot at `maxList - 1` arrives, at which
//! point anything past `maxList` is dropped.

use serde::{Serialize, Serializer};
use tracing::warn;

use super::types::RoomSummary;

/// Upper bound on slot indices accepted from the wire
pub const MAX_LIST_LEN: usize = 1024;

/// Result of applying one fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListUpdate {
    /// Slot stored, list not yet complete
    Pending,
    /// The announced final slot arrived; list truncated to its total
    Completed,
    /// Fragment ignored without touching the list
    Rejected,
}

/// Sparse ordered list: `None` marks a slot not received yet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomList {
    slots: Vec<Option<RoomSummary>>,
}

impl RoomList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one list fragment
    ///
    /// `max_list` missing counts as a total of 1.
    pub fn apply_fragment(
        &mut self,
        max_list: Option<i64>,
        index: i64,
        id: String,
        name: String,
    ) -> ListUpdate {
        let slot = match usize::try_from(index) {
            Ok(slot) if slot < MAX_LIST_LEN => slot,
            _ => {
                warn!(index, "Room list fragment index out of range, ignoring");
                return ListUpdate::Rejected;
            }
        };

        if self.slots.len() <= slot {
            self.slots.resize(slot + 1, None);
        }
        // slot < MAX_LIST_LEN so the 1-based index always fits
        self.slots[slot] = Some(RoomSummary::new(id, name, slot as u32 + 1));

        // slot + 1 cannot overflow, the wire total can
        let total = max_list.unwrap_or(1);
        if total == slot as i64 + 1 {
            self.slots.truncate(slot + 1);
            ListUpdate::Completed
        } else {
            ListUpdate::Pending
        }
    }

    /// Number of slots, received or not
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Raw slots, `None` where no fragment has arrived
    pub fn slots(&self) -> &[Option<RoomSummary>] {
        &self.slots
    }

    /// Ordered rooms with placeholders standing in for missing slots
    pub fn rooms(&self) -> Vec<RoomSummary> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.clone()
                    .unwrap_or_else(|| RoomSummary::placeholder(i as u32 + 1))
            })
            .collect()
    }

    /// Received rooms only, in order
    pub fn iter(&self) -> impl Iterator<Item = &RoomSummary> {
        self.slots.iter().flatten()
    }

    pub fn contains(&self, room_id: &str) -> bool {
        !room_id.is_empty() && self.iter().any(|r| r.id == room_id)
    }
}

impl Serialize for RoomList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.rooms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fragment(list: &mut RoomList, max: i64, index: i64, id: &str) -> ListUpdate {
        list.apply_fragment(Some(max), index, id.to_string(), format!("Room {}", id))
    }

    #[test]
    fn test_out_of_order_completion() {
        let mut list = RoomList::new();
        assert_eq!(fragment(&mut list, 2, 1, "r2"), ListUpdate::Completed);
        assert_eq!(fragment(&mut list, 2, 0, "r1"), ListUpdate::Pending);

        assert_eq!(
            list.rooms(),
            vec![
                RoomSummary::new("r1", "Room r1", 1),
                RoomSummary::new("r2", "Room r2", 2),
            ]
        );
    }

    #[test]
    fn test_intermediate_slots_are_pending() {
        let mut list = RoomList::new();
        assert_eq!(fragment(&mut list, 3, 0, "a"), ListUpdate::Pending);
        assert_eq!(fragment(&mut list, 3, 1, "b"), ListUpdate::Pending);
        assert_eq!(fragment(&mut list, 3, 2, "c"), ListUpdate::Completed);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_gap_materializes_placeholder() {
        let mut list = RoomList::new();
        fragment(&mut list, 3, 2, "c");
        let rooms = list.rooms();
        assert_eq!(rooms.len(), 3);
        assert!(rooms[0].is_placeholder());
        assert_eq!(rooms[0].index, 1);
        assert!(rooms[1].is_placeholder());
        assert_eq!(rooms[2].id, "c");
        assert_eq!(list.slots()[0], None);
    }

    #[test]
    fn test_shrinking_list_truncates_on_final_slot() {
        let mut list = RoomList::new();
        for (i, id) in ["a", "b", "c", "d"].iter().enumerate() {
            fragment(&mut list, 4, i as i64, id);
        }
        assert_eq!(list.len(), 4);

        fragment(&mut list, 2, 0, "x");
        assert_eq!(fragment(&mut list, 2, 1, "y"), ListUpdate::Completed);
        let ids: Vec<_> = list.rooms().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["x", "y"]);
    }

    #[test]
    fn test_missing_max_list_treated_as_one() {
        let mut list = RoomList::new();
        assert_eq!(
            list.apply_fragment(None, 0, "solo".into(), "Solo".into()),
            ListUpdate::Completed
        );
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_rejects_bad_index() {
        let mut list = RoomList::new();
        assert_eq!(fragment(&mut list, 2, -1, "a"), ListUpdate::Rejected);
        assert_eq!(
            fragment(&mut list, 5000, MAX_LIST_LEN as i64, "a"),
            ListUpdate::Rejected
        );
        assert!(list.is_empty());
    }

    #[test]
    fn test_extreme_max_list_never_completes() {
        let mut list = RoomList::new();
        for max in [i64::MIN, -1, 0, i64::MAX] {
            assert_eq!(fragment(&mut list, max, 0, "a"), ListUpdate::Pending);
        }
        assert_eq!(list.len(), 1);
        assert_eq!(fragment(&mut list, 1, 0, "a"), ListUpdate::Completed);
    }

    #[test]
    fn test_contains_ignores_placeholders() {
        let mut list = RoomList::new();
        fragment(&mut list, 2, 1, "r2");
        assert!(list.contains("r2"));
        assert!(!list.contains(""));
        assert!(!list.contains("r1"));
    }

    proptest! {
        #[test]
        fn prop_permutation_yields_same_list(
            n in 1usize..12,
            seed in any::<u64>(),
        ) {
            let ids: Vec<String> = (0..n).map(|i| format!("room-{}", i)).collect();

            // Deterministic shuffle driven by the seed
            let mut order: Vec<usize> = (0..n).collect();
            let mut state = seed;
            for i in (1..n).rev() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let j = (state >> 33) as usize % (i + 1);
                order.swap(i, j);
            }

            let mut in_order = RoomList::new();
            for i in 0..n {
                in_order.apply_fragment(Some(n as i64), i as i64, ids[i].clone(), ids[i].clone());
            }

            let mut shuffled = RoomList::new();
            let mut completions = 0;
            for &i in &order {
                if shuffled.apply_fragment(Some(n as i64), i as i64, ids[i].clone(), ids[i].clone())
                    == ListUpdate::Completed
                {
                    completions += 1;
                }
            }

            prop_assert_eq!(completions, 1);
            prop_assert_eq!(shuffled.rooms(), in_order.rooms());
            prop_assert_eq!(shuffled.len(), n);
        }
    }
}
