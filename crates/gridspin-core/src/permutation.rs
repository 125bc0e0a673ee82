#![forbid(unsafe_code)]

//! Permutation map: the fixed rotation path icons travel along.
//!
//! A [`PermutationMap`] is a partial, injective function `next: slot -> slot`.
//! Usually it is one closed cycle over the grid (see
//! [`PermutationMap::default_grid`]), but it may be a union of cycles, and it
//! may leave slots out entirely. Slots outside the domain never move.
//!
//! # Invariants
//!
//! 1. No slot has two successors (checked at construction).
//! 2. No slot has two predecessors (checked at construction), so icons never
//!    converge on the same slot.
//! 3. The map is immutable once built.
//!
//! # Walking the path
//!
//! [`PermutationMap::follow`] applies `next` repeatedly. If a hop lands on a
//! slot with no successor the walk is *undefined* and returns `None`; callers
//! treat that icon as not animating for the step.

use std::collections::BTreeMap;

/// Index of a grid slot (the icon's original DOM position).
pub type Slot = usize;

/// Reasons a permutation map cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermutationError {
    /// The map has no entries.
    #[error("permutation map is empty")]
    Empty,
    /// A slot was given two different successors.
    #[error("slot {slot} has more than one successor")]
    DuplicateSource { slot: Slot },
    /// Two slots share the same successor.
    #[error("slot {slot} is the successor of more than one slot")]
    DuplicateTarget { slot: Slot },
    /// A cycle lists fewer than two slots.
    #[error("cycle must contain at least 2 slots, got {len}")]
    DegenerateCycle { len: usize },
}

/// Fixed cyclic mapping from slot to next slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermutationMap {
    next: BTreeMap<Slot, Slot>,
}

impl PermutationMap {
    /// Build from explicit `(slot, next)` pairs.
    ///
    /// Open chains are allowed; walking off the end of one yields `None`
    /// from [`follow`](Self::follow).
    pub fn from_pairs<I>(pairs: I) -> Result<Self, PermutationError>
    where
        I: IntoIterator<Item = (Slot, Slot)>,
    {
        let mut next = BTreeMap::new();
        let mut targets = BTreeMap::new();
        for (from, to) in pairs {
            if next.insert(from, to).is_some_and(|prev| prev != to) {
                return Err(PermutationError::DuplicateSource { slot: from });
            }
            if targets.insert(to, from).is_some_and(|prev| prev != from) {
                return Err(PermutationError::DuplicateTarget { slot: to });
            }
        }
        if next.is_empty() {
            return Err(PermutationError::Empty);
        }
        Ok(Self { next })
    }

    /// Build a single closed cycle: each slot maps to the one after it, and
    /// the last maps back to the first.
    pub fn from_cycle(cycle: &[Slot]) -> Result<Self, PermutationError> {
        Self::from_cycles(&[cycle])
    }

    /// Build a union of closed cycles.
    pub fn from_cycles<C>(cycles: &[C]) -> Result<Self, PermutationError>
    where
        C: AsRef<[Slot]>,
    {
        let mut pairs = Vec::new();
        for cycle in cycles {
            let cycle = cycle.as_ref();
            if cycle.len() < 2 {
                return Err(PermutationError::DegenerateCycle { len: cycle.len() });
            }
            for (i, &slot) in cycle.iter().enumerate() {
                pairs.push((slot, cycle[(i + 1) % cycle.len()]));
            }
        }
        Self::from_pairs(pairs)
    }

    /// The 14-slot path used by the portfolio grid: the top row travels
    /// right, the bottom row travels left.
    ///
    /// ```text
    ///  0  1  2  3  4  5  6
    ///  7  8  9 10 11 12 13
    /// ```
    ///
    /// `7 → 0 → 1 → … → 6 → 13 → 12 → … → 8 → 7`.
    #[must_use]
    pub fn default_grid() -> Self {
        let next = [
            (7, 0),
            (0, 1),
            (1, 2),
            (2, 3),
            (3, 4),
            (4, 5),
            (5, 6),
            (6, 13),
            (13, 12),
            (12, 11),
            (11, 10),
            (10, 9),
            (9, 8),
            (8, 7),
        ]
        .into_iter()
        .collect();
        Self { next }
    }

    /// Successor of `slot`, if `slot` is in the domain.
    #[inline]
    #[must_use]
    pub fn next(&self, slot: Slot) -> Option<Slot> {
        self.next.get(&slot).copied()
    }

    /// True when `slot` has a successor.
    #[inline]
    #[must_use]
    pub fn contains(&self, slot: Slot) -> bool {
        self.next.contains_key(&slot)
    }

    /// Number of slots with a successor.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.next.len()
    }

    /// Always false; construction rejects empty maps.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.next.is_empty()
    }

    /// Slots with a successor, in ascending order.
    pub fn domain(&self) -> impl Iterator<Item = Slot> + '_ {
        self.next.keys().copied()
    }

    /// Largest slot index mentioned anywhere in the map.
    #[must_use]
    pub fn max_slot(&self) -> Slot {
        self.next
            .iter()
            .map(|(&from, &to)| from.max(to))
            .max()
            .unwrap_or(0)
    }

    /// Slot reached after applying `next` `steps` times starting at `slot`.
    ///
    /// - A `slot` outside the domain never moves: returns `Some(slot)`.
    /// - `steps == 0` returns `Some(slot)`.
    /// - If any hop lands on a slot without a successor, returns `None`.
    #[must_use]
    pub fn follow(&self, slot: Slot, steps: usize) -> Option<Slot> {
        if !self.contains(slot) {
            return Some(slot);
        }
        let mut current = slot;
        for _ in 0..steps {
            current = self.next(current)?;
            if !self.contains(current) {
                return None;
            }
        }
        Some(current)
    }

    /// Length of the closed cycle through `slot`.
    ///
    /// Returns `None` if `slot` is outside the domain or lies on an open chain.
    #[must_use]
    pub fn cycle_length(&self, slot: Slot) -> Option<usize> {
        let mut current = self.next(slot)?;
        let mut len = 1;
        while current != slot {
            current = self.next(current)?;
            len += 1;
            if len > self.next.len() {
                return None;
            }
        }
        Some(len)
    }
}

impl Default for PermutationMap {
    fn default() -> Self {
        Self::default_grid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grid_is_one_cycle_of_fourteen() {
        let map = PermutationMap::default_grid();
        assert_eq!(map.len(), 14);
        for slot in 0..14 {
            assert_eq!(map.cycle_length(slot), Some(14), "slot {slot}");
        }
        assert_eq!(map.max_slot(), 13);
    }

    #[test]
    fn default_grid_matches_explicit_cycle() {
        let cycle = [7, 0, 1, 2, 3, 4, 5, 6, 13, 12, 11, 10, 9, 8];
        assert_eq!(
            PermutationMap::from_cycle(&cycle).unwrap(),
            PermutationMap::default_grid()
        );
    }

    #[test]
    fn follow_walks_the_path() {
        let map = PermutationMap::default_grid();
        assert_eq!(map.follow(7, 0), Some(7));
        assert_eq!(map.follow(7, 1), Some(0));
        assert_eq!(map.follow(7, 2), Some(1));
        assert_eq!(map.follow(6, 1), Some(13));
        assert_eq!(map.follow(8, 1), Some(7));
        assert_eq!(map.follow(3, 14), Some(3));
    }

    #[test]
    fn slot_outside_domain_never_moves() {
        let map = PermutationMap::from_cycle(&[0, 1, 2]).unwrap();
        for steps in 0..10 {
            assert_eq!(map.follow(5, steps), Some(5));
        }
    }

    #[test]
    fn open_chain_becomes_undefined() {
        let map = PermutationMap::from_pairs([(0, 1), (1, 2)]).unwrap();
        assert_eq!(map.follow(0, 1), Some(1));
        // 2 has no successor, so landing there is undefined.
        assert_eq!(map.follow(0, 2), None);
        assert_eq!(map.follow(1, 1), None);
        assert_eq!(map.cycle_length(0), None);
    }

    #[test]
    fn rejects_duplicate_source() {
        let err = PermutationMap::from_pairs([(0, 1), (0, 2)]).unwrap_err();
        assert_eq!(err, PermutationError::DuplicateSource { slot: 0 });
    }

    #[test]
    fn rejects_duplicate_target() {
        let err = PermutationMap::from_pairs([(0, 2), (1, 2)]).unwrap_err();
        assert_eq!(err, PermutationError::DuplicateTarget { slot: 2 });
    }

    #[test]
    fn repeated_identical_pair_is_accepted() {
        let map = PermutationMap::from_pairs([(0, 1), (1, 0), (0, 1)]).unwrap();
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn rejects_empty_and_degenerate() {
        assert_eq!(
            PermutationMap::from_pairs(std::iter::empty()).unwrap_err(),
            PermutationError::Empty
        );
        assert_eq!(
            PermutationMap::from_cycle(&[4]).unwrap_err(),
            PermutationError::DegenerateCycle { len: 1 }
        );
    }

    #[test]
    fn union_of_cycles() {
        let map = PermutationMap::from_cycles(&[vec![0, 1], vec![2, 3, 4]]).unwrap();
        assert_eq!(map.cycle_length(0), Some(2));
        assert_eq!(map.cycle_length(3), Some(3));
        assert_eq!(map.follow(2, 4), Some(3));
    }

    #[test]
    fn errors_render_the_offending_slot() {
        assert_eq!(
            PermutationError::DuplicateTarget { slot: 9 }.to_string(),
            "slot 9 is the successor of more than one slot"
        );
        let err: Box<dyn std::error::Error> = Box::new(PermutationError::Empty);
        assert_eq!(err.to_string(), "permutation map is empty");
    }

    #[test]
    fn overlapping_cycles_are_rejected() {
        let err = PermutationMap::from_cycles(&[vec![0, 1], vec![1, 2]]).unwrap_err();
        assert_eq!(err, PermutationError::DuplicateSource { slot: 1 });
    }
}
