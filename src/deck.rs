//! The editable deck draft: a fixed hotbar of 10 slots over card ids.
//!
//! Slots are sparse: removing a card empties its slot without shifting the
//! rest. Packing for persistence drops the empties and keeps relative order,
//! so slot position is an editing affordance only.

use thiserror::Error;

pub const DECK_SLOTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SlotError {
    #[error("Deck is full! Cannot add more than 10 cards.")]
    DeckFull,
    #[error("That card is already in the deck.")]
    DuplicateCard,
}

/// A transient draft of one deck, alive only while edit mode is active.
///
/// Invariants: a card id occupies at most one slot, and at most
/// [`DECK_SLOTS`] slots are occupied. Slot indexes are trusted to be below
/// `DECK_SLOTS`; every caller derives them from the hotbar itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    deck_index: usize,
    slots: [Option<String>; DECK_SLOTS],
}

impl EditSession {
    /// Starts editing `deck_index`, seeding slots 0..n from the packed card
    /// list the server last persisted.
    pub fn begin(deck_index: usize, saved: &[String]) -> Self {
        let mut slots: [Option<String>; DECK_SLOTS] = Default::default();
        for (slot, id) in slots.iter_mut().zip(saved) {
            *slot = Some(id.clone());
        }
        Self { deck_index, slots }
    }

    pub fn deck_index(&self) -> usize {
        self.deck_index
    }

    pub fn slots(&self) -> &[Option<String>; DECK_SLOTS] {
        &self.slots
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn contains(&self, card_id: &str) -> bool {
        self.slots.iter().flatten().any(|id| id == card_id)
    }

    /// Places `card_id` at `slot`, overwriting any previous occupant of that
    /// slot. Rejects cards already held elsewhere in the draft and additions
    /// beyond capacity into an empty slot.
    pub fn assign(&mut self, card_id: &str, slot: usize) -> Result<(), SlotError> {
        let existing = self
            .slots
            .iter()
            .position(|s| s.as_deref() == Some(card_id));
        if existing.is_some_and(|at| at != slot) {
            return Err(SlotError::DuplicateCard);
        }
        if self.slots[slot].is_none() && self.occupied() >= DECK_SLOTS {
            return Err(SlotError::DeckFull);
        }
        self.slots[slot] = Some(card_id.to_owned());
        Ok(())
    }

    /// Empties `slot` unconditionally, leaving other slots in place.
    pub fn unassign(&mut self, slot: usize) -> Option<String> {
        self.slots[slot].take()
    }

    /// The context-menu "Add to Deck" path: same checks as [`assign`], then
    /// the lowest-indexed empty slot. Returns the slot the card landed in.
    ///
    /// [`assign`]: Self::assign
    pub fn assign_first_empty(&mut self, card_id: &str) -> Result<usize, SlotError> {
        if self.contains(card_id) {
            return Err(SlotError::DuplicateCard);
        }
        let slot = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(SlotError::DeckFull)?;
        self.slots[slot] = Some(card_id.to_owned());
        Ok(slot)
    }

    /// Dense, order-preserving card list for the save endpoint.
    pub fn pack(&self) -> Vec<String> {
        self.slots.iter().flatten().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn begin_seeds_packed_list_into_leading_slots() {
        let session = EditSession::begin(0, &ids(&["A", "B"]));
        assert_eq!(session.slots()[0].as_deref(), Some("A"));
        assert_eq!(session.slots()[1].as_deref(), Some("B"));
        assert!(session.slots()[2..].iter().all(Option::is_none));
        assert_eq!(session.occupied(), 2);
    }

    #[test]
    fn assign_places_card_at_target_slot() {
        let mut session = EditSession::begin(0, &[]);
        session.assign("A", 4).unwrap();
        assert_eq!(session.slots()[4].as_deref(), Some("A"));
        assert_eq!(session.occupied(), 1);
    }

    #[test]
    fn assign_overwrites_previous_occupant() {
        let mut session = EditSession::begin(0, &ids(&["A"]));
        session.assign("B", 0).unwrap();
        assert_eq!(session.slots()[0].as_deref(), Some("B"));
        assert!(!session.contains("A"));
    }

    #[test]
    fn assign_rejects_card_already_in_another_slot() {
        let mut session = EditSession::begin(0, &ids(&["A"]));
        assert_eq!(session.assign("A", 5), Err(SlotError::DuplicateCard));
        assert_eq!(session.slots()[5], None);
        assert_eq!(session.occupied(), 1);
    }

    #[test]
    fn assign_to_own_slot_is_a_no_op() {
        let mut session = EditSession::begin(0, &ids(&["A"]));
        session.assign("A", 0).unwrap();
        assert_eq!(session.occupied(), 1);
    }

    #[test]
    fn assign_rejects_eleventh_card_into_empty_slot() {
        let full: Vec<String> = (0..10).map(|n| format!("c{n}")).collect();
        let mut session = EditSession::begin(0, &full);
        // No empty slot exists, but overwrite of an occupied one is fine.
        assert_eq!(session.assign_first_empty("c10"), Err(SlotError::DeckFull));
        session.assign("c10", 3).unwrap();
        assert_eq!(session.occupied(), 10);
        assert!(!session.contains("c3"));
    }

    #[test]
    fn unassign_leaves_a_hole() {
        let mut session = EditSession::begin(0, &ids(&["A", "B", "C"]));
        assert_eq!(session.unassign(1).as_deref(), Some("B"));
        assert_eq!(session.slots()[0].as_deref(), Some("A"));
        assert_eq!(session.slots()[1], None);
        assert_eq!(session.slots()[2].as_deref(), Some("C"));
        // Unassigning an empty slot is harmless.
        assert_eq!(session.unassign(1), None);
    }

    #[test]
    fn assign_then_unassign_frees_the_card_again() {
        let mut session = EditSession::begin(0, &[]);
        session.assign("A", 2).unwrap();
        assert!(session.contains("A"));
        session.unassign(2);
        assert!(!session.contains("A"));
        session.assign("A", 7).unwrap();
        assert_eq!(session.slots()[7].as_deref(), Some("A"));
    }

    #[test]
    fn assign_first_empty_picks_lowest_hole() {
        let mut session = EditSession::begin(0, &ids(&["A", "B", "C"]));
        session.unassign(1);
        assert_eq!(session.assign_first_empty("D"), Ok(1));
        assert_eq!(session.slots()[1].as_deref(), Some("D"));
    }

    #[test]
    fn pack_drops_holes_and_keeps_relative_order() {
        let mut session = EditSession::begin(0, &ids(&["A", "X", "B", "Y"]));
        session.unassign(1);
        session.unassign(3);
        assert_eq!(session.pack(), ids(&["A", "B"]));
    }

    #[test]
    fn drag_scenario_produces_expected_save_payload() {
        // Deck 0 persisted as [A, B]. Move B from slot 1 to slot 2, then
        // drop C into the hole: the draft reads [A, C, B] and saves as
        // exactly that order.
        let mut session = EditSession::begin(0, &ids(&["A", "B"]));
        session.assign("B", 2).unwrap_err(); // duplicate guard holds
        session.unassign(1);
        session.assign("B", 2).unwrap();
        assert_eq!(session.pack(), ids(&["A", "B"]));
        session.assign("C", 1).unwrap();
        assert_eq!(session.pack(), ids(&["A", "C", "B"]));
        assert_eq!(session.deck_index(), 0);
    }

    #[test]
    fn uniqueness_holds_across_arbitrary_mutation_sequences() {
        let mut session = EditSession::begin(1, &ids(&["A", "B", "C"]));
        let _ = session.assign("D", 0);
        let _ = session.assign_first_empty("B");
        let _ = session.unassign(2);
        let _ = session.assign_first_empty("C");
        let _ = session.assign("C", 9);
        for (i, slot) in session.slots().iter().enumerate() {
            if let Some(id) = slot {
                let dupes = session
                    .slots()
                    .iter()
                    .enumerate()
                    .filter(|(j, s)| *j != i && s.as_deref() == Some(id))
                    .count();
                assert_eq!(dupes, 0, "card {id} held in more than one slot");
            }
        }
        assert!(session.occupied() <= DECK_SLOTS);
    }
}
