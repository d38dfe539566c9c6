use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{PreconditionError, ValidationError};

/// A (day, time-of-day) pair, the atomic unit of availability marking.
/// Always a typed pair; never a concatenated string key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Weekday index, 0 = Sunday.
    pub day: u8,
    /// Minutes since midnight of the slot start.
    pub minute: u16,
}

impl Cell {
    pub fn new(day: u8, minute: u16) -> Cell {
        Cell { day, minute }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ParticipantAvailability {
    name: String,
    cells: HashSet<Cell>,
}

/// Per-participant availability for the current poll. Participants are kept
/// in insertion order; that order is observable and drives deterministic
/// aggregation output downstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AvailabilityStore {
    participants: Vec<ParticipantAvailability>,
}

impl AvailabilityStore {
    pub fn new() -> AvailabilityStore {
        AvailabilityStore::default()
    }

    /// Adds a participant with an empty availability set. Idempotent:
    /// re-adding an existing name has no effect. Returns the canonical
    /// (trimmed) name.
    pub fn add_participant(&mut self, name: &str) -> Result<String, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.entry(name).is_none() {
            self.participants.push(ParticipantAvailability {
                name: name.to_string(),
                cells: HashSet::new(),
            });
        }
        Ok(name.to_string())
    }

    /// Flips membership of `cell` in the named participant's set and returns
    /// the new state. The participant must have been added first.
    pub fn toggle(&mut self, name: &str, cell: Cell) -> Result<bool, PreconditionError> {
        let entry = self
            .entry_mut(name)
            .ok_or_else(|| PreconditionError::UnknownParticipant(name.to_string()))?;
        if entry.cells.remove(&cell) {
            Ok(false)
        } else {
            entry.cells.insert(cell);
            Ok(true)
        }
    }

    /// Idempotent insert, used by bulk import paths where a repeated row
    /// must not un-mark a cell the way a second `toggle` would.
    pub fn mark_available(&mut self, name: &str, cell: Cell) -> Result<(), PreconditionError> {
        let entry = self
            .entry_mut(name)
            .ok_or_else(|| PreconditionError::UnknownParticipant(name.to_string()))?;
        entry.cells.insert(cell);
        Ok(())
    }

    /// Pure lookup; false for unknown participants and unmarked cells alike.
    pub fn is_available(&self, name: &str, cell: Cell) -> bool {
        self.entry(name)
            .map(|entry| entry.cells.contains(&cell))
            .unwrap_or(false)
    }

    /// Participant names in insertion order.
    pub fn participants(&self) -> impl Iterator<Item = &str> {
        self.participants.iter().map(|entry| entry.name.as_str())
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Total number of marked cells across all participants.
    pub fn marked_count(&self) -> usize {
        self.participants.iter().map(|entry| entry.cells.len()).sum()
    }

    fn entry(&self, name: &str) -> Option<&ParticipantAvailability> {
        self.participants.iter().find(|entry| entry.name == name)
    }

    fn entry_mut(&mut self, name: &str) -> Option<&mut ParticipantAvailability> {
        self.participants.iter_mut().find(|entry| entry.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_participant_trims_and_is_idempotent() {
        let mut store = AvailabilityStore::new();
        assert_eq!(store.add_participant("  Alice ").unwrap(), "Alice");
        store.toggle("Alice", Cell::new(1, 540)).unwrap();

        // Re-adding must not reset the availability set.
        store.add_participant("Alice").unwrap();
        assert!(store.is_available("Alice", Cell::new(1, 540)));
        assert_eq!(store.participant_count(), 1);
    }

    #[test]
    fn add_participant_rejects_blank_names() {
        let mut store = AvailabilityStore::new();
        assert_eq!(
            store.add_participant("   ").unwrap_err(),
            ValidationError::EmptyName
        );
        assert_eq!(store.participant_count(), 0);
    }

    #[test]
    fn toggle_is_its_own_inverse() {
        let mut store = AvailabilityStore::new();
        store.add_participant("Alice").unwrap();
        let cell = Cell::new(3, 555);

        assert!(!store.is_available("Alice", cell));
        assert!(store.toggle("Alice", cell).unwrap());
        assert!(store.is_available("Alice", cell));
        assert!(!store.toggle("Alice", cell).unwrap());
        assert!(!store.is_available("Alice", cell));
    }

    #[test]
    fn toggle_requires_known_participant() {
        let mut store = AvailabilityStore::new();
        assert_eq!(
            store.toggle("Ghost", Cell::new(1, 540)).unwrap_err(),
            PreconditionError::UnknownParticipant("Ghost".to_string())
        );
    }

    #[test]
    fn toggle_leaves_other_participants_alone() {
        let mut store = AvailabilityStore::new();
        store.add_participant("Alice").unwrap();
        store.add_participant("Bob").unwrap();
        let cell = Cell::new(1, 540);

        store.toggle("Alice", cell).unwrap();
        assert!(!store.is_available("Bob", cell));
    }

    #[test]
    fn is_available_is_total() {
        let store = AvailabilityStore::new();
        assert!(!store.is_available("Nobody", Cell::new(0, 0)));
    }

    #[test]
    fn participants_keep_insertion_order() {
        let mut store = AvailabilityStore::new();
        for name in ["Zoe", "Alice", "Mia"] {
            store.add_participant(name).unwrap();
        }
        let names: Vec<&str> = store.participants().collect();
        assert_eq!(names, vec!["Zoe", "Alice", "Mia"]);
    }

    #[test]
    fn mark_available_is_idempotent() {
        let mut store = AvailabilityStore::new();
        store.add_participant("Alice").unwrap();
        let cell = Cell::new(1, 540);
        store.mark_available("Alice", cell).unwrap();
        store.mark_available("Alice", cell).unwrap();
        assert!(store.is_available("Alice", cell));
        assert_eq!(store.marked_count(), 1);
    }
}
