use std::collections::HashMap;

use serde::Serialize;

use crate::availability::{AvailabilityStore, Cell};
use crate::poll::Poll;
use crate::schedule::slot_utils::poll_slots;

/// Overlap for one cell: how many participants are available, and who.
/// `available_count` always equals `participants.len()`; names are in the
/// store's insertion order.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateCell {
    pub available_count: usize,
    pub participants: Vec<String>,
}

/// Counts availability for every (day, slot) cell of the poll. The result is
/// sparse: cells nobody marked are absent, and callers must treat absence as
/// a count of zero. Side-effect free and cheap at human scale.
pub fn aggregate(poll: &Poll, store: &AvailabilityStore) -> HashMap<Cell, AggregateCell> {
    let mut cells = HashMap::new();
    for &minute in &poll_slots(poll) {
        for &day in &poll.days {
            let cell = Cell::new(day, minute);
            let available: Vec<String> = store
                .participants()
                .filter(|name| store.is_available(name, cell))
                .map(str::to_string)
                .collect();
            if !available.is_empty() {
                cells.insert(
                    cell,
                    AggregateCell {
                        available_count: available.len(),
                        participants: available,
                    },
                );
            }
        }
    }
    cells
}
