use std::collections::HashMap;

use serde::Serialize;

use crate::availability::{AvailabilityStore, Cell};
use crate::poll::Poll;
use crate::schedule::aggregate::{aggregate, AggregateCell};
use crate::schedule::slot_utils::{poll_slots, SLOT_MINUTES};

/// A closing block keeps at least this fraction of its running minimum
/// participant count: floor(min * 4 / 5) == floor(min * 0.8).
const TOLERANCE_NUM: usize = 4;
const TOLERANCE_DEN: usize = 5;

/// The single cell with the highest share of available participants.
#[derive(Debug, Clone, Serialize)]
pub struct BestSingleSlot {
    pub day: u8,
    pub minute: u16,
    pub available_count: usize,
    /// round(available_count / total participants * 100), 0-100.
    pub percentage: u32,
}

/// The best-scoring consecutive run of cells within one day. `end_minute`
/// is the start of the run's last slot, matching the grid labels.
#[derive(Debug, Clone, Serialize)]
pub struct LongestBlock {
    pub day: u8,
    pub start_minute: u16,
    pub end_minute: u16,
    pub slot_count: usize,
    pub min_participants: usize,
}

impl LongestBlock {
    pub fn duration_minutes(&self) -> u32 {
        self.slot_count as u32 * SLOT_MINUTES as u32
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Suggestions {
    pub best_single: BestSingleSlot,
    pub longest_block: Option<LongestBlock>,
}

/// Computes meeting suggestions. Returns `None` with fewer than two
/// participants, or when no cell has a single mark; both are ordinary
/// states, not failures.
pub fn suggest(poll: &Poll, store: &AvailabilityStore) -> Option<Suggestions> {
    let total = store.participant_count();
    if total < 2 {
        return None;
    }

    let cells = aggregate(poll, store);
    if cells.is_empty() {
        return None;
    }

    let slots = poll_slots(poll);
    let best_single = find_best_single_slot(poll, &slots, &cells, total)?;
    let longest_block = find_longest_block(poll, &slots, &cells);

    Some(Suggestions {
        best_single,
        longest_block,
    })
}

/// Scan order doubles as the tie-break: slots chronological (outer), days
/// ascending within each slot, first strictly-higher percentage wins.
fn find_best_single_slot(
    poll: &Poll,
    slots: &[u16],
    cells: &HashMap<Cell, AggregateCell>,
    total: usize,
) -> Option<BestSingleSlot> {
    let mut best: Option<BestSingleSlot> = None;
    for &minute in slots {
        for &day in &poll.days {
            let Some(agg) = cells.get(&Cell::new(day, minute)) else {
                continue;
            };
            let percentage = percentage(agg.available_count, total);
            if best
                .as_ref()
                .map(|b| percentage > b.percentage)
                .unwrap_or(true)
            {
                best = Some(BestSingleSlot {
                    day,
                    minute,
                    available_count: agg.available_count,
                    percentage,
                });
            }
        }
    }
    best
}

fn percentage(count: usize, total: usize) -> u32 {
    (count as f64 / total as f64 * 100.0).round() as u32
}

/// Greedy per-day scan over the chronological non-empty cells. A block
/// extends onto the next cell only when that cell sits on the immediately
/// following slot index and its count stays within the 80%-of-running-
/// minimum tolerance; anything else closes the block and starts a fresh one
/// at the breaking cell. Closed blocks of length >= 2 score
/// `length * running_min`; the strictly highest score wins, days scanned
/// ascending so ties keep the earliest find. Length-1 runs are never
/// candidates.
fn find_longest_block(
    poll: &Poll,
    slots: &[u16],
    cells: &HashMap<Cell, AggregateCell>,
) -> Option<LongestBlock> {
    let mut best: Option<LongestBlock> = None;
    let mut max_score = 0usize;

    for &day in &poll.days {
        // (slot index, minute, count), chronological by construction.
        let day_cells: Vec<(usize, u16, usize)> = slots
            .iter()
            .enumerate()
            .filter_map(|(idx, &minute)| {
                cells
                    .get(&Cell::new(day, minute))
                    .map(|agg| (idx, minute, agg.available_count))
            })
            .collect();

        let mut block: Vec<(usize, u16, usize)> = Vec::new();
        let mut min_participants = 0usize;

        for &(idx, minute, count) in &day_cells {
            if block.is_empty() {
                block.push((idx, minute, count));
                min_participants = count;
                continue;
            }

            let last_idx = block.last().unwrap().0;
            let tolerated = min_participants * TOLERANCE_NUM / TOLERANCE_DEN;
            if idx == last_idx + 1 && count >= tolerated {
                block.push((idx, minute, count));
                min_participants = min_participants.min(count);
            } else {
                close_block(day, &block, min_participants, &mut best, &mut max_score);
                block.clear();
                block.push((idx, minute, count));
                min_participants = count;
            }
        }
        close_block(day, &block, min_participants, &mut best, &mut max_score);
    }

    best
}

fn close_block(
    day: u8,
    block: &[(usize, u16, usize)],
    min_participants: usize,
    best: &mut Option<LongestBlock>,
    max_score: &mut usize,
) {
    if block.len() < 2 {
        return;
    }
    let score = block.len() * min_participants;
    if score > *max_score {
        *max_score = score;
        *best = Some(LongestBlock {
            day,
            start_minute: block[0].1,
            end_minute: block[block.len() - 1].1,
            slot_count: block.len(),
            min_participants,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poll_mon_wed() -> Poll {
        Poll::create("Standup", &[1, 3], 540, 600, "UTC").unwrap()
    }

    fn store_with(marks: &[(&str, u8, u16)]) -> AvailabilityStore {
        let mut store = AvailabilityStore::new();
        for &(name, day, minute) in marks {
            store.add_participant(name).unwrap();
            store.toggle(name, Cell::new(day, minute)).unwrap();
        }
        store
    }

    #[test]
    fn fewer_than_two_participants_gives_no_suggestion() {
        let poll = poll_mon_wed();
        let mut store = AvailabilityStore::new();
        store.add_participant("Solo").unwrap();
        // Full coverage still yields nothing to optimize over.
        for &minute in &[540, 555, 570, 585] {
            for &day in &[1, 3] {
                store.toggle("Solo", Cell::new(day, minute)).unwrap();
            }
        }
        assert!(suggest(&poll, &store).is_none());
    }

    #[test]
    fn two_participants_with_no_marks_gives_no_suggestion() {
        let poll = poll_mon_wed();
        let mut store = AvailabilityStore::new();
        store.add_participant("A").unwrap();
        store.add_participant("B").unwrap();
        assert!(suggest(&poll, &store).is_none());
    }

    #[test]
    fn best_slot_tie_break_and_decaying_block() {
        // A marks Mon 09:00, 09:15; B marks Mon 09:00, 09:15, 09:30.
        let poll = poll_mon_wed();
        let store = store_with(&[
            ("A", 1, 540),
            ("A", 1, 555),
            ("B", 1, 540),
            ("B", 1, 555),
            ("B", 1, 570),
        ]);

        let suggestions = suggest(&poll, &store).unwrap();

        let best = &suggestions.best_single;
        assert_eq!((best.day, best.minute), (1, 540), "first-scan tie-break");
        assert_eq!(best.available_count, 2);
        assert_eq!(best.percentage, 100);

        // 09:30 has 1 >= floor(2 * 0.8) = 1, so the block absorbs the drop.
        let block = suggestions.longest_block.unwrap();
        assert_eq!(block.day, 1);
        assert_eq!(block.start_minute, 540);
        assert_eq!(block.end_minute, 570);
        assert_eq!(block.slot_count, 3);
        assert_eq!(block.min_participants, 1);
        assert_eq!(block.duration_minutes(), 45);
    }

    #[test]
    fn percentage_is_rounded() {
        let poll = poll_mon_wed();
        let mut store = store_with(&[("A", 1, 540)]);
        store.add_participant("B").unwrap();
        store.add_participant("C").unwrap();

        let suggestions = suggest(&poll, &store).unwrap();
        assert_eq!(suggestions.best_single.percentage, 33);

        store.toggle("B", Cell::new(1, 540)).unwrap();
        let suggestions = suggest(&poll, &store).unwrap();
        assert_eq!(suggestions.best_single.percentage, 67);
    }

    #[test]
    fn deep_drop_closes_the_block() {
        // Counts 3,3,1 on consecutive slots: 1 < floor(3 * 0.8) = 2, so the
        // block is [09:00, 09:15] and the trailing single slot never scores.
        let poll = poll_mon_wed();
        let store = store_with(&[
            ("A", 1, 540),
            ("A", 1, 555),
            ("B", 1, 540),
            ("B", 1, 555),
            ("C", 1, 540),
            ("C", 1, 555),
            ("A", 1, 570),
        ]);

        let block = suggest(&poll, &store).unwrap().longest_block.unwrap();
        assert_eq!(block.slot_count, 2);
        assert_eq!(block.end_minute, 555);
        assert_eq!(block.min_participants, 3);
    }

    #[test]
    fn gaps_are_never_bridged() {
        // Marks at 09:00 and 09:30 with 09:15 empty: two length-1 runs,
        // so there is no block at all.
        let poll = poll_mon_wed();
        let store = store_with(&[
            ("A", 1, 540),
            ("B", 1, 540),
            ("A", 1, 570),
            ("B", 1, 570),
        ]);

        let suggestions = suggest(&poll, &store).unwrap();
        assert!(suggestions.longest_block.is_none());
    }

    #[test]
    fn block_ties_keep_the_earliest_day() {
        // Identical two-slot blocks on Monday and Wednesday; the strict
        // comparison keeps Monday, found first in the day-ascending scan.
        let poll = poll_mon_wed();
        let store = store_with(&[
            ("A", 1, 540),
            ("A", 1, 555),
            ("B", 1, 540),
            ("B", 1, 555),
            ("A", 3, 540),
            ("A", 3, 555),
            ("B", 3, 540),
            ("B", 3, 555),
        ]);

        let block = suggest(&poll, &store).unwrap().longest_block.unwrap();
        assert_eq!(block.day, 1);
    }

    #[test]
    fn higher_score_on_a_later_day_wins() {
        let poll = poll_mon_wed();
        let store = store_with(&[
            ("A", 1, 540),
            ("A", 1, 555),
            ("B", 1, 540),
            ("B", 1, 555),
            // Wednesday: three consecutive slots with both available.
            ("A", 3, 540),
            ("A", 3, 555),
            ("A", 3, 570),
            ("B", 3, 540),
            ("B", 3, 555),
            ("B", 3, 570),
        ]);

        let block = suggest(&poll, &store).unwrap().longest_block.unwrap();
        assert_eq!(block.day, 3);
        assert_eq!(block.slot_count, 3);
        assert_eq!(block.min_participants, 2);
    }

    #[test]
    fn block_slots_are_always_adjacent() {
        let poll = Poll::create("Long", &[1], 540, 720, "UTC").unwrap();
        let store = store_with(&[
            ("A", 1, 540),
            ("A", 1, 555),
            ("A", 1, 570),
            ("B", 1, 555),
            ("B", 1, 570),
            ("A", 1, 615),
            ("B", 1, 615),
            ("A", 1, 630),
        ]);

        let block = suggest(&poll, &store).unwrap().longest_block.unwrap();
        assert!(block.slot_count >= 2);
        // Contiguity: the span covers exactly slot_count slots.
        assert_eq!(
            (block.end_minute - block.start_minute) / SLOT_MINUTES + 1,
            block.slot_count as u16
        );
    }

    #[test]
    fn disjoint_marks_still_suggest_the_top_cell() {
        // Two participants who never overlap: the best single slot is a
        // 50% cell, chosen by scan order among the candidates.
        let poll = poll_mon_wed();
        let store = store_with(&[("A", 3, 555), ("B", 1, 570)]);

        let best = suggest(&poll, &store).unwrap().best_single;
        assert_eq!(best.percentage, 50);
        assert_eq!((best.day, best.minute), (3, 555), "earliest slot wins");
    }
}
