use std::io::Write;

use serde::Serialize;

use crate::availability::{AvailabilityStore, Cell};
use crate::poll::Poll;
use crate::schedule::aggregate::aggregate;
use crate::schedule::slot_utils::{format_slot, poll_slots};

/// One non-empty slot of a day's schedule: display time plus the available
/// participants in store insertion order.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleEntry {
    pub time: String,
    pub participants: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleDay {
    pub day: u8,
    pub day_name: String,
    pub entries: Vec<ScheduleEntry>,
}

/// Day -> time -> participants report of all marked availability. Days
/// follow the poll's day order (every poll day is present, possibly empty);
/// entries are chronological and cover exactly the non-empty cells.
#[derive(Debug, Clone, Serialize)]
pub struct Schedule {
    pub days: Vec<ScheduleDay>,
}

impl Schedule {
    pub fn is_empty(&self) -> bool {
        self.days.iter().all(|day| day.entries.is_empty())
    }
}

/// Builds the structured schedule report. Pure transform over the
/// aggregation; the text/UI formatter consumes the result as-is.
pub fn build_schedule(poll: &Poll, store: &AvailabilityStore) -> Schedule {
    let cells = aggregate(poll, store);
    let slots = poll_slots(poll);

    let days = poll
        .days
        .iter()
        .map(|&day| {
            let entries = slots
                .iter()
                .filter_map(|&minute| {
                    cells.get(&Cell::new(day, minute)).map(|agg| ScheduleEntry {
                        time: format_slot(minute),
                        participants: agg.participants.clone(),
                    })
                })
                .collect();
            ScheduleDay {
                day,
                day_name: Poll::day_name(day).to_string(),
                entries,
            }
        })
        .collect();

    Schedule { days }
}

/// Writes the schedule as flat CSV (day, time, available, participants),
/// one row per non-empty cell, for spreadsheet use.
pub fn write_schedule_csv<W: Write>(
    writer: W,
    poll: &Poll,
    store: &AvailabilityStore,
) -> Result<(), csv::Error> {
    let schedule = build_schedule(poll, store);
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(["day", "time", "available", "participants"])?;
    for day in &schedule.days {
        for entry in &day.entries {
            wtr.write_record([
                day.day_name.as_str(),
                entry.time.as_str(),
                &entry.participants.len().to_string(),
                &entry.participants.join("; "),
            ])?;
        }
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> (Poll, AvailabilityStore) {
        let poll = Poll::create("Standup", &[1, 3], 540, 600, "UTC").unwrap();
        let mut store = AvailabilityStore::new();
        store.add_participant("A").unwrap();
        store.add_participant("B").unwrap();
        store.toggle("A", Cell::new(1, 540)).unwrap();
        store.toggle("A", Cell::new(1, 555)).unwrap();
        store.toggle("B", Cell::new(1, 540)).unwrap();
        store.toggle("B", Cell::new(1, 555)).unwrap();
        store.toggle("B", Cell::new(1, 570)).unwrap();
        (poll, store)
    }

    #[test]
    fn schedule_covers_each_marked_cell_exactly_once() {
        let (poll, store) = scenario();
        let schedule = build_schedule(&poll, &store);

        assert_eq!(schedule.days.len(), 2);
        let monday = &schedule.days[0];
        assert_eq!(monday.day_name, "Monday");
        let times: Vec<&str> = monday.entries.iter().map(|e| e.time.as_str()).collect();
        assert_eq!(times, vec!["9:00 AM", "9:15 AM", "9:30 AM"]);
        assert_eq!(monday.entries[0].participants, vec!["A", "B"]);
        assert_eq!(monday.entries[2].participants, vec!["B"]);

        // Wednesday has no marks but is still present, empty.
        let wednesday = &schedule.days[1];
        assert_eq!(wednesday.day_name, "Wednesday");
        assert!(wednesday.entries.is_empty());
    }

    #[test]
    fn empty_store_builds_an_empty_schedule() {
        let poll = Poll::create("Standup", &[1], 540, 600, "UTC").unwrap();
        let schedule = build_schedule(&poll, &AvailabilityStore::new());
        assert!(schedule.is_empty());
    }

    #[test]
    fn csv_export_lists_non_empty_cells() {
        let (poll, store) = scenario();
        let mut out = Vec::new();
        write_schedule_csv(&mut out, &poll, &store).unwrap();
        let text = String::from_utf8(out).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "day,time,available,participants");
        assert_eq!(lines[1], "Monday,9:00 AM,2,A; B");
        assert_eq!(lines[3], "Monday,9:30 AM,1,B");
        assert_eq!(lines.len(), 4);
    }
}
