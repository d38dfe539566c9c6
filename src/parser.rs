use std::io::Read;
use std::path::Path;

use csv::Reader;

use crate::availability::{AvailabilityStore, Cell};
use crate::poll::parse_day;
use crate::schedule::slot_utils::parse_time_to_minutes;

/// One imported availability row: a participant, a day, and the slot times
/// they marked for it.
#[derive(Debug, Clone)]
pub struct AvailabilityRow {
    pub name: String,
    pub day: u8,
    pub minutes: Vec<u16>,
}

/// Loads availability rows from a CSV file with `name,day,times` columns,
/// where `times` is a comma-separated list of HH:MM values, e.g.
///
/// ```csv
/// name,day,times
/// Alice,Mon,"09:00, 09:15"
/// ```
pub fn load_availability_csv<P: AsRef<Path>>(
    csv_path: P,
) -> Result<Vec<AvailabilityRow>, Box<dyn std::error::Error>> {
    read_availability(std::fs::File::open(csv_path)?)
}

/// Reads availability rows from any CSV source. Columns are located by
/// header name with positional fallbacks; rows with a blank name or an
/// unrecognized day are skipped, as are unparseable times within a row.
pub fn read_availability<R: Read>(
    reader: R,
) -> Result<Vec<AvailabilityRow>, Box<dyn std::error::Error>> {
    let mut reader = Reader::from_reader(reader);

    let headers = reader.headers()?;
    let name_col = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("name"))
        .unwrap_or(0);
    let day_col = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("day"))
        .unwrap_or(1);
    let times_col = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("times"))
        .unwrap_or(2);

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;

        let name = record.get(name_col).unwrap_or("").trim().to_string();
        if name.is_empty() {
            continue;
        }
        let Some(day) = parse_day(record.get(day_col).unwrap_or("")) else {
            continue;
        };

        let minutes: Vec<u16> = record
            .get(times_col)
            .unwrap_or("")
            .split(',')
            .filter_map(parse_time_to_minutes)
            .collect();

        rows.push(AvailabilityRow { name, day, minutes });
    }

    Ok(rows)
}

/// Applies imported rows to the store: participants are added in row order
/// and every listed slot is marked. Repeated rows for one participant merge
/// into a single availability set. Returns the number of marks applied.
pub fn apply_rows(
    store: &mut AvailabilityStore,
    rows: &[AvailabilityRow],
) -> Result<usize, Box<dyn std::error::Error>> {
    let mut marked = 0;
    for row in rows {
        let name = store.add_participant(&row.name)?;
        for &minute in &row.minutes {
            store.mark_available(&name, Cell::new(row.day, minute))?;
            marked += 1;
        }
    }
    Ok(marked)
}
