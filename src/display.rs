use std::fs::File;
use std::io::Write;

use crate::availability::{AvailabilityStore, Cell};
use crate::export::Schedule;
use crate::poll::Poll;
use crate::schedule::aggregate::aggregate;
use crate::schedule::slot_utils::{format_slot, poll_slots};
use crate::schedule::suggest::Suggestions;

/// Formats the schedule report as shareable calendar text: title with an
/// underline, one section per day that has availability, and a fallback
/// line when nothing is marked yet.
pub fn format_schedule_text(poll: &Poll, schedule: &Schedule) -> String {
    let mut text = format!("{}\n{}\n\n", poll.title, "=".repeat(poll.title.chars().count()));

    for day in &schedule.days {
        if day.entries.is_empty() {
            continue;
        }
        text.push_str(&format!("{}:\n", day.day_name));
        for entry in &day.entries {
            text.push_str(&format!("  {}: {}\n", entry.time, entry.participants.join(", ")));
        }
        text.push('\n');
    }

    if schedule.is_empty() {
        text.push_str("No availability marked yet.\n");
    }

    text.push_str(&format!("\nGenerated from TimeSync poll {}", poll.id));
    text
}

/// Formats a slot-count duration as "1h 30m" / "45m".
pub fn format_duration(minutes: u32) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}

/// Prints the overlap grid: one row per slot, one column per poll day,
/// showing the available count for each cell.
pub fn print_overlap_grid(poll: &Poll, store: &AvailabilityStore) {
    let cells = aggregate(poll, store);

    println!("\n=== {} ===", poll.title);
    println!(
        "Participants ({}): {}",
        store.participant_count(),
        store.participants().collect::<Vec<_>>().join(", ")
    );

    print!("{:>10}", "");
    for &day in &poll.days {
        print!(" {:>5}", Poll::day_name_short(day));
    }
    println!();

    for &minute in &poll_slots(poll) {
        print!("{:>10}", format_slot(minute));
        for &day in &poll.days {
            let count = cells
                .get(&Cell::new(day, minute))
                .map(|agg| agg.available_count)
                .unwrap_or(0);
            if count > 0 {
                print!(" {:>5}", count);
            } else {
                print!(" {:>5}", ".");
            }
        }
        println!();
    }
}

/// Prints the suggestion summary, including the degenerate states.
pub fn print_suggestions(suggestions: Option<&Suggestions>, participant_count: usize) {
    println!("\n=== Suggested Times ===");
    if participant_count < 2 {
        println!("Add at least 2 participants to see suggestions.");
        return;
    }

    let Some(suggestions) = suggestions else {
        println!("No availability overlap found yet.");
        return;
    };

    let best = &suggestions.best_single;
    println!(
        "Best single time: {} at {} ({} available, {}%)",
        Poll::day_name(best.day),
        format_slot(best.minute),
        best.available_count,
        best.percentage
    );

    match &suggestions.longest_block {
        Some(block) => println!(
            "Longest block: {} from {} to {} ({} with {} available)",
            Poll::day_name(block.day),
            format_slot(block.start_minute),
            format_slot(block.end_minute),
            format_duration(block.duration_minutes()),
            block.min_participants
        ),
        None => println!("No consecutive block of 2+ slots yet."),
    }
}

/// Writes the calendar text to a file.
pub fn write_schedule_to_file(text: &str, filename: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut file = File::create(filename)?;
    file.write_all(text.as_bytes())?;
    Ok(())
}
