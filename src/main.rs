use timesync::availability::AvailabilityStore;
use timesync::display::{
    format_schedule_text, print_overlap_grid, print_suggestions, write_schedule_to_file,
};
use timesync::export::build_schedule;
use timesync::parser::{apply_rows, load_availability_csv};
use timesync::poll::Poll;
use timesync::schedule::suggest::suggest;
use timesync::storage::{PollSnapshot, PollStore};
use timesync::web;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let data_dir = std::env::var("TIMESYNC_DATA").unwrap_or_else(|_| "data".to_string());

    // Web mode
    if args.len() > 1 && args[1] == "web" {
        let port = args
            .get(2)
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(8080);

        println!("Starting web server on port {}...", port);
        println!("Access the poll at http://localhost:{}", port);

        web::start_server(port, data_dir).await?;
        return Ok(());
    }

    let store = PollStore::new(&data_dir);

    // Show mode: reload a saved poll by id and print its current state.
    if args.len() > 2 && args[1] == "show" {
        let poll_id = &args[2];
        let Some(snapshot) = store.load(poll_id)? else {
            eprintln!("No poll with id {} under {}", poll_id, data_dir);
            std::process::exit(1);
        };
        report(&snapshot);
        return Ok(());
    }

    // Demo mode: create a fresh poll, optionally import availability from
    // CSV, and write out the shareable schedule text.
    let timezone = std::env::var("TZ").unwrap_or_else(|_| "local".to_string());
    let poll = Poll::create("Team sync", &[1, 2, 3, 4, 5], 540, 1020, &timezone)?;
    let mut availability = AvailabilityStore::new();

    let csv_path = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| "data/availability.csv".to_string());
    if std::path::Path::new(&csv_path).exists() {
        println!("Loading availability from {}...", csv_path);
        let rows = load_availability_csv(&csv_path)?;
        let marked = apply_rows(&mut availability, &rows)?;
        println!("Imported {} rows ({} marks)", rows.len(), marked);
    }

    let snapshot = PollSnapshot { poll, availability };
    store.save(&snapshot)?;
    println!("Poll {} saved under {}", snapshot.poll.id, data_dir);

    report(&snapshot);

    let text = format_schedule_text(
        &snapshot.poll,
        &build_schedule(&snapshot.poll, &snapshot.availability),
    );
    write_schedule_to_file(&text, "schedule.txt")?;
    println!("\nSchedule written to schedule.txt");

    Ok(())
}

fn report(snapshot: &PollSnapshot) {
    print_overlap_grid(&snapshot.poll, &snapshot.availability);
    let suggestions = suggest(&snapshot.poll, &snapshot.availability);
    print_suggestions(
        suggestions.as_ref(),
        snapshot.availability.participant_count(),
    );
}
