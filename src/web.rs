use std::collections::HashMap;
use std::sync::Mutex;

use actix_files::Files;
use actix_session::{storage::CookieSessionStore, Session, SessionMiddleware};
use actix_web::cookie::Key;
use actix_web::{middleware, web, App, HttpResponse, HttpServer, Result};
use serde::{Deserialize, Serialize};

use crate::availability::{AvailabilityStore, Cell};
use crate::display::{format_duration, format_schedule_text};
use crate::error::StorageError;
use crate::export::{build_schedule, write_schedule_csv};
use crate::poll::Poll;
use crate::schedule::aggregate::aggregate;
use crate::schedule::slot_utils::{format_slot, parse_time_to_minutes, poll_slots};
use crate::schedule::suggest::suggest;
use crate::storage::{PollSnapshot, PollStore};

const SESSION_PARTICIPANT: &str = "participant";

/// In-memory poll sessions plus the snapshot store behind them. Snapshots
/// are re-saved after every mutation; polls not yet in memory are loaded
/// from the store on first access.
pub struct AppState {
    pub polls: Mutex<HashMap<String, PollSnapshot>>,
    pub store: PollStore,
}

#[derive(Deserialize)]
pub struct CreatePollRequest {
    title: String,
    days: Vec<u8>,
    start_time: String,
    end_time: String,
    timezone: Option<String>,
}

#[derive(Deserialize)]
pub struct JoinRequest {
    name: String,
}

#[derive(Deserialize)]
pub struct ToggleRequest {
    day: u8,
    time: String,
}

#[derive(Serialize)]
struct SlotInfo {
    minute: u16,
    label: String,
}

#[derive(Serialize)]
struct DayInfo {
    index: u8,
    name: String,
}

#[derive(Serialize)]
struct CellInfo {
    day: u8,
    minute: u16,
    available_count: usize,
    participants: Vec<String>,
}

#[derive(Serialize)]
struct GridResponse {
    poll: Poll,
    days: Vec<DayInfo>,
    slots: Vec<SlotInfo>,
    cells: Vec<CellInfo>,
    participants: Vec<String>,
    current_participant: Option<String>,
}

#[derive(Serialize)]
struct BestSingleView {
    day: String,
    time: String,
    available_count: usize,
    percentage: u32,
}

#[derive(Serialize)]
struct BlockView {
    day: String,
    start_time: String,
    end_time: String,
    duration: String,
    min_participants: usize,
}

#[derive(Serialize)]
struct SuggestionsResponse {
    participant_count: usize,
    best_single: Option<BestSingleView>,
    longest_block: Option<BlockView>,
}

fn bad_request(error: impl ToString) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({
        "success": false,
        "error": error.to_string(),
    }))
}

fn storage_failure(err: StorageError) -> actix_web::Error {
    log::error!("snapshot store failure: {}", err);
    actix_web::error::ErrorInternalServerError("storage failure")
}

/// Loads the poll into the in-memory map if the store knows it. Returns
/// false when the id names nothing.
fn ensure_loaded(state: &AppState, poll_id: &str) -> std::result::Result<bool, StorageError> {
    let mut polls = state.polls.lock().unwrap();
    if polls.contains_key(poll_id) {
        return Ok(true);
    }
    match state.store.load(poll_id)? {
        Some(snapshot) => {
            polls.insert(poll_id.to_string(), snapshot);
            Ok(true)
        }
        None => Ok(false),
    }
}

fn poll_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({"error": "Poll not found"}))
}

async fn create_poll(
    req: web::Json<CreatePollRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let Some(start) = parse_time_to_minutes(&req.start_time) else {
        return Ok(bad_request("Invalid start time"));
    };
    let Some(end) = parse_time_to_minutes(&req.end_time) else {
        return Ok(bad_request("Invalid end time"));
    };
    let timezone = req.timezone.as_deref().unwrap_or("local");

    let poll = match Poll::create(&req.title, &req.days, start, end, timezone) {
        Ok(poll) => poll,
        Err(err) => return Ok(bad_request(err)),
    };

    let snapshot = PollSnapshot {
        poll: poll.clone(),
        availability: AvailabilityStore::new(),
    };
    state.store.save(&snapshot).map_err(storage_failure)?;
    state
        .polls
        .lock()
        .unwrap()
        .insert(poll.id.clone(), snapshot);

    log::info!("created poll {} ({})", poll.id, poll.title);
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true, "poll": poll})))
}

async fn get_grid(
    poll_id: web::Path<String>,
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse> {
    if !ensure_loaded(&state, &poll_id).map_err(storage_failure)? {
        return Ok(poll_not_found());
    }
    let polls = state.polls.lock().unwrap();
    let snapshot = &polls[poll_id.as_str()];
    let poll = &snapshot.poll;
    let store = &snapshot.availability;

    let cells = aggregate(poll, store);
    let mut cell_infos: Vec<CellInfo> = cells
        .into_iter()
        .map(|(cell, agg)| CellInfo {
            day: cell.day,
            minute: cell.minute,
            available_count: agg.available_count,
            participants: agg.participants,
        })
        .collect();
    cell_infos.sort_by_key(|c| (c.minute, c.day));

    let response = GridResponse {
        poll: poll.clone(),
        days: poll
            .days
            .iter()
            .map(|&day| DayInfo {
                index: day,
                name: Poll::day_name_short(day).to_string(),
            })
            .collect(),
        slots: poll_slots(poll)
            .into_iter()
            .map(|minute| SlotInfo {
                minute,
                label: format_slot(minute),
            })
            .collect(),
        cells: cell_infos,
        participants: store.participants().map(str::to_string).collect(),
        current_participant: session.get(SESSION_PARTICIPANT).unwrap_or(None),
    };
    Ok(HttpResponse::Ok().json(response))
}

async fn join_poll(
    poll_id: web::Path<String>,
    req: web::Json<JoinRequest>,
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse> {
    if !ensure_loaded(&state, &poll_id).map_err(storage_failure)? {
        return Ok(poll_not_found());
    }

    let snapshot = {
        let mut polls = state.polls.lock().unwrap();
        let snapshot = polls.get_mut(poll_id.as_str()).unwrap();
        let name = match snapshot.availability.add_participant(&req.name) {
            Ok(name) => name,
            Err(err) => return Ok(bad_request(err)),
        };
        session.insert(SESSION_PARTICIPANT, &name)?;
        snapshot.clone()
    };
    state.store.save(&snapshot).map_err(storage_failure)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "participants": snapshot.availability.participants().collect::<Vec<_>>(),
    })))
}

async fn toggle_cell(
    poll_id: web::Path<String>,
    req: web::Json<ToggleRequest>,
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse> {
    let Some(name) = session.get::<String>(SESSION_PARTICIPANT)? else {
        return Ok(bad_request("Please enter your name first"));
    };
    let Some(minute) = parse_time_to_minutes(&req.time) else {
        return Ok(bad_request("Invalid time"));
    };

    if !ensure_loaded(&state, &poll_id).map_err(storage_failure)? {
        return Ok(poll_not_found());
    }

    let (available, snapshot) = {
        let mut polls = state.polls.lock().unwrap();
        let snapshot = polls.get_mut(poll_id.as_str()).unwrap();
        let available = match snapshot
            .availability
            .toggle(&name, Cell::new(req.day, minute))
        {
            Ok(available) => available,
            Err(err) => return Ok(bad_request(err)),
        };
        (available, snapshot.clone())
    };
    state.store.save(&snapshot).map_err(storage_failure)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "available": available,
    })))
}

async fn get_suggestions(
    poll_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if !ensure_loaded(&state, &poll_id).map_err(storage_failure)? {
        return Ok(poll_not_found());
    }
    let polls = state.polls.lock().unwrap();
    let snapshot = &polls[poll_id.as_str()];

    let suggestions = suggest(&snapshot.poll, &snapshot.availability);
    let response = SuggestionsResponse {
        participant_count: snapshot.availability.participant_count(),
        best_single: suggestions.as_ref().map(|s| BestSingleView {
            day: Poll::day_name(s.best_single.day).to_string(),
            time: format_slot(s.best_single.minute),
            available_count: s.best_single.available_count,
            percentage: s.best_single.percentage,
        }),
        longest_block: suggestions
            .as_ref()
            .and_then(|s| s.longest_block.as_ref())
            .map(|block| BlockView {
                day: Poll::day_name(block.day).to_string(),
                start_time: format_slot(block.start_minute),
                end_time: format_slot(block.end_minute),
                duration: format_duration(block.duration_minutes()),
                min_participants: block.min_participants,
            }),
    };
    Ok(HttpResponse::Ok().json(response))
}

async fn export_text(
    poll_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if !ensure_loaded(&state, &poll_id).map_err(storage_failure)? {
        return Ok(poll_not_found());
    }
    let polls = state.polls.lock().unwrap();
    let snapshot = &polls[poll_id.as_str()];

    let schedule = build_schedule(&snapshot.poll, &snapshot.availability);
    let text = format_schedule_text(&snapshot.poll, &schedule);
    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(text))
}

async fn export_csv(
    poll_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if !ensure_loaded(&state, &poll_id).map_err(storage_failure)? {
        return Ok(poll_not_found());
    }
    let polls = state.polls.lock().unwrap();
    let snapshot = &polls[poll_id.as_str()];

    let mut out = Vec::new();
    write_schedule_csv(&mut out, &snapshot.poll, &snapshot.availability)
        .map_err(actix_web::error::ErrorInternalServerError)?;
    Ok(HttpResponse::Ok().content_type("text/csv").body(out))
}

async fn index() -> Result<HttpResponse> {
    let html = include_str!("../templates/index.html");
    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}

pub async fn start_server(port: u16, data_dir: String) -> std::io::Result<()> {
    let app_state = web::Data::new(AppState {
        polls: Mutex::new(HashMap::new()),
        store: PollStore::new(&data_dir),
    });
    let session_key = Key::generate();

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), session_key.clone())
                    .cookie_secure(false)
                    .build(),
            )
            .service(Files::new("/static", "static"))
            .route("/", web::get().to(index))
            .route("/api/poll", web::post().to(create_poll))
            .route("/api/poll/{id}/grid", web::get().to(get_grid))
            .route("/api/poll/{id}/participants", web::post().to(join_poll))
            .route("/api/poll/{id}/toggle", web::post().to(toggle_cell))
            .route("/api/poll/{id}/suggestions", web::get().to(get_suggestions))
            .route("/api/poll/{id}/export", web::get().to(export_text))
            .route("/api/poll/{id}/export.csv", web::get().to(export_csv))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
