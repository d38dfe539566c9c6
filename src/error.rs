use thiserror::Error;

/// Rejected user input at poll-creation or join time. The operation that
/// produced one of these has not mutated anything.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("poll title must not be empty")]
    EmptyTitle,

    #[error("at least one day must be selected")]
    NoDaysSelected,

    #[error("day index {0} is out of range (expected 0-6)")]
    DayOutOfRange(u8),

    #[error("end time must be after start time ({start} >= {end})")]
    WindowOrder { start: u16, end: u16 },

    #[error("participant name must not be empty")]
    EmptyName,
}

/// Caller misuse, distinct from bad user input: the API was invoked in a
/// state or with arguments it documents as invalid.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("unknown participant: {0}")]
    UnknownParticipant(String),

    #[error("invalid slot range: start {start} is not before end {end}")]
    InvalidRange { start: u16, end: u16 },
}

/// Snapshot store failures. The aggregation and suggestion engine never
/// sees these; they surface only at the persistence boundary.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
