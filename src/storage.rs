use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::availability::AvailabilityStore;
use crate::error::StorageError;
use crate::poll::Poll;

/// Full state of one poll session: the immutable poll plus everything the
/// participants have marked. Saved as a whole after every mutation;
/// last write wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollSnapshot {
    pub poll: Poll,
    pub availability: AvailabilityStore,
}

/// Durable snapshot store: one JSON file per poll id under a data
/// directory. No versioning, no migration.
#[derive(Debug, Clone)]
pub struct PollStore {
    dir: PathBuf,
}

impl PollStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> PollStore {
        PollStore {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn save(&self, snapshot: &PollSnapshot) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(self.path_for(&snapshot.poll.id), json)?;
        log::debug!("saved poll {}", snapshot.poll.id);
        Ok(())
    }

    pub fn load(&self, poll_id: &str) -> Result<Option<PollSnapshot>, StorageError> {
        // Generated ids are lowercase alphanumeric; anything else cannot
        // name a snapshot file.
        if poll_id.is_empty() || !poll_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Ok(None);
        }
        let path = self.path_for(poll_id);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn path_for(&self, poll_id: &str) -> PathBuf {
        self.dir.join(format!("timesync_poll_{}.json", poll_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::Cell;

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = PollStore::new(dir.path());

        let poll = Poll::create("Standup", &[1, 3], 540, 600, "UTC").unwrap();
        let mut availability = AvailabilityStore::new();
        availability.add_participant("Alice").unwrap();
        availability.add_participant("Bob").unwrap();
        availability.toggle("Alice", Cell::new(1, 540)).unwrap();

        let id = poll.id.clone();
        store.save(&PollSnapshot { poll, availability }).unwrap();

        let loaded = store.load(&id).unwrap().unwrap();
        assert_eq!(loaded.poll.id, id);
        assert_eq!(loaded.poll.days, vec![1, 3]);
        assert!(loaded.availability.is_available("Alice", Cell::new(1, 540)));
        let names: Vec<&str> = loaded.availability.participants().collect();
        assert_eq!(names, vec!["Alice", "Bob"]);
    }

    #[test]
    fn load_missing_poll_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = PollStore::new(dir.path());
        assert!(store.load("missing12").unwrap().is_none());
    }

    #[test]
    fn load_rejects_non_id_strings() {
        let dir = tempfile::tempdir().unwrap();
        let store = PollStore::new(dir.path());
        assert!(store.load("../etc/passwd").unwrap().is_none());
        assert!(store.load("").unwrap().is_none());
    }

    #[test]
    fn save_overwrites_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = PollStore::new(dir.path());

        let poll = Poll::create("Standup", &[1], 540, 600, "UTC").unwrap();
        let id = poll.id.clone();
        let mut availability = AvailabilityStore::new();
        availability.add_participant("Alice").unwrap();
        store.save(&PollSnapshot {
            poll: poll.clone(),
            availability: availability.clone(),
        })
        .unwrap();

        availability.toggle("Alice", Cell::new(1, 555)).unwrap();
        store.save(&PollSnapshot { poll, availability }).unwrap();

        let loaded = store.load(&id).unwrap().unwrap();
        assert!(loaded.availability.is_available("Alice", Cell::new(1, 555)));
    }
}
