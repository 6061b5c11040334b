//! Session history: calculated input/result pairs
//!
//! The store accepts an `(inputs, results)` pair and hands back an opaque id.
//! The in-memory store keeps a bounded history, evicting the oldest session
//! first. `JsonSessionFile` persists that history between CLI runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{CaltrakError, Result, SessionError};
use crate::models::{CalculationResults, UserInputs};

/// Default number of sessions kept in history
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// Opaque session identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        SessionId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        SessionId(id.to_string())
    }
}

/// One saved calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
    pub inputs: UserInputs,
    pub results: CalculationResults,
}

/// Destination for calculated sessions
pub trait SessionStore {
    /// Record a calculation and return its id
    fn save(&mut self, inputs: UserInputs, results: CalculationResults) -> Result<SessionId>;

    /// Look up a session by id
    fn get(&self, id: &SessionId) -> Option<&Session>;

    /// All sessions, oldest first
    fn list(&self) -> Vec<&Session>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Bounded in-memory history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InMemorySessionStore {
    max_history: usize,
    total_sessions: u64,
    sessions: VecDeque<Session>,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl InMemorySessionStore {
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history: max_history.max(1),
            total_sessions: 0,
            sessions: VecDeque::new(),
        }
    }

    /// Sessions ever saved, including evicted ones
    pub fn total_sessions(&self) -> u64 {
        self.total_sessions
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Change the cap, evicting immediately if the history is over it
    pub fn set_max_history(&mut self, max_history: usize) {
        self.max_history = max_history.max(1);
        self.evict();
    }

    /// Remove a session, failing if it does not exist
    pub fn remove(&mut self, id: &SessionId) -> Result<Session> {
        let index = self.sessions.iter().position(|session| &session.id == id);
        index
            .and_then(|index| self.sessions.remove(index))
            .ok_or_else(|| SessionError::NotFound { id: id.to_string() }.into())
    }

    /// Sessions whose label contains `query`, case-insensitively, newest first
    pub fn find_by_name(&self, query: &str) -> Vec<&Session> {
        let query = query.to_lowercase();
        self.sessions
            .iter()
            .rev()
            .filter(|session| {
                session
                    .inputs
                    .name
                    .as_deref()
                    .is_some_and(|name| name.to_lowercase().contains(&query))
            })
            .collect()
    }

    /// Drop every session, returning how many were removed
    pub fn clear(&mut self) -> usize {
        let removed = self.sessions.len();
        self.sessions.clear();
        info!(removed, "Session history cleared");
        removed
    }

    fn evict(&mut self) {
        while self.sessions.len() > self.max_history {
            if let Some(evicted) = self.sessions.pop_front() {
                debug!(session_id = %evicted.id, "Evicted oldest session from history");
            }
        }
    }
}

impl SessionStore for InMemorySessionStore {
    fn save(&mut self, inputs: UserInputs, results: CalculationResults) -> Result<SessionId> {
        let id = SessionId::new();
        self.sessions.push_back(Session {
            id: id.clone(),
            created_at: Utc::now(),
            inputs,
            results,
        });
        self.total_sessions += 1;
        self.evict();

        info!(session_id = %id, total = self.total_sessions, "Session saved");
        Ok(id)
    }

    fn get(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.iter().find(|session| &session.id == id)
    }

    fn list(&self) -> Vec<&Session> {
        self.sessions.iter().collect()
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}

/// JSON file backing for the in-memory history
pub struct JsonSessionFile {
    path: PathBuf,
}

impl JsonSessionFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Default history location under the user's data directory
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("caltrak")
            .join("sessions.json")
    }

    /// Load the history, or an empty store if the file does not exist yet
    pub fn load(&self, max_history: usize) -> Result<InMemorySessionStore> {
        if !self.path.exists() {
            return Ok(InMemorySessionStore::new(max_history));
        }

        let content = fs::read_to_string(&self.path).map_err(|e| self.storage_error(e))?;
        let mut store: InMemorySessionStore =
            serde_json::from_str(&content).map_err(|e| self.storage_error(e))?;
        store.set_max_history(max_history);

        debug!(path = %self.path.display(), sessions = store.len(), "Loaded session history");
        Ok(store)
    }

    /// Write the whole history back to disk
    pub fn save(&self, store: &InMemorySessionStore) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(store).map_err(|e| self.storage_error(e))?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn storage_error(&self, err: impl std::fmt::Display) -> CaltrakError {
        SessionError::Storage {
            path: self.path.clone(),
            reason: err.to_string(),
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic::compute;
    use crate::models::{ActivityLevel, Gender, Goal, UnitSystem};

    fn sample(weight: f64) -> (UserInputs, CalculationResults) {
        let inputs = UserInputs::new(
            UnitSystem::Metric,
            Gender::Male,
            weight,
            18.0,
            ActivityLevel::Moderate,
            Goal::Recomp,
        );
        let results = compute(&inputs);
        (inputs, results)
    }

    #[test]
    fn test_save_and_get() {
        let mut store = InMemorySessionStore::default();
        let (inputs, results) = sample(80.0);
        let id = store.save(inputs.clone(), results.clone()).unwrap();

        let session = store.get(&id).unwrap();
        assert_eq!(session.inputs, inputs);
        assert_eq!(session.results, results);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_history_cap_evicts_oldest() {
        let mut store = InMemorySessionStore::new(3);
        let mut ids = Vec::new();
        for weight in [70.0, 75.0, 80.0, 85.0] {
            let (inputs, results) = sample(weight);
            ids.push(store.save(inputs, results).unwrap());
        }

        assert_eq!(store.len(), 3);
        assert_eq!(store.total_sessions(), 4);
        assert!(store.get(&ids[0]).is_none());
        assert_eq!(store.list()[0].inputs.weight, 75.0);
    }

    #[test]
    fn test_remove_unknown_session() {
        let mut store = InMemorySessionStore::default();
        let err = store.remove(&SessionId::from("missing")).unwrap_err();
        assert!(matches!(err, CaltrakError::Session(SessionError::NotFound { .. })));
    }

    #[test]
    fn test_find_by_name_and_clear() {
        let mut store = InMemorySessionStore::default();
        for (name, weight) in [("Priya S", 60.0), ("Marco", 82.0), ("priya k", 58.0)] {
            let (inputs, results) = sample(weight);
            store.save(inputs.with_name(name), results).unwrap();
        }
        let (inputs, results) = sample(70.0);
        store.save(inputs, results).unwrap();

        let found: Vec<_> = store
            .find_by_name("PRIYA")
            .iter()
            .map(|s| s.inputs.name.as_deref().unwrap_or_default())
            .collect();
        assert_eq!(found, vec!["priya k", "Priya S"]);
        assert!(store.find_by_name("nobody").is_empty());

        assert_eq!(store.clear(), 4);
        assert!(store.is_empty());
        assert_eq!(store.total_sessions(), 4);
    }

    #[test]
    fn test_json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let file = JsonSessionFile::new(dir.path().join("history").join("sessions.json"));

        let mut store = file.load(10).unwrap();
        assert!(store.is_empty());

        let (inputs, results) = sample(90.0);
        let id = store.save(inputs, results).unwrap();
        file.save(&store).unwrap();

        let reloaded = file.load(10).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.get(&id).is_some());
    }
}
