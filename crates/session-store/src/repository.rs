//! Repository Implementation

use crate::StorageError;
use chrono::{DateTime, Utc};
use exercise_engine::SessionSummary;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Default number of sessions kept
const DEFAULT_MAX_RECORDS: usize = 1_000;

/// Stored session totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: u64,
    pub exercise: String,
    pub valid_reps: u32,
    pub invalid_reps: u32,
    pub total_reps: u32,
    pub target_reps: u32,
    pub extremum: Option<f64>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl SessionRecord {
    fn from_summary(id: u64, summary: &SessionSummary, completed_at: DateTime<Utc>) -> Self {
        Self {
            id,
            exercise: summary.exercise.clone(),
            valid_reps: summary.valid_reps,
            invalid_reps: summary.invalid_reps,
            total_reps: summary.total_reps,
            target_reps: summary.target_reps,
            extremum: summary.extremum,
            started_at: summary.started_at,
            completed_at,
        }
    }
}

/// Sink for completed sessions; the engine never reads it back
pub trait SessionStore: Send + Sync {
    /// Persist final totals, returning the assigned record id
    fn save(&self, summary: &SessionSummary) -> Result<u64, StorageError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Inner {
    next_id: u64,
    records: VecDeque<SessionRecord>,
}

/// In-memory session repository with bounded retention
pub struct SessionRepository {
    inner: Mutex<Inner>,
    /// Oldest records are dropped past this count
    max_records: usize,
}

impl SessionRepository {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_RECORDS)
    }

    pub fn with_capacity(max_records: usize) -> Self {
        info!("Creating in-memory session repository (max {} records)", max_records);
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                records: VecDeque::new(),
            }),
            max_records: max_records.max(1),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StorageError> {
        self.inner.lock().map_err(|e| StorageError::Lock(e.to_string()))
    }

    /// Most recently saved session
    pub fn latest(&self) -> Result<Option<SessionRecord>, StorageError> {
        Ok(self.lock()?.records.back().cloned())
    }

    /// Up to `limit` sessions, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<SessionRecord>, StorageError> {
        Ok(self.lock()?.records.iter().rev().take(limit).cloned().collect())
    }

    pub fn get(&self, id: u64) -> Result<SessionRecord, StorageError> {
        self.lock()?
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StorageError::NotFound(id))
    }

    pub fn count(&self) -> usize {
        self.inner.lock().map(|inner| inner.records.len()).unwrap_or(0)
    }

    /// Drop every record; ids keep increasing
    pub fn clear(&self) -> Result<(), StorageError> {
        self.lock()?.records.clear();
        Ok(())
    }

    /// Encode the whole store with postcard
    pub fn snapshot(&self) -> Result<Vec<u8>, StorageError> {
        let inner = self.lock()?;
        let bytes = postcard::to_allocvec(&*inner)?;
        debug!("Snapshot of {} sessions ({} bytes)", inner.records.len(), bytes.len());
        Ok(bytes)
    }

    /// Rebuild a repository from [`snapshot`](Self::snapshot) output
    pub fn restore(bytes: &[u8]) -> Result<Self, StorageError> {
        let inner: Inner = postcard::from_bytes(bytes)?;
        info!("Restored {} sessions", inner.records.len());
        Ok(Self {
            max_records: DEFAULT_MAX_RECORDS.max(inner.records.len()),
            inner: Mutex::new(inner),
        })
    }

    /// Load the snapshot file at `path`, or start empty if there is none
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        match std::fs::read(path) {
            Ok(bytes) => Self::restore(&bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No session file at {}, starting empty", path.display());
                Ok(Self::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write a snapshot to `path`, replacing the previous file
    pub fn persist(&self, path: &Path) -> Result<(), StorageError> {
        let bytes = self.snapshot()?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, &bytes)?;
        std::fs::rename(&tmp, path)?;
        info!("Wrote {} sessions to {}", self.count(), path.display());
        Ok(())
    }
}

impl SessionStore for SessionRepository {
    fn save(&self, summary: &SessionSummary) -> Result<u64, StorageError> {
        let mut inner = self.lock()?;

        let id = inner.next_id;
        inner.next_id += 1;

        // Enforce retention
        while inner.records.len() >= self.max_records {
            inner.records.pop_front();
        }

        inner.records.push_back(SessionRecord::from_summary(id, summary, Utc::now()));
        info!(
            "Saved session {}: {} {}/{} valid",
            id, summary.exercise, summary.valid_reps, summary.total_reps
        );
        Ok(id)
    }
}

impl Default for SessionRepository {
    fn default() -> Self {
        Self::new()
    }
}
