use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::workflows::enrolment::form::FormValues;

/// Crash-recovery snapshot of an in-progress application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub step_index: u8,
    pub completed_steps: BTreeSet<u8>,
    pub form_values: FormValues,
    pub saved_at: DateTime<Utc>,
}

impl Draft {
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.saved_at)
    }

    pub fn is_expired(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        self.age(now) > max_age
    }
}

#[derive(Debug, Error)]
pub enum DraftStoreError {
    #[error("draft file {path} could not be accessed")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("draft could not be encoded or decoded")]
    Serialization(#[from] serde_json::Error),
}

/// Durable slot holding at most one draft.
pub trait DraftStore: Send + Sync {
    fn get(&self) -> Result<Option<Draft>, DraftStoreError>;
    fn set(&self, draft: &Draft) -> Result<(), DraftStoreError>;
    fn clear(&self) -> Result<(), DraftStoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    slot: Mutex<Option<Draft>>,
    writes: Mutex<usize>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_draft(draft: Draft) -> Self {
        Self {
            slot: Mutex::new(Some(draft)),
            writes: Mutex::new(0),
        }
    }

    /// Number of successful `set` calls.
    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn peek(&self) -> Option<Draft> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DraftStore for MemoryDraftStore {
    fn get(&self) -> Result<Option<Draft>, DraftStoreError> {
        Ok(self.peek())
    }

    fn set(&self, draft: &Draft) -> Result<(), DraftStoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(draft.clone());
        *self.writes.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }

    fn clear(&self) -> Result<(), DraftStoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Draft kept as pretty JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileDraftStore {
    path: PathBuf,
}

impl JsonFileDraftStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> DraftStoreError {
        DraftStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl DraftStore for JsonFileDraftStore {
    fn get(&self) -> Result<Option<Draft>, DraftStoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.io_error(err)),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn set(&self, draft: &Draft) -> Result<(), DraftStoreError> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }
        let body = serde_json::to_string_pretty(draft)?;
        fs::write(&self.path, body).map_err(|err| self.io_error(err))
    }

    fn clear(&self) -> Result<(), DraftStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.io_error(err)),
        }
    }
}
