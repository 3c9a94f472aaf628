//! Snapshot persistence gateway.
//!
//! # Responsibility
//! - Load and save the full ordered task list as one snapshot.
//! - Encode snapshots as a versioned JSON envelope in a key-value repository.
//!
//! # Invariants
//! - `save` overwrites the previous snapshot as a whole.
//! - `load` never returns a snapshot containing invalid tasks or duplicate IDs.
//! - Snapshots written by a newer schema are rejected, not partially read.

use crate::model::task::{Task, TaskId};
use crate::repo::kv_repo::{KvRepository, RepoError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Envelope version written by this build.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;
/// Key the task snapshot is stored under by default.
pub const DEFAULT_SNAPSHOT_KEY: &str = "tasks";

pub type PersistResult<T> = Result<T, PersistError>;

/// Snapshot load/save failures.
#[derive(Debug)]
pub enum PersistError {
    Repo(RepoError),
    Encode(serde_json::Error),
    Decode(serde_json::Error),
    UnsupportedSchemaVersion { found: u32, supported: u32 },
    DuplicateTaskId(TaskId),
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode task snapshot: {err}"),
            Self::Decode(err) => write!(f, "failed to decode task snapshot: {err}"),
            Self::UnsupportedSchemaVersion { found, supported } => write!(
                f,
                "task snapshot schema version {found} is newer than supported {supported}"
            ),
            Self::DuplicateTaskId(id) => write!(f, "task snapshot contains duplicate id {id}"),
        }
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Encode(err) | Self::Decode(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::DuplicateTaskId(_) => None,
        }
    }
}

impl From<RepoError> for PersistError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Whole-snapshot persistence contract.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Returns the last saved snapshot, or `None` when nothing was saved yet.
    async fn load(&self) -> PersistResult<Option<Vec<Task>>>;

    /// Replaces the stored snapshot with `tasks`.
    async fn save(&self, tasks: &[Task]) -> PersistResult<()>;
}

#[derive(Serialize)]
struct SnapshotEnvelopeRef<'a> {
    schema_version: u32,
    tasks: &'a [Task],
}

#[derive(Deserialize)]
struct SnapshotHeader {
    schema_version: u32,
}

#[derive(Deserialize)]
struct SnapshotEnvelope {
    tasks: Vec<Task>,
}

/// Persistence gateway storing the snapshot as JSON under one key.
pub struct KvSnapshotGateway<R: KvRepository> {
    repo: R,
    key: String,
}

impl<R: KvRepository> KvSnapshotGateway<R> {
    /// Uses `DEFAULT_SNAPSHOT_KEY`.
    pub fn new(repo: R) -> Self {
        Self::with_key(repo, DEFAULT_SNAPSHOT_KEY)
    }

    pub fn with_key(repo: R, key: impl Into<String>) -> Self {
        Self {
            repo,
            key: key.into(),
        }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn key(&self) -> &str {
        self.key.as_str()
    }
}

#[async_trait]
impl<R: KvRepository> PersistenceGateway for KvSnapshotGateway<R> {
    async fn load(&self) -> PersistResult<Option<Vec<Task>>> {
        match self.repo.get(self.key.as_str())? {
            Some(raw) => decode_snapshot(raw.as_str()).map(Some),
            None => Ok(None),
        }
    }

    async fn save(&self, tasks: &[Task]) -> PersistResult<()> {
        let raw = encode_snapshot(tasks)?;
        self.repo.put(self.key.as_str(), raw.as_str())?;
        Ok(())
    }
}

/// Serializes tasks into the versioned snapshot envelope.
pub fn encode_snapshot(tasks: &[Task]) -> PersistResult<String> {
    serde_json::to_string(&SnapshotEnvelopeRef {
        schema_version: SNAPSHOT_SCHEMA_VERSION,
        tasks,
    })
    .map_err(PersistError::Encode)
}

/// Parses a snapshot envelope, validating version, records and ID uniqueness.
pub fn decode_snapshot(raw: &str) -> PersistResult<Vec<Task>> {
    let header: SnapshotHeader = serde_json::from_str(raw).map_err(PersistError::Decode)?;
    if header.schema_version > SNAPSHOT_SCHEMA_VERSION {
        return Err(PersistError::UnsupportedSchemaVersion {
            found: header.schema_version,
            supported: SNAPSHOT_SCHEMA_VERSION,
        });
    }

    let envelope: SnapshotEnvelope = serde_json::from_str(raw).map_err(PersistError::Decode)?;
    let mut seen = HashSet::with_capacity(envelope.tasks.len());
    if let Some(duplicate) = envelope.tasks.iter().find(|task| !seen.insert(task.id)) {
        return Err(PersistError::DuplicateTaskId(duplicate.id));
    }

    Ok(envelope.tasks)
}
