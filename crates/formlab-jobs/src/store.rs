//! Job and result storage.
//!
//! Jobs live in memory only: each job sits behind its own mutex so status
//! and progress change together and different jobs never contend. Results
//! can additionally be persisted as one JSON file per job.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use async_trait::async_trait;
use tracing::{debug, warn};

use formlab_core::{AnalysisResult, Error, Job, JobErrorKind, JobId, Result};

// =============================================================================
// JOBS
// =============================================================================

/// A lifecycle change applied atomically to one job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobUpdate {
    Start,
    Progress(i32),
    Complete { result_id: String },
    Fail { kind: JobErrorKind, message: String },
}

impl JobUpdate {
    fn apply(self, job: &mut Job) -> Result<()> {
        match self {
            JobUpdate::Start => job.start(),
            JobUpdate::Progress(percent) => job.advance(percent).map(|_| ()),
            JobUpdate::Complete { result_id } => job.complete(result_id),
            JobUpdate::Fail { kind, message } => job.fail(kind, message),
        }
    }
}

/// Storage for job lifecycle records.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Insert a new job; fails if the id already exists.
    async fn insert(&self, job: Job) -> Result<()>;

    async fn get(&self, id: &JobId) -> Result<Option<Job>>;

    /// Apply a transition and return the updated job.
    async fn apply(&self, id: &JobId, update: JobUpdate) -> Result<Job>;

    /// Remove a job; returns whether it existed.
    async fn delete(&self, id: &JobId) -> Result<bool>;

    async fn list(&self) -> Result<Vec<Job>>;
}

fn lock_job(job: &Mutex<Job>) -> MutexGuard<'_, Job> {
    job.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory job store.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, Arc<Mutex<Job>>>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, id: &JobId) -> Option<Arc<Mutex<Job>>> {
        self.jobs
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(id)
            .cloned()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobStore {
    async fn insert(&self, job: Job) -> Result<()> {
        let mut jobs = self
            .jobs
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if jobs.contains_key(job.id()) {
            return Err(Error::InvalidInput(format!("Job {} already exists", job.id())));
        }
        jobs.insert(job.id().clone(), Arc::new(Mutex::new(job)));
        Ok(())
    }

    async fn get(&self, id: &JobId) -> Result<Option<Job>> {
        Ok(self.entry(id).map(|job| lock_job(&job).clone()))
    }

    async fn apply(&self, id: &JobId, update: JobUpdate) -> Result<Job> {
        let entry = self
            .entry(id)
            .ok_or_else(|| Error::NotFound(format!("Job {}", id)))?;
        let mut job = lock_job(&entry);
        update.apply(&mut job)?;
        Ok(job.clone())
    }

    async fn delete(&self, id: &JobId) -> Result<bool> {
        Ok(self
            .jobs
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(id)
            .is_some())
    }

    async fn list(&self) -> Result<Vec<Job>> {
        let entries: Vec<Arc<Mutex<Job>>> = self
            .jobs
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .cloned()
            .collect();
        let mut jobs: Vec<Job> = entries.iter().map(|job| lock_job(job).clone()).collect();
        jobs.sort_by(|a, b| a.created_at().cmp(&b.created_at()));
        Ok(jobs)
    }
}

// =============================================================================
// RESULTS
// =============================================================================

/// Storage for analysis results, keyed by job id.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Check that a result for `job_id` could be stored, before any work is done for it.
    fn validate_key(&self, _job_id: &JobId) -> Result<()> {
        Ok(())
    }

    /// Store a result. Concurrent writes for one job are last-write-wins.
    async fn put(&self, result: AnalysisResult) -> Result<()>;

    async fn get(&self, job_id: &JobId) -> Result<Option<AnalysisResult>>;

    async fn delete(&self, job_id: &JobId) -> Result<bool>;
}

/// In-memory result store.
#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    results: RwLock<HashMap<JobId, AnalysisResult>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultRepository for InMemoryResultStore {
    async fn put(&self, result: AnalysisResult) -> Result<()> {
        self.results
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(result.job_id.clone(), result);
        Ok(())
    }

    async fn get(&self, job_id: &JobId) -> Result<Option<AnalysisResult>> {
        Ok(self
            .results
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(job_id)
            .cloned())
    }

    async fn delete(&self, job_id: &JobId) -> Result<bool> {
        Ok(self
            .results
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(job_id)
            .is_some())
    }
}

/// Longest file name most filesystems accept.
const MAX_FILE_NAME: usize = 255;

/// Results as one JSON file per job, with an in-memory cache in front.
///
/// Ids made of ASCII letters, digits, `-` and `_` are stored as `{job_id}.json`.
/// Any other id is hex-encoded as `{hex}.hex.json`; plain ids never contain a
/// dot, so the two forms cannot collide.
#[derive(Debug)]
pub struct FileResultStore {
    dir: PathBuf,
    cache: InMemoryResultStore,
    // Serializes disk and cache updates so both always agree on the latest write.
    write_lock: tokio::sync::Mutex<()>,
}

impl FileResultStore {
    /// Open (creating if needed) a results directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            Error::Storage(format!("Cannot create results directory {}: {}", dir.display(), e))
        })?;
        Ok(Self {
            dir,
            cache: InMemoryResultStore::new(),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name(job_id: &JobId) -> Result<String> {
        let id = job_id.as_str();
        if id.is_empty() {
            return Err(Error::InvalidInput("Job id must not be empty".to_string()));
        }
        let plain = id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        let name = if plain {
            format!("{}.json", id)
        } else {
            format!("{}.hex.json", hex::encode(id.as_bytes()))
        };
        if name.len() > MAX_FILE_NAME {
            return Err(Error::InvalidInput(format!(
                "Job id too long to persist ({} bytes)",
                id.len()
            )));
        }
        Ok(name)
    }

    /// File path for a job's result. Always a direct child of the results directory.
    fn path_for(&self, job_id: &JobId) -> Result<PathBuf> {
        Ok(self.dir.join(Self::file_name(job_id)?))
    }
}

/// Write `bytes` to `path` through a temp file in the same directory.
fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl ResultRepository for FileResultStore {
    fn validate_key(&self, job_id: &JobId) -> Result<()> {
        Self::file_name(job_id).map(|_| ())
    }

    async fn put(&self, result: AnalysisResult) -> Result<()> {
        let path = self.path_for(&result.job_id)?;
        let bytes = serde_json::to_vec_pretty(&result)?;
        let dir = self.dir.clone();
        let target = path.clone();

        let _guard = self.write_lock.lock().await;
        tokio::task::spawn_blocking(move || write_atomic(&dir, &target, &bytes))
            .await
            .map_err(|e| Error::Storage(format!("Result write task failed: {}", e)))?
            .map_err(|e| Error::Storage(format!("Cannot write result {}: {}", path.display(), e)))?;

        debug!(job_id = %result.job_id, path = %path.display(), "Persisted result");
        self.cache.put(result).await
    }

    async fn get(&self, job_id: &JobId) -> Result<Option<AnalysisResult>> {
        if let Some(hit) = self.cache.get(job_id).await? {
            return Ok(Some(hit));
        }
        let Ok(path) = self.path_for(job_id) else {
            return Ok(None);
        };

        let _guard = self.write_lock.lock().await;
        if let Some(hit) = self.cache.get(job_id).await? {
            return Ok(Some(hit));
        }
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::Storage(format!(
                    "Cannot read result {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        let result: AnalysisResult = serde_json::from_slice(&bytes)?;
        self.cache.put(result.clone()).await?;
        Ok(Some(result))
    }

    async fn delete(&self, job_id: &JobId) -> Result<bool> {
        let Ok(path) = self.path_for(job_id) else {
            return Ok(false);
        };

        let _guard = self.write_lock.lock().await;
        let cached = self.cache.delete(job_id).await?;
        let on_disk = match tokio::fs::remove_file(&path).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "Failed to remove result file");
                return Err(Error::Storage(format!(
                    "Cannot remove result {}: {}",
                    path.display(),
                    e
                )));
            }
        };
        Ok(cached || on_disk)
    }
}
