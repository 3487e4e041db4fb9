use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use engine::StitchRequest;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::stitch::VideoStitcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Generate,
    Stitch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub kind: JobKind,
    pub status: JobStatus,
    /// 0..=100
    pub progress: u8,
    pub payload: Option<Value>,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(kind: JobKind, payload: Option<Value>) -> Self {
        Job {
            id: Uuid::new_v4(),
            kind,
            status: JobStatus::Pending,
            progress: 0,
            payload,
            result: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn start(&mut self, progress: u8) {
        self.status = JobStatus::Processing;
        self.progress = progress.min(100);
    }

    pub fn complete(&mut self, result: Option<Value>) {
        self.status = JobStatus::Completed;
        self.progress = 100;
        self.result = result;
        self.completed_at = Some(Utc::now());
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(Utc::now());
    }
}

/// Storage for job records. The in-memory store can be swapped for a
/// persistent one without touching callers.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Job>>;

    /// Insert or replace.
    async fn put(&self, job: Job) -> Result<()>;

    /// Replace an existing job in one step. Returns `false`, storing nothing,
    /// when the job is no longer there.
    async fn update(&self, job: Job) -> Result<bool>;

    /// Remove and return the job, if it existed.
    async fn delete(&self, id: Uuid) -> Result<Option<Job>>;

    /// All jobs, newest first.
    async fn list(&self) -> Result<Vec<Job>>;
}

#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<Uuid, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn get(&self, id: Uuid) -> Result<Option<Job>> {
        Ok(self.jobs.read().await.get(&id).cloned())
    }

    async fn put(&self, job: Job) -> Result<()> {
        self.jobs.write().await.insert(job.id, job);
        Ok(())
    }

    async fn update(&self, job: Job) -> Result<bool> {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(&job.id) {
            Some(slot) => {
                *slot = job;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Job>> {
        Ok(self.jobs.write().await.remove(&id))
    }

    async fn list(&self) -> Result<Vec<Job>> {
        let mut jobs: Vec<Job> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }
}

/// Runs stitches in the background and records their lifecycle in a [`JobStore`].
pub struct StitchJobRunner {
    store: Arc<dyn JobStore>,
    stitcher: Arc<VideoStitcher>,
}

impl StitchJobRunner {
    pub fn new(store: Arc<dyn JobStore>, stitcher: Arc<VideoStitcher>) -> Self {
        StitchJobRunner { store, stitcher }
    }

    /// Record a pending job and start the stitch. The returned handle resolves
    /// once the job reached `Completed` or `Failed`.
    pub async fn submit(&self, request: StitchRequest) -> Result<(Uuid, JoinHandle<()>)> {
        let job = Job::new(JobKind::Stitch, Some(serde_json::to_value(&request)?));
        let job_id = job.id;
        self.store.put(job).await?;
        info!("Created stitch job {} for {} inputs", job_id, request.inputs.len());

        let store = self.store.clone();
        let stitcher = self.stitcher.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = run_stitch_job(store, stitcher, job_id, request).await {
                warn!("Job {}: could not record job state: {:#}", job_id, e);
            }
        });

        Ok((job_id, handle))
    }
}

async fn run_stitch_job(
    store: Arc<dyn JobStore>,
    stitcher: Arc<VideoStitcher>,
    job_id: Uuid,
    request: StitchRequest,
) -> Result<()> {
    let mut job = store
        .get(job_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Job {} not found", job_id))?;
    job.start(10);
    if !store.update(job.clone()).await? {
        info!("Job {}: deleted before it started", job_id);
        return Ok(());
    }

    match stitcher.stitch(&request).await {
        Ok(result) => {
            job.complete(Some(serde_json::to_value(&result)?));
            info!("Job {}: Completed successfully", job_id);
        }
        Err(e) => {
            job.fail(e.to_string());
            warn!("Job {}: Stitching failed - {}", job_id, e);
        }
    }

    if !store.update(job).await? {
        info!("Job {}: deleted while running, result discarded", job_id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StitcherConfig;

    #[tokio::test]
    async fn store_round_trip() {
        let store = InMemoryJobStore::new();
        let first = Job::new(JobKind::Generate, None);
        let mut second = Job::new(JobKind::Stitch, None);
        second.created_at = first.created_at + chrono::Duration::seconds(5);

        store.put(first.clone()).await.unwrap();
        store.put(second.clone()).await.unwrap();

        assert_eq!(store.get(first.id).await.unwrap(), Some(first.clone()));
        let listed: Vec<Uuid> = store.list().await.unwrap().iter().map(|j| j.id).collect();
        assert_eq!(listed, vec![second.id, first.id]);

        assert_eq!(store.delete(first.id).await.unwrap(), Some(first.clone()));
        assert_eq!(store.get(first.id).await.unwrap(), None);
        assert_eq!(store.delete(first.id).await.unwrap(), None);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_never_recreates_a_deleted_job() {
        let store = InMemoryJobStore::new();
        let mut job = Job::new(JobKind::Stitch, None);
        store.put(job.clone()).await.unwrap();

        job.start(40);
        assert!(store.update(job.clone()).await.unwrap());
        assert_eq!(store.get(job.id).await.unwrap().unwrap().progress, 40);

        store.delete(job.id).await.unwrap();
        job.complete(None);
        assert!(!store.update(job.clone()).await.unwrap());
        assert_eq!(store.get(job.id).await.unwrap(), None);
        assert!(store.list().await.unwrap().is_empty());
    }

    #[test]
    fn job_transitions() {
        let mut job = Job::new(JobKind::Stitch, None);
        assert_eq!(job.status, JobStatus::Pending);
        job.start(150);
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.progress, 100);
        assert!(!job.status.is_finished());

        job.fail("boom");
        assert!(job.status.is_finished());
        assert_eq!(job.error.as_deref(), Some("boom"));
        assert!(job.completed_at.is_some());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&JobStatus::Processing).unwrap(), "\"processing\"");
        assert_eq!(serde_json::to_string(&JobKind::Stitch).unwrap(), "\"stitch\"");
    }

    #[tokio::test]
    async fn runner_records_failure() {
        let dir = tempfile::tempdir().unwrap();
        let stitcher = VideoStitcher::new(StitcherConfig::default().with_output_dir(dir.path())).unwrap();
        let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
        let runner = StitchJobRunner::new(store.clone(), Arc::new(stitcher));

        let missing = dir.path().join("missing.mp4");
        let (id, handle) = runner.submit(StitchRequest::new([missing])).await.unwrap();
        handle.await.unwrap();

        let job = store.get(id).await.unwrap().unwrap();
        assert_eq!(job.kind, JobKind::Stitch);
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.error.unwrap().contains("missing.mp4"));
        assert!(job.result.is_none());
        assert_eq!(job.payload.unwrap()["inputs"][0], serde_json::json!(dir.path().join("missing.mp4")));
    }
}
