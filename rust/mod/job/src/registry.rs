use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::Notify;

use erpgen_core::now_rfc3339;

use crate::model::{JobRecord, JobState, JobStatus};

/// Process-wide job status map.
///
/// Writes come from the task running a batch; reads come from status and
/// long-poll handlers. Every transition wakes long-poll waiters.
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, JobRecord>>,
    notify: Arc<Notify>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The Notify handle long-poll readers wait on.
    pub fn notify(&self) -> &Arc<Notify> {
        &self.notify
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, JobRecord>> {
        self.jobs.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, JobRecord>> {
        self.jobs.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a new job.
    pub fn insert(&self, record: JobRecord) {
        self.write().insert(record.id.clone(), record);
        self.notify.notify_waiters();
    }

    /// Move a job to `state`, stamping start/end times. Returns `false` for
    /// unknown ids.
    pub fn set(&self, job_id: &str, state: JobState) -> bool {
        self.update(job_id, |record| record.state = state).is_some()
    }

    /// Apply `f` to a job, then stamp times for its (possibly new) state.
    pub fn update(&self, job_id: &str, f: impl FnOnce(&mut JobRecord)) -> Option<JobRecord> {
        let updated = {
            let mut jobs = self.write();
            let record = jobs.get_mut(job_id)?;
            f(record);
            let now = now_rfc3339();
            if record.state == JobState::Running && record.started_at.is_none() {
                record.started_at = Some(now.clone());
            }
            if record.state.is_terminal() && record.ended_at.is_none() {
                record.ended_at = Some(now);
            }
            record.clone()
        };
        self.notify.notify_waiters();
        Some(updated)
    }

    pub fn get(&self, job_id: &str) -> JobStatus {
        self.read()
            .get(job_id)
            .map(JobRecord::status)
            .unwrap_or(JobStatus::Unknown)
    }

    pub fn record(&self, job_id: &str) -> Option<JobRecord> {
        self.read().get(job_id).cloned()
    }

    /// All jobs, newest first.
    pub fn list(&self) -> Vec<JobRecord> {
        let mut records: Vec<JobRecord> = self.read().values().cloned().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        records
    }

    pub fn remove(&self, job_id: &str) -> Option<JobRecord> {
        self.write().remove(job_id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
