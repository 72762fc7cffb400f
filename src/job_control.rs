use std::fmt;
use std::process::Child;

use log::{debug, error, warn};

use crate::core::job::{FinishedJob, Job, ProcessId};

/// Tracks background jobs until their termination is observed.
///
/// Only processes handed to [`JobTable::track`] are ever waited on here;
/// foreground children are waited for directly by the executor. The table is
/// owned by the single interpreter thread, so it needs no locking.
#[derive(Default)]
pub struct JobTable {
    jobs: Vec<Job>,
    /// Left-hand sides of finished background pipelines still running.
    stragglers: Vec<Child>,
}

impl JobTable {
    pub fn new() -> Self {
        Default::default()
    }

    /// Starts tracking `child` under `label`, returning its process id.
    pub fn track<S: Into<String>>(&mut self, child: Child, label: S) -> ProcessId {
        self.add(Job::new(child, label))
    }

    /// Tracks the right-hand `child` of a background pipeline. `upstream` is
    /// kept so it can be reclaimed, but is not listed as a job.
    pub fn track_pipeline<S: Into<String>>(
        &mut self,
        child: Child,
        upstream: Child,
        label: S,
    ) -> ProcessId {
        self.add(Job::new(child, label).with_upstream(upstream))
    }

    fn add(&mut self, job: Job) -> ProcessId {
        let id = job.id();
        debug!("tracking background job {:?}", job);
        self.jobs.push(job);
        id
    }

    pub fn has_jobs(&self) -> bool {
        !self.jobs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn contains(&self, id: ProcessId) -> bool {
        self.jobs.iter().any(|job| job.id() == id)
    }

    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    /// Removes every tracked job whose process has terminated, without
    /// blocking, and returns them.
    pub fn reap_completed(&mut self) -> Vec<FinishedJob> {
        let mut finished = Vec::new();
        let mut released = Vec::new();
        self.jobs.retain_mut(|job| match job.try_wait() {
            Ok(Some(status)) => {
                debug!("{} exited with {}.", job.id(), status);
                released.extend(job.take_upstream());
                finished.push(FinishedJob {
                    id: job.id(),
                    label: job.label().to_string(),
                    status,
                });
                false
            }
            Ok(None) => true,
            Err(e) => {
                error!("failed to check on job {}: {}", job.id(), e);
                true
            }
        });

        self.stragglers.extend(released);
        self.stragglers.retain_mut(|child| match child.try_wait() {
            Ok(Some(status)) => {
                debug!("pipeline stage {} exited with {}.", child.id(), status);
                false
            }
            Ok(None) => true,
            Err(e) => {
                warn!("dropping pipeline stage {}: {}", child.id(), e);
                false
            }
        });

        finished
    }
}

impl fmt::Debug for JobTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "{} jobs\tstragglers: {}",
            self.jobs.len(),
            self.stragglers.len()
        )?;
        for job in &self.jobs {
            writeln!(f, "{:?}", job)?;
        }

        Ok(())
    }
}
