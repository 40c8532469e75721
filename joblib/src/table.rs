use crate::error::{Error, Result};
use crate::job::Job;
use crate::types::{JobId, ProcessId, Program};
use std::fs::File;
use std::os::fd::RawFd;

/// Append-only list of every job spawned so far. A job's id is its index.
#[derive(Debug, Default)]
pub struct JobTable {
    jobs: Vec<Job>,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly launched child and hand back its id.
    pub(crate) fn push(
        &mut self,
        pid: ProcessId,
        name: Program,
        input: File,
        output: File,
    ) -> JobId {
        let id = self.jobs.len();
        self.jobs.push(Job::new(id, pid, name, input, output));
        id
    }

    pub fn get(&self, id: JobId) -> Result<&Job> {
        self.jobs.get(id).ok_or(Error::InvalidJob)
    }

    pub(crate) fn get_mut(&mut self, id: JobId) -> Result<&mut Job> {
        self.jobs.get_mut(id).ok_or(Error::InvalidJob)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Job> {
        self.jobs.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Every pipe descriptor held for existing jobs. A new child must close
    /// these so it cannot keep a sibling's pipe open.
    pub fn inherited_fds(&self) -> Vec<RawFd> {
        self.jobs.iter().flat_map(Job::raw_fds).collect()
    }
}
