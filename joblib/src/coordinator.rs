use crate::backend::{Backend, ForkBackend, Launched};
use crate::error::{Error, Result};
use crate::events::{JobStatus, Received};
use crate::table::JobTable;
use crate::tracker;
use crate::types::JobId;
use nix::sys::signal::Signal;
use std::ffi::{OsStr, OsString};
use std::io;
use std::os::unix::ffi::OsStrExt;
use tracing::{debug, info, warn};

/// A `JobCoordinator` which provides functionality for managing jobs and querying job state.
///
/// It exclusively owns the job table. Every operation runs to completion on the
/// caller's thread; job status is only refreshed when an operation asks for it.
#[derive(Debug, Default)]
pub struct JobCoordinator<B: Backend = ForkBackend> {
    jobs: JobTable,
    backend: B,
}

impl JobCoordinator<ForkBackend> {
    /// A coordinator that launches real processes.
    pub fn new() -> Self {
        Self::with_backend(ForkBackend)
    }
}

impl<B: Backend> JobCoordinator<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            jobs: JobTable::new(),
            backend,
        }
    }

    pub fn jobs(&self) -> &JobTable {
        &self.jobs
    }

    #[cfg(test)]
    pub(crate) fn backend(&self) -> &B {
        &self.backend
    }

    #[cfg(test)]
    pub(crate) fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// start a new job.
    pub fn start_job(&mut self, cmd: impl AsRef<OsStr>, args: &[OsString]) -> Result<JobId> {
        let cmd = cmd.as_ref();
        if cmd.is_empty() {
            return Err(Error::InsufficientArguments);
        }
        let inherited = self.jobs.inherited_fds();
        let Launched { pid, input, output } = self.backend.launch(cmd, args, &inherited)?;
        let job_id = self.jobs.push(pid, cmd.to_os_string(), input, output);
        info!(job_id, %pid, program = %cmd.to_string_lossy(), "job started");
        Ok(job_id)
    }

    /// Current status of a job, polling its process first.
    pub fn job_status(&mut self, job_id: JobId) -> Result<JobStatus> {
        let job = self.jobs.get_mut(job_id)?;
        Ok(tracker::refresh(job, &mut self.backend))
    }

    /// Deliver `signal` to the job's process unless it has already terminated.
    pub fn signal_job(&mut self, job_id: JobId, signal: Signal) -> Result<()> {
        let job = self.jobs.get_mut(job_id)?;
        if tracker::refresh(job, &mut self.backend).is_running() {
            debug!(job_id, %signal, "delivering signal");
            self.backend.signal(job.pid(), signal)?;
        }
        Ok(())
    }

    /// Write one line to the job's stdin.
    ///
    /// Terminated jobs and jobs whose input was closed are skipped silently. So
    /// is a child that stopped reading (broken pipe), which is only logged.
    pub fn send_line(&mut self, job_id: JobId, text: impl AsRef<OsStr>) -> Result<()> {
        let text = text.as_ref().as_bytes();
        let job = self.jobs.get_mut(job_id)?;
        if !tracker::refresh(job, &mut self.backend).is_running() {
            debug!(job_id, "job is not running, not sending");
            return Ok(());
        }
        match job.write_line(text) {
            Ok(true) => debug!(job_id, bytes = text.len() + 1, "sent line"),
            Ok(false) => debug!(job_id, "job input is closed, not sending"),
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
                warn!(job_id, "job is no longer reading its input");
            }
            Err(err) => return Err(err.into()),
        }
        Ok(())
    }

    /// Read one line of the job's output without waiting for the child.
    pub fn receive_line(&mut self, job_id: JobId) -> Result<Received> {
        let job = self.jobs.get_mut(job_id)?;
        Ok(job.read_line()?)
    }

    /// Close the job's stdin so the child sees end-of-file.
    pub fn close_input(&mut self, job_id: JobId) -> Result<()> {
        self.jobs.get_mut(job_id)?.close_input();
        Ok(())
    }

    /// Kill and reap every job that is still running. Records are kept.
    pub fn cleanup(&mut self) {
        for job in self.jobs.iter_mut() {
            if !tracker::refresh(job, &mut self.backend).is_running() {
                continue;
            }
            match self.backend.kill_and_wait(job.pid()) {
                Ok(status) => {
                    info!(job_id = job.id(), pid = %job.pid(), %status, "job killed");
                    job.set_status(status);
                }
                Err(err) => {
                    warn!(job_id = job.id(), pid = %job.pid(), error = %err, "failed to kill job");
                }
            }
        }
    }
}
