use crate::backend::Backend;
use crate::events::JobStatus;
use crate::job::Job;
use tracing::{info, warn};

/// Poll a job's process without blocking and record how it ended, if it has.
///
/// Jobs that already terminated are left alone, so this is safe to call before
/// every operation on a job.
pub fn refresh<B: Backend + ?Sized>(job: &mut Job, backend: &mut B) -> JobStatus {
    if !job.status().is_running() {
        return job.status();
    }
    match backend.try_wait(job.pid()) {
        Ok(Some(status)) => {
            info!(job_id = job.id(), pid = %job.pid(), %status, "job terminated");
            job.set_status(status);
        }
        Ok(None) => {}
        Err(err) => {
            warn!(job_id = job.id(), pid = %job.pid(), error = %err, "failed to poll job");
        }
    }
    job.status()
}
