use crate::types::{ExitCode, SignalNumber};
use std::fmt;

/// Termination state of a job. Once it leaves `Running` it never changes again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Exited { code: ExitCode },
    Killed { signal: SignalNumber },
}

impl JobStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, JobStatus::Running)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Running => write!(f, "running"),
            JobStatus::Exited { code } => write!(f, "exited({})", code),
            JobStatus::Killed { signal } => write!(f, "signalled({})", signal),
        }
    }
}

/// Outcome of a single non-blocking line read from a job.
///
/// Lines carry the child's bytes as written, without the trailing newline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Received {
    Line(Vec<u8>),
    NoInput,
    Eof,
}

impl Received {
    /// The text shown to the operator.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Received::Line(line) => line,
            Received::NoInput => b"<no input>".to_vec(),
            Received::Eof => b"<EOF>".to_vec(),
        }
    }
}
