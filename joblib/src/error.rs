use std::{ffi, io, result};
use thiserror;

/// Everything a job operation can fail with.
///
/// The first five variants are operator mistakes; their `Display` text is what
/// the supervisor prints after `Error: `. The rest wrap OS-level failures.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Insufficient arguments")]
    InsufficientArguments,
    #[error("Invalid job")]
    InvalidJob,
    #[error("Invalid signal")]
    InvalidSignal,
    #[error("Invalid command")]
    InvalidCommand,
    #[error("Invalid sleep time")]
    InvalidSleepTime,
    #[error("argument contains a NUL byte")]
    Nul(#[from] ffi::NulError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("system error: {0}")]
    Sys(#[from] nix::errno::Errno),
}

impl Error {
    /// True for errors caused by malformed operator input rather than the OS.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Error::InsufficientArguments
                | Error::InvalidJob
                | Error::InvalidSignal
                | Error::InvalidCommand
                | Error::InvalidSleepTime
        )
    }
}

pub type Result<T> = result::Result<T, Error>;
