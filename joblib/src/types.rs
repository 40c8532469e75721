use nix::unistd::Pid;
use std::ffi::OsString;

pub type Program = OsString;
pub type Args = Vec<OsString>;
pub type JobId = usize;
pub type ProcessId = Pid;
pub type SignalNumber = i32;
pub type ExitCode = i32;
