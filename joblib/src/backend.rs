use crate::error::Result;
use crate::events::JobStatus;
use crate::types::ProcessId;
use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, FdFlag, OFlag};
use nix::sys::signal::{self, SigHandler, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{self, fork, pipe2, ForkResult};
use std::ffi::{CStr, CString, OsStr, OsString};
use std::fs::File;
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::ffi::OsStrExt;
use std::{iter, ptr};
use tracing::debug;

/// Status a child exits with when its program image could not be replaced.
pub const EXEC_FAILURE_CODE: i32 = 99;

/// Supervisor-side ends of a freshly launched child.
#[derive(Debug)]
pub struct Launched {
    pub pid: ProcessId,
    /// Write end feeding the child's stdin.
    pub input: File,
    /// Read end draining the child's stdout.
    pub output: File,
}

/// Everything the coordinator needs from the operating system.
///
/// [`ForkBackend`] is the real thing; tests substitute a fake that never forks.
pub trait Backend {
    /// Start `program` with `args` (not including the program name itself).
    ///
    /// `inherited` lists descriptors belonging to other jobs, which the new
    /// child must not keep open.
    fn launch(
        &mut self,
        program: &OsStr,
        args: &[OsString],
        inherited: &[RawFd],
    ) -> Result<Launched>;

    /// Non-blocking reap. `None` while the process is still alive.
    fn try_wait(&mut self, pid: ProcessId) -> Result<Option<JobStatus>>;

    fn signal(&mut self, pid: ProcessId, signal: Signal) -> Result<()>;

    /// SIGKILL the process and block until it has been reaped.
    fn kill_and_wait(&mut self, pid: ProcessId) -> Result<JobStatus>;
}

/// Launches jobs with `fork` + `execvp` over a pair of private pipes.
///
/// Forking is only sound while the calling process has no other threads that
/// could hold locks, or when the child sticks to async-signal-safe calls. The
/// child side here allocates nothing: argv is built before the fork.
#[derive(Clone, Copy, Debug, Default)]
pub struct ForkBackend;

impl Backend for ForkBackend {
    fn launch(
        &mut self,
        program: &OsStr,
        args: &[OsString],
        inherited: &[RawFd],
    ) -> Result<Launched> {
        let argv = iter::once(program)
            .chain(args.iter().map(OsString::as_os_str))
            .map(|arg| CString::new(arg.as_bytes()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut argv_ptrs: Vec<*const libc::c_char> = argv.iter().map(|a| a.as_ptr()).collect();
        argv_ptrs.push(ptr::null());

        // close-on-exec everywhere: only the dup2'd copies survive into the child
        let (child_stdin, input) = pipe2(OFlag::O_CLOEXEC)?;
        let (output, child_stdout) = pipe2(OFlag::O_CLOEXEC)?;

        // SAFETY: the child only performs async-signal-safe calls before exec or _exit.
        match unsafe { fork() }? {
            ForkResult::Child => exec_child(
                &argv[0],
                &argv_ptrs,
                inherited,
                child_stdin.as_raw_fd(),
                child_stdout.as_raw_fd(),
            ),
            ForkResult::Parent { child } => {
                debug!(pid = %child, program = %program.to_string_lossy(), "forked child");
                // the child's ends are closed here as they drop
                Ok(Launched {
                    pid: child,
                    input: File::from(input),
                    output: File::from(output),
                })
            }
        }
    }

    fn try_wait(&mut self, pid: ProcessId) -> Result<Option<JobStatus>> {
        Ok(status_from_wait(waitpid(pid, Some(WaitPidFlag::WNOHANG))?))
    }

    fn signal(&mut self, pid: ProcessId, signal: Signal) -> Result<()> {
        signal::kill(pid, signal)?;
        Ok(())
    }

    fn kill_and_wait(&mut self, pid: ProcessId) -> Result<JobStatus> {
        signal::kill(pid, Signal::SIGKILL)?;
        loop {
            match waitpid(pid, None) {
                Ok(wait_status) => {
                    if let Some(status) = status_from_wait(wait_status) {
                        return Ok(status);
                    }
                }
                Err(Errno::EINTR) => continue,
                Err(errno) => return Err(errno.into()),
            }
        }
    }
}

fn status_from_wait(wait_status: WaitStatus) -> Option<JobStatus> {
    match wait_status {
        WaitStatus::Exited(_, code) => Some(JobStatus::Exited { code }),
        WaitStatus::Signaled(_, signal, _) => Some(JobStatus::Killed {
            signal: signal as i32,
        }),
        _ => None,
    }
}

/// Child half of [`ForkBackend::launch`]. Never returns.
fn exec_child(
    program: &CStr,
    argv: &[*const libc::c_char],
    inherited: &[RawFd],
    stdin: RawFd,
    stdout: RawFd,
) -> ! {
    // The supervisor ignores SIGINT, and SIGPIPE is ignored by the Rust
    // runtime. Ignored dispositions survive exec.
    unsafe {
        let _ = signal::signal(Signal::SIGINT, SigHandler::SigDfl);
        let _ = signal::signal(Signal::SIGPIPE, SigHandler::SigDfl);
    }

    for &fd in inherited {
        let _ = unistd::close(fd);
    }

    if redirect(stdin, libc::STDIN_FILENO).is_err()
        || redirect(stdout, libc::STDOUT_FILENO).is_err()
    {
        unsafe { libc::_exit(EXEC_FAILURE_CODE) }
    }

    unsafe {
        libc::execvp(program.as_ptr(), argv.as_ptr());
        libc::_exit(EXEC_FAILURE_CODE)
    }
}

/// `dup2` that also works when the pipe already landed on the target number,
/// in which case close-on-exec has to be cleared by hand.
fn redirect(fd: RawFd, target: RawFd) -> nix::Result<()> {
    if fd == target {
        fcntl(fd, FcntlArg::F_SETFD(FdFlag::empty()))?;
    } else {
        unistd::dup2(fd, target)?;
    }
    Ok(())
}
