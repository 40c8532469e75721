//! Test helper for `hq`: echoes stdin line by line and reports every signal it
//! can catch.
//!
//! Each signal prints `sigcat received <description>` to the current output.
//! SIGUSR1 switches the output to stdout, SIGUSR2 to stderr. Exits 0 at end of
//! input.

use anyhow::{Context, Result};
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::io::{self, BufRead};
use std::os::fd::RawFd;
use std::sync::atomic::{AtomicI32, Ordering};

static OUTPUT_FD: AtomicI32 = AtomicI32::new(libc::STDOUT_FILENO);

fn main() -> Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(report_signal),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    for sig in Signal::iterator() {
        if matches!(sig, Signal::SIGKILL | Signal::SIGSTOP) {
            continue;
        }
        unsafe { signal::sigaction(sig, &action) }
            .with_context(|| format!("failed to install handler for {}", sig))?;
    }

    let mut stdin = io::stdin().lock();
    let mut line = Vec::new();
    loop {
        line.clear();
        if stdin.read_until(b'\n', &mut line)? == 0 {
            return Ok(());
        }
        if line.last() != Some(&b'\n') {
            line.push(b'\n');
        }
        write_all(OUTPUT_FD.load(Ordering::SeqCst), &line);
    }
}

/// Async-signal-safe: raw writes only, no allocation.
extern "C" fn report_signal(signo: libc::c_int) {
    let fd = OUTPUT_FD.load(Ordering::SeqCst);
    write_all(fd, b"sigcat received ");
    write_all(fd, description(signo).as_bytes());
    write_all(fd, b"\n");

    match signo {
        libc::SIGUSR1 => OUTPUT_FD.store(libc::STDOUT_FILENO, Ordering::SeqCst),
        libc::SIGUSR2 => OUTPUT_FD.store(libc::STDERR_FILENO, Ordering::SeqCst),
        _ => {}
    }
}

fn write_all(fd: RawFd, mut bytes: &[u8]) {
    while !bytes.is_empty() {
        let written = unsafe { libc::write(fd, bytes.as_ptr().cast(), bytes.len()) };
        if written <= 0 {
            return;
        }
        bytes = &bytes[written as usize..];
    }
}

/// The text `strsignal(3)` gives for each signal on glibc.
fn description(signo: libc::c_int) -> &'static str {
    match signo {
        libc::SIGHUP => "Hangup",
        libc::SIGINT => "Interrupt",
        libc::SIGQUIT => "Quit",
        libc::SIGILL => "Illegal instruction",
        libc::SIGTRAP => "Trace/breakpoint trap",
        libc::SIGABRT => "Aborted",
        libc::SIGBUS => "Bus error",
        libc::SIGFPE => "Floating point exception",
        libc::SIGUSR1 => "User defined signal 1",
        libc::SIGSEGV => "Segmentation fault",
        libc::SIGUSR2 => "User defined signal 2",
        libc::SIGPIPE => "Broken pipe",
        libc::SIGALRM => "Alarm clock",
        libc::SIGTERM => "Terminated",
        #[cfg(any(target_os = "linux", target_os = "android"))]
        libc::SIGSTKFLT => "Stack fault",
        libc::SIGCHLD => "Child exited",
        libc::SIGCONT => "Continued",
        libc::SIGTSTP => "Stopped",
        libc::SIGTTIN => "Stopped (tty input)",
        libc::SIGTTOU => "Stopped (tty output)",
        libc::SIGURG => "Urgent I/O condition",
        libc::SIGXCPU => "CPU time limit exceeded",
        libc::SIGXFSZ => "File size limit exceeded",
        libc::SIGVTALRM => "Virtual timer expired",
        libc::SIGPROF => "Profiling timer expired",
        libc::SIGWINCH => "Window changed",
        libc::SIGIO => "I/O possible",
        #[cfg(any(target_os = "linux", target_os = "android"))]
        libc::SIGPWR => "Power failure",
        libc::SIGSYS => "Bad system call",
        _ => "Unknown signal",
    }
}
