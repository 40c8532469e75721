//! Operator-facing command handlers.
//!
//! Each handler validates its own arguments and turns the outcome into the
//! lines the operator sees. Mistakes in the input are reported as a single
//! `Error: <message>` line; nothing here ends the supervisor loop.

use crate::backend::Backend;
use crate::command::Command;
use crate::coordinator::JobCoordinator;
use crate::error::{Error, Result};
use crate::types::{Args, JobId};
use nix::sys::signal::Signal;
use std::ffi::{OsStr, OsString};
use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;
use std::thread;
use std::time::Duration;
use tracing::{debug, error};

/// Lines of output produced by one command, without their newlines. Job
/// names and received lines are passed through byte for byte.
type Reply = Vec<Vec<u8>>;

const REPORT_HEADER: &str = "[Job] cmd:status";

/// Signals the operator may name: SIGHUP through SIGSYS.
const SIGNAL_RANGE: std::ops::RangeInclusive<i32> = 1..=31;

/// Run one tokenized operator line and write its reply to `out`.
///
/// Blank lines are ignored. Only failures to write to `out` are returned.
pub fn dispatch<B: Backend, W: Write>(
    coordinator: &mut JobCoordinator<B>,
    tokens: Vec<OsString>,
    out: &mut W,
) -> io::Result<()> {
    if tokens.is_empty() {
        return Ok(());
    }
    match Command::parse(tokens).and_then(|command| execute(coordinator, command)) {
        Ok(reply) => {
            for line in reply {
                out.write_all(&line)?;
                out.write_all(b"\n")?;
            }
        }
        Err(err) => {
            if !err.is_usage() {
                error!(error = %err, "command failed");
            }
            writeln!(out, "Error: {}", err)?;
        }
    }
    out.flush()
}

fn execute<B: Backend>(coordinator: &mut JobCoordinator<B>, command: Command) -> Result<Reply> {
    debug!(?command, "executing command");
    use self::Command::*;
    match command {
        Spawn { args } => spawn(coordinator, &args),
        Report { args } => report(coordinator, &args),
        Signal { args } => signal(coordinator, &args),
        Sleep { args } => sleep(&args),
        Send { args } => send(coordinator, &args),
        Rcv { args } => rcv(coordinator, &args),
        Eof { args } => eof(coordinator, &args),
        Cleanup => {
            coordinator.cleanup();
            Ok(Reply::new())
        }
    }
}

fn spawn<B: Backend>(coordinator: &mut JobCoordinator<B>, args: &Args) -> Result<Reply> {
    let (program, rest) = args.split_first().ok_or(Error::InsufficientArguments)?;
    let job_id = coordinator.start_job(program, rest)?;
    Ok(vec![format!("New Job ID [{}] created", job_id).into_bytes()])
}

fn report<B: Backend>(coordinator: &mut JobCoordinator<B>, args: &Args) -> Result<Reply> {
    let job_ids: Vec<JobId> = match args.first() {
        Some(token) => vec![job_id(coordinator, token)?],
        None => (0..coordinator.jobs().len()).collect(),
    };
    let mut reply = vec![REPORT_HEADER.as_bytes().to_vec()];
    for job_id in job_ids {
        let status = coordinator.job_status(job_id)?;
        let job = coordinator.jobs().get(job_id)?;
        let mut line = format!("[{}] ", job.id()).into_bytes();
        line.extend_from_slice(job.name().as_bytes());
        line.extend_from_slice(format!(":{}", status).as_bytes());
        reply.push(line);
    }
    Ok(reply)
}

fn signal<B: Backend>(coordinator: &mut JobCoordinator<B>, args: &Args) -> Result<Reply> {
    let [job, signal, ..] = args.as_slice() else {
        return Err(Error::InsufficientArguments);
    };
    let job_id = job_id(coordinator, job)?;
    let signal = parse_signal(signal)?;
    coordinator.signal_job(job_id, signal)?;
    Ok(Reply::new())
}

fn sleep(args: &Args) -> Result<Reply> {
    let millis = args.first().ok_or(Error::InsufficientArguments)?;
    let duration = parse_millis(millis)?;
    debug!(?duration, "sleeping");
    thread::sleep(duration);
    Ok(Reply::new())
}

fn send<B: Backend>(coordinator: &mut JobCoordinator<B>, args: &Args) -> Result<Reply> {
    let [job, text, ..] = args.as_slice() else {
        return Err(Error::InsufficientArguments);
    };
    let job_id = job_id(coordinator, job)?;
    coordinator.send_line(job_id, text)?;
    Ok(Reply::new())
}

fn rcv<B: Backend>(coordinator: &mut JobCoordinator<B>, args: &Args) -> Result<Reply> {
    let job = args.first().ok_or(Error::InsufficientArguments)?;
    let job_id = job_id(coordinator, job)?;
    let received = coordinator.receive_line(job_id)?;
    Ok(vec![received.into_bytes()])
}

fn eof<B: Backend>(coordinator: &mut JobCoordinator<B>, args: &Args) -> Result<Reply> {
    let job = args.first().ok_or(Error::InsufficientArguments)?;
    let job_id = job_id(coordinator, job)?;
    coordinator.close_input(job_id)?;
    Ok(Reply::new())
}

/// A decimal job id naming a job that exists.
fn job_id<B: Backend>(coordinator: &JobCoordinator<B>, token: &OsStr) -> Result<JobId> {
    let job_id = token
        .to_str()
        .and_then(|token| token.parse::<JobId>().ok())
        .ok_or(Error::InvalidJob)?;
    coordinator.jobs().get(job_id)?;
    Ok(job_id)
}

fn parse_signal(token: &OsStr) -> Result<Signal> {
    let number = token
        .to_str()
        .and_then(|token| token.parse::<i32>().ok())
        .ok_or(Error::InvalidSignal)?;
    if !SIGNAL_RANGE.contains(&number) {
        return Err(Error::InvalidSignal);
    }
    Signal::try_from(number).map_err(|_| Error::InvalidSignal)
}

/// Milliseconds as a non-negative decimal, fractions allowed.
fn parse_millis(token: &OsStr) -> Result<Duration> {
    let millis = token
        .to_str()
        .and_then(|token| token.parse::<f64>().ok())
        .ok_or(Error::InvalidSleepTime)?;
    if !millis.is_finite() || millis < 0.0 {
        return Err(Error::InvalidSleepTime);
    }
    Duration::try_from_secs_f64(millis / 1000.0).map_err(|_| Error::InvalidSleepTime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::FakeBackend;
    use crate::events::JobStatus;
    use std::io::{Read, Write};
    use std::os::unix::ffi::OsStringExt;
    use std::time::Instant;

    fn run_tokens(
        coordinator: &mut JobCoordinator<FakeBackend>,
        tokens: Vec<OsString>,
    ) -> Vec<u8> {
        let mut out = Vec::new();
        dispatch(coordinator, tokens, &mut out).unwrap();
        out
    }

    fn run(coordinator: &mut JobCoordinator<FakeBackend>, line: &str) -> String {
        let tokens = line.split_whitespace().map(OsString::from).collect();
        String::from_utf8(run_tokens(coordinator, tokens)).unwrap()
    }

    fn coordinator_with_jobs(count: usize) -> JobCoordinator<FakeBackend> {
        let mut coordinator = JobCoordinator::with_backend(FakeBackend::default());
        for _ in 0..count {
            run(&mut coordinator, "spawn cat");
        }
        coordinator
    }

    #[test]
    fn spawn_reports_sequential_ids() {
        let mut coordinator = coordinator_with_jobs(0);
        assert_eq!(run(&mut coordinator, "spawn cat"), "New Job ID [0] created\n");
        assert_eq!(
            run(&mut coordinator, "spawn sleep 10"),
            "New Job ID [1] created\n"
        );
        assert_eq!(
            coordinator.backend().launched[1],
            (OsString::from("sleep"), vec![OsString::from("10")])
        );
        assert_eq!(run(&mut coordinator, "spawn"), "Error: Insufficient arguments\n");
    }

    #[test]
    fn blank_line_prints_nothing() {
        let mut coordinator = coordinator_with_jobs(0);
        assert_eq!(run(&mut coordinator, "   "), "");
    }

    #[test]
    fn unknown_command() {
        let mut coordinator = coordinator_with_jobs(0);
        assert_eq!(run(&mut coordinator, "frobnicate 1"), "Error: Invalid command\n");
    }

    #[test]
    fn report_all_and_one() {
        let mut coordinator = coordinator_with_jobs(3);
        coordinator
            .backend_mut()
            .exit(1, JobStatus::Exited { code: 3 });
        coordinator
            .backend_mut()
            .exit(2, JobStatus::Killed { signal: 15 });

        assert_eq!(
            run(&mut coordinator, "report"),
            "[Job] cmd:status\n[0] cat:running\n[1] cat:exited(3)\n[2] cat:signalled(15)\n"
        );
        assert_eq!(
            run(&mut coordinator, "report 1"),
            "[Job] cmd:status\n[1] cat:exited(3)\n"
        );
    }

    #[test]
    fn report_with_no_jobs_prints_only_the_header() {
        let mut coordinator = coordinator_with_jobs(0);
        assert_eq!(run(&mut coordinator, "report"), "[Job] cmd:status\n");
    }

    #[test]
    fn report_rejects_bad_ids() {
        let mut coordinator = coordinator_with_jobs(2);
        assert_eq!(run(&mut coordinator, "report 5"), "Error: Invalid job\n");
        assert_eq!(run(&mut coordinator, "report 2"), "Error: Invalid job\n");
        assert_eq!(run(&mut coordinator, "report one"), "Error: Invalid job\n");
        assert_eq!(run(&mut coordinator, "report -1"), "Error: Invalid job\n");
    }

    #[test]
    fn signal_validation_order() {
        let mut coordinator = coordinator_with_jobs(1);
        assert_eq!(run(&mut coordinator, "signal 0"), "Error: Insufficient arguments\n");
        assert_eq!(run(&mut coordinator, "signal 4 999"), "Error: Invalid job\n");
        assert_eq!(run(&mut coordinator, "signal 0 999"), "Error: Invalid signal\n");
        assert_eq!(run(&mut coordinator, "signal 0 0"), "Error: Invalid signal\n");
        assert_eq!(run(&mut coordinator, "signal 0 32"), "Error: Invalid signal\n");
        assert_eq!(run(&mut coordinator, "signal 0 TERM"), "Error: Invalid signal\n");
        assert!(coordinator.backend().delivered.is_empty());
    }

    #[test]
    fn signal_is_delivered() {
        let mut coordinator = coordinator_with_jobs(1);
        assert_eq!(run(&mut coordinator, "signal 0 10"), "");
        let pid = coordinator.backend().pid_of(0);
        assert_eq!(coordinator.backend().delivered, vec![(pid, Signal::SIGUSR1)]);
    }

    #[test]
    fn sleep_arguments() {
        let mut coordinator = coordinator_with_jobs(0);
        assert_eq!(run(&mut coordinator, "sleep"), "Error: Insufficient arguments\n");
        assert_eq!(run(&mut coordinator, "sleep soon"), "Error: Invalid sleep time\n");
        assert_eq!(run(&mut coordinator, "sleep 10ms"), "Error: Invalid sleep time\n");
        assert_eq!(run(&mut coordinator, "sleep -5"), "Error: Invalid sleep time\n");
        assert_eq!(run(&mut coordinator, "sleep inf"), "Error: Invalid sleep time\n");

        let started = Instant::now();
        assert_eq!(run(&mut coordinator, "sleep 50.5"), "");
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn parse_millis_accepts_fractions() {
        assert_eq!(parse_millis(OsStr::new("1.5")).unwrap(), Duration::from_micros(1500));
        assert_eq!(parse_millis(OsStr::new("0")).unwrap(), Duration::ZERO);
    }

    #[test]
    fn send_writes_a_terminated_line() {
        let mut coordinator = coordinator_with_jobs(1);
        assert_eq!(run(&mut coordinator, "send 0"), "Error: Insufficient arguments\n");
        assert_eq!(run(&mut coordinator, "send 1 hi"), "Error: Invalid job\n");
        assert_eq!(run(&mut coordinator, "send 0 hello"), "");
        run(&mut coordinator, "eof 0");

        let mut sent = String::new();
        coordinator
            .backend_mut()
            .child(0)
            .stdin
            .read_to_string(&mut sent)
            .unwrap();
        assert_eq!(sent, "hello\n");
    }

    #[test]
    fn rcv_reports_lines_no_input_and_eof() {
        let mut coordinator = coordinator_with_jobs(1);
        assert_eq!(run(&mut coordinator, "rcv"), "Error: Insufficient arguments\n");
        assert_eq!(run(&mut coordinator, "rcv 9"), "Error: Invalid job\n");
        assert_eq!(run(&mut coordinator, "rcv 0"), "<no input>\n");

        let child = coordinator.backend_mut().child(0);
        child
            .stdout
            .as_mut()
            .unwrap()
            .write_all(b"first line\n")
            .unwrap();
        child.stdout = None;

        assert_eq!(run(&mut coordinator, "rcv 0"), "first line\n");
        assert_eq!(run(&mut coordinator, "rcv 0"), "<EOF>\n");
        assert_eq!(run(&mut coordinator, "rcv 0"), "<EOF>\n");
    }

    #[test]
    fn bytes_pass_through_unchanged() {
        let mut coordinator = coordinator_with_jobs(0);
        let name = OsString::from_vec(b"c\xe4t".to_vec());
        let text = OsString::from_vec(vec![b'h', 0xff, b'i']);
        run_tokens(&mut coordinator, vec!["spawn".into(), name]);
        run_tokens(&mut coordinator, vec!["send".into(), "0".into(), text]);
        run(&mut coordinator, "eof 0");

        let child = coordinator.backend_mut().child(0);
        let mut sent = Vec::new();
        child.stdin.read_to_end(&mut sent).unwrap();
        assert_eq!(sent, b"h\xffi\n");
        child
            .stdout
            .as_mut()
            .unwrap()
            .write_all(b"caf\xe9\n")
            .unwrap();

        assert_eq!(
            run_tokens(&mut coordinator, vec!["rcv".into(), "0".into()]),
            b"caf\xe9\n"
        );
        assert_eq!(
            run_tokens(&mut coordinator, vec!["report".into()]),
            b"[Job] cmd:status\n[0] c\xe4t:running\n"
        );
        assert_eq!(
            run_tokens(&mut coordinator, vec!["rcv".into(), OsString::from_vec(vec![0xff])]),
            b"Error: Invalid job\n"
        );
    }

    #[test]
    fn eof_is_repeatable() {
        let mut coordinator = coordinator_with_jobs(1);
        assert_eq!(run(&mut coordinator, "eof"), "Error: Insufficient arguments\n");
        assert_eq!(run(&mut coordinator, "eof x"), "Error: Invalid job\n");
        assert_eq!(run(&mut coordinator, "eof 0"), "");
        assert_eq!(run(&mut coordinator, "eof 0"), "");
        assert!(!coordinator.jobs().get(0).unwrap().input_open());
    }

    #[test]
    fn cleanup_then_report() {
        let mut coordinator = coordinator_with_jobs(2);
        coordinator
            .backend_mut()
            .exit(0, JobStatus::Exited { code: 0 });
        assert_eq!(run(&mut coordinator, "cleanup"), "");
        assert_eq!(
            run(&mut coordinator, "report"),
            "[Job] cmd:status\n[0] cat:exited(0)\n[1] cat:signalled(9)\n"
        );
        assert_eq!(run(&mut coordinator, "spawn cat"), "New Job ID [2] created\n");
    }
}
