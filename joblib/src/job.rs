use crate::events::{JobStatus, Received};
use crate::readiness::is_readable;
use crate::types::{JobId, ProcessId, Program};
use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, Read, Write};
use std::mem;
use std::os::fd::{AsRawFd, RawFd};
use tracing::debug;

const READ_CHUNK: usize = 4096;

/// Bookkeeping for one spawned child.
///
/// The job owns the supervisor's ends of both pipes: the write end feeding
/// the child's stdin (until `eof` closes it) and the read end draining the
/// child's stdout. Output that does not yet form a whole line waits in
/// `pending`.
#[derive(Debug)]
pub struct Job {
    id: JobId,
    pid: ProcessId,
    name: Program,
    input: Option<File>,
    output: File,
    pending: Vec<u8>,
    status: JobStatus,
    eof_seen: bool,
}

impl Job {
    pub(crate) fn new(id: JobId, pid: ProcessId, name: Program, input: File, output: File) -> Self {
        Self {
            id,
            pid,
            name,
            input: Some(input),
            output,
            pending: Vec::new(),
            status: JobStatus::Running,
            eof_seen: false,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    pub fn name(&self) -> &OsStr {
        &self.name
    }

    /// Last known status. Use the coordinator to poll for a fresher one.
    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Whether the child's end of the output pipe has been seen closed. A
    /// final unterminated line may still be waiting to be received.
    pub fn eof_seen(&self) -> bool {
        self.eof_seen
    }

    pub fn input_open(&self) -> bool {
        self.input.is_some()
    }

    /// Records a terminal status. Ignored once the job has already terminated.
    pub(crate) fn set_status(&mut self, status: JobStatus) {
        if self.status.is_running() {
            self.status = status;
        }
    }

    /// Writes `text` followed by a newline to the child's stdin.
    ///
    /// Returns `Ok(false)` without writing when the input channel was closed.
    pub(crate) fn write_line(&mut self, text: &[u8]) -> io::Result<bool> {
        let Some(input) = self.input.as_mut() else {
            return Ok(false);
        };
        let mut buf = Vec::with_capacity(text.len() + 1);
        buf.extend_from_slice(text);
        buf.push(b'\n');
        input.write_all(&buf)?;
        Ok(true)
    }

    /// Closes the child's stdin. Closing twice is a no-op.
    pub(crate) fn close_input(&mut self) {
        if self.input.take().is_some() {
            debug!(job_id = self.id, "closed job input");
        }
    }

    /// Reads one line of the child's output if one can be had without waiting
    /// for the child to write anything.
    ///
    /// Every read is preceded by a readiness check, so a child that printed
    /// half a line and went quiet yields `NoInput` until it finishes the line
    /// or closes its output.
    pub(crate) fn read_line(&mut self) -> io::Result<Received> {
        loop {
            if let Some(end) = self.pending.iter().position(|&b| b == b'\n') {
                let mut line: Vec<u8> = self.pending.drain(..=end).collect();
                line.pop();
                return Ok(Received::Line(line));
            }
            if self.eof_seen {
                if self.pending.is_empty() {
                    return Ok(Received::Eof);
                }
                return Ok(Received::Line(mem::take(&mut self.pending)));
            }
            if !is_readable(&self.output)? {
                return Ok(Received::NoInput);
            }

            let mut chunk = [0; READ_CHUNK];
            match self.output.read(&mut chunk) {
                Ok(0) => {
                    debug!(job_id = self.id, "job output reached end of stream");
                    self.eof_seen = true;
                }
                Ok(read) => self.pending.extend_from_slice(&chunk[..read]),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }
    }

    /// Raw descriptors the supervisor still holds for this job.
    pub(crate) fn raw_fds(&self) -> impl Iterator<Item = RawFd> + '_ {
        self.input
            .iter()
            .map(AsRawFd::as_raw_fd)
            .chain(Some(self.output.as_raw_fd()))
    }
}
