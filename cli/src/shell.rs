use crate::tokenizer::tokenize;
use joblib::{dispatch, Backend, JobCoordinator};
use std::io::{self, BufRead, Write};
use tracing::info;

const PROMPT: &str = "> ";

/// The operator loop: read a line, run it, repeat until end of input.
///
/// Every job still running when the loop ends is killed and reaped, including
/// when the loop ends because the operator's streams failed.
pub fn run<B: Backend, R: BufRead, W: Write>(
    coordinator: &mut JobCoordinator<B>,
    mut input: R,
    output: &mut W,
    prompt: bool,
) -> io::Result<()> {
    let result = serve(coordinator, &mut input, output, prompt);
    info!(jobs = coordinator.jobs().len(), "operator input ended, cleaning up");
    coordinator.cleanup();
    result
}

fn serve<B: Backend, R: BufRead, W: Write>(
    coordinator: &mut JobCoordinator<B>,
    input: &mut R,
    output: &mut W,
    prompt: bool,
) -> io::Result<()> {
    loop {
        if prompt {
            write!(output, "{}", PROMPT)?;
            output.flush()?;
        }
        let Some(line) = read_line(input)? else {
            return Ok(());
        };
        dispatch(coordinator, tokenize(&line), output)?;
    }
}

/// One line without its terminator, or `None` at end of input.
fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<Vec<u8>>> {
    let mut line = Vec::new();
    if input.read_until(b'\n', &mut line)? == 0 {
        return Ok(None);
    }
    if line.last() == Some(&b'\n') {
        line.pop();
    }
    Ok(Some(line))
}
