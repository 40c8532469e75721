use crate::error::{Error, Result};
use crate::types::Args;
use std::ffi::OsString;

/// One operator command with its still-unvalidated arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Spawn { args: Args },
    Report { args: Args },
    Signal { args: Args },
    Sleep { args: Args },
    Send { args: Args },
    Rcv { args: Args },
    Eof { args: Args },
    Cleanup,
}

impl Command {
    /// Pick the command named by the first token. The remaining tokens become
    /// its arguments; each handler checks its own.
    pub fn parse(tokens: Vec<OsString>) -> Result<Self> {
        let mut tokens = tokens.into_iter();
        let name = tokens.next().ok_or(Error::InvalidCommand)?;
        let args: Args = tokens.collect();
        use self::Command::*;
        let command = match name.to_str() {
            Some("spawn") => Spawn { args },
            Some("report") => Report { args },
            Some("signal") => Signal { args },
            Some("sleep") => Sleep { args },
            Some("send") => Send { args },
            Some("rcv") => Rcv { args },
            Some("eof") => Eof { args },
            Some("cleanup") => Cleanup,
            _ => return Err(Error::InvalidCommand),
        };
        Ok(command)
    }
}
