use clap::{Parser, ValueEnum};

/// Interactive job-control supervisor: spawn programs and talk to them over pipes
#[derive(Debug, Parser)]
#[command(name = "hq", version)]
pub struct ArgParser {
    /// Log verbosity. Logs go to stderr, stdout is reserved for command output
    #[arg(long = "log-level", value_enum, ignore_case = true, env = "HQ_LOG")]
    pub log_level: Option<LogLevel>,

    /// Don't print the "> " prompt before reading each command
    #[arg(long = "no-prompt")]
    pub no_prompt: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}
