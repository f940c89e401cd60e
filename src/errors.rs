use thiserror;

use std::fmt;
use std::path::PathBuf;

use crate::graph::Channel;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error reading or writing \"{file}\": {source}")]
    FileIo {
        file: PathBuf,
        source: std::io::Error,
    },

    #[error("No file matching \"{pattern}\" in {dir}")]
    MissingInput { pattern: String, dir: PathBuf },

    #[error("More than one file matches \"{pattern}\": {}", .matches.join(", "))]
    AmbiguousInput {
        pattern: String,
        matches: Vec<String>,
    },

    #[error("Could not start {tool}: {source}")]
    ToolSpawn {
        tool: String,
        source: std::io::Error,
    },

    #[error("{tool} exited with {code} when {step}")]
    ToolFailed {
        step: &'static str,
        tool: String,
        code: ExitCode,
    },

    #[error("Expected output {expected} was not produced when {step}")]
    MissingOutput {
        step: &'static str,
        expected: PathBuf,
    },

    #[error("No {channel} file available when {step}")]
    MissingChannel {
        step: &'static str,
        channel: Channel,
    },

    #[error("Invalid annotation in header \"{header}\": {reason}")]
    InvalidHeader {
        header: String,
        reason: &'static str,
    },

    #[error("Error loading configuration \"{file}\": {source}")]
    Config {
        file: String,
        source: serde_yaml::Error,
    },

    #[error("Invalid value for parameter {name}: {reason}")]
    InvalidParam { name: &'static str, reason: String },

    #[error("Error parsing record in \"{file}\": {source}")]
    ParseRecord {
        file: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    pub(crate) fn file_io(file: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Error {
        let file = file.into();
        move |source| Error::FileIo { file, source }
    }
}

/// Exit status of an external tool.
///
/// Processes killed by a signal have no exit code.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitCode {
    Code(i32),
    Signal,
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ExitCode::*;
        match self {
            Code(c) => write!(f, "exit code {c}"),
            Signal => write!(f, "termination by signal"),
        }
    }
}
