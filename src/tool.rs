use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

use crate::errors::*;

/// One invocation of an external tool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolCommand {
    pub step: &'static str,
    pub program: String,
    pub args: Vec<OsString>,
    pub current_dir: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new(step: &'static str, program: impl Into<String>) -> Self {
        Self {
            step,
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add a flag followed by its value.
    pub fn opt(self, flag: &str, value: impl ToString) -> Self {
        self.arg(flag).arg(value.to_string())
    }

    pub fn path(self, flag: &str, value: impl AsRef<Path>) -> Self {
        self.arg(flag).arg(value.as_ref().as_os_str())
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Arguments as strings, lossily converted.
    pub fn arg_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.program)?;

        for arg in self.arg_strings() {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{arg}'")?;
            } else {
                write!(f, " {arg}")?;
            }
        }

        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ToolStatus {
    Success,
    Failed(ExitCode),
}

/// Executes tool commands.
pub trait ToolRunner: Send + Sync {
    fn run(&self, cmd: &ToolCommand) -> Result<ToolStatus>;

    /// Whether running a command actually writes its output files.
    fn creates_outputs(&self) -> bool {
        true
    }
}

/// Runs commands as child processes that share this process's standard streams.
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&self, cmd: &ToolCommand) -> Result<ToolStatus> {
        let mut command = Command::new(&cmd.program);
        command.args(&cmd.args);

        if let Some(dir) = &cmd.current_dir {
            command.current_dir(dir);
        }

        let status = command.status().map_err(|e| Error::ToolSpawn {
            tool: cmd.program.clone(),
            source: e,
        })?;

        if status.success() {
            Ok(ToolStatus::Success)
        } else {
            Ok(ToolStatus::Failed(match status.code() {
                Some(c) => ExitCode::Code(c),
                None => ExitCode::Signal,
            }))
        }
    }
}

/// Prints and records commands without running them.
#[derive(Default)]
pub struct DryRunRunner {
    commands: Mutex<Vec<ToolCommand>>,
}

impl DryRunRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<ToolCommand> {
        self.commands.lock().unwrap().clone()
    }
}

impl ToolRunner for DryRunRunner {
    fn run(&self, cmd: &ToolCommand) -> Result<ToolStatus> {
        println!("{cmd}");
        self.commands.lock().unwrap().push(cmd.clone());
        Ok(ToolStatus::Success)
    }

    fn creates_outputs(&self) -> bool {
        false
    }
}
