use rustc_hash::FxHashMap;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::*;
use crate::naming::*;
use crate::presto_log::*;
use crate::tool::*;

pub mod node;

/// A stream of reads whose current file moves from step to step.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    R1,
    R2,
    Assembled,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Channel::*;
        match self {
            R1 => write!(f, "read 1"),
            R2 => write!(f, "read 2"),
            Assembled => write!(f, "assembled"),
        }
    }
}

/// A log file written by a tool and the fields to tabulate from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogFile {
    pub path: PathBuf,
    pub fields: Vec<String>,
}

/// A file a step is expected to write.
///
/// `expected` is the name the step should produce. If it is absent, the single file in the
/// output directory matching `pattern` is taken instead.
pub struct Output {
    pub channel: Channel,
    pub expected: PathBuf,
    pub pattern: Wildcard,
    pub intermediate: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepStatus {
    Done,
    Failed(ExitCode),
    Skipped,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepReport {
    pub step: &'static str,
    pub status: StepStatus,
}

/// Files and settings shared by the steps of one pipeline run.
pub struct Workspace {
    out_dir: PathBuf,
    files: FxHashMap<Channel, PathBuf>,
    prefixes: FxHashMap<Channel, String>,
    logs: Vec<LogFile>,
    intermediates: Vec<PathBuf>,
    runner: Arc<dyn ToolRunner>,
    keep_going: bool,
    tool_failed: bool,
}

impl Workspace {
    pub fn new(out_dir: impl Into<PathBuf>, runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            out_dir: out_dir.into(),
            files: FxHashMap::default(),
            prefixes: FxHashMap::default(),
            logs: Vec::new(),
            intermediates: Vec::new(),
            runner,
            keep_going: false,
            tool_failed: false,
        }
    }

    /// Continue past failing tools and skip the steps whose inputs are missing.
    pub fn keep_going(mut self, keep_going: bool) -> Self {
        self.keep_going = keep_going;
        self
    }

    /// Start a channel from an input file, naming its outputs with `prefix`.
    pub fn with_channel(mut self, channel: Channel, file: impl Into<PathBuf>, prefix: &str) -> Self {
        self.files.insert(channel, file.into());
        self.prefixes.insert(channel, prefix.to_owned());
        self
    }

    pub fn keeps_going(&self) -> bool {
        self.keep_going
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn is_dry_run(&self) -> bool {
        !self.runner.creates_outputs()
    }

    pub fn file(&self, channel: Channel) -> Option<&Path> {
        self.files.get(&channel).map(|p| p.as_path())
    }

    pub fn has_channel(&self, channel: Channel) -> bool {
        self.files.contains_key(&channel)
    }

    /// Output name prefix of a channel.
    pub fn prefix(&self, channel: Channel) -> &str {
        self.prefixes.get(&channel).map(|s| s.as_str()).unwrap_or("")
    }

    pub fn set_prefix(&mut self, channel: Channel, prefix: &str) {
        self.prefixes.insert(channel, prefix.to_owned());
    }

    /// Input file of a channel required by a step.
    pub fn input(&self, step: &'static str, channel: Channel) -> Result<PathBuf> {
        self.file(channel)
            .map(|p| p.to_owned())
            .ok_or(Error::MissingChannel { step, channel })
    }

    /// Path of a file in the output directory.
    pub fn out_path(&self, name: &str) -> PathBuf {
        self.out_dir.join(name)
    }

    /// Register a tool log and return its path.
    pub fn add_log(&mut self, name: &str, fields: &[&str]) -> PathBuf {
        let path = self.out_path(name);
        self.logs.push(LogFile {
            path: path.clone(),
            fields: fields.iter().map(|f| (*f).to_owned()).collect(),
        });
        path
    }

    pub fn logs(&self) -> &[LogFile] {
        &self.logs
    }

    pub fn intermediates(&self) -> &[PathBuf] {
        &self.intermediates
    }

    /// Run a tool command from the output directory.
    ///
    /// A non-zero exit is an error unless the workspace keeps going.
    pub fn run_tool(&mut self, cmd: ToolCommand) -> Result<StepStatus> {
        let cmd = cmd.current_dir(&self.out_dir);
        let mut record = LogRecord::new();
        record.push("COMMAND", &cmd);
        log::debug!("\n{}", record.format());

        let status = self.runner.run(&cmd)?;
        self.tool_failed = status != ToolStatus::Success;

        match status {
            ToolStatus::Success => Ok(StepStatus::Done),
            ToolStatus::Failed(code) if self.keep_going => {
                log::warn!("{} exited with {code} when {}", cmd.program, cmd.step);
                Ok(StepStatus::Failed(code))
            }
            ToolStatus::Failed(code) => Err(Error::ToolFailed {
                step: cmd.step,
                tool: cmd.program,
                code,
            }),
        }
    }

    /// Point a channel at the file a step produced.
    ///
    /// When the file is missing, or the last tool failed, the channel is dropped if the workspace
    /// keeps going, and it is an error otherwise. Files left by an earlier run are not taken as
    /// the output of a failed tool.
    pub fn resolve_output(&mut self, step: &'static str, output: Output) -> Result<()> {
        let Output {
            channel,
            expected,
            pattern,
            intermediate,
        } = output;

        let found = if self.tool_failed {
            None
        } else if self.is_dry_run() || expected.is_file() {
            Some(expected.clone())
        } else {
            match find_one(&self.out_dir, &pattern) {
                Ok(p) => Some(p),
                Err(Error::MissingInput { .. }) => None,
                Err(e) => return Err(e),
            }
        };

        match found {
            Some(path) => {
                if intermediate {
                    self.intermediates.push(path.clone());
                }
                self.files.insert(channel, path);
                Ok(())
            }
            None if self.keep_going => {
                log::warn!(
                    "No {channel} output matching \"{}\" when {step}",
                    pattern.as_str()
                );
                self.files.remove(&channel);
                Ok(())
            }
            None => Err(Error::MissingOutput { step, expected }),
        }
    }
}

/// Ordered pipeline of steps, where each step is a node.
pub struct Graph {
    nodes: Vec<Arc<dyn GraphNode>>,
}

pub trait GraphNode: Send + Sync {
    fn run(&self, ws: &mut Workspace) -> Result<StepStatus>;
    fn required_channels(&self) -> &[Channel];
    fn name(&self) -> &'static str;
}

impl Graph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Add a step node to the graph and return the node.
    pub fn add<G: GraphNode + 'static>(&mut self, node: G) -> Arc<G> {
        let a = Arc::new(node);
        let b = Arc::clone(&a);
        self.nodes.push(a);
        b
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Names of the steps, in execution order.
    pub fn step_names(&self) -> Vec<&'static str> {
        self.nodes.iter().map(|n| n.name()).collect()
    }

    /// Run every step in order.
    ///
    /// If a channel required by a step is not available, the run stops with an error, or the
    /// step is skipped when the workspace keeps going.
    pub fn run(&self, ws: &mut Workspace) -> Result<Vec<StepReport>> {
        let mut reports = Vec::with_capacity(self.nodes.len());

        for node in &self.nodes {
            let missing = node
                .required_channels()
                .iter()
                .find(|&&c| !ws.has_channel(c))
                .copied();

            if let Some(channel) = missing {
                if !ws.keep_going {
                    return Err(Error::MissingChannel {
                        step: node.name(),
                        channel,
                    });
                }

                log::warn!("Skipped {}: no {channel} file", node.name());
                reports.push(StepReport {
                    step: node.name(),
                    status: StepStatus::Skipped,
                });
                continue;
            }

            let mut record = LogRecord::new();
            record.push("START", node.name());
            log::info!("\n{}", record.format());

            let status = node.run(ws)?;

            let mut record = LogRecord::new();
            record.push("END", node.name());
            for channel in node.required_channels() {
                if let Some(file) = ws.file(*channel) {
                    record.push(format!("{channel:?}"), file_name(file));
                }
            }
            log::info!("\n{}", record.format());

            reports.push(StepReport {
                step: node.name(),
                status,
            });
        }

        Ok(reports)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}
