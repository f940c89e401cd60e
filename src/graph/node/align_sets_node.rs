use std::path::PathBuf;

use crate::graph::node::*;
use crate::params::Params;

pub struct AlignSetsNode {
    required_channels: [Channel; 1],
    program: String,
    log_name: String,
    muscle_exec: PathBuf,
    field: String,
    nproc: usize,
}

impl AlignSetsNode {
    const NAME: &'static str = "aligning read groups";

    /// Multiple-align the reads sharing a UID with `AlignSets.py muscle`.
    pub fn new(params: &Params, channel: Channel, log_name: &str) -> Self {
        Self {
            required_channels: [channel],
            program: params.tools.align_sets.clone(),
            log_name: log_name.to_owned(),
            muscle_exec: params.muscle_exec.clone(),
            field: params.pair_field.clone(),
            nproc: params.nproc,
        }
    }
}

impl GraphNode for AlignSetsNode {
    fn run(&self, ws: &mut Workspace) -> Result<StepStatus> {
        let channel = self.required_channels[0];
        let input = ws.input(Self::NAME, channel)?;
        let log = ws.add_log(&self.log_name, &["BARCODE", "SEQCOUNT", "ERROR"]);

        let cmd = ToolCommand::new(Self::NAME, &self.program)
            .arg("muscle")
            .path("-s", &input)
            .opt("--bf", &self.field)
            .path("--exec", &self.muscle_exec);
        let cmd = with_common_opts(cmd, ws, channel, Some(self.nproc), Some(&log)).arg("--clean");

        let status = ws.run_tool(cmd)?;
        let output = named_output(ws, channel, "align-pass", "fastq", true);
        ws.resolve_output(Self::NAME, output)?;
        Ok(status)
    }

    fn required_channels(&self) -> &[Channel] {
        &self.required_channels
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}
