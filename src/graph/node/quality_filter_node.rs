use crate::graph::node::*;
use crate::params::Params;

pub struct QualityFilterNode {
    required_channels: [Channel; 1],
    program: String,
    log_name: String,
    min_qual: u32,
    nproc: usize,
}

impl QualityFilterNode {
    const NAME: &'static str = "filtering reads by quality";

    /// Remove reads whose mean quality score is below `fs_qual` with `FilterSeq.py quality`.
    ///
    /// Writes `<prefix>_quality-pass.fastq` and the log `log_name`.
    pub fn new(params: &Params, channel: Channel, log_name: &str) -> Self {
        Self {
            required_channels: [channel],
            program: params.tools.filter_seq.clone(),
            log_name: log_name.to_owned(),
            min_qual: params.fs_qual,
            nproc: params.nproc,
        }
    }
}

impl GraphNode for QualityFilterNode {
    fn run(&self, ws: &mut Workspace) -> Result<StepStatus> {
        let channel = self.required_channels[0];
        let input = ws.input(Self::NAME, channel)?;
        let log = ws.add_log(&self.log_name, &["ID", "QUALITY"]);

        let cmd = ToolCommand::new(Self::NAME, &self.program)
            .arg("quality")
            .path("-s", &input)
            .opt("-q", self.min_qual);
        let cmd = with_common_opts(cmd, ws, channel, Some(self.nproc), Some(&log)).arg("--clean");

        let status = ws.run_tool(cmd)?;
        let output = named_output(ws, channel, "quality-pass", "fastq", true);
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
