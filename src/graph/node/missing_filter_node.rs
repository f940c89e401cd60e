use crate::graph::node::*;
use crate::params::Params;

pub struct MissingFilterNode {
    program: String,
    log_name: String,
    max_missing: u32,
    nproc: usize,
}

impl MissingFilterNode {
    const NAME: &'static str = "filtering missing bases";

    /// Remove assembled sequences with more than `fs_miss` inner N or gap characters with
    /// `FilterSeq.py missing`.
    pub fn new(params: &Params, log_name: &str) -> Self {
        Self {
            program: params.tools.filter_seq.clone(),
            log_name: log_name.to_owned(),
            max_missing: params.fs_miss,
            nproc: params.nproc,
        }
    }
}

impl GraphNode for MissingFilterNode {
    fn run(&self, ws: &mut Workspace) -> Result<StepStatus> {
        let input = ws.input(Self::NAME, Channel::Assembled)?;
        let log = ws.add_log(&self.log_name, &["ID", "MISSING"]);

        let cmd = ToolCommand::new(Self::NAME, &self.program)
            .arg("missing")
            .path("-s", &input)
            .opt("-n", self.max_missing)
            .arg("--inner");
        let cmd = with_common_opts(cmd, ws, Channel::Assembled, Some(self.nproc), Some(&log))
            .arg("--clean");

        let status = ws.run_tool(cmd)?;
        let output = named_output(ws, Channel::Assembled, "missing-pass", "fastq", true);
        ws.resolve_output(Self::NAME, output)?;
        Ok(status)
    }

    fn required_channels(&self) -> &[Channel] {
        &[Channel::Assembled]
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}
