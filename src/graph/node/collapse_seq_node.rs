use crate::graph::node::*;
use crate::params::Params;

pub struct CollapseSeqNode {
    program: String,
    max_missing: u32,
}

impl CollapseSeqNode {
    const NAME: &'static str = "removing duplicate sequences";

    /// Collapse identical sequences with the same consensus primer with `CollapseSeq.py`,
    /// summing their consensus counts.
    ///
    /// Writes the deduplicated repertoire as `<out_name>_collapse-unique.fasta`.
    pub fn new(params: &Params) -> Self {
        Self {
            program: params.tools.collapse_seq.clone(),
            max_missing: params.cs_miss,
        }
    }
}

impl GraphNode for CollapseSeqNode {
    fn run(&self, ws: &mut Workspace) -> Result<StepStatus> {
        let input = ws.input(Self::NAME, Channel::Assembled)?;

        let cmd = ToolCommand::new(Self::NAME, &self.program)
            .path("-s", &input)
            .opt("-n", self.max_missing)
            .opt("--uf", "PRCONS")
            .opt("--cf", "CONSCOUNT")
            .opt("--act", "sum")
            .arg("--inner")
            .arg("--fasta");
        let cmd = with_common_opts(cmd, ws, Channel::Assembled, None, None);

        let status = ws.run_tool(cmd)?;
        let output = named_output(ws, Channel::Assembled, "collapse-unique", "fasta", false);
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
