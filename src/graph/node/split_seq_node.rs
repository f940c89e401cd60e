use crate::graph::node::*;
use crate::params::Params;

pub struct SplitSeqNode {
    program: String,
    threshold: u32,
}

impl SplitSeqNode {
    const NAME: &'static str = "grouping by consensus count";

    /// Partition unique sequences by `CONSCOUNT` with `SplitSeq.py group`, continuing with the
    /// sequences supported by at least `sp_threshold` UID groups.
    pub fn new(params: &Params) -> Self {
        Self {
            program: params.tools.split_seq.clone(),
            threshold: params.sp_threshold,
        }
    }
}

impl GraphNode for SplitSeqNode {
    fn run(&self, ws: &mut Workspace) -> Result<StepStatus> {
        let input = ws.input(Self::NAME, Channel::Assembled)?;

        let cmd = ToolCommand::new(Self::NAME, &self.program)
            .arg("group")
            .path("-s", &input)
            .opt("-f", "CONSCOUNT")
            .opt("--num", self.threshold)
            .path("--outdir", ws.out_dir());

        let status = ws.run_tool(cmd)?;
        let label = group_label(self.threshold);
        let output = derived_output(ws, Channel::Assembled, &input, &label, "fasta", false);
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
