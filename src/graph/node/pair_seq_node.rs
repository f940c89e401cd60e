use crate::graph::node::*;
use crate::params::Params;

pub struct PairSeqNode {
    program: String,
    field: String,
    coord: String,
}

impl PairSeqNode {
    const NAME: &'static str = "pairing reads";

    /// Match read 1 and read 2 by sequence ID with `PairSeq.py`, copying the UID field from
    /// read 2 onto read 1.
    ///
    /// Outputs are named after each input file: `<input>_pair-pass.fastq`.
    pub fn new(params: &Params) -> Self {
        Self {
            program: params.tools.pair_seq.clone(),
            field: params.pair_field.clone(),
            coord: params.coord.clone(),
        }
    }
}

impl GraphNode for PairSeqNode {
    fn run(&self, ws: &mut Workspace) -> Result<StepStatus> {
        let r1 = ws.input(Self::NAME, Channel::R1)?;
        let r2 = ws.input(Self::NAME, Channel::R2)?;

        let cmd = ToolCommand::new(Self::NAME, &self.program)
            .path("-1", &r1)
            .path("-2", &r2)
            .opt("-f", &self.field)
            .opt("--coord", &self.coord)
            .arg("--clean");

        let status = ws.run_tool(cmd)?;
        let out1 = derived_output(ws, Channel::R1, &r1, "pair-pass", "fastq", true);
        let out2 = derived_output(ws, Channel::R2, &r2, "pair-pass", "fastq", true);
        ws.resolve_output(Self::NAME, out1)?;
        ws.resolve_output(Self::NAME, out2)?;
        Ok(status)
    }

    fn required_channels(&self) -> &[Channel] {
        &[Channel::R1, Channel::R2]
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}
