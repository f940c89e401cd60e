use crate::graph::node::*;
use crate::params::Params;

pub struct BuildConsensusNode {
    required_channels: [Channel; 1],
    program: String,
    log_name: String,
    field: String,
    prcons: Option<f64>,
    min_qual: u32,
    max_error: f64,
    max_gap: f64,
    nproc: usize,
}

impl BuildConsensusNode {
    const NAME: &'static str = "building consensus sequences";

    /// Collapse each UID read group into one consensus sequence with `BuildConsensus.py`.
    ///
    /// Read 1 also assigns the consensus primer (`PRCONS`) of each group.
    pub fn new(params: &Params, channel: Channel, log_name: &str) -> Self {
        Self {
            required_channels: [channel],
            program: params.tools.build_consensus.clone(),
            log_name: log_name.to_owned(),
            field: params.pair_field.clone(),
            prcons: (channel == Channel::R1).then_some(params.bc_prcons),
            min_qual: params.bc_qual,
            max_error: params.bc_maxerr,
            max_gap: params.bc_maxgap,
            nproc: params.nproc,
        }
    }
}

impl GraphNode for BuildConsensusNode {
    fn run(&self, ws: &mut Workspace) -> Result<StepStatus> {
        let channel = self.required_channels[0];
        let input = ws.input(Self::NAME, channel)?;
        let log = ws.add_log(
            &self.log_name,
            &["BARCODE", "SEQCOUNT", "CONSCOUNT", "PRIMER", "PRCONS", "PRFREQ", "ERROR"],
        );

        let mut cmd = ToolCommand::new(Self::NAME, &self.program)
            .path("-s", &input)
            .opt("--bf", &self.field)
            .opt("--pf", "PRIMER");
        if let Some(prcons) = self.prcons {
            cmd = cmd.opt("--prcons", prcons);
        }
        let cmd = cmd
            .opt("-q", self.min_qual)
            .opt("--maxerror", self.max_error)
            .opt("--maxgap", self.max_gap);
        let cmd = with_common_opts(cmd, ws, channel, Some(self.nproc), Some(&log)).arg("--clean");

        let status = ws.run_tool(cmd)?;
        let output = named_output(ws, channel, "consensus-pass", "fastq", true);
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
