use crate::graph::node::*;
use crate::params::Params;

pub struct AssemblePairsNode {
    program: String,
    log_name: String,
    out_name: String,
    max_error: f64,
    alpha: f64,
    nproc: usize,
}

impl AssemblePairsNode {
    const NAME: &'static str = "assembling read pairs";

    /// Stitch each read 2 / read 1 consensus pair into one sequence with
    /// `AssemblePairs.py align`, reverse complementing read 1.
    ///
    /// Starts the assembled channel at `<out_name>_assemble-pass.fastq`.
    pub fn new(params: &Params, log_name: &str) -> Self {
        Self {
            program: params.tools.assemble_pairs.clone(),
            log_name: log_name.to_owned(),
            out_name: params.out_name.clone(),
            max_error: params.ap_maxerr,
            alpha: params.ap_alpha,
            nproc: params.nproc,
        }
    }
}

impl GraphNode for AssemblePairsNode {
    fn run(&self, ws: &mut Workspace) -> Result<StepStatus> {
        let r1 = ws.input(Self::NAME, Channel::R1)?;
        let r2 = ws.input(Self::NAME, Channel::R2)?;
        ws.set_prefix(Channel::Assembled, &self.out_name);
        let log = ws.add_log(
            &self.log_name,
            &["ID", "LENGTH", "OVERLAP", "ERROR", "PVALUE", "FIELDS1", "FIELDS2"],
        );

        let cmd = ToolCommand::new(Self::NAME, &self.program)
            .arg("align")
            .path("-1", &r2)
            .path("-2", &r1)
            .opt("--coord", "presto")
            .opt("--rc", "tail")
            .opt("--1f", "CONSCOUNT")
            .args(["--2f", "CONSCOUNT", "PRCONS"])
            .opt("--maxerror", self.max_error)
            .opt("--alpha", self.alpha);
        let cmd = with_common_opts(cmd, ws, Channel::Assembled, Some(self.nproc), Some(&log))
            .arg("--clean");

        let status = ws.run_tool(cmd)?;
        let output = named_output(ws, Channel::Assembled, "assemble-pass", "fastq", true);
        ws.resolve_output(Self::NAME, output)?;
        Ok(status)
    }

    fn required_channels(&self) -> &[Channel] {
        &[Channel::R1, Channel::R2]
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}
