use std::path::PathBuf;

use crate::graph::node::*;
use crate::params::{Params, PrimerMode};

pub struct MaskPrimersNode {
    required_channels: [Channel; 1],
    program: String,
    log_name: String,
    primers: PathBuf,
    mode: PrimerMode,
    start: usize,
    barcode: bool,
    max_error: f64,
    nproc: usize,
}

impl MaskPrimersNode {
    const NAME: &'static str = "identifying primers";

    /// Score the read 1 primers at the start of each read 1 sequence.
    pub fn read1(params: &Params, log_name: &str) -> Result<Self> {
        Ok(Self {
            required_channels: [Channel::R1],
            program: params.tools.mask_primers.clone(),
            log_name: log_name.to_owned(),
            primers: primer_file(&params.r1_primers, "r1_primers")?,
            mode: params.mp_r1_mode,
            start: 0,
            barcode: false,
            max_error: params.mp_r1_maxerr,
            nproc: params.nproc,
        })
    }

    /// Score the read 2 primers after the UID, storing the UID as the `BARCODE` annotation.
    pub fn read2(params: &Params, log_name: &str) -> Result<Self> {
        Ok(Self {
            required_channels: [Channel::R2],
            program: params.tools.mask_primers.clone(),
            log_name: log_name.to_owned(),
            primers: primer_file(&params.r2_primers, "r2_primers")?,
            mode: params.mp_r2_mode,
            start: params.uid_len,
            barcode: true,
            max_error: params.mp_r2_maxerr,
            nproc: params.nproc,
        })
    }
}

fn primer_file(file: &Option<PathBuf>, name: &'static str) -> Result<PathBuf> {
    file.clone().ok_or(Error::InvalidParam {
        name,
        reason: "no primer file given".to_owned(),
    })
}

impl GraphNode for MaskPrimersNode {
    fn run(&self, ws: &mut Workspace) -> Result<StepStatus> {
        let channel = self.required_channels[0];
        let input = ws.input(Self::NAME, channel)?;
        let log = ws.add_log(&self.log_name, &["ID", "PRIMER", "BARCODE", "ERROR"]);

        let mut cmd = ToolCommand::new(Self::NAME, &self.program)
            .arg("score")
            .path("-s", &input)
            .path("-p", &self.primers)
            .opt("--mode", self.mode.as_str())
            .opt("--start", self.start);
        if self.barcode {
            cmd = cmd.arg("--barcode");
        }
        let cmd = cmd.opt("--maxerror", self.max_error);
        let cmd = with_common_opts(cmd, ws, channel, Some(self.nproc), Some(&log)).arg("--clean");

        let status = ws.run_tool(cmd)?;
        let output = named_output(ws, channel, "primers-pass", "fastq", true);
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
