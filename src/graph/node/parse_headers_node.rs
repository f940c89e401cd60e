use crate::graph::node::*;
use crate::params::Params;

pub struct ParseHeadersNode {
    program: String,
}

impl ParseHeadersNode {
    const NAME: &'static str = "rewriting headers";

    /// Reduce the two consensus counts carried over from read 1 and read 2 to their minimum
    /// with `ParseHeaders.py collapse`.
    pub fn new(params: &Params) -> Self {
        Self {
            program: params.tools.parse_headers.clone(),
        }
    }
}

impl GraphNode for ParseHeadersNode {
    fn run(&self, ws: &mut Workspace) -> Result<StepStatus> {
        let input = ws.input(Self::NAME, Channel::Assembled)?;

        let cmd = ToolCommand::new(Self::NAME, &self.program)
            .arg("collapse")
            .path("-s", &input)
            .opt("-f", "CONSCOUNT")
            .opt("--act", "min");
        let cmd = with_common_opts(cmd, ws, Channel::Assembled, None, None);

        let status = ws.run_tool(cmd)?;
        let output = named_output(ws, Channel::Assembled, "reheader", "fastq", true);
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
