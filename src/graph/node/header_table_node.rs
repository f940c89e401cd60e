use crate::fastx::table_headers;
use crate::graph::node::*;
use crate::params::Params;

pub struct HeaderTableNode {
    fields: Vec<String>,
}

impl HeaderTableNode {
    const NAME: &'static str = "tabulating headers";

    /// Write the annotations `table_fields` of the final repertoire to
    /// `<repertoire>_headers.tab`.
    pub fn new(params: &Params) -> Self {
        Self {
            fields: params.table_fields.clone(),
        }
    }
}

impl GraphNode for HeaderTableNode {
    fn run(&self, ws: &mut Workspace) -> Result<StepStatus> {
        let input = ws.input(Self::NAME, Channel::Assembled)?;

        if ws.is_dry_run() {
            log::info!("Would tabulate {} from {}", self.fields.join(","), input.display());
            return Ok(StepStatus::Done);
        }

        let counts = table_headers(&input, &self.fields, Some(ws.out_dir()))?;
        log::info!("\n{}", counts.to_record("ParseHeaders").format());
        Ok(StepStatus::Done)
    }

    fn required_channels(&self) -> &[Channel] {
        &[Channel::Assembled]
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}
