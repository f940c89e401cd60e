use crate::archive::archive_files;
use crate::graph::node::*;
use crate::params::Params;

pub const LOG_ARCHIVE: &str = "LogFiles.tar.gz";
pub const TEMP_ARCHIVE: &str = "TempFiles.tar.gz";

pub struct ArchiveNode {
    remove: bool,
}

impl ArchiveNode {
    const NAME: &'static str = "archiving logs and intermediate files";

    /// Pack the tool logs into `LogFiles.tar.gz` and the intermediate sequence files into
    /// `TempFiles.tar.gz`.
    pub fn new(params: &Params) -> Self {
        Self {
            remove: params.remove_archived,
        }
    }
}

impl GraphNode for ArchiveNode {
    fn run(&self, ws: &mut Workspace) -> Result<StepStatus> {
        let logs = ws.logs().iter().map(|l| l.path.clone()).collect::<Vec<_>>();
        let temps = ws.intermediates().to_vec();

        if ws.is_dry_run() {
            log::info!(
                "Would archive {} logs into {LOG_ARCHIVE} and {} files into {TEMP_ARCHIVE}",
                logs.len(),
                temps.len()
            );
            return Ok(StepStatus::Done);
        }

        for (name, files) in [(LOG_ARCHIVE, &logs), (TEMP_ARCHIVE, &temps)] {
            let dest = ws.out_path(name);
            if archive_files(&dest, files, self.remove)? {
                let mut record = LogRecord::new();
                record.push("OUTPUT", name).push("FILES", files.len());
                log::info!("\n{}", record.format());
            }
        }

        Ok(StepStatus::Done)
    }

    fn required_channels(&self) -> &[Channel] {
        &[]
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}
