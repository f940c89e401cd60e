use std::thread;

use crate::graph::node::*;

pub struct ParseLogNode;

impl ParseLogNode {
    const NAME: &'static str = "parsing logs";

    /// Tabulate every registered tool log into `<log>_table.tab`.
    ///
    /// Logs are independent, so each one is parsed on its own thread and the step finishes
    /// when all of them are done.
    pub fn new() -> Self {
        Self
    }
}

impl Default for ParseLogNode {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphNode for ParseLogNode {
    fn run(&self, ws: &mut Workspace) -> Result<StepStatus> {
        let (present, missing): (Vec<&LogFile>, Vec<&LogFile>) =
            ws.logs().iter().partition(|l| ws.is_dry_run() || l.path.is_file());

        for l in missing {
            log::warn!("Log {} was not written", l.path.display());
        }

        if ws.is_dry_run() {
            for l in present {
                log::info!("Would tabulate {} from {}", l.fields.join(","), l.path.display());
            }
            return Ok(StepStatus::Done);
        }

        let results = thread::scope(|s| {
            let handles = present
                .iter()
                .map(|l| s.spawn(move || table_log(&l.path, &l.fields, None)))
                .collect::<Vec<_>>();

            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect::<Vec<_>>()
        });

        for res in results {
            match res {
                Ok(counts) => log::info!("\n{}", counts.to_record("ParseLog").format()),
                Err(e) if ws.keeps_going() => log::warn!("{e}"),
                Err(e) => return Err(e),
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
