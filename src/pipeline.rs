//! The fixed step order of the repertoire pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::*;
use crate::fastx::count_records;
use crate::graph::node::*;
use crate::graph::*;
use crate::naming::*;
use crate::params::*;
use crate::tool::ToolRunner;

/// Read files of one sequencing run and where its outputs go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inputs {
    pub r1: PathBuf,
    pub r2: PathBuf,
    pub out_dir: PathBuf,
}

impl Inputs {
    /// Find `*R1*.fastq` and `*R2*.fastq` in a run directory, which also receives the outputs.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let (r1, r2) = discover_pair(dir)?;
        Ok(Self {
            r1,
            r2,
            out_dir: dir.to_owned(),
        })
    }

    pub fn new(r1: impl Into<PathBuf>, r2: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            r1: r1.into(),
            r2: r2.into(),
            out_dir: out_dir.into(),
        }
    }

    /// Sample name shared by both read files, used to prefix the per-read outputs.
    ///
    /// This is the read 1 file stem up to its `_R1` tag, or the whole stem if there is none.
    pub fn sample_name(&self) -> String {
        let stem = file_stem(&self.r1);
        let cut = stem
            .rfind("_R1")
            .or_else(|| stem.rfind("R1"))
            .unwrap_or(stem.len());
        let name = stem[..cut].trim_end_matches(&['_', '-', '.'][..]);

        if name.is_empty() {
            stem
        } else {
            name.to_owned()
        }
    }
}

/// Assemble the steps in pipeline order.
///
/// The multiple alignment step is included only when [`Params::aligns`] holds for `preset`.
pub fn build_pipeline(params: &Params, preset: Preset) -> Result<Graph> {
    use Channel::*;

    let mut graph = Graph::new();

    graph.add(QualityFilterNode::new(params, R1, "FS1.log"));
    graph.add(QualityFilterNode::new(params, R2, "FS2.log"));
    graph.add(MaskPrimersNode::read1(params, "MP1.log")?);
    graph.add(MaskPrimersNode::read2(params, "MP2.log")?);
    graph.add(PairSeqNode::new(params));

    if params.aligns(preset) {
        graph.add(AlignSetsNode::new(params, R1, "AS1.log"));
        graph.add(AlignSetsNode::new(params, R2, "AS2.log"));
    }

    graph.add(BuildConsensusNode::new(params, R1, "BC1.log"));
    graph.add(BuildConsensusNode::new(params, R2, "BC2.log"));
    graph.add(AssemblePairsNode::new(params, "AP.log"));
    graph.add(MissingFilterNode::new(params, "FS3.log"));
    graph.add(ParseHeadersNode::new(params));
    graph.add(CollapseSeqNode::new(params));
    graph.add(SplitSeqNode::new(params));
    graph.add(HeaderTableNode::new(params));
    graph.add(ParseLogNode::new());

    if params.archive {
        graph.add(ArchiveNode::new(params));
    }

    Ok(graph)
}

/// Outcome of a pipeline run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub steps: Vec<StepReport>,
    /// The final repertoire file, if the pipeline got that far.
    pub repertoire: Option<PathBuf>,
    /// Number of sequences in the repertoire, unless this was a dry run.
    pub sequences: Option<usize>,
}

impl RunSummary {
    pub fn failed_steps(&self) -> impl Iterator<Item = &StepReport> {
        self.steps
            .iter()
            .filter(|r| r.status != StepStatus::Done)
    }
}

/// Validate the parameters and run every step on one pair of read files.
pub fn run_pipeline(
    params: &Params,
    preset: Preset,
    inputs: &Inputs,
    runner: Arc<dyn ToolRunner>,
) -> Result<RunSummary> {
    params.validate()?;

    let graph = build_pipeline(params, preset)?;
    let sample = inputs.sample_name();
    log::info!(
        "Running {} steps on {} and {} into {}",
        graph.len(),
        inputs.r1.display(),
        inputs.r2.display(),
        inputs.out_dir.display()
    );

    let dry_run = !runner.creates_outputs();
    if !dry_run {
        std::fs::create_dir_all(&inputs.out_dir).map_err(Error::file_io(&inputs.out_dir))?;
    }

    let mut ws = Workspace::new(&inputs.out_dir, runner)
        .with_channel(Channel::R1, &inputs.r1, &format!("{sample}-R1"))
        .with_channel(Channel::R2, &inputs.r2, &format!("{sample}-R2"))
        .keep_going(params.keep_going);

    let steps = graph.run(&mut ws)?;
    let repertoire = ws.file(Channel::Assembled).map(|p| p.to_owned());

    let sequences = match &repertoire {
        Some(file) if !dry_run && file.is_file() => Some(count_records(file)?),
        _ => None,
    };

    Ok(RunSummary {
        steps,
        repertoire,
        sequences,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use crate::errors::ExitCode;
    use crate::tool::*;

    const RECORDS: &str = "@SEQ1|PRCONS=IGHG|CONSCOUNT=3|DUPCOUNT=2\nACGT\n+\nIIII\n\
                           @SEQ2|PRCONS=IGHM|CONSCOUNT=5|DUPCOUNT=1\nACGA\n+\nIIII\n";

    /// Writes the files each tool would write, and a small log for tools given `--log`.
    #[derive(Default)]
    struct FakeTools {
        commands: Mutex<Vec<ToolCommand>>,
        fail: Option<&'static str>,
    }

    impl FakeTools {
        fn failing(step: &'static str) -> Self {
            Self {
                fail: Some(step),
                ..Self::default()
            }
        }

        fn commands(&self) -> Vec<ToolCommand> {
            self.commands.lock().unwrap().clone()
        }
    }

    fn value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(|s| s.as_str())
    }

    fn write_seqs(path: &Path) {
        let text = if path.extension().map_or(false, |e| e == "fasta") {
            RECORDS
                .lines()
                .collect::<Vec<_>>()
                .chunks(4)
                .map(|r| format!(">{}\n{}\n", &r[0][1..], r[1]))
                .collect::<String>()
        } else {
            RECORDS.to_owned()
        };
        std::fs::write(path, text).unwrap();
    }

    impl ToolRunner for FakeTools {
        fn run(&self, cmd: &ToolCommand) -> Result<ToolStatus> {
            self.commands.lock().unwrap().push(cmd.clone());
            if self.fail == Some(cmd.step) {
                return Ok(ToolStatus::Failed(ExitCode::Code(1)));
            }

            let args = cmd.arg_strings();
            let dir = cmd.current_dir.clone().unwrap();
            let named = |label: &str, ext: &str| {
                let prefix = value(&args, "--outname").unwrap();
                dir.join(format!("{prefix}_{label}.{ext}"))
            };
            let derived = |flag: &str, label: &str, ext: &str| {
                let input = value(&args, flag).unwrap();
                dir.join(format!("{}_{label}.{ext}", file_stem(input)))
            };

            let outputs = match (cmd.program.as_str(), args[0].as_str()) {
                ("FilterSeq.py", "quality") => vec![named("quality-pass", "fastq")],
                ("FilterSeq.py", "missing") => vec![named("missing-pass", "fastq")],
                ("MaskPrimers.py", _) => vec![named("primers-pass", "fastq")],
                ("PairSeq.py", _) => vec![
                    derived("-1", "pair-pass", "fastq"),
                    derived("-2", "pair-pass", "fastq"),
                ],
                ("AlignSets.py", _) => vec![named("align-pass", "fastq")],
                ("BuildConsensus.py", _) => vec![named("consensus-pass", "fastq")],
                ("AssemblePairs.py", _) => vec![named("assemble-pass", "fastq")],
                ("ParseHeaders.py", _) => vec![named("reheader", "fastq")],
                ("CollapseSeq.py", _) => vec![named("collapse-unique", "fasta")],
                ("SplitSeq.py", _) => vec![derived("-s", "atleast-2", "fasta")],
                (program, _) => panic!("unexpected tool {program}"),
            };

            for out in outputs {
                write_seqs(&out);
            }
            if let Some(log) = value(&args, "--log") {
                std::fs::write(log, "ID> SEQ1\nQUALITY> 36\n\nID> SEQ2\nQUALITY> 12\n\n").unwrap();
            }

            Ok(ToolStatus::Success)
        }
    }

    fn run_dir(params: &Params, tools: &Arc<FakeTools>) -> (tempfile::TempDir, Result<RunSummary>) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("S1_R1.fastq"), RECORDS).unwrap();
        std::fs::write(dir.path().join("S1_R2.fastq"), RECORDS).unwrap();

        let inputs = Inputs::from_dir(dir.path()).unwrap();
        let runner: Arc<dyn ToolRunner> = tools.clone();
        let res = run_pipeline(params, Preset::Directory, &inputs, runner);
        (dir, res)
    }

    fn params() -> Params {
        let mut params = Params::default();
        params.r1_primers = Some(PathBuf::from("/primers/R1.fasta"));
        params.r2_primers = Some(PathBuf::from("/primers/R2.fasta"));
        params
    }

    #[test]
    fn sample_names() {
        let name = |r1: &str| Inputs::new(r1, "r2", "out").sample_name();
        assert_eq!(name("/data/S1_L001_R1_001.fastq"), "S1_L001");
        assert_eq!(name("run7-R1.fastq"), "run7");
        assert_eq!(name("reads.fastq"), "reads");
        assert_eq!(name("R1.fastq"), "R1");
    }

    #[test]
    fn step_order() {
        let graph = build_pipeline(&params(), Preset::Directory).unwrap();
        assert_eq!(
            graph.step_names(),
            vec![
                "filtering reads by quality",
                "filtering reads by quality",
                "identifying primers",
                "identifying primers",
                "pairing reads",
                "building consensus sequences",
                "building consensus sequences",
                "assembling read pairs",
                "filtering missing bases",
                "rewriting headers",
                "removing duplicate sequences",
                "grouping by consensus count",
                "tabulating headers",
                "parsing logs",
                "archiving logs and intermediate files",
            ]
        );
    }

    #[test]
    fn alignment_only_when_enabled() {
        let count = |graph: &Graph| {
            graph
                .step_names()
                .iter()
                .filter(|&&n| n == "aligning read groups")
                .count()
        };

        assert_eq!(count(&build_pipeline(&params(), Preset::Directory).unwrap()), 0);
        assert_eq!(count(&build_pipeline(&params(), Preset::Pair).unwrap()), 2);

        let mut no_align = params();
        no_align.align_sets = Some(false);
        assert_eq!(count(&build_pipeline(&no_align, Preset::Pair).unwrap()), 0);
    }

    #[test]
    fn no_archive_step() {
        let mut p = params();
        p.archive = false;
        let graph = build_pipeline(&p, Preset::Directory).unwrap();
        assert_eq!(graph.step_names().last(), Some(&"parsing logs"));
    }

    #[test]
    fn missing_primers() {
        let res = build_pipeline(&Params::default(), Preset::Directory);
        assert!(matches!(
            res,
            Err(Error::InvalidParam {
                name: "r1_primers",
                ..
            })
        ));
    }

    #[test]
    fn full_run() {
        let tools = Arc::new(FakeTools::default());
        let (dir, res) = run_dir(&params(), &tools);
        let summary = res.unwrap();
        let out = dir.path();

        let programs = tools
            .commands()
            .iter()
            .map(|c| format!("{} {}", c.program, c.arg_strings()[0]))
            .collect::<Vec<_>>();
        assert_eq!(
            programs,
            vec![
                "FilterSeq.py quality",
                "FilterSeq.py quality",
                "MaskPrimers.py score",
                "MaskPrimers.py score",
                "PairSeq.py -1",
                "BuildConsensus.py -s",
                "BuildConsensus.py -s",
                "AssemblePairs.py align",
                "FilterSeq.py missing",
                "ParseHeaders.py collapse",
                "CollapseSeq.py -s",
                "SplitSeq.py group",
            ]
        );

        let commands = tools.commands();
        assert_eq!(
            commands[4].arg_strings()[..4],
            [
                "-1".to_owned(),
                out.join("S1-R1_primers-pass.fastq").display().to_string(),
                "-2".to_owned(),
                out.join("S1-R2_primers-pass.fastq").display().to_string(),
            ]
        );
        assert_eq!(
            value(&commands[7].arg_strings(), "-1"),
            Some(out.join("S1-R2_consensus-pass.fastq").display().to_string().as_str())
        );

        assert!(summary.steps.iter().all(|r| r.status == StepStatus::Done));
        assert_eq!(
            summary.repertoire,
            Some(out.join("Assembled_collapse-unique_atleast-2.fasta"))
        );
        assert_eq!(summary.sequences, Some(2));

        for name in [
            "Assembled_collapse-unique.fasta",
            "Assembled_collapse-unique_atleast-2.fasta",
            "Assembled_collapse-unique_atleast-2_headers.tab",
            "FS1_table.tab",
            "AP_table.tab",
            "LogFiles.tar.gz",
            "TempFiles.tar.gz",
        ] {
            assert!(out.join(name).is_file(), "{name} is missing");
        }
        for name in ["FS1.log", "S1-R1_quality-pass.fastq", "Assembled_assemble-pass.fastq"] {
            assert!(!out.join(name).exists(), "{name} was not archived");
        }

        let headers =
            std::fs::read_to_string(out.join("Assembled_collapse-unique_atleast-2_headers.tab")).unwrap();
        assert_eq!(
            headers,
            "ID\tPRCONS\tCONSCOUNT\tDUPCOUNT\nSEQ1\tIGHG\t3\t2\nSEQ2\tIGHM\t5\t1\n"
        );
    }

    #[test]
    fn failing_tool_stops() {
        let tools = Arc::new(FakeTools::failing("assembling read pairs"));
        let (dir, res) = run_dir(&params(), &tools);

        assert!(matches!(
            res,
            Err(Error::ToolFailed {
                step: "assembling read pairs",
                code: ExitCode::Code(1),
                ..
            })
        ));
        assert_eq!(tools.commands().len(), 8);
        assert!(!dir.path().join("LogFiles.tar.gz").exists());
    }

    #[test]
    fn failing_tool_keeps_going() {
        let mut p = params();
        p.keep_going = true;
        let tools = Arc::new(FakeTools::failing("assembling read pairs"));
        let (dir, res) = run_dir(&p, &tools);
        let summary = res.unwrap();

        assert_eq!(tools.commands().len(), 8);
        assert_eq!(summary.repertoire, None);
        assert_eq!(summary.sequences, None);

        let statuses = summary
            .steps
            .iter()
            .map(|r| (r.step, r.status.clone()))
            .collect::<Vec<_>>();
        assert_eq!(
            statuses[7],
            ("assembling read pairs", StepStatus::Failed(ExitCode::Code(1)))
        );
        assert!(statuses[8..12].iter().all(|(_, s)| *s == StepStatus::Skipped));
        assert_eq!(summary.failed_steps().count(), 6);

        // logs written before the failure are still tabulated and archived
        assert!(dir.path().join("BC2_table.tab").is_file());
        assert!(dir.path().join("LogFiles.tar.gz").is_file());
    }

    #[test]
    fn pair_preset_aligns() {
        let dir = tempfile::tempdir().unwrap();
        let r1 = dir.path().join("lib_R1_001.fastq");
        let r2 = dir.path().join("lib_R2_001.fastq");
        std::fs::write(&r1, RECORDS).unwrap();
        std::fs::write(&r2, RECORDS).unwrap();

        let mut p = params();
        p.archive = false;
        let tools = Arc::new(FakeTools::default());
        let inputs = Inputs::new(&r1, &r2, dir.path().join("out"));
        let runner: Arc<dyn ToolRunner> = tools.clone();
        let summary = run_pipeline(&p, Preset::Pair, &inputs, runner).unwrap();

        let aligned = tools
            .commands()
            .iter()
            .filter(|c| c.program == "AlignSets.py")
            .map(|c| value(&c.arg_strings(), "--outname").unwrap().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(aligned, vec!["lib-R1", "lib-R2"]);
        assert!(dir.path().join("out/AS1_table.tab").is_file());
        assert!(dir.path().join("out/AS1.log").is_file());
        assert_eq!(summary.sequences, Some(2));
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let runner = Arc::new(DryRunRunner::new());
        let inputs = Inputs::new("/data/S1_R1.fastq", "/data/S1_R2.fastq", &out);

        let summary = run_pipeline(&params(), Preset::Pair, &inputs, runner.clone()).unwrap();
        assert_eq!(runner.commands().len(), 14);
        assert_eq!(
            summary.repertoire,
            Some(out.join("Assembled_collapse-unique_atleast-2.fasta"))
        );
        assert_eq!(summary.sequences, None);
        assert!(!out.exists());
    }
}
