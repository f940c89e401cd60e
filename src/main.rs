use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use std::path::PathBuf;
use std::sync::Arc;

use abseq_pipeline::fastx::{convert_headers, table_headers};
use abseq_pipeline::presto_log::table_log;
use abseq_pipeline::*;

#[derive(Parser)]
#[command(name = "abseq-pipeline")]
#[command(version)]
#[command(about = "Run the pRESTO tools on paired-end antibody reads to build a deduplicated repertoire")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print every tool command before it runs
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Process the *R1*.fastq / *R2*.fastq pair found in a directory, writing outputs there
    ///
    /// Files written by an earlier run, like `S1-R1_quality-pass.fastq`, are not taken as inputs.
    Dir {
        input_dir: PathBuf,

        #[arg(short, long)]
        nproc: Option<usize>,

        #[command(flatten)]
        run: RunArgs,
    },
    /// Process an explicit read 1 / read 2 pair
    Pair {
        r1: PathBuf,
        r2: PathBuf,
        out_dir: PathBuf,
        nproc: Option<usize>,

        #[command(flatten)]
        run: RunArgs,
    },
    /// Convert pRESTO log files into tab-delimited tables
    ParseLog {
        #[arg(short = 'l', long = "log", required = true, num_args = 1..)]
        logs: Vec<PathBuf>,

        #[arg(short = 'f', long = "field", required = true, num_args = 1..)]
        fields: Vec<String>,

        #[arg(long)]
        outdir: Option<PathBuf>,
    },
    /// Tabulate header annotations of FASTA or FASTQ files
    Table {
        #[arg(short = 's', long = "seq", required = true, num_args = 1..)]
        seqs: Vec<PathBuf>,

        #[arg(short = 'f', long = "field", required = true, num_args = 1..)]
        fields: Vec<String>,

        #[arg(long)]
        outdir: Option<PathBuf>,
    },
    /// Repair free-text headers of FASTA or FASTQ files into annotation headers
    Convert {
        #[arg(short = 's', long = "seq", required = true, num_args = 1..)]
        seqs: Vec<PathBuf>,

        #[arg(long)]
        outdir: Option<PathBuf>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// YAML file overriding default parameters
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, value_name = "FILE")]
    r1_primers: Option<PathBuf>,

    #[arg(long, value_name = "FILE")]
    r2_primers: Option<PathBuf>,

    /// Multiple-align each UID read group before building consensus sequences
    #[arg(long, overrides_with = "no_align")]
    align: bool,

    #[arg(long, overrides_with = "align")]
    no_align: bool,

    /// Continue past failing tools, skipping steps whose inputs are missing
    #[arg(long)]
    keep_going: bool,

    /// Leave logs and intermediate files unarchived
    #[arg(long)]
    no_archive: bool,

    /// Print the tool commands without running them
    #[arg(long)]
    dry_run: bool,
}

impl RunArgs {
    fn params(&self, nproc: Option<usize>) -> Result<Params> {
        let mut params = match &self.config {
            Some(file) => Params::from_yaml_file(file)?,
            None => Params::default(),
        };

        if let Some(n) = nproc {
            params.nproc = n;
        }
        if let Some(f) = &self.r1_primers {
            params.r1_primers = Some(f.clone());
        }
        if let Some(f) = &self.r2_primers {
            params.r2_primers = Some(f.clone());
        }
        if self.align {
            params.align_sets = Some(true);
        } else if self.no_align {
            params.align_sets = Some(false);
        }
        params.keep_going |= self.keep_going;
        if self.no_archive {
            params.archive = false;
        }

        Ok(params)
    }

    fn runner(&self) -> Arc<dyn ToolRunner> {
        if self.dry_run {
            Arc::new(DryRunRunner::new())
        } else {
            Arc::new(ProcessRunner)
        }
    }
}

fn run(params: &Params, preset: Preset, inputs: &Inputs, runner: Arc<dyn ToolRunner>) -> Result<()> {
    let summary = run_pipeline(params, preset, inputs, runner)?;

    for report in &summary.steps {
        let status = match &report.status {
            StepStatus::Done => "done".green(),
            StepStatus::Failed(code) => format!("failed ({code})").as_str().red(),
            StepStatus::Skipped => "skipped".yellow(),
        };
        eprintln!("{:>40}  {status}", report.step);
    }

    match (&summary.repertoire, summary.sequences) {
        (Some(file), Some(n)) => eprintln!(
            "{} {} ({n} sequences)",
            "Repertoire:".bold(),
            file.display()
        ),
        (Some(file), None) => eprintln!("{} {}", "Repertoire:".bold(), file.display()),
        (None, _) => eprintln!("{}", "No repertoire was produced".red().bold()),
    }

    let failed = summary.failed_steps().count();
    if failed > 0 {
        eprintln!("{}", format!("{failed} steps did not complete").as_str().yellow());
    }

    Ok(())
}

fn for_each_file<F>(files: &[PathBuf], tool: &str, mut process: F) -> Result<()>
where
    F: FnMut(&PathBuf) -> Result<presto_log::TableCounts>,
{
    for file in files {
        let counts = process(file)?;
        log::info!("\n{}", counts.to_record(tool).format());
    }
    Ok(())
}

fn try_main(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Dir {
            input_dir,
            nproc,
            run: args,
        } => {
            let params = args.params(nproc)?;
            let inputs = Inputs::from_dir(&input_dir)?;
            run(&params, Preset::Directory, &inputs, args.runner())
        }
        Commands::Pair {
            r1,
            r2,
            out_dir,
            nproc,
            run: args,
        } => {
            let params = args.params(nproc)?;
            let inputs = Inputs::new(r1, r2, out_dir);
            run(&params, Preset::Pair, &inputs, args.runner())
        }
        Commands::ParseLog {
            logs,
            fields,
            outdir,
        } => for_each_file(&logs, "ParseLog", |f| {
            table_log(f, &fields, outdir.as_deref())
        }),
        Commands::Table {
            seqs,
            fields,
            outdir,
        } => for_each_file(&seqs, "ParseHeaders", |f| {
            table_headers(f, &fields, outdir.as_deref())
        }),
        Commands::Convert { seqs, outdir } => for_each_file(&seqs, "ParseHeaders", |f| {
            convert_headers(f, outdir.as_deref())
        }),
    }
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .init();

    if let Err(e) = try_main(cli) {
        eprintln!("{} {e}", "Error:".red().bold());
        std::process::exit(1);
    }
}
