/// Graph nodes, one per pipeline step.

pub mod quality_filter_node;
pub use quality_filter_node::*;

pub mod mask_primers_node;
pub use mask_primers_node::*;

pub mod pair_seq_node;
pub use pair_seq_node::*;

pub mod align_sets_node;
pub use align_sets_node::*;

pub mod build_consensus_node;
pub use build_consensus_node::*;

pub mod assemble_pairs_node;
pub use assemble_pairs_node::*;

pub mod missing_filter_node;
pub use missing_filter_node::*;

pub mod parse_headers_node;
pub use parse_headers_node::*;

pub mod collapse_seq_node;
pub use collapse_seq_node::*;

pub mod split_seq_node;
pub use split_seq_node::*;

pub mod header_table_node;
pub use header_table_node::*;

pub mod parse_log_node;
pub use parse_log_node::*;

pub mod archive_node;
pub use archive_node::*;

use crate::graph::*;

/// Output written by a tool run with `--outname <channel prefix>`.
fn named_output(
    ws: &Workspace,
    channel: Channel,
    label: &str,
    ext: &str,
    intermediate: bool,
) -> Output {
    let prefix = ws.prefix(channel);
    Output {
        channel,
        expected: ws.out_path(&output_name(prefix, Some(label), ext)),
        pattern: Wildcard::new(&format!("{prefix}*_{label}.{ext}")),
        intermediate,
    }
}

/// Output written by a tool that names its files after the input file.
fn derived_output(
    ws: &Workspace,
    channel: Channel,
    input: &Path,
    label: &str,
    ext: &str,
    intermediate: bool,
) -> Output {
    let prefix = ws.prefix(channel);
    Output {
        channel,
        expected: ws.out_path(&output_name(&file_stem(input), Some(label), ext)),
        pattern: Wildcard::new(&format!("{prefix}*_{label}.{ext}")),
        intermediate,
    }
}

/// Options shared by the tools that process one file per channel.
fn with_common_opts(
    cmd: ToolCommand,
    ws: &Workspace,
    channel: Channel,
    nproc: Option<usize>,
    log: Option<&Path>,
) -> ToolCommand {
    let mut cmd = cmd;

    if let Some(nproc) = nproc {
        cmd = cmd.opt("--nproc", nproc);
    }

    cmd = cmd
        .opt("--outname", ws.prefix(channel))
        .path("--outdir", ws.out_dir());

    if let Some(log) = log {
        cmd = cmd.path("--log", log);
    }

    cmd
}
