//! Rust library for running the pRESTO repertoire pipeline on paired-end antibody reads.
//!
//! # Overview
//! abseq-pipeline turns a pair of read 1 / read 2 FASTQ files into a deduplicated repertoire
//! of assembled antibody sequences. The sequence processing itself is done by the external
//! pRESTO command-line tools; this crate decides their order and parameters, connects the output
//! of each step to the input of the next, and keeps the books on their logs.
//!
//! ## Steps
//! A pipeline is a [`Graph`] of steps ("nodes") run in a fixed order:
//! 1. quality filtering of each read (`FilterSeq.py quality`)
//! 2. primer identification, keeping the read 2 UID as a barcode (`MaskPrimers.py score`)
//! 3. read pairing (`PairSeq.py`)
//! 4. optionally, multiple alignment of each UID read group (`AlignSets.py muscle`)
//! 5. UID consensus building (`BuildConsensus.py`)
//! 6. pair assembly (`AssemblePairs.py align`)
//! 7. missing-base filtering (`FilterSeq.py missing`)
//! 8. header rewriting (`ParseHeaders.py collapse`)
//! 9. deduplication (`CollapseSeq.py`)
//! 10. grouping by consensus count (`SplitSeq.py group`)
//! 11. a table of the final headers, written by this crate
//! 12. a table for every tool log, written by this crate with one thread per log
//! 13. archiving of logs and intermediate files into gzipped tarballs
//!
//! See [`build_pipeline()`] for how steps are put together and [`run_pipeline()`] to run them.
//!
//! ## Channels and file names
//! Every step reads the current file of one or more *channels* (read 1, read 2 and, after
//! assembly, the assembled reads) and moves the channel to the file it writes.
//! Tools name their outputs `<prefix>_<label>.<ext>`:
//! ```text
//! S1-R1_quality-pass.fastq
//! S1-R1_primers-pass.fastq
//! S1-R1_primers-pass_pair-pass.fastq
//! S1-R1_consensus-pass.fastq
//! Assembled_assemble-pass.fastq
//! Assembled_collapse-unique.fasta
//! ```
//! A step looks for the name it expects first, and falls back to the single file matching
//! `<prefix>*_<label>.<ext>` in the output directory.
//!
//! ## Failures
//! By default the run stops at the first tool that exits with an error or does not write its
//! output. With [`Params::keep_going`] set, failing tools are logged and the run continues,
//! skipping every step whose input is gone.
//!
//! ## Running tools
//! Commands go through a [`ToolRunner`]. [`ProcessRunner`] starts real processes and
//! [`DryRunRunner`] only prints the commands, trusting the expected output names.

pub mod annotation;
pub mod archive;
pub mod errors;
pub mod fastx;
pub mod graph;
pub mod naming;
pub mod params;
pub mod pipeline;
pub mod presto_log;
pub mod tool;

// commonly used functions and types

pub use crate::errors::*;
pub use crate::graph::*;
pub use crate::params::*;
pub use crate::pipeline::*;
pub use crate::tool::*;
