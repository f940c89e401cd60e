use serde::Deserialize;

use std::path::{Path, PathBuf};

use crate::errors::*;

/// Which of the two pipeline entry points is being run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Preset {
    /// Reads are discovered inside one directory, which also receives the outputs.
    Directory,
    /// Read 1, read 2 and the output directory are given explicitly.
    Pair,
}

/// How primers are handled by `MaskPrimers.py`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimerMode {
    Cut,
    Mask,
    Trim,
    Tag,
}

impl PrimerMode {
    pub fn as_str(&self) -> &'static str {
        use PrimerMode::*;
        match self {
            Cut => "cut",
            Mask => "mask",
            Trim => "trim",
            Tag => "tag",
        }
    }
}

/// Executables of the external toolchain.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolPaths {
    pub filter_seq: String,
    pub mask_primers: String,
    pub pair_seq: String,
    pub align_sets: String,
    pub build_consensus: String,
    pub assemble_pairs: String,
    pub parse_headers: String,
    pub collapse_seq: String,
    pub split_seq: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            filter_seq: "FilterSeq.py".to_owned(),
            mask_primers: "MaskPrimers.py".to_owned(),
            pair_seq: "PairSeq.py".to_owned(),
            align_sets: "AlignSets.py".to_owned(),
            build_consensus: "BuildConsensus.py".to_owned(),
            assemble_pairs: "AssemblePairs.py".to_owned(),
            parse_headers: "ParseHeaders.py".to_owned(),
            collapse_seq: "CollapseSeq.py".to_owned(),
            split_seq: "SplitSeq.py".to_owned(),
        }
    }
}

/// Every parameter the pipeline passes to the external tools.
///
/// All fields have defaults, so a YAML configuration only needs the keys it changes.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Params {
    pub nproc: usize,

    /// Mean quality score threshold for `FilterSeq.py quality`.
    pub fs_qual: u32,
    /// Maximum number of missing bases for `FilterSeq.py missing`.
    pub fs_miss: u32,

    pub r1_primers: Option<PathBuf>,
    pub r2_primers: Option<PathBuf>,
    pub mp_r1_mode: PrimerMode,
    pub mp_r2_mode: PrimerMode,
    pub mp_r1_maxerr: f64,
    pub mp_r2_maxerr: f64,
    /// Length of the UID barcode preceding the read 2 primer.
    pub uid_len: usize,

    pub pair_field: String,
    pub coord: String,

    /// Whether to run `AlignSets.py muscle`; unset means the preset decides.
    pub align_sets: Option<bool>,
    pub muscle_exec: PathBuf,

    pub bc_qual: u32,
    pub bc_maxerr: f64,
    pub bc_prcons: f64,
    pub bc_maxgap: f64,

    pub ap_maxerr: f64,
    pub ap_alpha: f64,

    pub cs_miss: u32,
    /// Minimum consensus count a unique sequence needs to land in the `atleast` group.
    pub sp_threshold: u32,

    pub out_name: String,
    pub table_fields: Vec<String>,

    pub keep_going: bool,
    pub archive: bool,
    pub remove_archived: bool,

    pub tools: ToolPaths,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            nproc: 4,
            fs_qual: 20,
            fs_miss: 20,
            r1_primers: None,
            r2_primers: None,
            mp_r1_mode: PrimerMode::Cut,
            mp_r2_mode: PrimerMode::Cut,
            mp_r1_maxerr: 0.2,
            mp_r2_maxerr: 0.5,
            uid_len: 17,
            pair_field: "BARCODE".to_owned(),
            coord: "illumina".to_owned(),
            align_sets: None,
            muscle_exec: PathBuf::from("/usr/local/bin/muscle"),
            bc_qual: 0,
            bc_maxerr: 0.1,
            bc_prcons: 0.6,
            bc_maxgap: 0.5,
            ap_maxerr: 0.3,
            ap_alpha: 1e-5,
            cs_miss: 0,
            sp_threshold: 2,
            out_name: "Assembled".to_owned(),
            table_fields: ["ID", "PRCONS", "CONSCOUNT", "DUPCOUNT"]
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
            keep_going: false,
            archive: true,
            remove_archived: true,
            tools: ToolPaths::default(),
        }
    }
}

impl Params {
    /// Whether the multiple alignment step runs for an entry point.
    ///
    /// Unless configured explicitly, only the pair preset multiple-aligns each UID read group
    /// before building consensus sequences.
    pub fn aligns(&self, preset: Preset) -> bool {
        self.align_sets.unwrap_or(preset == Preset::Pair)
    }

    /// Parse parameters from YAML.
    ///
    /// Keys missing from the YAML keep their default value.
    pub fn from_yaml_str(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }

    pub fn from_yaml_file(file: impl AsRef<Path>) -> Result<Self> {
        let file = file.as_ref();
        let yaml = std::fs::read_to_string(file).map_err(Error::file_io(file))?;
        Self::from_yaml_str(&yaml).map_err(|e| Error::Config {
            file: file.display().to_string(),
            source: e,
        })
    }

    /// Check parameter ranges and that every file the pipeline needs is set.
    pub fn validate(&self) -> Result<()> {
        if self.nproc == 0 {
            return Err(Error::InvalidParam {
                name: "nproc",
                reason: "must be greater than zero".to_owned(),
            });
        }

        let rates = [
            ("mp_r1_maxerr", self.mp_r1_maxerr),
            ("mp_r2_maxerr", self.mp_r2_maxerr),
            ("bc_maxerr", self.bc_maxerr),
            ("bc_prcons", self.bc_prcons),
            ("bc_maxgap", self.bc_maxgap),
            ("ap_maxerr", self.ap_maxerr),
            ("ap_alpha", self.ap_alpha),
        ];

        for (name, rate) in rates {
            if !(0.0..=1.0).contains(&rate) {
                return Err(Error::InvalidParam {
                    name,
                    reason: format!("{rate} is not between 0 and 1"),
                });
            }
        }

        if self.r1_primers.is_none() {
            return Err(Error::InvalidParam {
                name: "r1_primers",
                reason: "no primer file given".to_owned(),
            });
        }
        if self.r2_primers.is_none() {
            return Err(Error::InvalidParam {
                name: "r2_primers",
                reason: "no primer file given".to_owned(),
            });
        }
        if self.out_name.is_empty() || self.out_name.contains('/') {
            return Err(Error::InvalidParam {
                name: "out_name",
                reason: format!("\"{}\" is not a valid file prefix", self.out_name),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_toggle_alignment() {
        let mut params = Params::default();
        assert!(!params.aligns(Preset::Directory));
        assert!(params.aligns(Preset::Pair));

        params.align_sets = Some(true);
        assert!(params.aligns(Preset::Directory));
        params.align_sets = Some(false);
        assert!(!params.aligns(Preset::Pair));
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(Params::from_yaml_str("\n").unwrap(), Params::default());
    }

    #[test]
    fn yaml_overrides_only_given_keys() {
        let yaml = "
            nproc: 16
            fs_qual: 25
            r1_primers: /data/primers/R1.fasta
            mp_r2_mode: mask
            tools:
              filter_seq: /opt/presto/bin/FilterSeq.py
        ";
        let params = Params::from_yaml_str(yaml).unwrap();

        assert_eq!(params.nproc, 16);
        assert_eq!(params.fs_qual, 25);
        assert_eq!(params.r1_primers, Some(PathBuf::from("/data/primers/R1.fasta")));
        assert_eq!(params.mp_r2_mode, PrimerMode::Mask);
        assert_eq!(params.tools.filter_seq, "/opt/presto/bin/FilterSeq.py");
        assert_eq!(params.tools.pair_seq, "PairSeq.py");
        assert_eq!(params.fs_miss, Params::default().fs_miss);
    }

    #[test]
    fn yaml_rejects_unknown_keys() {
        assert!(Params::from_yaml_str("fs_quality: 30").is_err());
    }

    #[test]
    fn validate_ranges() {
        let mut params = Params::default();
        params.r1_primers = Some(PathBuf::from("R1.fasta"));
        params.r2_primers = Some(PathBuf::from("R2.fasta"));
        assert!(params.validate().is_ok());

        params.bc_maxerr = 1.5;
        assert!(matches!(
            params.validate(),
            Err(Error::InvalidParam { name: "bc_maxerr", .. })
        ));

        params.bc_maxerr = 0.1;
        params.nproc = 0;
        assert!(matches!(
            params.validate(),
            Err(Error::InvalidParam { name: "nproc", .. })
        ));
    }

    #[test]
    fn validate_requires_primers() {
        let params = Params::default();
        assert!(matches!(
            params.validate(),
            Err(Error::InvalidParam { name: "r1_primers", .. })
        ));
    }
}
