//! File naming conventions shared with the external toolchain.
//!
//! Every tool writes `<out_name>_<label>.<ext>` into its output directory, and the next step
//! finds that file again by name or by wildcard.

use regex::Regex;

use std::path::{Path, PathBuf};

use crate::errors::*;

/// Output file name for a tool run with `--outname out_name`.
pub fn output_name(out_name: &str, label: Option<&str>, ext: &str) -> String {
    match label {
        Some(label) => format!("{out_name}_{label}.{ext}"),
        None => format!("{out_name}.{ext}"),
    }
}

/// Short name of a file without its directory or final extension.
pub fn file_stem(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Label of the numeric partition written by `SplitSeq.py group --num`.
///
/// Thresholds are formatted with one significant digit, so 2 gives `atleast-2` and 20 gives
/// `atleast-2e+01`.
pub fn group_label(threshold: u32) -> String {
    format!("atleast-{}", one_significant_digit(threshold))
}

fn one_significant_digit(n: u32) -> String {
    if n < 10 {
        return n.to_string();
    }

    let mut exp = 0;
    let mut scale = 1u64;
    while n as u64 / scale >= 10 {
        scale *= 10;
        exp += 1;
    }

    // round half to even, like printf
    let mut digit = n as u64 / scale;
    let rem = n as u64 % scale;
    let half = scale / 2;
    if rem > half || (rem == half && digit % 2 == 1) {
        digit += 1;
    }
    if digit == 10 {
        digit = 1;
        exp += 1;
    }
    format!("{digit}e+{exp:02}")
}

/// Shell-style wildcard pattern supporting `*` and `?`.
#[derive(Clone, Debug)]
pub struct Wildcard {
    pattern: String,
    regex: Regex,
}

impl Wildcard {
    pub fn new(pattern: &str) -> Self {
        let mut re = String::with_capacity(pattern.len() * 2 + 2);
        re.push('^');

        for c in pattern.chars() {
            match c {
                '*' => re.push_str(".*"),
                '?' => re.push('.'),
                c => re.push_str(&regex::escape(c.encode_utf8(&mut [0u8; 4]))),
            }
        }

        re.push('$');

        Self {
            pattern: pattern.to_owned(),
            // only literals and wildcards are emitted above
            regex: Regex::new(&re).unwrap_or_else(|e| panic!("Error compiling wildcard: {e}")),
        }
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

/// All files in `dir` whose name matches `pattern`, sorted by name.
pub fn find_all(dir: impl AsRef<Path>, pattern: &Wildcard) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut res = Vec::new();

    for entry in std::fs::read_dir(dir).map_err(Error::file_io(dir))? {
        let entry = entry.map_err(Error::file_io(dir))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };

        if pattern.is_match(name) && entry.path().is_file() {
            res.push(entry.path());
        }
    }

    res.sort();
    Ok(res)
}

/// The single file in `dir` whose name matches `pattern`.
pub fn find_one(dir: impl AsRef<Path>, pattern: &Wildcard) -> Result<PathBuf> {
    let dir = dir.as_ref();
    let matches = find_all(dir, pattern)?;
    single_match(dir, pattern, matches)
}

fn single_match(dir: &Path, pattern: &Wildcard, mut matches: Vec<PathBuf>) -> Result<PathBuf> {
    match matches.len() {
        0 => Err(Error::MissingInput {
            pattern: pattern.as_str().to_owned(),
            dir: dir.to_owned(),
        }),
        1 => Ok(matches.swap_remove(0)),
        _ => Err(Error::AmbiguousInput {
            pattern: pattern.as_str().to_owned(),
            matches: matches.iter().map(|p| p.display().to_string()).collect(),
        }),
    }
}

/// Whether a file was written by a pipeline step, like `S1-R1_quality-pass.fastq`.
pub fn is_step_output(path: impl AsRef<Path>) -> bool {
    file_stem(path)
        .rsplit_once('_')
        .map_or(false, |(_, label)| label.ends_with("-pass") || label.ends_with("-fail"))
}

/// Locate the read 1 and read 2 FASTQ files of a sequencing run directory.
///
/// Outputs left by an earlier run in the same directory are not candidates.
pub fn discover_pair(dir: impl AsRef<Path>) -> Result<(PathBuf, PathBuf)> {
    let dir = dir.as_ref();
    let r1 = find_input(dir, &Wildcard::new("*R1*.fastq"))?;
    let r2 = find_input(dir, &Wildcard::new("*R2*.fastq"))?;
    Ok((r1, r2))
}

fn find_input(dir: &Path, pattern: &Wildcard) -> Result<PathBuf> {
    let matches = find_all(dir, pattern)?
        .into_iter()
        .filter(|p| !is_step_output(p))
        .collect();
    single_match(dir, pattern, matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs::File;

    #[test]
    fn output_names() {
        assert_eq!(
            output_name("S1-R1", Some("quality-pass"), "fastq"),
            "S1-R1_quality-pass.fastq"
        );
        assert_eq!(output_name("Assembled", None, "fasta"), "Assembled.fasta");
        assert_eq!(file_stem("/tmp/run/FS1.log"), "FS1");
    }

    #[test]
    fn group_labels() {
        assert_eq!(group_label(2), "atleast-2");
        assert_eq!(group_label(9), "atleast-9");
        assert_eq!(group_label(20), "atleast-2e+01");
        assert_eq!(group_label(96), "atleast-1e+02");

        // ties go to the even digit
        assert_eq!(group_label(25), "atleast-2e+01");
        assert_eq!(group_label(45), "atleast-4e+01");
        assert_eq!(group_label(250), "atleast-2e+02");
        assert_eq!(group_label(35), "atleast-4e+01");
        assert_eq!(group_label(95), "atleast-1e+02");
        assert_eq!(group_label(26), "atleast-3e+01");
    }

    #[test]
    fn wildcard_matching() {
        let w = Wildcard::new("*R1*.fastq");
        assert!(w.is_match("Sample_S1_L001_R1_001.fastq"));
        assert!(!w.is_match("Sample_S1_L001_R2_001.fastq"));
        assert!(!w.is_match("Sample_R1.fastq.gz"));

        let w = Wildcard::new("FS?.log");
        assert!(w.is_match("FS1.log"));
        assert!(!w.is_match("FS12.log"));
        assert!(!w.is_match("FS1xlog"));
    }

    #[test]
    fn discover_reads() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("S1_R1_001.fastq")).unwrap();
        File::create(dir.path().join("S1_R2_001.fastq")).unwrap();
        File::create(dir.path().join("notes.txt")).unwrap();

        let (r1, r2) = discover_pair(dir.path()).unwrap();
        assert_eq!(r1, dir.path().join("S1_R1_001.fastq"));
        assert_eq!(r2, dir.path().join("S1_R2_001.fastq"));
    }

    #[test]
    fn discover_reads_after_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "S1_R1_001.fastq",
            "S1_R2_001.fastq",
            "S1-R1_quality-pass.fastq",
            "S1-R2_primers-pass.fastq",
            "S1-R1_primers-pass_pair-pass.fastq",
            "S1-R2_reheader-fail.fastq",
        ] {
            File::create(dir.path().join(name)).unwrap();
        }

        let (r1, r2) = discover_pair(dir.path()).unwrap();
        assert_eq!(r1, dir.path().join("S1_R1_001.fastq"));
        assert_eq!(r2, dir.path().join("S1_R2_001.fastq"));

        assert!(is_step_output("S1-R1_consensus-pass.fastq"));
        assert!(!is_step_output("S1_R1_001.fastq"));
    }

    #[test]
    fn discover_reads_errors() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("S1_R1_001.fastq")).unwrap();
        assert!(matches!(
            discover_pair(dir.path()),
            Err(Error::MissingInput { .. })
        ));

        File::create(dir.path().join("S2_R1_001.fastq")).unwrap();
        File::create(dir.path().join("S2_R2_001.fastq")).unwrap();
        assert!(matches!(
            discover_pair(dir.path()),
            Err(Error::AmbiguousInput { .. })
        ));
    }
}
