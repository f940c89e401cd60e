use flate2::{write::GzEncoder, Compression};

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::errors::*;
use crate::presto_log::file_name;

/// Pack `files` into a gzipped tarball at `dest`, each entry stored under its file name.
///
/// Files that no longer exist are skipped. When `remove` is set, the archived originals are
/// deleted afterwards. Returns `false` without creating `dest` if nothing was left to archive.
pub fn archive_files(dest: impl AsRef<Path>, files: &[PathBuf], remove: bool) -> Result<bool> {
    let dest = dest.as_ref();
    let present = files
        .iter()
        .filter(|f| {
            let exists = f.is_file();
            if !exists {
                log::warn!("Not archiving {}: file not found", f.display());
            }
            exists
        })
        .collect::<Vec<_>>();

    if present.is_empty() {
        return Ok(false);
    }

    let out = BufWriter::new(File::create(dest).map_err(Error::file_io(dest))?);
    let mut builder = tar::Builder::new(GzEncoder::new(out, Compression::default()));

    for file in &present {
        builder
            .append_path_with_name(file, file_name(file))
            .map_err(Error::file_io(*file))?;
    }

    builder
        .into_inner()
        .and_then(|gz| gz.finish())
        .and_then(|out| out.into_inner().map_err(|e| e.into_error()))
        .map_err(Error::file_io(dest))?;

    if remove {
        for file in present {
            std::fs::remove_file(file).map_err(Error::file_io(file))?;
        }
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    use flate2::read::GzDecoder;

    fn entries(archive: &Path) -> Vec<String> {
        let mut archive = tar::Archive::new(GzDecoder::new(File::open(archive).unwrap()));
        archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().display().to_string())
            .collect()
    }

    #[test]
    fn archive_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("FS1.log");
        let b = dir.path().join("FS2.log");
        std::fs::write(&a, "ID> R1\n").unwrap();
        std::fs::write(&b, "ID> R2\n").unwrap();
        let dest = dir.path().join("LogFiles.tar.gz");

        let missing = dir.path().join("MP1.log");
        assert!(archive_files(&dest, &[a.clone(), missing, b.clone()], true).unwrap());

        assert_eq!(entries(&dest), vec!["FS1.log", "FS2.log"]);
        assert!(!a.exists());
        assert!(!b.exists());
    }

    #[test]
    fn archive_keeps_originals() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("S1-R1_quality-pass.fastq");
        std::fs::write(&a, "@r\nA\n+\nI\n").unwrap();
        let dest = dir.path().join("TempFiles.tar.gz");

        assert!(archive_files(&dest, &[a.clone()], false).unwrap());
        assert!(a.exists());
        assert_eq!(entries(&dest), vec!["S1-R1_quality-pass.fastq"]);
    }

    #[test]
    fn nothing_to_archive() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("LogFiles.tar.gz");
        assert!(!archive_files(&dest, &[dir.path().join("none.log")], true).unwrap());
        assert!(!dest.exists());
    }
}
