//! Console log records written by the toolchain with `--log`.
//!
//! A log is a sequence of records separated by blank lines. Each line of a record is a
//! right-aligned key, `"> "` and a value:
//! ```text
//!      ID> READ1
//! QUALITY> 36
//! ```

use memchr::memmem;

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::errors::*;
use crate::naming::*;

const KEY_DELIM: &[u8] = b"> ";

/// One log record: ordered key/value pairs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogRecord {
    entries: Vec<(String, String)>,
}

impl LogRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        self.entries.push((key.into(), value.to_string()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Render the record with keys right-aligned to the longest key, one entry per line.
    pub fn format(&self) -> String {
        let inset = self.entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        let mut res = String::new();

        for (k, v) in &self.entries {
            res.push_str(&format!("{k:>inset$}> {v}\n"));
        }

        res
    }
}

/// Parse the lines of one record.
///
/// Lines that do not split into exactly one key and one value are ignored.
pub fn parse_record(text: &str) -> LogRecord {
    let mut record = LogRecord::new();

    for line in text.lines() {
        let line = line.trim();
        let mut delims = memmem::find_iter(line.as_bytes(), KEY_DELIM);

        if let (Some(i), None) = (delims.next(), delims.next()) {
            record.push(&line[..i], &line[i + KEY_DELIM.len()..]);
        }
    }

    record
}

/// Split a log into records at blank lines.
///
/// The last record does not need a trailing blank line.
pub fn read_records(reader: impl BufRead) -> std::io::Result<Vec<LogRecord>> {
    let mut res = Vec::new();
    let mut block = String::new();

    for line in reader.lines() {
        let line = line?;

        if line.trim().is_empty() {
            if !block.is_empty() {
                res.push(parse_record(&block));
                block.clear();
            }
        } else {
            block.push_str(&line);
            block.push('\n');
        }
    }

    if !block.is_empty() {
        res.push(parse_record(&block));
    }

    Ok(res)
}

/// Counts reported after tabulating a log or sequence file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableCounts {
    pub output: PathBuf,
    pub records: usize,
    pub pass: usize,
    pub fail: usize,
}

impl TableCounts {
    pub fn to_record(&self, tool: &str) -> LogRecord {
        let mut record = LogRecord::new();
        record
            .push("OUTPUT", file_name(&self.output))
            .push("RECORDS", self.records)
            .push("PASS", self.pass)
            .push("FAIL", self.fail)
            .push("END", tool);
        record
    }
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Tab-delimited table writer with a fixed header.
///
/// Values of fields missing from a row are left empty and extra fields are dropped.
pub struct TableWriter<W: Write> {
    writer: W,
    fields: Vec<String>,
}

impl<W: Write> TableWriter<W> {
    pub fn new(mut writer: W, fields: &[String]) -> std::io::Result<Self> {
        writeln!(writer, "{}", fields.join("\t"))?;
        Ok(Self {
            writer,
            fields: fields.to_owned(),
        })
    }

    pub fn write_row<'a>(&mut self, get: impl Fn(&str) -> Option<&'a str>) -> std::io::Result<()> {
        let row = self
            .fields
            .iter()
            .map(|f| get(f).unwrap_or(""))
            .collect::<Vec<_>>();
        writeln!(self.writer, "{}", row.join("\t"))
    }

    pub fn finish(mut self) -> std::io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Field names as the toolchain writes them: upper-cased.
pub fn normalize_fields(fields: &[String]) -> Vec<String> {
    fields.iter().map(|f| f.to_ascii_uppercase()).collect()
}

/// Convert a log into a table of the requested fields.
///
/// The table is written to `<log stem>_table.tab`, next to the log unless `out_dir` is given.
/// Field names are matched case-insensitively.
pub fn table_log(
    log_file: impl AsRef<Path>,
    fields: &[String],
    out_dir: Option<&Path>,
) -> Result<TableCounts> {
    let log_file = log_file.as_ref();
    let fields = normalize_fields(fields);
    let dir = out_dir
        .or_else(|| log_file.parent())
        .unwrap_or_else(|| Path::new("."));
    let output = dir.join(output_name(&file_stem(log_file), Some("table"), "tab"));

    let reader = BufReader::new(File::open(log_file).map_err(Error::file_io(log_file))?);
    let records = read_records(reader).map_err(Error::file_io(log_file))?;

    std::fs::create_dir_all(dir).map_err(Error::file_io(dir))?;
    let out = BufWriter::new(File::create(&output).map_err(Error::file_io(&output))?);
    let mut table = TableWriter::new(out, &fields).map_err(Error::file_io(&output))?;

    let mut pass = 0;
    let mut fail = 0;

    for record in &records {
        if record.keys().any(|k| fields.iter().any(|f| f == k)) {
            pass += 1;
            table
                .write_row(|f| record.get(f))
                .map_err(Error::file_io(&output))?;
        } else if !record.is_empty() {
            fail += 1;
        }
    }

    table.finish().map_err(Error::file_io(&output))?;

    Ok(TableCounts {
        output,
        records: records.len(),
        pass,
        fail,
    })
}
