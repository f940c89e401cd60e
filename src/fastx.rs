use needletail::{parse_fastx_file, FastxReader};

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::annotation::*;
use crate::errors::*;
use crate::naming::*;
use crate::presto_log::*;

fn open(file: &Path) -> Result<Option<Box<dyn FastxReader>>> {
    let len = std::fs::metadata(file).map_err(Error::file_io(file))?.len();

    if len == 0 {
        return Ok(None);
    }

    parse_fastx_file(file).map(Some).map_err(|e| Error::ParseRecord {
        file: file.to_owned(),
        source: Box::new(e),
    })
}

/// Number of records in a FASTA or FASTQ file.
pub fn count_records(file: impl AsRef<Path>) -> Result<usize> {
    let file = file.as_ref();
    let Some(mut reader) = open(file)? else { return Ok(0) };
    let mut count = 0;

    while let Some(record) = reader.next() {
        record.map_err(|e| Error::ParseRecord {
            file: file.to_owned(),
            source: Box::new(e),
        })?;
        count += 1;
    }

    Ok(count)
}

/// Write the requested header annotations of every record to `<stem>_headers.tab`.
///
/// Field names are matched case-insensitively.
/// Records whose header cannot be parsed, or that carry none of the fields, are counted as
/// failed and left out of the table.
pub fn table_headers(
    file: impl AsRef<Path>,
    fields: &[String],
    out_dir: Option<&Path>,
) -> Result<TableCounts> {
    let file = file.as_ref();
    let fields = normalize_fields(fields);
    let dir = out_dir
        .or_else(|| file.parent())
        .unwrap_or_else(|| Path::new("."));
    let output = dir.join(output_name(&file_stem(file), Some("headers"), "tab"));

    std::fs::create_dir_all(dir).map_err(Error::file_io(dir))?;
    let out = BufWriter::new(File::create(&output).map_err(Error::file_io(&output))?);
    let mut table = TableWriter::new(out, &fields).map_err(Error::file_io(&output))?;

    let mut records = 0;
    let mut pass = 0;
    let mut fail = 0;

    if let Some(mut reader) = open(file)? {
        while let Some(record) = reader.next() {
            let record = record.map_err(|e| Error::ParseRecord {
                file: file.to_owned(),
                source: Box::new(e),
            })?;
            records += 1;

            let header = String::from_utf8_lossy(record.id());
            let ann = match Annotation::parse(&header) {
                Ok(ann) => ann.select(&fields),
                Err(e) => {
                    log::debug!("{e}");
                    fail += 1;
                    continue;
                }
            };

            if ann.is_empty() {
                fail += 1;
            } else {
                pass += 1;
                table
                    .write_row(|f| ann.get(f))
                    .map_err(Error::file_io(&output))?;
            }
        }
    }

    table.finish().map_err(Error::file_io(&output))?;

    Ok(TableCounts {
        output,
        records,
        pass,
        fail,
    })
}

fn write_record(
    writer: &mut impl Write,
    header: &[u8],
    seq: &[u8],
    qual: Option<&[u8]>,
) -> std::io::Result<()> {
    match qual {
        Some(qual) => {
            writer.write_all(b"@")?;
            writer.write_all(header)?;
            writer.write_all(b"\n")?;
            writer.write_all(seq)?;
            writer.write_all(b"\n+\n")?;
            writer.write_all(qual)?;
        }
        None => {
            writer.write_all(b">")?;
            writer.write_all(header)?;
            writer.write_all(b"\n")?;
            writer.write_all(seq)?;
        }
    }
    writer.write_all(b"\n")
}

/// Rewrite free-text headers into annotation headers.
///
/// Records whose header can be repaired go to `<stem>_reheader-pass.<ext>`, the rest go
/// unchanged to `<stem>_reheader-fail.<ext>`. The returned counts name the pass file.
pub fn convert_headers(file: impl AsRef<Path>, out_dir: Option<&Path>) -> Result<TableCounts> {
    let file = file.as_ref();
    let dir = out_dir
        .or_else(|| file.parent())
        .unwrap_or_else(|| Path::new("."));
    let ext = file
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "fastq".to_owned());
    let stem = file_stem(file);
    let pass_file = dir.join(output_name(&stem, Some("reheader-pass"), &ext));
    let fail_file = dir.join(output_name(&stem, Some("reheader-fail"), &ext));

    std::fs::create_dir_all(dir).map_err(Error::file_io(dir))?;
    let mut pass_out =
        BufWriter::new(File::create(&pass_file).map_err(Error::file_io(&pass_file))?);
    let mut fail_out =
        BufWriter::new(File::create(&fail_file).map_err(Error::file_io(&fail_file))?);

    let mut records = 0;
    let mut pass = 0;
    let mut fail = 0;

    if let Some(mut reader) = open(file)? {
        while let Some(record) = reader.next() {
            let record = record.map_err(|e| Error::ParseRecord {
                file: file.to_owned(),
                source: Box::new(e),
            })?;
            records += 1;

            let header = String::from_utf8_lossy(record.id());
            let converted = Annotation::convert(&header).and_then(|h| Annotation::parse(&h).ok());

            match converted {
                Some(ann) => {
                    pass += 1;
                    let header = ann.to_string();
                    write_record(&mut pass_out, header.as_bytes(), &record.seq(), record.qual())
                        .map_err(Error::file_io(&pass_file))?;
                }
                None => {
                    fail += 1;
                    write_record(&mut fail_out, record.id(), &record.seq(), record.qual())
                        .map_err(Error::file_io(&fail_file))?;
                }
            }
        }
    }

    pass_out.flush().map_err(Error::file_io(&pass_file))?;
    fail_out.flush().map_err(Error::file_io(&fail_file))?;

    Ok(TableCounts {
        output: pass_file,
        records,
        pass,
        fail,
    })
}
