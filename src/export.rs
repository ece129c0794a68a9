//! Streaming CSV export of matched file records
//!
//! The exporter is the downstream consumer of the scan: it pulls
//! records off the lazy iterator and writes them out as they arrive.
//! Fields containing separators, quotes or newlines are quoted;
//! timestamps are RFC 3339 in UTC.

use crate::scanner::record::FileRecord;
use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::SystemTime;

const HEADER: &str =
    "path,parent,size,modified,created,accessed,read_only,hidden,system,depth\n";

/// Writes scan records to a CSV file as they stream in
pub struct CsvExporter {
    writer: BufWriter<File>,
    written: u64,
}

impl CsvExporter {
    /// Create the output file and write the header
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(HEADER.as_bytes())?;
        Ok(Self { writer, written: 0 })
    }

    /// Append one record
    pub fn write_record(&mut self, record: &FileRecord) -> io::Result<()> {
        let path = record.path.to_string_lossy();
        let parent = record.parent.to_string_lossy();

        writeln!(
            self.writer,
            "{},{},{},{},{},{},{},{},{},{}",
            escape(&path),
            escape(&parent),
            record.size,
            format_time(Some(record.modified)),
            format_time(record.created),
            format_time(record.accessed),
            record.read_only,
            record.hidden,
            record.system,
            record.depth,
        )?;
        self.written += 1;
        Ok(())
    }

    /// Records written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush and close, returning the record count
    pub fn finish(mut self) -> io::Result<u64> {
        self.writer.flush()?;
        Ok(self.written)
    }
}

/// Quote a field if it contains a comma, quote, or newline
fn escape(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// RFC 3339 UTC, or empty when the filesystem did not supply the time
fn format_time(time: Option<SystemTime>) -> String {
    match time {
        Some(time) => DateTime::<Utc>::from(time).to_rfc3339(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_escape() {
        assert_eq!(escape("plain.txt"), "plain.txt");
        assert_eq!(escape("with,comma"), "\"with,comma\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn test_export_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("data.bin");
        fs::write(&file_path, b"12345").unwrap();
        let metadata = fs::metadata(&file_path).unwrap();
        let record = FileRecord::from_metadata(file_path, 2, &metadata).unwrap();

        let out_path = dir.path().join("out.csv");
        let mut exporter = CsvExporter::create(&out_path).unwrap();
        exporter.write_record(&record).unwrap();
        assert_eq!(exporter.finish().unwrap(), 1);

        let contents = fs::read_to_string(&out_path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some(HEADER.trim_end()));

        let row = lines.next().unwrap();
        assert!(row.contains("data.bin"));
        assert!(row.contains(",5,"));
        assert!(row.ends_with(",2"));
        assert!(lines.next().is_none());
    }
}
