//! CSV table writers
//!
//! `CsvWriter` is the primary writer, built on the `csv` crate.
//! `PlainWriter` is the last resort: it formats every line by hand with
//! nothing but `std::fs`, quoting every field and doubling embedded quotes.

use crate::output::traits::{ExportError, ExportResult, Table, TableWriter};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Primary writer backed by the `csv` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvWriter;

/// Minimal hand-formatted writer
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainWriter;

fn write_error(writer: &'static str, path: &Path, message: impl ToString) -> ExportError {
    ExportError::Write {
        writer,
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

/// Creates the parent directory of `path` when it has one
fn ensure_parent(writer: &'static str, path: &Path) -> ExportResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| write_error(writer, path, e))?;
        }
    }
    Ok(())
}

impl TableWriter for CsvWriter {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn write(&self, table: &Table, path: &Path) -> ExportResult<()> {
        let name = self.name();
        ensure_parent(name, path)?;

        let file = File::create(path).map_err(|e| write_error(name, path, e))?;
        let mut writer = csv::Writer::from_writer(file);

        writer
            .write_record(&table.columns)
            .map_err(|e| write_error(name, path, e))?;
        for row in &table.rows {
            writer.write_record(row).map_err(|e| write_error(name, path, e))?;
        }
        writer.flush().map_err(|e| write_error(name, path, e))?;

        let file = writer
            .into_inner()
            .map_err(|e| write_error(name, path, e.error()))?;
        file.sync_all().map_err(|e| write_error(name, path, e))?;
        Ok(())
    }
}

/// Quotes a field, doubling any embedded quote
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

impl PlainWriter {
    fn format_line(fields: &[String]) -> String {
        let quoted: Vec<String> = fields.iter().map(|field| quote(field)).collect();
        quoted.join(",")
    }
}

impl TableWriter for PlainWriter {
    fn name(&self) -> &'static str {
        "plain"
    }

    fn write(&self, table: &Table, path: &Path) -> ExportResult<()> {
        let name = self.name();
        ensure_parent(name, path)?;

        let file = File::create(path).map_err(|e| write_error(name, path, e))?;
        let mut out = BufWriter::new(file);

        for fields in std::iter::once(&table.columns).chain(table.rows.iter()) {
            writeln!(out, "{}", Self::format_line(fields)).map_err(|e| write_error(name, path, e))?;
        }

        let file = out
            .into_inner()
            .map_err(|e| write_error(name, path, e.error()))?;
        file.sync_all().map_err(|e| write_error(name, path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn table() -> Table {
        Table {
            columns: vec!["name".to_string(), "price".to_string()],
            rows: vec![
                vec!["Crème \"riche\"".to_string(), "12,99 €".to_string()],
                vec!["Gel".to_string(), String::new()],
            ],
        }
    }

    #[test]
    fn test_csv_writer_escapes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        CsvWriter.write(&table(), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "name,price");
        assert_eq!(lines[1], "\"Crème \"\"riche\"\"\",\"12,99 €\"");
        assert_eq!(lines[2], "Gel,");
    }

    #[test]
    fn test_plain_writer_quotes_everything() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        PlainWriter.write(&table(), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "\"name\",\"price\"");
        assert_eq!(lines[1], "\"Crème \"\"riche\"\"\",\"12,99 €\"");
        assert_eq!(lines[2], "\"Gel\",\"\"");
    }

    #[test]
    fn test_plain_output_reads_back_as_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        PlainWriter.write(&table(), &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(&rows[0][0], "Crème \"riche\"");
        assert_eq!(&rows[1][1], "");
    }

    #[test]
    fn test_write_into_file_parent_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let err = CsvWriter.write(&table(), &blocker.join("out.csv")).unwrap_err();
        assert!(matches!(err, ExportError::Write { writer: "csv", .. }));
    }
}
