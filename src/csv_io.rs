use std::fs;
use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::Instant;

use polars::prelude::{Column, CsvReadOptions, CsvWriter, DataFrame, SerReader, SerWriter};
use tracing::{debug, info, trace};

use crate::domain::{EXPORT_FILE_NAME, TableError};
use crate::pipeline::VisibleColumns;
use crate::record::{Field, Record, Value};

/// Header of the identifier column. Identifiers are always reassigned on
/// import so the source values are dropped.
const ID_HEADER: &str = "id";

enum Target {
    Field(Field),
    Extra(String),
    Skip,
}

pub fn read_csv_file(path: &Path) -> Result<Vec<Record>, TableError> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => TableError::FileNotFound(path.to_path_buf()),
        ErrorKind::PermissionDenied => TableError::PermissionDenied(path.to_path_buf()),
        _ => TableError::IoError(e),
    })?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    parse_csv(bytes)
}

/// Parses csv text with a header row into records.
///
/// Headers naming a catalog field fill that field, other headers are kept as
/// extra attributes. Rows with an empty or missing `name` are dropped. The
/// id of a record is its 1-based row position in the file, so dropped rows
/// leave a gap.
pub fn parse_csv(bytes: Vec<u8>) -> Result<Vec<Record>, TableError> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(TableError::CsvParse("file is empty".to_string()));
    }
    let start_time = Instant::now();

    // Schema inference is disabled so every column is read as text.
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;

    let mut columns = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let header = column.name().as_str();
        let target = match header.parse::<Field>() {
            Ok(field) => Target::Field(field),
            Err(_) if header == ID_HEADER => Target::Skip,
            Err(_) => Target::Extra(header.to_string()),
        };
        columns.push((target, column.str()?));
    }

    let mut records = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let mut record = Record::new(row + 1);
        for (target, values) in columns.iter() {
            // The reader yields null for an empty cell; under a known header
            // that is still an empty value, not an absent one.
            let raw = values.get(row).unwrap_or("");
            match target {
                Target::Field(field) => record.set(*field, Value::parse(*field, raw)),
                Target::Extra(header) => record.extra.push((header.clone(), raw.to_string())),
                Target::Skip => {}
            }
        }

        if record.get(Field::Name).is_some_and(|name| !name.to_string().is_empty()) {
            records.push(record);
        } else {
            trace!("Dropping csv row {} without a name", row + 1);
        }
    }

    info!(
        "Parsed {} of {} csv rows in {}ms",
        records.len(),
        df.height(),
        start_time.elapsed().as_millis()
    );
    Ok(records)
}

/// Serializes all `records` in store order, restricted to the visible
/// columns in their visible order. Absent and empty values are written as
/// bare empty cells.
pub fn encode_csv(records: &[Record], visible: &VisibleColumns) -> Result<String, TableError> {
    if visible.is_empty() {
        return Ok(String::new());
    }

    let columns: Vec<Column> = visible
        .fields()
        .iter()
        .map(|&field| {
            let values: Vec<Option<String>> = records
                .iter()
                .map(|r| r.get(field).map(|v| v.to_string()).filter(|s| !s.is_empty()))
                .collect();
            Column::new(field.id().into(), values)
        })
        .collect();
    let mut df = DataFrame::new(columns)?;

    let mut buf = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .finish(&mut df)?;
    String::from_utf8(buf).map_err(|e| TableError::CsvParse(e.to_string()))
}

/// Writes the export file into `dir` and returns its path.
pub fn export_csv(
    dir: &Path,
    records: &[Record],
    visible: &VisibleColumns,
) -> Result<PathBuf, TableError> {
    let csv = encode_csv(records, visible)?;
    fs::create_dir_all(dir)?;
    let path = dir.join(EXPORT_FILE_NAME);
    fs::write(&path, csv)?;
    info!("Exported {} records to {}", records.len(), path.display());
    Ok(path)
}

/// One csv line for the visible values of a single record.
pub fn encode_row(record: &Record, visible: &VisibleColumns) -> String {
    visible
        .fields()
        .iter()
        .map(|&field| quote_cell(&record.display(field)))
        .collect::<Vec<String>>()
        .join(",")
}

fn quote_cell(cell: &str) -> String {
    let needs_wrapping = cell.chars().any(|c| matches!(c, ',' | '"' | '\n' | '\r'));
    if needs_wrapping {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
