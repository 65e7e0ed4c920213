use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};

use crate::error::ResultsError;
use crate::model::{IDENTIFIER_COLUMN, MarkGrid, ResultTable, StudentRow, TableCell};

pub(crate) fn write_csv<T: MarkGrid>(
    path: &Path,
    table: &T,
    delimiter: u8,
) -> Result<(), ResultsError> {
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_path(path)?;
    writer.write_record(table.header())?;
    for row in table.text_rows() {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

pub(crate) fn write_csv_to_string<T: MarkGrid>(
    table: &T,
    delimiter: u8,
) -> Result<String, ResultsError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::<u8>::new());
    writer.write_record(table.header())?;
    for row in table.text_rows() {
        writer.write_record(&row)?;
    }
    writer.flush()?;

    let bytes = writer
        .into_inner()
        .map_err(|error| ResultsError::Csv(error.into_error().into()))?;
    String::from_utf8(bytes)
        .map_err(|error| ResultsError::InvalidTable(format!("invalid utf-8 csv output: {error}")))
}

/// Reads a table previously written by [`write_csv`]. Subject columns keep
/// the file's order.
pub(crate) fn read_csv<R: Read>(input: R, delimiter: u8) -> Result<ResultTable, ResultsError> {
    let mut reader = ReaderBuilder::new().delimiter(delimiter).from_reader(input);
    let headers = reader.headers()?.clone();
    let mut columns = headers.iter().map(|header| header.trim().to_string());
    match columns.next() {
        Some(first) if first == IDENTIFIER_COLUMN => {}
        other => {
            return Err(ResultsError::InvalidTable(format!(
                "first column must be {IDENTIFIER_COLUMN}, found {other:?}"
            )));
        }
    }
    let subjects = columns.collect::<Vec<_>>();

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let usn = record.get(0).unwrap_or_default().trim().to_string();
        if usn.is_empty() {
            continue;
        }
        let cells = (1..=subjects.len())
            .map(|index| {
                record
                    .get(index)
                    .unwrap_or_default()
                    .parse::<TableCell>()
                    .map_err(|error| {
                        ResultsError::InvalidTable(format!("row {}: {error}", line + 2))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(StudentRow { usn, cells });
    }

    Ok(ResultTable { subjects, rows })
}
