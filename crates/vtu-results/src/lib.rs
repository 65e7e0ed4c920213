mod aggregate;
mod chart;
mod classify;
mod csv_out;
mod error;
mod extract;
mod model;
mod options;
mod page_reader;
mod project;
mod record;
mod slot;
mod warning;
mod xlsx_out;

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::csv_out::{read_csv, write_csv, write_csv_to_string};
use crate::page_reader::read_pages_dir;
use crate::xlsx_out::{write_xlsx, write_xlsx_to_bytes};

pub use aggregate::aggregate;
pub use chart::{ChartFrames, Heatmap, HistogramSeries, LineSeries, build_chart_frames, numeric_matrix};
pub use classify::{RejectReason, RowClass, classify_row};
pub use error::ResultsError;
pub use extract::{Extraction, ExtractionStrategy, FlowStrategy, GridStrategy, TableExtractor};
pub use model::{
    CandidateRow, Cell, FetchedPage, IDENTIFIER_COLUMN, MISSING_MARKER, MarkGrid, MarkToken,
    MarkValue, ProjectedTable, ResultTable, Strategy, StudentRecord, StudentRow, SubjectMark,
    TableCell,
};
pub use options::{ColumnSelection, ExtractOptions, FIFTH_SEMESTER_COLUMNS, UsnList};
pub use page_reader::{PageStatus, RawDocument, decode_page_bytes, screen_page, usn_from_file_name};
pub use project::{Projection, project};
pub use record::build_record;
pub use slot::{MemorySlot, ResultSlot};
pub use warning::{ExtractWarning, WarningCode as ExtractWarningCode};

use crate::warning::WarningCode;

pub const RESULTS_SHEET_NAME: &str = "Results";
pub const PROJECTION_SHEET_NAME: &str = "Selected";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchReport {
    pub processed: usize,
    pub accepted: Vec<String>,
    pub skipped: Vec<String>,
    pub warnings: Vec<ExtractWarning>,
}

/// Screens, parses and extracts one page. Problems become warnings; `None`
/// means the student contributes nothing to the batch.
pub fn extract_student(
    page: &FetchedPage,
    extractor: &TableExtractor,
    warnings: &mut Vec<ExtractWarning>,
) -> Option<StudentRecord> {
    let usn = page.usn.trim();
    let Some(body) = page.body.as_deref() else {
        warn!(usn, "no page was fetched");
        warnings.push(
            ExtractWarning::new(WarningCode::NoPage, "no result page was fetched").with_usn(usn),
        );
        return None;
    };

    match screen_page(body) {
        PageStatus::Results => {}
        PageStatus::Empty => {
            warn!(usn, "page body is empty");
            warnings.push(
                ExtractWarning::new(WarningCode::EmptyDocument, PageStatus::Empty.describe())
                    .with_usn(usn),
            );
            return None;
        }
        status => {
            warn!(usn, reason = status.describe(), "portal did not return results");
            warnings.push(
                ExtractWarning::new(WarningCode::PortalRejected, status.describe()).with_usn(usn),
            );
            return None;
        }
    }

    let document = RawDocument::parse(body);
    let extraction = extractor.extract(&document);
    if extraction.strategy == Some(Strategy::Flow) {
        warnings.push(
            ExtractWarning::new(
                WarningCode::FlowFallbackUsed,
                "no result table rows found; parsed divTableRow layout instead",
            )
            .with_usn(usn),
        );
    }

    let subject_count = extraction.marks.len();
    match build_record(usn, extraction.marks) {
        Some(record) => {
            info!(usn, subjects = subject_count, "parsed student results");
            Some(record)
        }
        None => {
            warn!(usn, "no subject/mark data extracted");
            warnings.push(
                ExtractWarning::new(
                    WarningCode::NoResultData,
                    "no subject/mark data could be extracted from the page",
                )
                .with_usn(usn),
            );
            None
        }
    }
}

/// Extracts every page and aggregates the accepted records, in page order.
pub fn run_batch(
    pages: &[FetchedPage],
    options: &ExtractOptions,
) -> Result<(ResultTable, BatchReport), ResultsError> {
    let extractor = TableExtractor::new(options);
    let mut report = BatchReport {
        processed: pages.len(),
        ..BatchReport::default()
    };

    let mut seen = HashSet::new();
    let mut order = Vec::with_capacity(pages.len());
    let mut records = Vec::new();
    for page in pages {
        let usn = page.usn.trim().to_string();
        if !seen.insert(usn.clone()) {
            report.warnings.push(
                ExtractWarning::new(
                    WarningCode::DuplicateUsn,
                    "USN appears more than once; the last page that parses wins",
                )
                .with_usn(&usn),
            );
        } else {
            order.push(usn.clone());
        }

        match extract_student(page, &extractor, &mut report.warnings) {
            Some(record) => records.push(record),
            None => report.skipped.push(usn),
        }
    }

    let table = aggregate(&order, &records)?;
    report.accepted = table.rows.iter().map(|row| row.usn.clone()).collect();
    report.skipped.retain(|usn| !report.accepted.contains(usn));
    info!(
        students = table.rows.len(),
        subjects = table.subjects.len(),
        skipped = report.skipped.len(),
        "aggregated batch"
    );
    Ok((table, report))
}

/// Runs a batch and swaps the new table into `slot` once it is complete.
pub fn run_batch_into<S: ResultSlot + ?Sized>(
    slot: &S,
    pages: &[FetchedPage],
    options: &ExtractOptions,
) -> Result<(Arc<ResultTable>, BatchReport), ResultsError> {
    let (table, report) = run_batch(pages, options)?;
    slot.replace(table);
    let latest = slot
        .latest()
        .ok_or_else(|| ResultsError::InvalidTable("result slot is empty after replace".to_string()))?;
    Ok((latest, report))
}

/// Projects `table` onto `selection`, reporting missing columns as a warning.
pub fn project_table(
    table: &ResultTable,
    selection: &ColumnSelection,
) -> Result<(Projection, Vec<ExtractWarning>), ResultsError> {
    let projection = project(table, selection.columns())?;
    let mut warnings = Vec::new();
    if !projection.missing_columns.is_empty() {
        warn!(missing = ?projection.missing_columns, "some requested columns are not in the results");
        warnings.push(ExtractWarning::new(
            WarningCode::MissingColumns,
            format!(
                "columns not found in results: {}",
                projection.missing_columns.join(", ")
            ),
        ));
    }
    Ok((projection, warnings))
}

pub fn read_pages(dir: &Path) -> Result<Vec<FetchedPage>, ResultsError> {
    read_pages_dir(dir)
}

pub fn table_to_csv_string<T: MarkGrid>(table: &T, delimiter: u8) -> Result<String, ResultsError> {
    write_csv_to_string(table, delimiter)
}

pub fn write_table_csv<T: MarkGrid>(
    path: &Path,
    table: &T,
    delimiter: u8,
) -> Result<(), ResultsError> {
    write_csv(path, table, delimiter)
}

pub fn read_table_csv(path: &Path, delimiter: u8) -> Result<ResultTable, ResultsError> {
    let file = std::fs::File::open(path)?;
    read_csv(file, delimiter)
}

pub fn parse_table_csv(text: &str, delimiter: u8) -> Result<ResultTable, ResultsError> {
    read_csv(text.as_bytes(), delimiter)
}

pub fn table_to_xlsx_bytes<T: MarkGrid>(table: &T, sheet_name: &str) -> Result<Vec<u8>, ResultsError> {
    write_xlsx_to_bytes(table, sheet_name)
}

pub fn write_table_xlsx<T: MarkGrid>(
    path: &Path,
    table: &T,
    sheet_name: &str,
) -> Result<(), ResultsError> {
    write_xlsx(path, table, sheet_name)
}

#[cfg(test)]
mod tests {
    use super::{ExtractWarningCode, run_batch, run_batch_into};
    use crate::model::{FetchedPage, MarkGrid};
    use crate::options::ExtractOptions;
    use crate::slot::{MemorySlot, ResultSlot};
    use crate::ResultsError;

    fn grid_page(rows: &[(&str, &str)]) -> String {
        let body = rows
            .iter()
            .enumerate()
            .map(|(index, (subject, mark))| {
                format!("<tr><td>{}</td><td>{subject}</td><td>x</td><td>y</td><td>{mark}</td></tr>", index + 1)
            })
            .collect::<String>();
        format!(r#"<table class="table">{body}</table>"#)
    }

    fn page(usn: &str, body: Option<String>) -> FetchedPage {
        FetchedPage {
            usn: usn.to_string(),
            body,
        }
    }

    #[test]
    fn batch_isolates_failed_pages() {
        let pages = vec![
            page("1CS01", Some(grid_page(&[("21CS51", "88")]))),
            page("1CS02", None),
            page("1CS03", Some("Invalid USN".to_string())),
            page("1CS04", Some("<p>maintenance</p>".to_string())),
            page("1CS05", Some(grid_page(&[("21CS52", "76")]))),
        ];

        let (table, report) = run_batch(&pages, &ExtractOptions::default()).expect("batch");
        assert_eq!(table.header(), vec!["USN", "21CS51", "21CS52"]);
        assert_eq!(report.processed, 5);
        assert_eq!(report.accepted, vec!["1CS01", "1CS05"]);
        assert_eq!(report.skipped, vec!["1CS02", "1CS03", "1CS04"]);

        let codes: Vec<_> = report.warnings.iter().map(|warning| warning.code).collect();
        assert_eq!(
            codes,
            vec![
                ExtractWarningCode::NoPage,
                ExtractWarningCode::PortalRejected,
                ExtractWarningCode::NoResultData,
            ]
        );
    }

    #[test]
    fn batch_without_any_record_is_empty() {
        let pages = vec![page("1CS01", Some(String::new()))];
        let err = run_batch(&pages, &ExtractOptions::default()).expect_err("empty batch");
        assert!(matches!(err, ResultsError::EmptyBatch));
    }

    #[test]
    fn duplicate_usn_keeps_last_page() {
        let pages = vec![
            page("1CS01", Some(grid_page(&[("21CS51", "10")]))),
            page("1CS01", Some(grid_page(&[("21CS51", "20")]))),
        ];
        let (table, report) = run_batch(&pages, &ExtractOptions::default()).expect("batch");
        assert_eq!(table.text_rows(), vec![vec!["1CS01", "20"]]);
        assert_eq!(report.warnings[0].code, ExtractWarningCode::DuplicateUsn);
    }

    #[test]
    fn duplicate_usn_keeps_earlier_page_when_later_fails() {
        let pages = vec![
            page("1CS01", Some(grid_page(&[("21CS51", "10")]))),
            page("1CS01", None),
        ];
        let (table, report) = run_batch(&pages, &ExtractOptions::default()).expect("batch");
        assert_eq!(table.text_rows(), vec![vec!["1CS01", "10"]]);
        assert_eq!(report.accepted, vec!["1CS01"]);
        assert!(report.skipped.is_empty());

        let duplicate = &report.warnings[0];
        assert_eq!(duplicate.code, ExtractWarningCode::DuplicateUsn);
        assert!(duplicate.message.contains("last page that parses"));
        assert_eq!(report.warnings[1].code, ExtractWarningCode::NoPage);
    }

    #[test]
    fn slot_holds_latest_batch() {
        let slot = MemorySlot::new();
        let pages = vec![page("1CS01", Some(grid_page(&[("21CS51", "10")])))];
        let (latest, _) = run_batch_into(&slot, &pages, &ExtractOptions::default()).expect("batch");
        assert_eq!(latest.subjects, vec!["21CS51"]);

        let failing = vec![page("1CS02", None)];
        assert!(run_batch_into(&slot, &failing, &ExtractOptions::default()).is_err());
        assert_eq!(
            slot.latest().expect("previous table kept").subjects,
            vec!["21CS51"]
        );
    }
}
