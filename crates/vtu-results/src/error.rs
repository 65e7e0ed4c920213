use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("invalid results table: {0}")]
    InvalidTable(String),

    #[error("no student result data could be parsed from the batch")]
    EmptyBatch,

    #[error("no usable subject columns; missing: {}", missing.join(", "))]
    NoUsableColumns { missing: Vec<String> },
}
