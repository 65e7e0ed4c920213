use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::classify::{RowClass, classify_row};
use crate::model::{CandidateRow, Cell, MarkToken, Strategy, SubjectMark};
use crate::options::ExtractOptions;
use crate::page_reader::RawDocument;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("hardcoded CSS selector is valid")
}

static RESULT_TABLE: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"table[class*="table"], table#resultsTable"#));
static TABLE_ROW: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
static TABLE_CELL: LazyLock<Selector> = LazyLock::new(|| selector("td"));
static FLOW_ROW: LazyLock<Selector> = LazyLock::new(|| selector(r#"div[class*="divTableRow"]"#));
static FLOW_CELL: LazyLock<Selector> = LazyLock::new(|| selector(r#"div[class*="divTableCell"]"#));

fn element_cell(element: ElementRef<'_>) -> Cell {
    Cell::new(element.text())
}

/// One structural heuristic for finding subject rows in a result page.
pub trait ExtractionStrategy {
    fn kind(&self) -> Strategy;

    fn candidate_rows(&self, document: &Html) -> Vec<CandidateRow>;

    fn extract(&self, document: &Html, tokens: &[MarkToken]) -> Vec<SubjectMark> {
        let mut marks = Vec::new();
        for (index, row) in self.candidate_rows(document).iter().enumerate() {
            match classify_row(row, tokens) {
                RowClass::Data(subject_mark) => {
                    debug!(
                        strategy = ?self.kind(),
                        row = index,
                        subject = %subject_mark.subject_code,
                        mark = %subject_mark.mark,
                        "parsed subject row"
                    );
                    marks.push(subject_mark);
                }
                RowClass::Header => {
                    debug!(strategy = ?self.kind(), row = index, "skipping header row");
                }
                RowClass::Reject(reason) => {
                    debug!(strategy = ?self.kind(), row = index, ?reason, "skipping row");
                }
            }
        }
        marks
    }
}

/// `<tr>` rows of the first result-looking `<table>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridStrategy;

impl ExtractionStrategy for GridStrategy {
    fn kind(&self) -> Strategy {
        Strategy::Grid
    }

    fn candidate_rows(&self, document: &Html) -> Vec<CandidateRow> {
        let Some(table) = document.select(&RESULT_TABLE).next() else {
            return Vec::new();
        };
        table
            .select(&TABLE_ROW)
            .map(|row| CandidateRow {
                strategy: Strategy::Grid,
                cells: row.select(&TABLE_CELL).map(element_cell).collect(),
            })
            .collect()
    }
}

/// `divTableRow` containers with `divTableCell` children.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlowStrategy;

impl ExtractionStrategy for FlowStrategy {
    fn kind(&self) -> Strategy {
        Strategy::Flow
    }

    fn candidate_rows(&self, document: &Html) -> Vec<CandidateRow> {
        document
            .select(&FLOW_ROW)
            .map(|row| CandidateRow {
                strategy: Strategy::Flow,
                cells: row.select(&FLOW_CELL).map(element_cell).collect(),
            })
            .collect()
    }
}

#[must_use]
pub fn strategy_for(kind: Strategy) -> Box<dyn ExtractionStrategy> {
    match kind {
        Strategy::Grid => Box::new(GridStrategy),
        Strategy::Flow => Box::new(FlowStrategy),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Extraction {
    /// Strategy that produced the marks, `None` when every strategy came up empty.
    pub strategy: Option<Strategy>,
    pub marks: Vec<SubjectMark>,
}

/// Tries each strategy in priority order until one yields subject marks.
pub struct TableExtractor {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    options: ExtractOptions,
}

impl TableExtractor {
    #[must_use]
    pub fn new(options: &ExtractOptions) -> Self {
        Self {
            strategies: options.strategies.iter().copied().map(strategy_for).collect(),
            options: options.clone(),
        }
    }

    /// Appends a strategy after the configured ones.
    #[must_use]
    pub fn with_strategy(mut self, strategy: Box<dyn ExtractionStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    #[must_use]
    pub fn extract(&self, document: &RawDocument) -> Extraction {
        for strategy in &self.strategies {
            let kind = strategy.kind();
            let marks = strategy.extract(document.html(), self.options.mark_tokens(kind));
            if !marks.is_empty() {
                return Extraction {
                    strategy: Some(kind),
                    marks,
                };
            }
            debug!(strategy = ?kind, "strategy found no subject rows");
        }
        Extraction::default()
    }
}

impl Default for TableExtractor {
    fn default() -> Self {
        Self::new(&ExtractOptions::default())
    }
}
