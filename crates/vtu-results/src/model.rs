use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Name of the leading identifier column in every exported table.
pub const IDENTIFIER_COLUMN: &str = "USN";

/// Text written for a [`TableCell::Missing`] cell in tabular exports.
pub const MISSING_MARKER: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    Grid,
    Flow,
}

/// Symbolic outcomes a result page may print instead of a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarkToken {
    Ab,
    Ne,
    Absent,
    Fail,
    Pass,
}

impl MarkToken {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ab => "AB",
            Self::Ne => "NE",
            Self::Absent => "ABSENT",
            Self::Fail => "FAIL",
            Self::Pass => "PASS",
        }
    }
}

impl FromStr for MarkToken {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "AB" => Ok(Self::Ab),
            "NE" => Ok(Self::Ne),
            "ABSENT" => Ok(Self::Absent),
            "FAIL" => Ok(Self::Fail),
            "PASS" => Ok(Self::Pass),
            other => Err(format!("unknown mark token '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarkValue {
    Numeric(u64),
    Symbolic(MarkToken),
}

impl MarkValue {
    /// Numeric view used at the visualization boundary; tokens have no number.
    #[must_use]
    pub const fn as_number(self) -> Option<u64> {
        match self {
            Self::Numeric(value) => Some(value),
            Self::Symbolic(_) => None,
        }
    }
}

impl Display for MarkValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric(value) => write!(f, "{value}"),
            Self::Symbolic(token) => f.write_str(token.as_str()),
        }
    }
}

impl FromStr for MarkValue {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if !value.is_empty() && value.chars().all(|ch| ch.is_ascii_digit()) {
            return value
                .parse::<u64>()
                .map(Self::Numeric)
                .map_err(|error| format!("invalid numeric mark '{value}': {error}"));
        }
        value.parse::<MarkToken>().map(Self::Symbolic)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectMark {
    pub subject_code: String,
    pub mark: MarkValue,
}

/// Text nodes found under one table or row position.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cell {
    pub fragments: Vec<String>,
}

impl Cell {
    #[must_use]
    pub fn new<S: Into<String>>(fragments: impl IntoIterator<Item = S>) -> Self {
        Self {
            fragments: fragments.into_iter().map(Into::into).collect(),
        }
    }

    /// Non-empty fragments joined by single spaces.
    #[must_use]
    pub fn text(&self) -> String {
        self.fragments
            .iter()
            .flat_map(|fragment| fragment.split_whitespace())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Trimmed fragments that carry any text.
    pub fn trimmed_fragments(&self) -> impl Iterator<Item = &str> {
        self.fragments
            .iter()
            .map(|fragment| fragment.trim())
            .filter(|fragment| !fragment.is_empty())
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Self::new([text])
    }
}

impl From<String> for Cell {
    fn from(text: String) -> Self {
        Self::new([text])
    }
}

/// One structural row found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRow {
    pub strategy: Strategy,
    pub cells: Vec<Cell>,
}

impl CandidateRow {
    #[must_use]
    pub fn grid<C: Into<Cell>>(cells: impl IntoIterator<Item = C>) -> Self {
        Self {
            strategy: Strategy::Grid,
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn flow<C: Into<Cell>>(cells: impl IntoIterator<Item = C>) -> Self {
        Self {
            strategy: Strategy::Flow,
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.cells
            .iter()
            .map(Cell::text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentRecord {
    pub usn: String,
    pub marks: BTreeMap<String, MarkValue>,
}

/// A per-student page body as handed over by the fetch step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedPage {
    pub usn: String,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TableCell {
    Mark(MarkValue),
    Missing,
}

impl TableCell {
    #[must_use]
    pub const fn mark(self) -> Option<MarkValue> {
        match self {
            Self::Mark(mark) => Some(mark),
            Self::Missing => None,
        }
    }
}

impl Display for TableCell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mark(mark) => write!(f, "{mark}"),
            Self::Missing => f.write_str(MISSING_MARKER),
        }
    }
}

impl FromStr for TableCell {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.is_empty() || value == MISSING_MARKER {
            return Ok(Self::Missing);
        }
        value.parse::<MarkValue>().map(Self::Mark)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRow {
    pub usn: String,
    pub cells: Vec<TableCell>,
}

/// Identifier column plus subject columns, shared by full and projected tables.
pub trait MarkGrid {
    fn subjects(&self) -> &[String];
    fn rows(&self) -> &[StudentRow];

    fn header(&self) -> Vec<String> {
        std::iter::once(IDENTIFIER_COLUMN.to_string())
            .chain(self.subjects().iter().cloned())
            .collect()
    }

    fn text_rows(&self) -> Vec<Vec<String>> {
        self.rows()
            .iter()
            .map(|row| {
                std::iter::once(row.usn.clone())
                    .chain(row.cells.iter().map(ToString::to_string))
                    .collect()
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultTable {
    pub subjects: Vec<String>,
    pub rows: Vec<StudentRow>,
}

impl MarkGrid for ResultTable {
    fn subjects(&self) -> &[String] {
        &self.subjects
    }

    fn rows(&self) -> &[StudentRow] {
        &self.rows
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedTable {
    pub subjects: Vec<String>,
    pub rows: Vec<StudentRow>,
}

impl MarkGrid for ProjectedTable {
    fn subjects(&self) -> &[String] {
        &self.subjects
    }

    fn rows(&self) -> &[StudentRow] {
        &self.rows
    }
}
