use std::collections::HashSet;
use std::str::FromStr;

use crate::model::{IDENTIFIER_COLUMN, MarkToken, Strategy};

/// Columns of the fifth semester export, identifier first.
pub const FIFTH_SEMESTER_COLUMNS: &[&str] = &[
    IDENTIFIER_COLUMN,
    "21CIV57",
    "21CS51",
    "21CS52",
    "21CS53",
    "21CS54",
    "21CSL55",
    "21CSL581",
    "21RMI56",
];

pub(crate) const GRID_MARK_TOKENS: &[MarkToken] = &[
    MarkToken::Ab,
    MarkToken::Ne,
    MarkToken::Absent,
    MarkToken::Fail,
    MarkToken::Pass,
];

pub(crate) const FLOW_MARK_TOKENS: &[MarkToken] = &[MarkToken::Ab, MarkToken::Ne];

fn split_list(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .filter(|item| seen.insert(item.to_string()))
        .map(str::to_string)
        .collect()
}

/// Comma separated student identifiers, trimmed, blanks and repeats dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsnList {
    usns: Vec<String>,
}

impl UsnList {
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.usns
    }
}

impl FromStr for UsnList {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let usns = split_list(raw);
        if usns.is_empty() {
            return Err("enter at least one valid USN".to_string());
        }
        Ok(Self { usns })
    }
}

/// Wanted output columns for a projection, in caller order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSelection {
    columns: Vec<String>,
}

impl ColumnSelection {
    #[must_use]
    pub fn fifth_semester() -> Self {
        Self {
            columns: FIFTH_SEMESTER_COLUMNS
                .iter()
                .map(|column| (*column).to_string())
                .collect(),
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl Default for ColumnSelection {
    fn default() -> Self {
        Self::fifth_semester()
    }
}

impl FromStr for ColumnSelection {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let columns = split_list(raw);
        if columns.is_empty() {
            return Err("column selection cannot be empty".to_string());
        }
        Ok(Self { columns })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Strategies tried in order until one yields subject marks.
    pub strategies: Vec<Strategy>,
    /// Accept the grid token set on flow rows too.
    pub unify_mark_tokens: bool,
    pub delimiter: u8,
}

impl ExtractOptions {
    pub(crate) fn mark_tokens(&self, strategy: Strategy) -> &'static [MarkToken] {
        match strategy {
            Strategy::Flow if !self.unify_mark_tokens => FLOW_MARK_TOKENS,
            Strategy::Grid | Strategy::Flow => GRID_MARK_TOKENS,
        }
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            strategies: vec![Strategy::Grid, Strategy::Flow],
            unify_mark_tokens: false,
            delimiter: b',',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnSelection, ExtractOptions, UsnList};
    use crate::model::{MarkToken, Strategy};
    use std::str::FromStr;

    #[test]
    fn parse_usn_list_trims_and_drops_blanks() {
        let list = UsnList::from_str(" 1CS01, ,1CS02,1CS01 ,").expect("list should parse");
        assert_eq!(list.as_slice(), ["1CS01", "1CS02"]);
    }

    #[test]
    fn reject_empty_usn_list() {
        let err = UsnList::from_str(" , ,").expect_err("blank list should fail");
        assert!(err.contains("at least one"));
    }

    #[test]
    fn parse_column_selection_keeps_order() {
        let selection = ColumnSelection::from_str("USN,21CS52,21CS51").expect("columns parse");
        assert_eq!(selection.columns(), ["USN", "21CS52", "21CS51"]);
    }

    #[test]
    fn default_selection_is_fifth_semester_preset() {
        let selection = ColumnSelection::default();
        assert_eq!(selection.columns().first().map(String::as_str), Some("USN"));
        assert_eq!(selection.columns().len(), 9);
    }

    #[test]
    fn flow_tokens_widen_only_when_unified() {
        let mut options = ExtractOptions::default();
        assert!(!options.mark_tokens(Strategy::Flow).contains(&MarkToken::Pass));
        options.unify_mark_tokens = true;
        assert!(options.mark_tokens(Strategy::Flow).contains(&MarkToken::Pass));
    }
}
