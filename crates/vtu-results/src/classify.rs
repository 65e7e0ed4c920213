use crate::model::{CandidateRow, Cell, MarkToken, MarkValue, Strategy, SubjectMark};

pub(crate) const HEADER_LABELS: &[&str] = &["subject code", "subject name", "subject", "sl. no."];

const FLOW_HEADER_MARKERS: &[&str] = &["subject code", "internal marks"];

const MIN_DATA_CELLS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    TooFewCells,
    EmptySubject,
    EmptyMark,
    UnrecognizedMark,
    HeaderLikeSubject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowClass {
    Header,
    Data(SubjectMark),
    Reject(RejectReason),
}

/// Lower-cased label with punctuation and whitespace removed, so `Sl.No`
/// and `Sl. No.` compare equal.
fn label_key(text: &str) -> String {
    text.chars()
        .filter(|ch| ch.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

pub(crate) fn is_header_label(text: &str) -> bool {
    let key = label_key(text);
    !key.is_empty() && HEADER_LABELS.iter().any(|label| label_key(label) == key)
}

/// Positions of the subject code and mark cells for a row origin.
const fn field_positions(strategy: Strategy) -> (usize, usize) {
    match strategy {
        Strategy::Grid => (1, 4),
        Strategy::Flow => (0, 4),
    }
}

fn filter_mark_text(cell: &Cell, tokens: &[MarkToken]) -> String {
    cell.trimmed_fragments()
        .filter(|fragment| {
            fragment.chars().all(|ch| ch.is_ascii_digit())
                || tokens.iter().any(|token| token.as_str() == *fragment)
        })
        .collect()
}

fn parse_mark(text: &str, tokens: &[MarkToken]) -> Option<MarkValue> {
    if text.chars().all(|ch| ch.is_ascii_digit()) {
        return text.parse::<u64>().ok().map(MarkValue::Numeric);
    }
    tokens
        .iter()
        .find(|token| token.as_str() == text)
        .map(|token| MarkValue::Symbolic(*token))
}

fn is_header_row(row: &CandidateRow) -> bool {
    let first = row
        .cells
        .iter()
        .map(Cell::text)
        .find(|text| !text.is_empty());
    if first.is_some_and(|text| is_header_label(&text)) {
        return true;
    }

    if row.strategy == Strategy::Flow {
        let joined = row.text().to_lowercase();
        return FLOW_HEADER_MARKERS
            .iter()
            .any(|marker| joined.contains(marker));
    }

    false
}

/// Classifies one candidate row. `tokens` is the symbolic mark set accepted
/// for the row's strategy.
#[must_use]
pub fn classify_row(row: &CandidateRow, tokens: &[MarkToken]) -> RowClass {
    if is_header_row(row) {
        return RowClass::Header;
    }

    if row.cells.len() < MIN_DATA_CELLS {
        return RowClass::Reject(RejectReason::TooFewCells);
    }

    let (subject_at, mark_at) = field_positions(row.strategy);
    let subject_code = row.cells[subject_at].text();
    if subject_code.is_empty() {
        return RowClass::Reject(RejectReason::EmptySubject);
    }

    let mark_text = filter_mark_text(&row.cells[mark_at], tokens);
    if mark_text.is_empty() {
        return RowClass::Reject(RejectReason::EmptyMark);
    }

    let Some(mark) = parse_mark(&mark_text, tokens) else {
        return RowClass::Reject(RejectReason::UnrecognizedMark);
    };

    if is_header_label(&subject_code) {
        return RowClass::Reject(RejectReason::HeaderLikeSubject);
    }

    RowClass::Data(SubjectMark { subject_code, mark })
}

#[cfg(test)]
mod tests {
    use super::{RejectReason, RowClass, classify_row, is_header_label};
    use crate::model::{CandidateRow, Cell, MarkToken, MarkValue, SubjectMark};
    use crate::options::{FLOW_MARK_TOKENS, GRID_MARK_TOKENS};

    fn data(subject_code: &str, mark: MarkValue) -> RowClass {
        RowClass::Data(SubjectMark {
            subject_code: subject_code.to_string(),
            mark,
        })
    }

    #[test]
    fn grid_row_yields_subject_and_external_mark() {
        let row = CandidateRow::grid(["1", "21CS51 Data Structures", "", "", "88"]);
        assert_eq!(
            classify_row(&row, GRID_MARK_TOKENS),
            data("21CS51 Data Structures", MarkValue::Numeric(88))
        );
    }

    #[test]
    fn header_row_is_detected_despite_punctuation() {
        let row = CandidateRow::grid(["Sl.No", "Subject Code", "Subject Name", "Internal", "External"]);
        assert_eq!(classify_row(&row, GRID_MARK_TOKENS), RowClass::Header);
        assert!(is_header_label("  SL. NO. "));
        assert!(!is_header_label("21CS51"));
    }

    #[test]
    fn short_rows_are_rejected() {
        let row = CandidateRow::grid(["1", "21CS51", "40"]);
        assert_eq!(
            classify_row(&row, GRID_MARK_TOKENS),
            RowClass::Reject(RejectReason::TooFewCells)
        );
    }

    #[test]
    fn short_flow_rows_are_rejected() {
        let row = CandidateRow::flow(["21CS51", "DS", "20", "40"]);
        assert_eq!(
            classify_row(&row, FLOW_MARK_TOKENS),
            RowClass::Reject(RejectReason::TooFewCells)
        );
    }

    #[test]
    fn blank_subject_cell_is_rejected() {
        let row = CandidateRow::grid(["1", "  ", "", "", "88"]);
        assert_eq!(
            classify_row(&row, GRID_MARK_TOKENS),
            RowClass::Reject(RejectReason::EmptySubject)
        );

        let flow = CandidateRow::flow(["\n\t", "DS", "20", "40", "60"]);
        assert_eq!(
            classify_row(&flow, FLOW_MARK_TOKENS),
            RowClass::Reject(RejectReason::EmptySubject)
        );
    }

    #[test]
    fn mark_beyond_integer_range_is_unrecognized() {
        let row = CandidateRow::grid(["1", "21CS51", "", "", "123456789012345678901234"]);
        assert_eq!(
            classify_row(&row, GRID_MARK_TOKENS),
            RowClass::Reject(RejectReason::UnrecognizedMark)
        );
    }

    #[test]
    fn subject_that_looks_like_header_is_rejected() {
        let row = CandidateRow::grid(["x", "Subject", "", "", "12"]);
        assert_eq!(
            classify_row(&row, GRID_MARK_TOKENS),
            RowClass::Reject(RejectReason::HeaderLikeSubject)
        );
    }

    #[test]
    fn mark_fragments_keep_only_digits_and_tokens() {
        let mut cells: Vec<Cell> = ["2", "21CS52", "", ""].into_iter().map(Cell::from).collect();
        cells.push(Cell::new(["  ", "7", "*", "6"]));
        let row = CandidateRow {
            strategy: crate::model::Strategy::Grid,
            cells,
        };
        assert_eq!(
            classify_row(&row, GRID_MARK_TOKENS),
            data("21CS52", MarkValue::Numeric(76))
        );

        let noisy = CandidateRow::grid(["3", "21CS53", "", "", "--"]);
        assert_eq!(
            classify_row(&noisy, GRID_MARK_TOKENS),
            RowClass::Reject(RejectReason::EmptyMark)
        );
    }

    #[test]
    fn mixed_token_and_digits_is_unrecognized() {
        let mut cells: Vec<Cell> = ["4", "21CS54", "", ""].into_iter().map(Cell::from).collect();
        cells.push(Cell::new(["AB", "12"]));
        let row = CandidateRow {
            strategy: crate::model::Strategy::Grid,
            cells,
        };
        assert_eq!(
            classify_row(&row, GRID_MARK_TOKENS),
            RowClass::Reject(RejectReason::UnrecognizedMark)
        );
    }

    #[test]
    fn token_sets_differ_between_strategies() {
        let grid = CandidateRow::grid(["5", "21CSL55", "", "", "PASS"]);
        assert_eq!(
            classify_row(&grid, GRID_MARK_TOKENS),
            data("21CSL55", MarkValue::Symbolic(MarkToken::Pass))
        );

        let flow = CandidateRow::flow(["21CSL55", "Lab", "20", "30", "PASS", "P"]);
        assert_eq!(
            classify_row(&flow, FLOW_MARK_TOKENS),
            RowClass::Reject(RejectReason::EmptyMark)
        );

        let absent = CandidateRow::flow(["21CS51", "DS", "20", "0", "AB"]);
        assert_eq!(
            classify_row(&absent, FLOW_MARK_TOKENS),
            data("21CS51", MarkValue::Symbolic(MarkToken::Ab))
        );
    }

    #[test]
    fn flow_header_text_markers() {
        let row = CandidateRow::flow(["Code", "Name", "Internal Marks", "External", "Total"]);
        assert_eq!(classify_row(&row, FLOW_MARK_TOKENS), RowClass::Header);
    }
}
