use std::collections::{BTreeSet, HashMap};

use crate::error::ResultsError;
use crate::model::{ResultTable, StudentRecord, StudentRow, TableCell};

/// Merges student records into one wide table.
///
/// Columns are the sorted union of every record's subject codes. Rows follow
/// `order`; identifiers without a record are skipped, records not named in
/// `order` are appended in input order, and a repeated identifier keeps its
/// last record.
pub fn aggregate(order: &[String], records: &[StudentRecord]) -> Result<ResultTable, ResultsError> {
    if records.is_empty() {
        return Err(ResultsError::EmptyBatch);
    }

    let mut by_usn: HashMap<&str, &StudentRecord> = HashMap::new();
    let mut input_order: Vec<&str> = Vec::new();
    for record in records {
        if by_usn.insert(record.usn.as_str(), record).is_none() {
            input_order.push(record.usn.as_str());
        }
    }

    let subjects = by_usn
        .values()
        .flat_map(|record| record.marks.keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>();

    let mut placed: BTreeSet<&str> = BTreeSet::new();
    let row_order = order
        .iter()
        .map(String::as_str)
        .chain(input_order)
        .filter(|usn| by_usn.contains_key(usn))
        .filter(|usn| placed.insert(*usn))
        .collect::<Vec<_>>();

    let rows = row_order
        .into_iter()
        .map(|usn| {
            let record = by_usn[usn];
            StudentRow {
                usn: record.usn.clone(),
                cells: subjects
                    .iter()
                    .map(|subject| {
                        record
                            .marks
                            .get(subject)
                            .map_or(TableCell::Missing, |mark| TableCell::Mark(*mark))
                    })
                    .collect(),
            }
        })
        .collect();

    Ok(ResultTable { subjects, rows })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::aggregate;
    use crate::error::ResultsError;
    use crate::model::{MarkGrid, MarkValue, StudentRecord, TableCell};

    fn record(usn: &str, marks: &[(&str, u64)]) -> StudentRecord {
        StudentRecord {
            usn: usn.to_string(),
            marks: marks
                .iter()
                .map(|(subject, mark)| ((*subject).to_string(), MarkValue::Numeric(*mark)))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn order(usns: &[&str]) -> Vec<String> {
        usns.iter().map(|usn| (*usn).to_string()).collect()
    }

    #[test]
    fn unions_subjects_and_fills_missing() {
        let records = vec![
            record("1CS01", &[("21CS51", 88)]),
            record("1CS02", &[("21CS52", 76)]),
        ];
        let table = aggregate(&order(&["1CS01", "1CS02"]), &records).expect("table");

        assert_eq!(table.header(), vec!["USN", "21CS51", "21CS52"]);
        assert_eq!(
            table.rows[0].cells,
            vec![TableCell::Mark(MarkValue::Numeric(88)), TableCell::Missing]
        );
        assert_eq!(
            table.rows[1].cells,
            vec![TableCell::Missing, TableCell::Mark(MarkValue::Numeric(76))]
        );
    }

    #[test]
    fn rows_follow_batch_order_and_skip_rejected() {
        let records = vec![record("B", &[("X", 1)]), record("A", &[("Y", 2)])];
        let table = aggregate(&order(&["A", "REJECTED", "B"]), &records).expect("table");
        let usns: Vec<_> = table.rows.iter().map(|row| row.usn.as_str()).collect();
        assert_eq!(usns, vec!["A", "B"]);
    }

    #[test]
    fn unordered_records_are_appended_and_duplicates_keep_last() {
        let records = vec![
            record("A", &[("X", 1)]),
            record("C", &[("X", 3)]),
            record("A", &[("X", 9)]),
        ];
        let table = aggregate(&order(&["A"]), &records).expect("table");
        assert_eq!(table.text_rows(), vec![vec!["A", "9"], vec!["C", "3"]]);
    }

    #[test]
    fn reaggregation_is_identical() {
        let records = vec![
            record("1CS03", &[("21CS53", 10), ("21CS51", 20)]),
            record("1CS01", &[("21CS52", 30)]),
        ];
        let batch = order(&["1CS03", "1CS01"]);
        let first = aggregate(&batch, &records).expect("table");
        let second = aggregate(&batch, &records).expect("table");
        assert_eq!(first, second);
        assert_eq!(first.subjects, vec!["21CS51", "21CS52", "21CS53"]);
    }

    #[test]
    fn empty_batch_fails() {
        let err = aggregate(&[], &[]).expect_err("empty batch should fail");
        assert!(matches!(err, ResultsError::EmptyBatch));
    }
}
