use std::collections::BTreeMap;

use crate::model::{StudentRecord, SubjectMark};

/// Builds a student record from extracted marks. A later mark for the same
/// subject code replaces an earlier one. Returns `None` when there is nothing
/// to aggregate (no marks, or a blank identifier).
#[must_use]
pub fn build_record(usn: &str, subject_marks: Vec<SubjectMark>) -> Option<StudentRecord> {
    let usn = usn.trim();
    if usn.is_empty() {
        return None;
    }

    let mut marks = BTreeMap::new();
    for subject_mark in subject_marks {
        marks.insert(subject_mark.subject_code, subject_mark.mark);
    }
    if marks.is_empty() {
        return None;
    }

    Some(StudentRecord {
        usn: usn.to_string(),
        marks,
    })
}
