use std::sync::{Arc, PoisonError, RwLock};

use crate::model::ResultTable;

/// Holder of the latest batch result. A run builds its table completely and
/// then swaps it in; readers keep whichever snapshot they already hold.
pub trait ResultSlot {
    fn replace(&self, table: ResultTable) -> Option<Arc<ResultTable>>;
    fn latest(&self) -> Option<Arc<ResultTable>>;
}

#[derive(Debug, Default)]
pub struct MemorySlot {
    current: RwLock<Option<Arc<ResultTable>>>,
}

impl MemorySlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultSlot for MemorySlot {
    fn replace(&self, table: ResultTable) -> Option<Arc<ResultTable>> {
        let next = Arc::new(table);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        guard.replace(next)
    }

    fn latest(&self) -> Option<Arc<ResultTable>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::{MemorySlot, ResultSlot};
    use crate::model::ResultTable;

    fn table(subject: &str) -> ResultTable {
        ResultTable {
            subjects: vec![subject.to_string()],
            rows: Vec::new(),
        }
    }

    #[test]
    fn replace_swaps_whole_table() {
        let slot = MemorySlot::new();
        assert!(slot.latest().is_none());

        assert!(slot.replace(table("21CS51")).is_none());
        let before = slot.latest().expect("first table");

        let previous = slot.replace(table("21CS52")).expect("previous table");
        assert_eq!(previous.subjects, vec!["21CS51"]);
        assert_eq!(before.subjects, vec!["21CS51"]);
        assert_eq!(slot.latest().expect("second table").subjects, vec!["21CS52"]);
    }
}
