use std::collections::BTreeMap;

/// Per-label running file counter for one export run.
///
/// Keys are normalized labels. Counts only ever grow. The table is owned by
/// the caller and threaded through the exporter, never held globally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterTable {
    counts: BTreeMap<String, u32>,
}

impl CounterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files already numbered for `label` (0 if unseen).
    pub fn current(&self, label: &str) -> u32 {
        self.counts.get(label).copied().unwrap_or(0)
    }

    /// Index the next file for `label` would get. Does not modify the table.
    pub fn next_index(&self, label: &str) -> u32 {
        self.current(label) + 1
    }

    /// Store `index` as the count for `label`.
    ///
    /// Indices must be committed in order; anything other than
    /// `next_index(label)` is ignored so the count never moves backwards.
    pub fn commit(&mut self, label: &str, index: u32) {
        let current = self.current(label);
        debug_assert_eq!(index, current + 1, "out-of-order commit for {}", label);
        if index > current {
            self.counts.insert(label.to_string(), index);
        }
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(label, count)| (label.as_str(), *count))
    }
}
