use std::collections::HashSet;

use crate::models::news::NewsItem;

/// Open/closed state of the rendered news list, keyed by position in the
/// *visible* list. Reindexing when the filter changes is expected; list
/// order is treated as stable for a given fetch.
#[derive(Debug, Default)]
pub struct ExpansionState {
    open: HashSet<usize>,
    seeded: bool,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the open set from `defaultExpanded`, once, on the first
    /// non-empty list. Later calls (and empty lists) change nothing.
    pub fn seed(&mut self, visible: &[NewsItem]) {
        if self.seeded || visible.is_empty() {
            return;
        }
        self.open = visible
            .iter()
            .enumerate()
            .filter(|(_, item)| item.default_expanded)
            .map(|(index, _)| index)
            .collect();
        self.seeded = true;
    }

    /// Flips one index. No side effects beyond the set itself.
    pub fn toggle(&mut self, index: usize) {
        if !self.open.remove(&index) {
            self.open.insert(index);
        }
    }

    pub fn is_open(&self, index: usize) -> bool {
        self.open.contains(&index)
    }
}
