//! Linear undo/redo log of whole-state snapshots.

use crate::models::AnalysisSnapshot;

/// Ordered snapshots plus a cursor pointing at the live one.
///
/// Pushing while the cursor is behind the tip discards every snapshot after
/// the cursor, so the log never branches.
///
/// # Example
///
/// ```
/// use deal_core::session::HistoryStack;
///
/// let mut history = HistoryStack::new();
/// history.push("a");
/// history.push("b");
///
/// assert_eq!(history.undo(), Some(&"a"));
/// history.push("c");
///
/// assert!(!history.can_redo());
/// assert_eq!(history.current(), Some(&"c"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryStack<S = AnalysisSnapshot> {
    entries: Vec<S>,
    cursor: Option<usize>,
}

impl<S> HistoryStack<S> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
        }
    }

    pub fn push(
        &mut self,
        snapshot: S,
    ) {
        match self.cursor {
            Some(cursor) => self.entries.truncate(cursor + 1),
            None => self.entries.clear(),
        }
        self.entries.push(snapshot);
        self.cursor = Some(self.entries.len() - 1);
    }

    /// Steps back one snapshot and returns it, or `None` at the start.
    pub fn undo(&mut self) -> Option<&S> {
        match self.cursor {
            Some(cursor) if cursor > 0 => {
                self.cursor = Some(cursor - 1);
                self.entries.get(cursor - 1)
            }
            _ => None,
        }
    }

    /// Steps forward one snapshot and returns it, or `None` at the tip.
    pub fn redo(&mut self) -> Option<&S> {
        match self.cursor {
            Some(cursor) if cursor + 1 < self.entries.len() => {
                self.cursor = Some(cursor + 1);
                self.entries.get(cursor + 1)
            }
            _ => None,
        }
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.cursor, Some(cursor) if cursor > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.cursor, Some(cursor) if cursor + 1 < self.entries.len())
    }

    pub fn current(&self) -> Option<&S> {
        self.cursor.and_then(|cursor| self.entries.get(cursor))
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S> Default for HistoryStack<S> {
    fn default() -> Self {
        Self::new()
    }
}
