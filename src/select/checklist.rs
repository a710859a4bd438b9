//! Checklist state machine, independent of any terminal.

/// A user intent understood by the checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecklistAction {
    /// Move the cursor up one row (wraps to the bottom).
    Up,
    /// Move the cursor down one row (wraps to the top).
    Down,
    /// Jump to the first row.
    Home,
    /// Jump to the last row.
    End,
    /// Flip the row under the cursor.
    Toggle,
    /// Check every row, or uncheck every row when all are already checked.
    ToggleAll,
    /// Accept the current selection.
    Confirm,
    /// Abort the prompt.
    Cancel,
}

/// Result of applying one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecklistStep {
    /// Keep prompting.
    Continue,
    /// The user confirmed; indices of checked rows in ascending order.
    Confirmed(Vec<usize>),
    /// The user aborted.
    Cancelled,
}

/// Cursor position and checked rows of a checklist prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistState {
    cursor: usize,
    checked: Vec<bool>,
}

impl ChecklistState {
    /// A checklist of `len` unchecked rows with the cursor on the first.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            cursor: 0,
            checked: vec![false; len],
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.checked.len()
    }

    /// True when there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checked.is_empty()
    }

    /// Row under the cursor.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether row `index` is checked.
    #[must_use]
    pub fn is_checked(&self, index: usize) -> bool {
        self.checked.get(index).copied().unwrap_or(false)
    }

    /// Number of checked rows.
    #[must_use]
    pub fn checked_count(&self) -> usize {
        self.checked.iter().filter(|c| **c).count()
    }

    /// Indices of checked rows, ascending.
    #[must_use]
    pub fn selected(&self) -> Vec<usize> {
        self.checked
            .iter()
            .enumerate()
            .filter_map(|(i, checked)| checked.then_some(i))
            .collect()
    }

    /// Applies one action and reports whether the prompt is finished.
    pub fn apply(&mut self, action: ChecklistAction) -> ChecklistStep {
        let len = self.len();
        match action {
            ChecklistAction::Confirm => return ChecklistStep::Confirmed(self.selected()),
            ChecklistAction::Cancel => return ChecklistStep::Cancelled,
            _ if len == 0 => {}
            ChecklistAction::Up => {
                self.cursor = if self.cursor == 0 { len - 1 } else { self.cursor - 1 };
            }
            ChecklistAction::Down => {
                self.cursor = (self.cursor + 1) % len;
            }
            ChecklistAction::Home => self.cursor = 0,
            ChecklistAction::End => self.cursor = len - 1,
            ChecklistAction::Toggle => {
                if let Some(checked) = self.checked.get_mut(self.cursor) {
                    *checked = !*checked;
                }
            }
            ChecklistAction::ToggleAll => {
                let target = self.checked_count() != len;
                self.checked.iter_mut().for_each(|c| *c = target);
            }
        }
        ChecklistStep::Continue
    }

    /// First row of a `height`-row window that keeps the cursor visible.
    #[must_use]
    pub fn window_start(&self, height: usize) -> usize {
        let height = height.max(1);
        if self.cursor < height {
            0
        } else {
            self.cursor + 1 - height
        }
    }
}
