//! Choosing which catalog entries to download.
//!
//! A [`Selector`] receives one label per entry and returns the indices the
//! user kept. [`TerminalSelector`] is the interactive checklist; [`SelectAll`]
//! accepts everything without prompting. [`pick`] maps indices back to items
//! in their original order.

mod checklist;
mod terminal;

pub use checklist::{ChecklistAction, ChecklistState, ChecklistStep};
pub use terminal::{TerminalSelector, map_key, render_lines};

use thiserror::Error;

/// Errors that end a selection prompt without a result.
#[derive(Debug, Error)]
pub enum SelectError {
    /// The user aborted the prompt.
    #[error("selection cancelled")]
    Cancelled,

    /// Interactive selection was requested without a terminal.
    #[error("interactive selection needs a terminal; pass --all to download everything")]
    NotATerminal,

    /// Reading keys or drawing the prompt failed.
    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}

/// Something that can choose a subset of labelled rows.
pub trait Selector {
    /// Returns the chosen row indices, ascending. An empty vector means the
    /// user confirmed with nothing checked.
    ///
    /// # Errors
    ///
    /// Returns [`SelectError::Cancelled`] when the user aborts.
    fn select(&mut self, prompt: &str, labels: &[String]) -> Result<Vec<usize>, SelectError>;
}

/// Selects every row without asking.
#[derive(Debug, Default, Clone, Copy)]
pub struct SelectAll;

impl Selector for SelectAll {
    fn select(&mut self, _prompt: &str, labels: &[String]) -> Result<Vec<usize>, SelectError> {
        Ok((0..labels.len()).collect())
    }
}

/// Asks `selector` to choose among `items` and returns the chosen items in
/// list order. An empty `items` returns an empty selection without prompting.
///
/// # Errors
///
/// Propagates the selector's [`SelectError`].
pub fn pick<T, S, F>(
    selector: &mut S,
    prompt: &str,
    items: Vec<T>,
    label: F,
) -> Result<Vec<T>, SelectError>
where
    S: Selector + ?Sized,
    F: Fn(&T) -> String,
{
    if items.is_empty() {
        return Ok(items);
    }
    let labels: Vec<String> = items.iter().map(&label).collect();
    let mut chosen = selector.select(prompt, &labels)?;
    chosen.sort_unstable();
    chosen.dedup();

    let mut chosen = chosen.into_iter().peekable();
    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            if chosen.peek() == Some(&index) {
                chosen.next();
                Some(item)
            } else {
                None
            }
        })
        .collect())
}
