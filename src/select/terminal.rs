//! Crossterm front end for the checklist.
//!
//! Rendering is split into [`render_lines`] (pure) and a small redraw loop
//! that owns the terminal while the prompt is open.

use std::io::{self, IsTerminal, Write};

use crossterm::cursor::{Hide, MoveToColumn, MoveUp, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::{execute, queue};
use tracing::debug;

use super::checklist::{ChecklistAction, ChecklistState, ChecklistStep};
use super::{SelectError, Selector};

const HELP: &str = "(space: toggle, a: all, enter: confirm, esc: cancel)";

/// Rows reserved for the prompt line and the footer.
const CHROME_ROWS: usize = 2;

/// Maps a key press to a checklist action; other keys are ignored.
#[must_use]
pub fn map_key(key: &KeyEvent) -> Option<ChecklistAction> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return matches!(key.code, KeyCode::Char('c' | 'd')).then_some(ChecklistAction::Cancel);
    }
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => Some(ChecklistAction::Up),
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => Some(ChecklistAction::Down),
        KeyCode::Home | KeyCode::PageUp => Some(ChecklistAction::Home),
        KeyCode::End | KeyCode::PageDown => Some(ChecklistAction::End),
        KeyCode::Char(' ') => Some(ChecklistAction::Toggle),
        KeyCode::Char('a') => Some(ChecklistAction::ToggleAll),
        KeyCode::Enter => Some(ChecklistAction::Confirm),
        KeyCode::Esc | KeyCode::Char('q') => Some(ChecklistAction::Cancel),
        _ => None,
    }
}

/// Builds the text rows for one frame.
///
/// `height` is the number of terminal rows available and `width` the number
/// of columns; rows are truncated so none of them wraps.
#[must_use]
pub fn render_lines(
    prompt: &str,
    labels: &[String],
    state: &ChecklistState,
    height: usize,
    width: usize,
) -> Vec<String> {
    let visible = height.saturating_sub(CHROME_ROWS).max(1);
    let start = state.window_start(visible);
    let end = (start + visible).min(labels.len());

    let mut lines = Vec::with_capacity(end - start + CHROME_ROWS);
    lines.push(truncate(&format!("? {prompt} {HELP}"), width));
    for (index, label) in labels.iter().enumerate().take(end).skip(start) {
        let pointer = if index == state.cursor() { '>' } else { ' ' };
        let mark = if state.is_checked(index) { 'x' } else { ' ' };
        lines.push(truncate(&format!("{pointer} [{mark}] {label}"), width));
    }

    let mut footer = format!("  {}/{} selected", state.checked_count(), labels.len());
    if labels.len() > visible {
        footer.push_str(&format!(" (showing {}-{})", start + 1, end));
    }
    lines.push(truncate(&footer, width));
    lines
}

fn truncate(line: &str, width: usize) -> String {
    if width == 0 || line.chars().count() <= width {
        return line.to_string();
    }
    let mut out: String = line.chars().take(width.saturating_sub(1)).collect();
    out.push('~');
    out
}

/// Restores cooked mode and the cursor however the prompt ends.
struct RawModeGuard;

impl RawModeGuard {
    fn enter(out: &mut impl Write) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        if let Err(e) = execute!(out, Hide) {
            let _ = terminal::disable_raw_mode();
            return Err(e);
        }
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stderr(), Show);
        let _ = terminal::disable_raw_mode();
    }
}

/// Interactive checklist drawn on stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalSelector;

impl TerminalSelector {
    /// Creates a terminal selector.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// True when both stdin and stderr are attached to a terminal.
    #[must_use]
    pub fn is_available() -> bool {
        io::stdin().is_terminal() && io::stderr().is_terminal()
    }
}

impl Selector for TerminalSelector {
    fn select(&mut self, prompt: &str, labels: &[String]) -> Result<Vec<usize>, SelectError> {
        if !Self::is_available() {
            return Err(SelectError::NotATerminal);
        }

        let mut out = io::stderr();
        let guard = RawModeGuard::enter(&mut out)?;
        let mut state = ChecklistState::new(labels.len());
        let mut drawn = 0;

        let outcome = loop {
            let (width, height) = terminal::size()?;
            let lines = render_lines(
                prompt,
                labels,
                &state,
                usize::from(height),
                usize::from(width),
            );
            redraw(&mut out, drawn, &lines)?;
            drawn = lines.len();

            let Event::Key(key) = event::read()? else {
                continue;
            };
            let Some(action) = map_key(&key) else {
                continue;
            };
            match state.apply(action) {
                ChecklistStep::Continue => {}
                ChecklistStep::Confirmed(selected) => break Ok(selected),
                ChecklistStep::Cancelled => break Err(SelectError::Cancelled),
            }
        };

        let summary = match &outcome {
            Ok(selected) => format!("? {prompt} {} selected", selected.len()),
            Err(_) => format!("? {prompt} cancelled"),
        };
        redraw(&mut out, drawn, &[summary])?;
        execute!(out, MoveToColumn(0))?;
        drop(guard);
        eprintln!();

        debug!(?outcome, "checklist finished");
        outcome
    }
}

/// Replaces the previously drawn `previous` rows with `lines`.
fn redraw(out: &mut impl Write, previous: usize, lines: &[String]) -> io::Result<()> {
    if previous > 1 {
        let up = u16::try_from(previous - 1).unwrap_or(u16::MAX);
        queue!(out, MoveUp(up))?;
    }
    queue!(out, MoveToColumn(0), Clear(ClearType::FromCursorDown))?;
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            // Raw mode does not translate \n into \r\n.
            out.write_all(b"\r\n")?;
        }
        out.write_all(line.as_bytes())?;
    }
    out.flush()
}
