//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the form,
//! and translates keyboard events into core::Action values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Redraw Strategy
//!
//! Nothing animates, so the loop sleeps up to 500ms waiting for input and
//! only redraws after an event or a terminal resize. All pending events are
//! drained before the next draw so a large paste costs one frame.
//!
//! A `SteadyBlock` cursor style is used instead of a blinking cursor because
//! ratatui's `set_cursor_position` resets the terminal's blink timer on every
//! `draw()` call.

mod component;
mod components;
mod event;
mod focus;
mod ui;

use std::io::stdout;
use std::time::Duration;

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use log::{debug, info, warn};
use ratatui::DefaultTerminal;

use crate::core::action::Effect;
use crate::core::error::FormError;
use crate::core::form::FormSession;
use crate::core::model::{Form, FormOutcome, Model, Submission};
use crate::tui::component::EventHandler;
use crate::tui::components::{FormView, FormViewState};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// TUI-only state that survives between frames.
pub struct TuiState {
    pub form_view: FormViewState,
}

impl TuiState {
    pub fn new(session: &FormSession) -> Self {
        Self {
            form_view: FormViewState::new(session),
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Kitty keyboard protocol is ignored by terminals that lack it
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,                        // Show cursor for text entry
            SetCursorStyle::SteadyBlock, // Non-blinking: redraws reset the blink timer
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, steady block cursor, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

/// Show `form` in the terminal until the user submits a valid document or
/// cancels.
pub fn run<T: Model>(mut form: Form<T>) -> Result<FormOutcome<T>, FormError> {
    let mut tui = TuiState::new(form.session());

    let mut terminal = ratatui::init();
    let terminal_mode_guard = TerminalModeGuard::new()
        .inspect_err(|e| warn!("Failed to enable terminal modes: {}", e))
        .ok();

    let outcome = event_loop(&mut terminal, &mut form, &mut tui);

    drop(terminal_mode_guard);
    ratatui::restore();
    outcome
}

fn event_loop<T: Model>(
    terminal: &mut DefaultTerminal,
    form: &mut Form<T>,
    tui: &mut TuiState,
) -> Result<FormOutcome<T>, FormError> {
    let mut needs_redraw = true; // Force first frame

    loop {
        if needs_redraw {
            terminal.draw(|f| ui::draw_ui(f, form.session(), tui))?;
            needs_redraw = false;
        }

        let first_event = poll_event_timeout(Duration::from_millis(500))?;
        if first_event.is_some() {
            needs_redraw = true;
        }

        // Process first event + drain ALL pending events before next draw
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            // Resize just needs a redraw (already flagged above)
            if matches!(event, TuiEvent::Resize) {
                continue;
            }

            if let Some(outcome) = dispatch(form, tui, &event) {
                return Ok(outcome);
            }
        }
    }
}

/// Apply one input event. Returns the outcome once the form is finished.
fn dispatch<T: Model>(
    form: &mut Form<T>,
    tui: &mut TuiState,
    event: &TuiEvent,
) -> Option<FormOutcome<T>> {
    let action = FormView::new(form.session(), &mut tui.form_view).handle_event(event)?;

    match form.apply(action) {
        Effect::Abort => {
            info!("Form cancelled");
            Some(FormOutcome::Aborted)
        }
        Effect::Submit => match form.submit() {
            Submission::Accepted(instance) => Some(FormOutcome::Accepted(instance)),
            Submission::Rejected(errors) => {
                debug!("Submission rejected:\n{}", errors);
                tui.form_view.focus_first_error(form.session());
                None
            }
            Submission::Closed => None,
        },
        Effect::Changed => {
            // Later events in the same batch navigate the changed tree
            tui.form_view.focus.refresh(form.session());
            None
        }
        Effect::None => None,
    }
}
