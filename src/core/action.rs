//! # Actions
//!
//! Everything the user can do to a form becomes an `Action`.
//! Types a character into `name`? That's `Action::InsertChar`.
//! Picks the second variant of `edition`? That's `Action::Select`.
//!
//! `update()` applies an action to the session and returns an `Effect`
//! telling the caller what, if anything, needs to happen next. Validation
//! and terminal I/O happen elsewhere.
//!
//! ```text
//! Session + Action  →  update()  →  Effect
//! ```

use log::{debug, warn};

use crate::core::descriptor::FieldPath;
use crate::core::form::{FormSession, Phase};
use crate::core::widget::TextEntry;

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    InsertChar { path: FieldPath, ch: char },
    Paste { path: FieldPath, text: String },
    Backspace(FieldPath),
    Delete(FieldPath),
    CursorLeft(FieldPath),
    CursorRight(FieldPath),
    CursorHome(FieldPath),
    CursorEnd(FieldPath),
    /// Reset a field to "no value".
    Clear(FieldPath),
    /// Drop the selection of a choice list or variant selector.
    Deselect(FieldPath),
    /// Pick option `index` of a choice list or variant selector.
    Select { path: FieldPath, index: usize },
    AddEntry(FieldPath),
    RemoveEntry { path: FieldPath, index: usize },
    Submit,
    Cancel,
}

/// What the caller should do after `update()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Nothing changed.
    None,
    /// The document changed; redraw (and re-validate when live).
    Changed,
    /// The user asked to submit; run validation.
    Submit,
    /// The user cancelled the form.
    Abort,
}

pub fn update(session: &mut FormSession, action: Action) -> Effect {
    if session.phase() == Phase::Accepted {
        warn!("Ignoring {:?} on an accepted form", action);
        return Effect::None;
    }
    debug!("Action: {:?}", action);

    match action {
        Action::InsertChar { path, ch } => edit(session, &path, |entry| entry.insert(ch)),
        Action::Paste { path, text } => edit(session, &path, |entry| entry.paste(&text)),
        Action::Backspace(path) => edit(session, &path, TextEntry::backspace),
        Action::Delete(path) => edit(session, &path, TextEntry::delete),
        Action::CursorLeft(path) => cursor(session, &path, TextEntry::move_left),
        Action::CursorRight(path) => cursor(session, &path, TextEntry::move_right),
        Action::CursorHome(path) => cursor(session, &path, TextEntry::move_home),
        Action::CursorEnd(path) => cursor(session, &path, TextEntry::move_end),
        Action::Clear(path) => changed(session.clear(&path)),
        Action::Deselect(path) => changed(session.deselect(&path)),
        Action::Select { path, index } => match session.select(&path, index) {
            Ok(selected) => changed(selected),
            Err(e) => {
                warn!("Cannot select variant {} of {}: {}", index, path, e);
                session.push_form_error(e.to_string());
                Effect::Changed
            }
        },
        Action::AddEntry(path) => match session.add_entry(&path) {
            Ok(added) => changed(added.is_some()),
            Err(e) => {
                warn!("Cannot add an entry to {}: {}", path, e);
                session.push_form_error(e.to_string());
                Effect::Changed
            }
        },
        Action::RemoveEntry { path, index } => changed(session.remove_entry(&path, index)),
        Action::Submit => {
            session.set_phase(Phase::Submitting);
            Effect::Submit
        }
        Action::Cancel => Effect::Abort,
    }
}

fn changed(changed: bool) -> Effect {
    if changed { Effect::Changed } else { Effect::None }
}

fn edit(session: &mut FormSession, path: &FieldPath, op: impl FnOnce(&mut TextEntry) -> bool) -> Effect {
    match session.text_entry_mut(path) {
        Some(entry) => changed(op(entry)),
        None => {
            warn!("No text entry at {}", path);
            Effect::None
        }
    }
}

/// Cursor movement redraws but leaves the document alone.
fn cursor(session: &mut FormSession, path: &FieldPath, op: impl FnOnce(&mut TextEntry) -> bool) -> Effect {
    match session.text_entry_mut(path) {
        Some(entry) => changed(op(entry)),
        None => Effect::None,
    }
}
