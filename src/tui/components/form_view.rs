//! # FormView Component
//!
//! The scrollable body of the form: one block per field, nested fields
//! indented below their parent.
//!
//! ```text
//! name *
//! [Ann█]
//! edition *
//! [ ] Normal
//! [X] Sports
//!   top_speed *
//!   [250]
//!   ! 'fast' is not of type 'integer'
//! tags *
//!   #0 *
//!   [web]
//!   [+ add]
//! ```
//!
//! Follows the persistent state + transient wrapper pattern:
//! - `FormViewState` (focus, scroll offset) lives in `TuiState`
//! - `FormView` is created each frame with the borrowed session
//!
//! Key presses are translated into `Action`s according to the focused
//! target; navigation and scrolling stay local.

use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthStr;

use crate::core::action::Action;
use crate::core::descriptor::FieldPath;
use crate::core::form::FormSession;
use crate::core::widget::{FieldNode, Widget};
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;
use crate::tui::focus::{FocusState, FocusTarget};

const INDENT: usize = 2;

/// Persistent state of the form body.
#[derive(Debug, Default)]
pub struct FormViewState {
    pub focus: FocusState,
    pub scroll: u16,
    /// Scroll to the focused row on the next render. Cleared by manual
    /// scrolling so the wheel is not fought over.
    follow_focus: bool,
}

impl FormViewState {
    pub fn new(session: &FormSession) -> Self {
        Self {
            focus: FocusState::new(session),
            scroll: 0,
            follow_focus: true,
        }
    }

    fn next(&mut self) {
        self.focus.next();
        self.follow_focus = true;
    }

    fn prev(&mut self) {
        self.focus.prev();
        self.follow_focus = true;
    }

    /// Focus the first target whose field carries an error.
    pub fn focus_first_error(&mut self, session: &FormSession) {
        self.focus.refresh(session);
        let first = self.focus.targets().iter().find(|target| {
            target
                .path()
                .and_then(|path| session.find(path))
                .is_some_and(|node| !node.errors.is_empty())
        });
        if let Some(target) = first.cloned() {
            self.focus.focus(&target);
            self.follow_focus = true;
        }
    }
}

/// Transient render wrapper for the form body.
pub struct FormView<'a> {
    session: &'a FormSession,
    state: &'a mut FormViewState,
}

impl<'a> FormView<'a> {
    pub fn new(session: &'a FormSession, state: &'a mut FormViewState) -> Self {
        Self { session, state }
    }
}

impl Component for FormView<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.state.focus.refresh(self.session);
        let mut layout = FormLines::new(area.width as usize, self.state.focus.current());
        layout.form_errors(self.session.form_errors());
        for field in self.session.fields() {
            layout.node(field, 0, true);
        }

        let height = area.height as usize;
        let total = layout.lines.len();
        if self.state.follow_focus
            && let Some(line) = layout.focus_line
        {
            let scroll = self.state.scroll as usize;
            if line < scroll {
                self.state.scroll = line as u16;
            } else if height > 0 && line >= scroll + height {
                self.state.scroll = (line + 1 - height) as u16;
            }
            self.state.follow_focus = false;
        }
        let max_scroll = total.saturating_sub(height) as u16;
        self.state.scroll = self.state.scroll.min(max_scroll);

        if let Some((column, line)) = layout.cursor {
            let scroll = self.state.scroll as usize;
            if line >= scroll && line < scroll + height && column < area.width as usize {
                frame.set_cursor_position(Position::new(
                    area.x + column as u16,
                    area.y + (line - scroll) as u16,
                ));
            }
        }

        let paragraph = Paragraph::new(layout.lines).scroll((self.state.scroll, 0));
        frame.render_widget(paragraph, area);
    }
}

impl EventHandler for FormView<'_> {
    type Event = Action;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Action> {
        let target = self.state.focus.current().cloned();
        match (event, target) {
            (TuiEvent::Submit, _) => Some(Action::Submit),
            (TuiEvent::Cancel | TuiEvent::ForceQuit, _) => Some(Action::Cancel),
            (TuiEvent::Tab | TuiEvent::Down, _) => {
                self.state.next();
                None
            }
            (TuiEvent::BackTab | TuiEvent::Up, _) => {
                self.state.prev();
                None
            }
            (TuiEvent::ScrollUp, _) => {
                self.state.scroll = self.state.scroll.saturating_sub(3);
                self.state.follow_focus = false;
                None
            }
            (TuiEvent::ScrollDown, _) => {
                self.state.scroll = self.state.scroll.saturating_add(3);
                self.state.follow_focus = false;
                None
            }

            // Buttons, options and add rows
            (TuiEvent::Enter | TuiEvent::Char(' '), Some(FocusTarget::Option { path, index })) => {
                Some(Action::Select { path, index })
            }
            (TuiEvent::Enter | TuiEvent::Char(' '), Some(FocusTarget::AddEntry(path))) => {
                Some(Action::AddEntry(path))
            }
            (TuiEvent::Enter | TuiEvent::Char(' '), Some(FocusTarget::Submit)) => Some(Action::Submit),
            (TuiEvent::Enter | TuiEvent::Char(' '), Some(FocusTarget::Cancel)) => Some(Action::Cancel),

            // Text entry
            (TuiEvent::Enter, Some(FocusTarget::Input(_))) => {
                self.state.next();
                None
            }
            (TuiEvent::Char(ch), Some(FocusTarget::Input(path))) => {
                Some(Action::InsertChar { path, ch: *ch })
            }
            (TuiEvent::Paste(text), Some(FocusTarget::Input(path))) => Some(Action::Paste {
                path,
                text: text.clone(),
            }),
            (TuiEvent::Backspace, Some(FocusTarget::Input(path))) => Some(Action::Backspace(path)),
            (TuiEvent::Delete, Some(FocusTarget::Input(path))) => Some(Action::Delete(path)),
            (TuiEvent::Left, Some(FocusTarget::Input(path))) => Some(Action::CursorLeft(path)),
            (TuiEvent::Right, Some(FocusTarget::Input(path))) => Some(Action::CursorRight(path)),
            (TuiEvent::Home, Some(FocusTarget::Input(path))) => Some(Action::CursorHome(path)),
            (TuiEvent::End, Some(FocusTarget::Input(path))) => Some(Action::CursorEnd(path)),

            // Field-level shortcuts
            (TuiEvent::Clear, Some(FocusTarget::Option { path, .. })) => Some(Action::Deselect(path)),
            (TuiEvent::Clear, Some(target)) => target.path().cloned().map(Action::Clear),
            (TuiEvent::AddEntry, Some(FocusTarget::AddEntry(path))) => Some(Action::AddEntry(path)),
            (TuiEvent::AddEntry, Some(target)) => target
                .path()
                .and_then(|path| self.session.enclosing_entry(path))
                .map(|(list, _)| Action::AddEntry(list)),
            (TuiEvent::RemoveEntry, Some(target)) => target
                .path()
                .and_then(|path| self.session.enclosing_entry(path))
                .map(|(path, index)| Action::RemoveEntry { path, index }),
            _ => None,
        }
    }
}

/// Lines of the form body plus where the focused target ended up.
struct FormLines<'f> {
    width: usize,
    focus: Option<&'f FocusTarget>,
    lines: Vec<Line<'static>>,
    focus_line: Option<usize>,
    /// Terminal cursor for the focused text entry: (column, line).
    cursor: Option<(usize, usize)>,
}

impl<'f> FormLines<'f> {
    fn new(width: usize, focus: Option<&'f FocusTarget>) -> Self {
        Self {
            width,
            focus,
            lines: Vec::new(),
            focus_line: None,
            cursor: None,
        }
    }

    fn is_focused(&self, target: &FocusTarget) -> bool {
        self.focus == Some(target)
    }

    fn push(&mut self, line: Line<'static>, target: Option<&FocusTarget>) {
        if target.is_some_and(|t| self.is_focused(t)) {
            self.focus_line = Some(self.lines.len());
        }
        self.lines.push(line);
    }

    fn form_errors(&mut self, errors: &[String]) {
        for error in errors {
            self.wrapped(0, &format!("! {error}"), Style::default().fg(Color::Red));
        }
    }

    fn wrapped(&mut self, depth: usize, text: &str, style: Style) {
        let indent = " ".repeat(depth * INDENT);
        let width = self.width.saturating_sub(indent.len()).max(10);
        for part in textwrap::wrap(text, width) {
            self.push(
                Line::from(vec![Span::raw(indent.clone()), Span::styled(part.into_owned(), style)]),
                None,
            );
        }
    }

    fn node(&mut self, node: &FieldNode, depth: usize, show_label: bool) {
        let indent = " ".repeat(depth * INDENT);
        let path = node.path().clone();

        if show_label {
            let mut style = Style::default().add_modifier(Modifier::BOLD);
            if has_errors(node) {
                style = style.fg(Color::Red);
            }
            let mut spans = vec![
                Span::raw(indent.clone()),
                Span::styled(node.descriptor.label.clone(), style),
            ];
            if node.descriptor.required {
                spans.push(Span::styled(" *", Style::default().fg(Color::DarkGray)));
            }
            self.push(Line::from(spans), None);
            if let Some(description) = &node.descriptor.description {
                self.wrapped(depth, description, Style::default().fg(Color::DarkGray));
            }
        }

        match &node.widget {
            Widget::Text(entry) => {
                let target = FocusTarget::Input(path);
                let focused = self.is_focused(&target);
                let mut style = if entry.is_present() {
                    Style::default()
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                if focused {
                    style = style.fg(Color::Yellow);
                }
                if focused {
                    let before = &entry.buffer()[..entry.cursor()];
                    self.cursor = Some((indent.len() + 1 + before.width(), self.lines.len()));
                }
                self.push(
                    Line::from(vec![
                        Span::raw(indent.clone()),
                        Span::styled(format!("[{}]", entry.buffer()), style),
                    ]),
                    Some(&target),
                );
            }
            Widget::Choice(list) => {
                let labels: Vec<_> = list.options.iter().map(|o| o.label.clone()).collect();
                self.options(&indent, &path, &labels, list.selected);
            }
            Widget::Variant(selector) => {
                let labels: Vec<_> = selector.options.iter().map(|o| o.label.clone()).collect();
                self.options(&indent, &path, &labels, selector.selected);
                if let Some(active) = &selector.active {
                    let tagged = active.path() != node.path();
                    self.node(active, depth + 1, tagged);
                }
            }
            Widget::Form(form) => {
                for field in &form.fields {
                    self.node(field, depth + 1, true);
                }
            }
            Widget::List(list) => {
                for entry in &list.entries {
                    self.node(entry, depth + 1, true);
                }
                let target = FocusTarget::AddEntry(path);
                let style = focus_style(self.is_focused(&target)).fg(Color::Green);
                self.push(
                    Line::from(vec![
                        Span::raw(" ".repeat((depth + 1) * INDENT)),
                        Span::styled("[+ add]", style),
                    ]),
                    Some(&target),
                );
            }
        }

        for error in &node.errors {
            self.wrapped(depth, &format!("! {error}"), Style::default().fg(Color::Red));
        }
    }

    fn options(
        &mut self,
        indent: &str,
        path: &FieldPath,
        labels: &[String],
        selected: Option<usize>,
    ) {
        for (index, label) in labels.iter().enumerate() {
            let target = FocusTarget::Option {
                path: path.clone(),
                index,
            };
            let mark = if selected == Some(index) { "[X]" } else { "[ ]" };
            let style = focus_style(self.is_focused(&target));
            self.push(
                Line::from(vec![
                    Span::raw(indent.to_string()),
                    Span::styled(format!("{mark} {label}"), style),
                ]),
                Some(&target),
            );
        }
    }
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    }
}

/// Errors on the node itself or on the untagged variant shown in its place.
fn has_errors(node: &FieldNode) -> bool {
    if !node.errors.is_empty() {
        return true;
    }
    match &node.widget {
        Widget::Variant(selector) => selector
            .active
            .as_ref()
            .is_some_and(|active| active.path() == node.path() && !active.errors.is_empty()),
        _ => false,
    }
}
