//! # ButtonBar Component
//!
//! The submit and cancel buttons plus a one-line key reference. Buttons are
//! focus targets like any field; this component only draws them.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::tui::component::Component;
use crate::tui::focus::FocusTarget;

const HELP: &str = "Tab/↓ next  Shift+Tab/↑ prev  Space select  Ctrl+S submit  Esc cancel  Ctrl+N add  Ctrl+D remove  Ctrl+X clear";

pub struct ButtonBar<'a> {
    pub submit_label: &'a str,
    pub cancel_label: &'a str,
    pub focus: Option<&'a FocusTarget>,
}

impl ButtonBar<'_> {
    fn button(&self, label: &str, target: &FocusTarget) -> Span<'static> {
        let style = if self.focus == Some(target) {
            Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        Span::styled(format!("[ {label} ]"), style)
    }
}

impl Component for ButtonBar<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [buttons_area, help_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(area);

        let buttons = Line::from(vec![
            self.button(self.submit_label, &FocusTarget::Submit),
            Span::raw("  "),
            self.button(self.cancel_label, &FocusTarget::Cancel),
        ]);
        frame.render_widget(buttons, buttons_area);
        frame.render_widget(
            Line::from(Span::styled(HELP, Style::default().fg(Color::DarkGray))),
            help_area,
        );
    }
}
