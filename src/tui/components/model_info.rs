//! # ModelInfo Component
//!
//! Side pane with the document a submission would validate and the current
//! errors. Shown when `show_model_info` is on.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Padding, Paragraph, Wrap};

use crate::core::form::FormSession;
use crate::tui::component::Component;

pub struct ModelInfo {
    pub document: String,
    pub errors: Vec<String>,
}

impl ModelInfo {
    pub fn from_session(session: &FormSession) -> Self {
        let document = serde_json::to_string_pretty(&session.document())
            .unwrap_or_else(|e| format!("<cannot render document: {e}>"));
        let mut errors: Vec<String> = session.form_errors().to_vec();
        session.root().walk(&mut |node| {
            errors.extend(node.errors.iter().map(|e| format!("{}: {}", node.path(), e)));
        });
        Self { document, errors }
    }
}

impl Component for ModelInfo {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let mut lines: Vec<Line> = self.document.lines().map(Line::raw).collect();
        if !self.errors.is_empty() {
            lines.push(Line::raw(""));
            lines.extend(
                self.errors
                    .iter()
                    .map(|e| Line::styled(format!("! {e}"), Style::default().fg(Color::Red))),
            );
        }

        let block = Block::default()
            .borders(Borders::LEFT)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Model ")
            .padding(Padding::horizontal(1));
        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }
}
