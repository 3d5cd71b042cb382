//! # TitleBar Component
//!
//! Top bar showing the form title and a status message.
//!
//! ## Design Decisions
//!
//! ### Stateless Component
//!
//! TitleBar is purely presentational: it receives all data as props and has
//! no internal state.
//!
//! ```rust,ignore
//! let mut title_bar = TitleBar::new("Car".to_string(), "2 errors".to_string());
//! title_bar.render(frame, area);
//! ```
//!
//! ## Conditional Formatting
//!
//! 1. **Status message**: `"Car | 2 errors"`
//! 2. **Default**: `"Car"`

use crate::tui::component::Component;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

/// Top bar component showing the form title and status.
pub struct TitleBar {
    /// Form title (config override, schema title, or "Form")
    pub title: String,
    /// Status message (e.g., "2 errors", "live validation")
    pub status_message: String,
}

impl TitleBar {
    pub fn new(title: String, status_message: String) -> Self {
        Self {
            title,
            status_message,
        }
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::styled(
            self.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )];
        if !self.status_message.is_empty() {
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(
                self.status_message.clone(),
                Style::default().fg(Color::Yellow),
            ));
        }
        frame.render_widget(Line::from(spans), area);
    }
}
