use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};

use crate::core::form::FormSession;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{ButtonBar, FormView, ModelInfo, TitleBar};

/// Draw one frame:
///
/// ```text
/// ┌ title bar ─────────────────────────────┐
/// │ form view              │ model info    │
/// │                        │ (optional)    │
/// ├ buttons ───────────────────────────────┤
/// └ key help ──────────────────────────────┘
/// ```
pub fn draw_ui(frame: &mut Frame, session: &FormSession, tui: &mut TuiState) {
    let [title_area, body_area, buttons_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(2),
    ])
    .areas(frame.area());

    TitleBar::new(session.title().to_string(), status_message(session)).render(frame, title_area);

    let form_area = if session.config().show_model_info {
        let [form_area, info_area] =
            Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
                .areas(body_area);
        ModelInfo::from_session(session).render(frame, info_area);
        form_area
    } else {
        body_area
    };

    FormView::new(session, &mut tui.form_view).render(frame, form_area);

    ButtonBar {
        submit_label: &session.config().submit_label,
        cancel_label: &session.config().cancel_label,
        focus: tui.form_view.focus.current(),
    }
    .render(frame, buttons_area);
}

fn status_message(session: &FormSession) -> String {
    let mut count = session.form_errors().len();
    session.root().walk(&mut |node| count += node.errors.len());
    match count {
        0 if session.config().live_validation => "live validation".to_string(),
        0 => String::new(),
        1 => "1 error".to_string(),
        n => format!("{n} errors"),
    }
}
