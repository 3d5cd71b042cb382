use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind};
use log::{debug, warn};

/// TUI-specific input events
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TuiEvent {
    // Form-level (handled regardless of focus)
    Cancel,
    ForceQuit, // Ctrl+C
    Submit,    // Ctrl+S

    // Focus-dependent
    Enter,
    Char(char),
    Paste(String), // Bracketed paste
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
    Up,
    Down,
    Tab,
    BackTab,
    AddEntry,    // Ctrl+N
    RemoveEntry, // Ctrl+D
    Clear,       // Ctrl+X

    // TUI-local
    ScrollUp,
    ScrollDown,
    Resize,
}

/// Poll for an event without blocking (returns immediately)
pub fn poll_event_immediate() -> Option<TuiEvent> {
    poll_event_timeout(Duration::ZERO).unwrap_or_else(|e| {
        warn!("Failed to read terminal event: {}", e);
        None
    })
}

/// Poll for an event, blocking up to `timeout`.
pub fn poll_event_timeout(timeout: Duration) -> io::Result<Option<TuiEvent>> {
    if !event::poll(timeout)? {
        return Ok(None);
    }
    Ok(translate(event::read()?))
}

fn translate(event: Event) -> Option<TuiEvent> {
    match event {
        Event::Key(key_event) => {
            // Keyboard enhancement reports releases and repeats too
            if key_event.kind == KeyEventKind::Release {
                return None;
            }
            debug!("Key event: {:?} with modifiers {:?}", key_event.code, key_event.modifiers);
            match (key_event.modifiers, key_event.code) {
                (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(TuiEvent::ForceQuit),
                (KeyModifiers::CONTROL, KeyCode::Char('s')) => Some(TuiEvent::Submit),
                (KeyModifiers::CONTROL, KeyCode::Char('n')) => Some(TuiEvent::AddEntry),
                (KeyModifiers::CONTROL, KeyCode::Char('d')) => Some(TuiEvent::RemoveEntry),
                (KeyModifiers::CONTROL, KeyCode::Char('x')) => Some(TuiEvent::Clear),
                (m, KeyCode::Char(_)) if m.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => None,
                (_, KeyCode::Char(c)) => Some(TuiEvent::Char(c)),
                (_, KeyCode::Enter) => Some(TuiEvent::Enter),
                (_, KeyCode::Esc) => Some(TuiEvent::Cancel),
                (_, KeyCode::Backspace) => Some(TuiEvent::Backspace),
                (_, KeyCode::Delete) => Some(TuiEvent::Delete),
                (_, KeyCode::Left) => Some(TuiEvent::Left),
                (_, KeyCode::Right) => Some(TuiEvent::Right),
                (_, KeyCode::Home) => Some(TuiEvent::Home),
                (_, KeyCode::End) => Some(TuiEvent::End),
                (_, KeyCode::Up) => Some(TuiEvent::Up),
                (_, KeyCode::Down) => Some(TuiEvent::Down),
                (_, KeyCode::Tab) => Some(TuiEvent::Tab),
                (_, KeyCode::BackTab) => Some(TuiEvent::BackTab),
                (_, KeyCode::PageUp) => Some(TuiEvent::ScrollUp),
                (_, KeyCode::PageDown) => Some(TuiEvent::ScrollDown),
                _ => None,
            }
        }
        Event::Mouse(mouse_event) => match mouse_event.kind {
            MouseEventKind::ScrollUp => Some(TuiEvent::ScrollUp),
            MouseEventKind::ScrollDown => Some(TuiEvent::ScrollDown),
            _ => None,
        },
        Event::Paste(data) => Some(TuiEvent::Paste(data)),
        Event::Resize(_, _) => Some(TuiEvent::Resize),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyEventState};

    fn key(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn test_control_shortcuts() {
        assert_eq!(translate(key(KeyCode::Char('s'), KeyModifiers::CONTROL)), Some(TuiEvent::Submit));
        assert_eq!(translate(key(KeyCode::Char('c'), KeyModifiers::CONTROL)), Some(TuiEvent::ForceQuit));
        assert_eq!(translate(key(KeyCode::Char('n'), KeyModifiers::CONTROL)), Some(TuiEvent::AddEntry));
        assert_eq!(translate(key(KeyCode::Char('q'), KeyModifiers::CONTROL)), None);
    }

    #[test]
    fn test_shifted_char_is_text() {
        assert_eq!(translate(key(KeyCode::Char('A'), KeyModifiers::SHIFT)), Some(TuiEvent::Char('A')));
    }

    #[test]
    fn test_release_is_ignored() {
        let release = Event::Key(KeyEvent {
            code: KeyCode::Char('a'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        });
        assert_eq!(translate(release), None);
    }

    #[test]
    fn test_paste_and_resize() {
        assert_eq!(translate(Event::Paste("x".into())), Some(TuiEvent::Paste("x".into())));
        assert_eq!(translate(Event::Resize(80, 24)), Some(TuiEvent::Resize));
    }
}
