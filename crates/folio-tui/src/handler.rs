use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use folio_core::AutoScroll;

use crate::app::{App, FocusPane, InputMode};
use crate::tui::AppEvent;

/// Lines moved per mouse wheel notch
const WHEEL_LINES: usize = 3;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        // The new size is only known at the next draw; re-follow there
        AppEvent::Resize => app.follow = AutoScroll::default(),
        AppEvent::Tick => app.tick_animation(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => {
                app.should_quit = true;
                return;
            }
            KeyCode::Char('l') => {
                app.clear_chat();
                return;
            }
            // Unbound shortcuts must not reach the input as plain letters
            _ => return,
        }
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn focus_input(app: &mut App) {
    app.focus = FocusPane::Input;
    app.input_mode = InputMode::Editing;
    // Cursor at end of existing text
    app.input_cursor = app.store.pending_input().chars().count();
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Tab | KeyCode::Enter | KeyCode::Char('i') => focus_input(app),

        KeyCode::Char('c') => app.clear_chat(),

        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::PageDown => app.scroll_down(app.page_size()),
        KeyCode::PageUp => app.scroll_up(app.page_size()),
        KeyCode::Char('g') | KeyCode::Home => app.scroll_to_top(),
        KeyCode::Char('G') | KeyCode::End => app.scroll_to_bottom(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Tab => {
            app.input_mode = InputMode::Normal;
            app.focus = FocusPane::Transcript;
        }
        // Input keeps focus after sending, like a chat form
        KeyCode::Enter => app.submit(),

        KeyCode::PageDown => app.scroll_down(app.page_size()),
        KeyCode::PageUp => app.scroll_up(app.page_size()),

        KeyCode::Backspace => app.edit_input(|text, cursor| {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }),
        KeyCode::Delete => app.edit_input(|text, cursor| {
            if *cursor < text.chars().count() {
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }),
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.store.pending_input().chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.store.pending_input().chars().count();
        }
        KeyCode::Char(c) => app.edit_input(|text, cursor| {
            let byte_pos = char_to_byte_index(text, *cursor);
            text.insert(byte_pos, c);
            *cursor += 1;
        }),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(WHEEL_LINES),
        MouseEventKind::ScrollUp => app.scroll_up(WHEEL_LINES),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{Config, MockGateway, Provider, Status};
    use std::sync::Arc;

    fn app() -> App {
        App::new(&Config::new(), Provider::Mock, Arc::new(MockGateway::new()))
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_event(app, AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_char_to_byte_index() {
        assert_eq!(char_to_byte_index("héllo", 2), 3);
        assert_eq!(char_to_byte_index("abc", 10), 3);
    }

    #[test]
    fn test_typing_and_cursor_editing() {
        let mut app = app();
        type_text(&mut app, "helo");
        press(&mut app, KeyCode::Left);
        type_text(&mut app, "l");
        assert_eq!(app.store.pending_input(), "hello");

        press(&mut app, KeyCode::Home);
        press(&mut app, KeyCode::Delete);
        press(&mut app, KeyCode::End);
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.store.pending_input(), "ell");
    }

    #[test]
    fn test_enter_on_blank_input_is_ignored() {
        let mut app = app();
        type_text(&mut app, "   ");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.store.transcript().len(), 1);
        assert_eq!(app.store.status(), Status::Idle);
        assert!(app.query_task.is_none());
    }

    #[tokio::test]
    async fn test_enter_submits_and_keeps_focus() {
        let mut app = app();
        type_text(&mut app, "Hi there");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.store.status(), Status::Awaiting);
        assert!(app.query_task.is_some());
        assert_eq!(app.input_mode, InputMode::Editing);
    }

    #[test]
    fn test_ctrl_l_clears_and_ctrl_c_quits() {
        let mut app = app();
        app.store.submit("question");
        app.store.resolve(Ok(folio_core::Message::assistant("answer")));

        handle_event(
            &mut app,
            AppEvent::Key(KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL)),
        );
        assert_eq!(app.store.transcript().len(), 1);

        handle_event(
            &mut app,
            AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
        );
        assert!(app.should_quit);
    }

    #[test]
    fn test_unbound_ctrl_keys_do_nothing() {
        let mut app = app();
        type_text(&mut app, "hi");
        for c in ['a', 'e', 'u', 'w'] {
            handle_event(
                &mut app,
                AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)),
            );
        }
        assert_eq!(app.store.pending_input(), "hi");
        assert_eq!(app.input_cursor, 2);
    }

    #[test]
    fn test_resize_follows_to_new_bottom() {
        let mut app = app();
        for i in 0..10 {
            app.store.submit(&format!("question {}", i));
            app.store.resolve(Ok(folio_core::Message::assistant("answer")));
        }
        app.chat_width = 40;
        app.chat_height = 10;
        app.follow_transcript();
        let old_bottom = app.chat_scroll;
        assert_eq!(old_bottom, app.max_scroll());

        // Resize arrives before the next draw knows the new size
        handle_event(&mut app, AppEvent::Resize);
        app.chat_height = 4;
        app.follow_transcript();
        assert_eq!(app.chat_scroll, app.max_scroll());
        assert!(app.chat_scroll > old_bottom);
    }

    #[test]
    fn test_q_types_while_editing_but_quits_in_normal_mode() {
        let mut app = app();
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);
        assert_eq!(app.store.pending_input(), "q");

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.focus, FocusPane::Transcript);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
