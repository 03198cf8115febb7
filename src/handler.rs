use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, InputMode};
use crate::session::{Phase, Position};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string edits
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize => {}
        AppEvent::Tick => {
            app.tick_animation();
            app.poll_tasks().await;
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Works in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Enter the prompt box; only an idle session accepts a new prompt
        KeyCode::Char('e') | KeyCode::Char('i') => match app.session.phase() {
            Phase::Idle => app.input_mode = InputMode::Editing,
            Phase::AwaitingResponses => {}
            _ => app.set_status("Press n to start a new test first", false),
        },

        // Vote by panel position
        KeyCode::Char('1') => app.cast_vote(Position::Left),
        KeyCode::Char('2') => app.cast_vote(Position::Right),

        // New round, once the current one is past the fetch
        KeyCode::Char('n') => match app.session.phase() {
            Phase::AwaitingVote | Phase::Voted => app.start_new_round(),
            _ => {}
        },

        KeyCode::Char('r') => app.refresh_leaderboard(),

        // Response panel scrolling
        KeyCode::Char('j') | KeyCode::Down => {
            app.response_scroll = app.response_scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.response_scroll = app.response_scroll.saturating_sub(1);
        }

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            if !app.prompt_input.trim().is_empty() {
                app.submit_prompt();
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.prompt_input, app.prompt_cursor);
            app.prompt_input.insert(byte_pos, c);
            app.prompt_cursor += 1;
        }
        KeyCode::Backspace => {
            if app.prompt_cursor > 0 {
                app.prompt_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.prompt_input, app.prompt_cursor);
                app.prompt_input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.prompt_input.chars().count();
            if app.prompt_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.prompt_input, app.prompt_cursor);
                app.prompt_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.prompt_cursor = app.prompt_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.prompt_input.chars().count();
            app.prompt_cursor = (app.prompt_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.prompt_cursor = 0;
        }
        KeyCode::End => {
            app.prompt_cursor = app.prompt_input.chars().count();
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::from(code)
    }

    #[test]
    fn test_char_to_byte_index_multibyte() {
        let s = "héllo";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 1), 1);
        assert_eq!(char_to_byte_index(s, 2), 3);
        assert_eq!(char_to_byte_index(s, 99), s.len());
    }

    #[test]
    fn test_editing_inserts_at_cursor() {
        let mut app = App::new(&Config::default());
        app.input_mode = InputMode::Editing;
        for c in "déjà".chars() {
            handle_key(&mut app, key(KeyCode::Char(c)));
        }
        handle_key(&mut app, key(KeyCode::Left));
        handle_key(&mut app, key(KeyCode::Char('X')));
        assert_eq!(app.prompt_input, "déjXà");
        assert_eq!(app.prompt_cursor, 4);
    }

    #[test]
    fn test_backspace_removes_multibyte_char() {
        let mut app = App::new(&Config::default());
        app.input_mode = InputMode::Editing;
        for c in "né".chars() {
            handle_key(&mut app, key(KeyCode::Char(c)));
        }
        handle_key(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.prompt_input, "n");
        assert_eq!(app.prompt_cursor, 1);
    }

    #[test]
    fn test_esc_leaves_editing() {
        let mut app = App::new(&Config::default());
        app.input_mode = InputMode::Editing;
        handle_key(&mut app, key(KeyCode::Esc));
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn test_enter_on_blank_prompt_stays_editing() {
        let mut app = App::new(&Config::default());
        app.input_mode = InputMode::Editing;
        handle_key(&mut app, key(KeyCode::Char(' ')));
        handle_key(&mut app, key(KeyCode::Enter));
        assert_eq!(app.input_mode, InputMode::Editing);
        assert_eq!(app.session.phase(), Phase::Idle);
    }

    #[test]
    fn test_q_quits_from_normal_mode() {
        let mut app = App::new(&Config::default());
        handle_key(&mut app, key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn test_edit_key_blocked_after_round() {
        let mut app = App::new(&Config::default());
        app.session.submit_prompt("p");
        app.session.set_response(crate::session::Label::A, "a".to_string());
        app.session.set_response(crate::session::Label::B, "b".to_string());

        handle_key(&mut app, key(KeyCode::Char('e')));
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.status.is_some());
    }
}
