use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use penpal_core::Role;
use ratatui::layout::Rect;

use crate::app::{char_to_byte_index, App, FocusPane};
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => {
            app.tick_animation();
            app.collect_finished_send().await;
        }
        AppEvent::Transcript(fragment) => app.handle_transcript(fragment),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if let KeyCode::Char('c') | KeyCode::Char('q') = key.code {
            app.should_quit = true;
            return;
        }
    }

    if app.show_api_key_input {
        handle_api_key_input(app, key);
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('s') => app.send(),
            KeyCode::Char('n') => app.new_conversation(),
            KeyCode::Char('d') => app.toggle_dictation(),
            KeyCode::Char('k') => app.open_api_key_input(),
            KeyCode::Char('u') => app.download(Role::User),
            KeyCode::Char('r') => app.download(Role::Ai),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Tab => app.focus = app.focus.next(),
        KeyCode::BackTab => app.focus = app.focus.prev(),
        KeyCode::Esc => app.focus = FocusPane::Compose,
        _ if app.focus == FocusPane::Compose => handle_compose(app, key),
        _ => handle_pane_scroll(app, key),
    }
}

fn handle_compose(app: &mut App, key: KeyEvent) {
    if !app.compose_editable() {
        app.status = Some(if app.is_sending() {
            "Your pen pal is still writing...".to_string()
        } else {
            "Stop dictation (Ctrl+D) to type.".to_string()
        });
        return;
    }

    match key.code {
        KeyCode::Enter => app.compose_insert('\n'),
        KeyCode::Char(c) => app.compose_insert(c),
        KeyCode::Backspace => app.compose_backspace(),
        KeyCode::Delete => app.compose_delete(),
        KeyCode::Left => app.compose_left(),
        KeyCode::Right => app.compose_right(),
        KeyCode::Up => app.compose_vertical(-1),
        KeyCode::Down => app.compose_vertical(1),
        KeyCode::Home => app.compose_line_start(),
        KeyCode::End => app.compose_line_end(),
        _ => {}
    }
}

fn handle_pane_scroll(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.scroll_focused(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_focused(-1),
        KeyCode::PageDown | KeyCode::Char(' ') => app.scroll_focused(10),
        KeyCode::PageUp => app.scroll_focused(-10),
        KeyCode::Home | KeyCode::Char('g') => app.scroll_focused(-i32::from(u16::MAX)),
        _ => {}
    }
}

fn handle_api_key_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_api_key_input(),
        KeyCode::Enter => app.submit_api_key(),
        KeyCode::Backspace => {
            if app.api_key_input_cursor > 0 {
                app.api_key_input_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.api_key_input, app.api_key_input_cursor);
                app.api_key_input.remove(byte_pos);
            }
        }
        // Shortcut chords are not part of a key
        KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            let byte_pos = char_to_byte_index(&app.api_key_input, app.api_key_input_cursor);
            app.api_key_input.insert(byte_pos, c);
            app.api_key_input_cursor += 1;
        }
        KeyCode::Left => {
            app.api_key_input_cursor = app.api_key_input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.api_key_input.chars().count();
            app.api_key_input_cursor = (app.api_key_input_cursor + 1).min(char_count);
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.show_api_key_input {
        return;
    }

    let panes = [
        (app.compose_area, FocusPane::Compose),
        (app.last_letter_area, FocusPane::LastLetter),
        (app.reply_area, FocusPane::Reply),
        (app.thread_area, FocusPane::Thread),
    ];
    let Some(pane) = panes
        .into_iter()
        .find(|(area, _)| area.is_some_and(|r| point_in_rect(mouse.column, mouse.row, r)))
        .map(|(_, pane)| pane)
    else {
        return;
    };

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => app.focus = pane,
        // Scroll whichever pane is under the pointer, regardless of focus
        MouseEventKind::ScrollDown | MouseEventKind::ScrollUp => {
            let delta = if mouse.kind == MouseEventKind::ScrollDown { 3 } else { -3 };
            let focus = app.focus;
            app.focus = pane;
            app.scroll_focused(delta);
            app.focus = focus;
        }
        _ => {}
    }
}
