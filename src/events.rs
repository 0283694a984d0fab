//! Event handling module for keyboard and mouse events.
//!
//! Keeps the modal-priority routing out of the main loop: an open dialog
//! owns the keyboard until it is closed.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::App;
use crate::actions::Action;

/// Result of handling a key event.
pub enum KeyEventResult {
    /// Continue the event loop normally
    Continue,
    /// Should quit the application
    Quit,
}

/// Handle a key press event.
///
/// Returns `KeyEventResult::Quit` if the application should exit.
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> KeyEventResult {
    if app.confirm.is_some() {
        match key.code {
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_pending(),
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => app.confirm = None,
            _ => {}
        }
        return KeyEventResult::Continue;
    }

    if app.repo_picker.open {
        let len = app.repos.available().len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => app.repo_picker.move_selection(-1, len),
            KeyCode::Down | KeyCode::Char('j') => app.repo_picker.move_selection(1, len),
            KeyCode::Enter => app.confirm_repo_picker(),
            KeyCode::Esc | KeyCode::Char('q') => app.repo_picker.close(),
            _ => {}
        }
        return KeyEventResult::Continue;
    }

    if app.checkout_modal.open {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => app.checkout_modal.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => app.checkout_modal.move_selection(1),
            KeyCode::Enter => app.confirm_checkout(),
            KeyCode::Esc | KeyCode::Char('q') => app.checkout_modal.close(),
            _ => {}
        }
        return KeyEventResult::Continue;
    }

    if app.history_modal.open {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => app.history_modal.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => app.history_modal.move_selection(1),
            KeyCode::PageUp => app.history_modal.move_selection(-10),
            KeyCode::PageDown => app.history_modal.move_selection(10),
            KeyCode::Esc | KeyCode::Char('q') => app.history_modal.close(),
            _ => {}
        }
        return KeyEventResult::Continue;
    }

    if app.commit_modal.open {
        handle_commit_editor_key(app, key);
        return KeyEventResult::Continue;
    }

    if app.branch_modal.open {
        handle_branch_input_key(app, key);
        return KeyEventResult::Continue;
    }

    if app.remote_modal.open {
        handle_remote_input_key(app, key);
        return KeyEventResult::Continue;
    }

    match key.code {
        KeyCode::Char('q') => return KeyEventResult::Quit,
        KeyCode::Char('t') => app.toggle_theme(),
        KeyCode::Char('c') => app.term_log.clear(),
        KeyCode::Char('r') => app.dispatch(Action::RefreshRepositories),
        KeyCode::Left | KeyCode::Char('h') => app.move_button_focus(-1, 0),
        KeyCode::Right | KeyCode::Char('l') => app.move_button_focus(1, 0),
        KeyCode::Up | KeyCode::Char('k') => app.move_button_focus(0, -1),
        KeyCode::Down | KeyCode::Char('j') => app.move_button_focus(0, 1),
        KeyCode::Enter | KeyCode::Char(' ') => app.activate_focused_button(),
        KeyCode::PageUp => app.scroll_log(5),
        KeyCode::PageDown => app.scroll_log(-5),
        KeyCode::Esc => app.status_message = None,
        _ => {}
    }
    KeyEventResult::Continue
}

fn handle_commit_editor_key(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Enter {
        app.submit_commit();
        return;
    }

    match key.code {
        KeyCode::Esc => app.commit_modal.close(),
        KeyCode::Left => app.commit_modal.message.move_left(),
        KeyCode::Right => app.commit_modal.message.move_right(),
        KeyCode::Home => app.commit_modal.message.move_home(),
        KeyCode::End => app.commit_modal.message.move_end(),
        KeyCode::Backspace => app.commit_modal.message.backspace(),
        KeyCode::Delete => app.commit_modal.message.delete(),
        KeyCode::Enter => app.commit_modal.message.insert_char('\n'),
        KeyCode::Char(ch)
            if !key.modifiers.contains(KeyModifiers::CONTROL)
                && !key.modifiers.contains(KeyModifiers::ALT) =>
        {
            app.commit_modal.message.insert_char(ch);
        }
        _ => {}
    }
}

fn handle_branch_input_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.branch_modal.close(),
        KeyCode::Enter => app.submit_new_branch(),
        KeyCode::Left => app.branch_modal.name.move_left(),
        KeyCode::Right => app.branch_modal.name.move_right(),
        KeyCode::Home => app.branch_modal.name.move_home(),
        KeyCode::End => app.branch_modal.name.move_end(),
        KeyCode::Backspace => app.branch_modal.name.backspace(),
        KeyCode::Delete => app.branch_modal.name.delete(),
        KeyCode::Char(ch)
            if !key.modifiers.contains(KeyModifiers::CONTROL)
                && !key.modifiers.contains(KeyModifiers::ALT) =>
        {
            app.branch_modal.name.insert_char(ch);
        }
        _ => {}
    }
}

fn handle_remote_input_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.remote_modal.close(),
        KeyCode::Enter => app.submit_add_remote(),
        KeyCode::Tab | KeyCode::BackTab => app.remote_modal.toggle_focus(),
        KeyCode::Left => app.remote_modal.focused_field().move_left(),
        KeyCode::Right => app.remote_modal.focused_field().move_right(),
        KeyCode::Home => app.remote_modal.focused_field().move_home(),
        KeyCode::End => app.remote_modal.focused_field().move_end(),
        KeyCode::Backspace => app.remote_modal.focused_field().backspace(),
        KeyCode::Delete => app.remote_modal.focused_field().delete(),
        KeyCode::Char(ch)
            if !key.modifiers.contains(KeyModifiers::CONTROL)
                && !key.modifiers.contains(KeyModifiers::ALT) =>
        {
            app.remote_modal.focused_field().insert_char(ch);
        }
        _ => {}
    }
}

/// Handle a mouse event: button clicks resolve through the click zones
/// recorded at draw time, the wheel scrolls the output pane.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => app.handle_click(mouse.row, mouse.column),
        MouseEventKind::ScrollUp => app.scroll_log(3),
        MouseEventKind::ScrollDown => app.scroll_log(-3),
        _ => {}
    }
}
