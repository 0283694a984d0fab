//! Dialog state for the modal surfaces: commit message, new branch,
//! checkout picker, add remote, repository picker, commit history, and
//! the confirm prompts.

use ratatui::widgets::ListState;
use unicode_width::UnicodeWidthStr;

use crate::classify::{BranchInfo, CommitInfo};

pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Single-line text input with a char-indexed cursor.
#[derive(Clone, Debug, Default)]
pub struct TextField {
    pub value: String,
    pub cursor: usize,
}

impl TextField {
    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn insert_char(&mut self, ch: char) {
        let byte = char_to_byte_index(&self.value, self.cursor);
        self.value.insert(byte, ch);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let b0 = char_to_byte_index(&self.value, self.cursor - 1);
        let b1 = char_to_byte_index(&self.value, self.cursor);
        if b0 < b1 {
            self.value.replace_range(b0..b1, "");
            self.cursor -= 1;
        }
    }

    pub fn delete(&mut self) {
        let len = self.value.chars().count();
        if self.cursor >= len {
            return;
        }
        let b0 = char_to_byte_index(&self.value, self.cursor);
        let b1 = char_to_byte_index(&self.value, self.cursor + 1);
        if b0 < b1 {
            self.value.replace_range(b0..b1, "");
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        let len = self.value.chars().count();
        if self.cursor < len {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.value.chars().count();
    }
}

/// Multi-line text input for the commit message.
#[derive(Clone, Debug, Default)]
pub struct TextArea {
    pub value: String,
    pub cursor: usize,
    pub scroll_y: u16,
}

impl TextArea {
    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
        self.scroll_y = 0;
    }

    pub fn insert_char(&mut self, ch: char) {
        let byte = char_to_byte_index(&self.value, self.cursor);
        self.value.insert(byte, ch);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let b0 = char_to_byte_index(&self.value, self.cursor - 1);
        let b1 = char_to_byte_index(&self.value, self.cursor);
        if b0 < b1 {
            self.value.replace_range(b0..b1, "");
            self.cursor -= 1;
        }
    }

    pub fn delete(&mut self) {
        let len = self.value.chars().count();
        if self.cursor >= len {
            return;
        }
        let b0 = char_to_byte_index(&self.value, self.cursor);
        let b1 = char_to_byte_index(&self.value, self.cursor + 1);
        if b0 < b1 {
            self.value.replace_range(b0..b1, "");
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        let len = self.value.chars().count();
        if self.cursor < len {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        let (line, _) = self.cursor_line_col();
        self.cursor = index_at_line_col(&self.value, line, 0);
    }

    pub fn move_end(&mut self) {
        let (line, _) = self.cursor_line_col();
        let line_len = line_length(&self.value, line);
        self.cursor = index_at_line_col(&self.value, line, line_len);
    }

    pub fn cursor_line_col(&self) -> (usize, usize) {
        cursor_line_col(&self.value, self.cursor)
    }

    pub fn ensure_cursor_visible(&mut self, view_height: usize) {
        if view_height == 0 {
            return;
        }
        let (line, _) = self.cursor_line_col();
        let cur = line as i64;
        let top = self.scroll_y as i64;
        let bottom = top + view_height as i64 - 1;

        if cur < top {
            self.scroll_y = line as u16;
        } else if cur > bottom {
            self.scroll_y = (cur - (view_height as i64 - 1)).max(0) as u16;
        }
    }
}

fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    if char_idx == 0 {
        return 0;
    }
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

fn cursor_line_col(s: &str, cursor: usize) -> (usize, usize) {
    let mut line = 0usize;
    let mut col = 0usize;
    for (i, ch) in s.chars().enumerate() {
        if i >= cursor {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 0;
        } else {
            col += 1;
        }
    }
    (line, col)
}

fn line_length(s: &str, line_index: usize) -> usize {
    s.lines()
        .nth(line_index)
        .map(|l| l.chars().count())
        .unwrap_or(0)
}

fn index_at_line_col(s: &str, target_line: usize, target_col: usize) -> usize {
    let mut idx = 0usize;
    let mut line = 0usize;
    let mut col = 0usize;

    for ch in s.chars() {
        if line == target_line && col == target_col {
            break;
        }

        if ch == '\n' {
            if line == target_line {
                break;
            }
            line += 1;
            col = 0;
            idx += 1;
            continue;
        }

        if line == target_line {
            col += 1;
        }
        idx += 1;
    }

    idx
}

#[derive(Clone, Debug)]
pub struct CommitModal {
    pub open: bool,
    pub message: TextArea,
    pub status: Option<String>,
}

impl CommitModal {
    pub fn new() -> Self {
        Self {
            open: false,
            message: TextArea::default(),
            status: None,
        }
    }

    pub fn show(&mut self) {
        self.message.clear();
        self.status = None;
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }
}

#[derive(Clone, Debug)]
pub struct BranchModal {
    pub open: bool,
    pub name: TextField,
    pub status: Option<String>,
}

impl BranchModal {
    pub fn new() -> Self {
        Self {
            open: false,
            name: TextField::default(),
            status: None,
        }
    }

    pub fn show(&mut self) {
        self.name.clear();
        self.status = None;
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteField {
    Name,
    Url,
}

#[derive(Clone, Debug)]
pub struct RemoteModal {
    pub open: bool,
    pub name: TextField,
    pub url: TextField,
    pub focus: RemoteField,
    pub status: Option<String>,
}

impl RemoteModal {
    pub fn new() -> Self {
        Self {
            open: false,
            name: TextField::default(),
            url: TextField::default(),
            focus: RemoteField::Name,
            status: None,
        }
    }

    pub fn show(&mut self) {
        self.name.clear();
        self.url.clear();
        self.focus = RemoteField::Name;
        self.status = None;
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            RemoteField::Name => RemoteField::Url,
            RemoteField::Url => RemoteField::Name,
        };
    }

    pub fn focused_field(&mut self) -> &mut TextField {
        match self.focus {
            RemoteField::Name => &mut self.name,
            RemoteField::Url => &mut self.url,
        }
    }
}

#[derive(Debug)]
pub struct CheckoutModal {
    pub open: bool,
    pub branches: Vec<BranchInfo>,
    pub list_state: ListState,
    pub status: Option<String>,
}

impl CheckoutModal {
    pub fn new() -> Self {
        Self {
            open: false,
            branches: Vec::new(),
            list_state: ListState::default(),
            status: None,
        }
    }

    pub fn show(&mut self, branches: Vec<BranchInfo>) {
        // Start on the first branch that is not the current one.
        let initial = branches.iter().position(|b| !b.current);
        self.branches = branches;
        self.list_state = ListState::default();
        self.list_state.select(initial);
        self.status = None;
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn move_selection(&mut self, delta: i32) {
        if self.branches.is_empty() {
            return;
        }
        let len = self.branches.len() as i32;
        let cur = self.list_state.selected().unwrap_or(0) as i32;
        let next = (cur + delta).clamp(0, len - 1);
        self.list_state.select(Some(next as usize));
    }

    pub fn selected(&self) -> Option<&BranchInfo> {
        self.list_state
            .selected()
            .and_then(|i| self.branches.get(i))
    }
}

#[derive(Debug)]
pub struct RepoPickerModal {
    pub open: bool,
    pub list_state: ListState,
}

impl RepoPickerModal {
    pub fn new() -> Self {
        Self {
            open: false,
            list_state: ListState::default(),
        }
    }

    pub fn show(&mut self, len: usize, current_index: Option<usize>) {
        self.list_state = ListState::default();
        if len > 0 {
            self.list_state.select(Some(current_index.unwrap_or(0)));
        }
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn move_selection(&mut self, delta: i32, len: usize) {
        if len == 0 {
            return;
        }
        let cur = self.list_state.selected().unwrap_or(0) as i32;
        let next = (cur + delta).clamp(0, len as i32 - 1);
        self.list_state.select(Some(next as usize));
    }
}

#[derive(Debug)]
pub struct HistoryModal {
    pub open: bool,
    pub commits: Vec<CommitInfo>,
    pub list_state: ListState,
}

impl HistoryModal {
    pub fn new() -> Self {
        Self {
            open: false,
            commits: Vec::new(),
            list_state: ListState::default(),
        }
    }

    pub fn show(&mut self, commits: Vec<CommitInfo>) {
        self.list_state = ListState::default();
        if !commits.is_empty() {
            self.list_state.select(Some(0));
        }
        self.commits = commits;
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn move_selection(&mut self, delta: i32) {
        if self.commits.is_empty() {
            return;
        }
        let len = self.commits.len() as i32;
        let cur = self.list_state.selected().unwrap_or(0) as i32;
        let next = (cur + delta).clamp(0, len - 1);
        self.list_state.select(Some(next as usize));
    }
}

/// Pending confirm prompt, one at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmAction {
    InitRepository,
    Shutdown,
}

impl ConfirmAction {
    pub fn title(self) -> &'static str {
        match self {
            ConfirmAction::InitRepository => "Initialize repository",
            ConfirmAction::Shutdown => "Shut down",
        }
    }

    pub fn prompt(self) -> &'static str {
        match self {
            ConfirmAction::InitRepository => {
                "This will initialize a new Git repository in the current directory. Continue?"
            }
            ConfirmAction::Shutdown => "Are you sure you want to shut down the application?",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_editing_round_trip() {
        let mut field = TextField::default();
        for ch in "main".chars() {
            field.insert_char(ch);
        }
        assert_eq!(field.value, "main");
        assert_eq!(field.cursor, 4);

        field.move_home();
        field.insert_char('@');
        assert_eq!(field.value, "@main");

        field.move_end();
        field.backspace();
        assert_eq!(field.value, "@mai");

        field.move_home();
        field.delete();
        assert_eq!(field.value, "mai");
        assert_eq!(field.cursor, 0);
    }

    #[test]
    fn field_handles_multibyte() {
        let mut field = TextField::default();
        field.insert_char('é');
        field.insert_char('x');
        assert_eq!(field.value, "éx");
        field.move_left();
        field.backspace();
        assert_eq!(field.value, "x");
    }

    #[test]
    fn area_home_end_work_per_line() {
        let mut area = TextArea::default();
        for ch in "one\ntwo".chars() {
            area.insert_char(ch);
        }
        assert_eq!(area.cursor_line_col(), (1, 3));

        area.move_home();
        assert_eq!(area.cursor_line_col(), (1, 0));
        area.insert_char('>');
        assert_eq!(area.value, "one\n>two");

        area.move_end();
        assert_eq!(area.cursor_line_col(), (1, 4));
    }

    #[test]
    fn area_scrolls_cursor_into_view() {
        let mut area = TextArea::default();
        for ch in "a\nb\nc\nd\ne".chars() {
            area.insert_char(ch);
        }
        area.ensure_cursor_visible(2);
        assert_eq!(area.scroll_y, 3);

        area.cursor = 0;
        area.ensure_cursor_visible(2);
        assert_eq!(area.scroll_y, 0);
    }

    #[test]
    fn checkout_modal_skips_current_branch_initially() {
        let mut modal = CheckoutModal::new();
        modal.show(vec![
            BranchInfo {
                name: "main".into(),
                current: true,
            },
            BranchInfo {
                name: "dev".into(),
                current: false,
            },
        ]);
        assert_eq!(modal.selected().map(|b| b.name.as_str()), Some("dev"));
    }

    #[test]
    fn remote_modal_focus_toggles() {
        let mut modal = RemoteModal::new();
        modal.show();
        assert_eq!(modal.focus, RemoteField::Name);
        modal.toggle_focus();
        assert_eq!(modal.focus, RemoteField::Url);
        modal.focused_field().insert_char('u');
        assert_eq!(modal.url.value, "u");
        assert_eq!(modal.name.value, "");
    }
}
