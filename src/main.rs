use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use serde::{Deserialize, Serialize};
use std::{
    env, fs, io,
    path::PathBuf,
    sync::mpsc,
    thread,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

mod actions;
mod classify;
mod client;
mod events;
mod lifecycle;
mod modal;
mod repos;
mod term_log;

use actions::Action;
use classify::{Envelope, Outcome, classify};
use client::{BackendClient, BackendConfig, RawResponse};
use events::KeyEventResult;
use lifecycle::{Lifecycle, ResetReason, Transition};
use modal::{
    BranchModal, CheckoutModal, CommitModal, ConfirmAction, HistoryModal, RemoteModal,
    RepoPickerModal, display_width,
};
use repos::RepoSelection;
use term_log::{LogLevel, TerminalLog};

mod theme {
    use ratatui::style::Color;
    use serde::{Deserialize, Serialize};

    use crate::term_log::LogLevel;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum Theme {
        Dark,
        Light,
    }

    impl Theme {
        pub fn label(self) -> &'static str {
            match self {
                Theme::Dark => "dark",
                Theme::Light => "light",
            }
        }

        pub fn toggled(self) -> Theme {
            match self {
                Theme::Dark => Theme::Light,
                Theme::Light => Theme::Dark,
            }
        }
    }

    #[derive(Clone, Copy, Debug)]
    pub struct Palette {
        pub bg: Color,
        pub fg: Color,
        pub dim: Color,
        pub accent_primary: Color,
        pub accent_secondary: Color,
        pub accent_tertiary: Color,
        pub border_inactive: Color,
        pub selection_bg: Color,
        pub btn_bg: Color,
        pub btn_fg: Color,
        pub banner_bg: Color,
        pub banner_fg: Color,
        pub error: Color,
    }

    pub fn palette(theme: Theme) -> Palette {
        match theme {
            Theme::Dark => Palette {
                bg: Color::Rgb(30, 30, 46),
                fg: Color::Rgb(205, 214, 244),
                dim: Color::Rgb(127, 132, 156),
                accent_primary: Color::Rgb(137, 180, 250),
                accent_secondary: Color::Rgb(166, 227, 161),
                accent_tertiary: Color::Rgb(249, 226, 175),
                border_inactive: Color::Rgb(88, 91, 112),
                selection_bg: Color::Rgb(69, 71, 90),
                btn_bg: Color::Rgb(88, 91, 112),
                btn_fg: Color::Rgb(17, 17, 27),
                banner_bg: Color::Rgb(249, 226, 175),
                banner_fg: Color::Rgb(30, 30, 46),
                error: Color::Rgb(243, 139, 168),
            },
            Theme::Light => Palette {
                bg: Color::Rgb(239, 241, 245),
                fg: Color::Rgb(76, 79, 105),
                dim: Color::Rgb(140, 143, 161),
                accent_primary: Color::Rgb(30, 102, 245),
                accent_secondary: Color::Rgb(64, 160, 43),
                accent_tertiary: Color::Rgb(223, 142, 29),
                border_inactive: Color::Rgb(156, 160, 176),
                selection_bg: Color::Rgb(204, 208, 218),
                btn_bg: Color::Rgb(156, 160, 176),
                btn_fg: Color::Rgb(239, 241, 245),
                banner_bg: Color::Rgb(223, 142, 29),
                banner_fg: Color::Rgb(239, 241, 245),
                error: Color::Rgb(210, 15, 57),
            },
        }
    }

    pub fn level_color(palette: &Palette, level: LogLevel) -> Color {
        match level {
            LogLevel::Info => palette.fg,
            LogLevel::Success | LogLevel::Added => palette.accent_secondary,
            LogLevel::Warning | LogLevel::Modified => palette.accent_tertiary,
            LogLevel::Error | LogLevel::Deleted => palette.error,
            LogLevel::Heading => palette.accent_primary,
        }
    }
}

const GIT_UNAVAILABLE_HELP: &str = "Git executable was not found on your system. Git operations will not work.\n\nTo fix this:\n1. Install Git from https://git-scm.com/downloads\n2. Make sure Git is in your system PATH\n3. Restart the application";

struct JobResult {
    action: Action,
    generation: u64,
    exchange: Result<RawResponse, String>,
}

struct PendingJob {
    action: Action,
    generation: u64,
    rx: mpsc::Receiver<JobResult>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct PersistedUiSettings {
    #[serde(default)]
    theme: Option<theme::Theme>,
    #[serde(default)]
    last_activity_unix: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ButtonId {
    SwitchRepo,
    AddRepo,
    RefreshRepos,
    Status,
    StageAll,
    Commit,
    Push,
    Pull,
    History,
    Init,
    Branches,
    NewBranch,
    Checkout,
    Remotes,
    AddRemote,
    Theme,
    ClearLog,
    Shutdown,
    Quit,
}

struct ButtonSpec {
    id: ButtonId,
    label: &'static str,
    row: u8,
}

const BUTTONS: &[ButtonSpec] = &[
    ButtonSpec { id: ButtonId::SwitchRepo, label: " Switch Repo ", row: 0 },
    ButtonSpec { id: ButtonId::AddRepo, label: " Add Repo ", row: 0 },
    ButtonSpec { id: ButtonId::RefreshRepos, label: " Refresh ", row: 0 },
    ButtonSpec { id: ButtonId::Status, label: " Status ", row: 1 },
    ButtonSpec { id: ButtonId::StageAll, label: " Stage All ", row: 1 },
    ButtonSpec { id: ButtonId::Commit, label: " Commit ", row: 1 },
    ButtonSpec { id: ButtonId::Push, label: " Push ", row: 1 },
    ButtonSpec { id: ButtonId::Pull, label: " Pull ", row: 1 },
    ButtonSpec { id: ButtonId::History, label: " History ", row: 1 },
    ButtonSpec { id: ButtonId::Init, label: " Init ", row: 2 },
    ButtonSpec { id: ButtonId::Branches, label: " Branches ", row: 2 },
    ButtonSpec { id: ButtonId::NewBranch, label: " New Branch ", row: 2 },
    ButtonSpec { id: ButtonId::Checkout, label: " Checkout ", row: 2 },
    ButtonSpec { id: ButtonId::Remotes, label: " Remotes ", row: 2 },
    ButtonSpec { id: ButtonId::AddRemote, label: " Add Remote ", row: 2 },
    ButtonSpec { id: ButtonId::Theme, label: " Theme ", row: 3 },
    ButtonSpec { id: ButtonId::ClearLog, label: " Clear ", row: 3 },
    ButtonSpec { id: ButtonId::Shutdown, label: " Shutdown ", row: 3 },
    ButtonSpec { id: ButtonId::Quit, label: " Quit ", row: 3 },
];

const BUTTON_ROWS: u16 = 4;

#[derive(Clone, Debug, PartialEq)]
enum AppAction {
    Activate(ButtonId),
    SelectRepo(usize),
    SelectCheckoutBranch(usize),
    SelectHistoryItem(usize),
    SubmitCommit,
    SubmitNewBranch,
    SubmitAddRemote,
    Confirm,
    Cancel,
    CloseModal,
    DismissBanner,
    None,
}

#[derive(Clone)]
struct ClickZone {
    rect: Rect,
    action: AppAction,
}

pub(crate) struct App {
    pub(crate) client: BackendClient,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) repos: RepoSelection,
    pub(crate) term_log: TerminalLog,
    pub(crate) pending_job: Option<PendingJob>,
    pub(crate) commit_modal: CommitModal,
    pub(crate) branch_modal: BranchModal,
    pub(crate) checkout_modal: CheckoutModal,
    pub(crate) remote_modal: RemoteModal,
    pub(crate) repo_picker: RepoPickerModal,
    pub(crate) history_modal: HistoryModal,
    pub(crate) confirm: Option<ConfirmAction>,
    pub(crate) focused_button: usize,
    pub(crate) should_quit: bool,
    pub(crate) theme: theme::Theme,
    pub(crate) palette: theme::Palette,
    pub(crate) status_message: Option<(String, Instant)>,
    pub(crate) spinner_frame: usize,
    pub(crate) log_scroll: usize,
    pub(crate) banner_dismissed: bool,
    zones: Vec<ClickZone>,
    pub(crate) ui_settings_path: Option<PathBuf>,
    pub(crate) last_activity_unix: Option<u64>,
}

impl App {
    pub(crate) fn new(client: BackendClient) -> Self {
        let now = Instant::now();
        let theme = theme::Theme::Dark;
        Self {
            client,
            lifecycle: Lifecycle::new(now),
            repos: RepoSelection::new(),
            term_log: TerminalLog::new(),
            pending_job: None,
            commit_modal: CommitModal::new(),
            branch_modal: BranchModal::new(),
            checkout_modal: CheckoutModal::new(),
            remote_modal: RemoteModal::new(),
            repo_picker: RepoPickerModal::new(),
            history_modal: HistoryModal::new(),
            confirm: None,
            focused_button: 0,
            should_quit: false,
            theme,
            palette: theme::palette(theme),
            status_message: None,
            spinner_frame: 0,
            log_scroll: 0,
            banner_dismissed: false,
            zones: Vec::new(),
            ui_settings_path: ui_settings_file_path(),
            last_activity_unix: None,
        }
    }

    fn set_status<S: Into<String>>(&mut self, msg: S) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    fn maybe_expire_status(&mut self) {
        if let Some((_, when)) = &self.status_message
            && when.elapsed() > Duration::from_secs(4)
        {
            self.status_message = None;
        }
    }

    fn set_theme(&mut self, theme: theme::Theme) {
        self.theme = theme;
        self.palette = theme::palette(theme);
    }

    pub(crate) fn toggle_theme(&mut self) {
        self.set_theme(self.theme.toggled());
        self.save_persisted_ui_settings();
        self.term_log.push(
            LogLevel::Info,
            format!("Theme switched to {} mode", self.theme.label()),
        );
    }

    // --- operation dispatch -------------------------------------------------

    pub(crate) fn dispatch(&mut self, action: Action) {
        if action.requires_repository() && !self.repos.controls_enabled() {
            self.set_status("Select a repository first");
            return;
        }

        let generation = self.begin_operation(&action);

        let client = self.client.clone();
        let job_action = action.clone();
        let (tx, rx) = mpsc::channel();
        self.pending_job = Some(PendingJob {
            action,
            generation,
            rx,
        });

        thread::spawn(move || {
            let exchange = job_action.call(&client);
            let _ = tx.send(JobResult {
                action: job_action,
                generation,
                exchange,
            });
        });
    }

    /// Enter the busy state, logging a preemption if an operation was
    /// already in flight, and record the activity timestamp.
    fn begin_operation(&mut self, action: &Action) -> u64 {
        let now = Instant::now();
        if let Transition::Preempted { abandoned } =
            self.lifecycle.begin(action.busy_message(), now)
        {
            self.term_log.push(
                LogLevel::Warning,
                format!("Abandoned in-flight operation: {}", abandoned),
            );
        }
        self.last_activity_unix = Some(unix_now());
        self.save_persisted_ui_settings();
        self.lifecycle.generation()
    }

    fn poll_pending_job(&mut self) {
        let mut done: Option<JobResult> = None;
        if let Some(job) = &self.pending_job {
            match job.rx.try_recv() {
                Ok(msg) => done = Some(msg),
                Err(mpsc::TryRecvError::Empty) => {}
                Err(mpsc::TryRecvError::Disconnected) => {
                    done = Some(JobResult {
                        action: job.action.clone(),
                        generation: job.generation,
                        exchange: Err("Background job disconnected".to_string()),
                    });
                }
            }
        }

        if let Some(msg) = done {
            self.pending_job = None;
            self.handle_job_result(msg);
        }
    }

    fn handle_job_result(&mut self, msg: JobResult) {
        // A completion issued before a forced reset or preemption is
        // stale and must not touch any state.
        if !self.lifecycle.is_current(msg.generation) {
            return;
        }

        self.lifecycle.end();
        let outcome = classify(msg.exchange);
        self.handle_outcome(msg.action, outcome);
    }

    fn handle_outcome(&mut self, action: Action, outcome: Outcome) {
        match outcome {
            Outcome::Success(envelope) => {
                self.apply_success(&action, envelope);
                if let Some(next) = action.follow_up() {
                    self.dispatch(next);
                }
            }
            Outcome::DomainError {
                message,
                git_unavailable,
            } => {
                if git_unavailable && self.repos.mark_git_unavailable() {
                    self.banner_dismissed = false;
                    self.term_log.push(LogLevel::Error, GIT_UNAVAILABLE_HELP);
                }
                // Picker cancellation and the startup probe are expected
                // to fail; they log as plain notices.
                let level = match action {
                    Action::PickDirectory | Action::CheckGitAvailability => LogLevel::Info,
                    _ => LogLevel::Error,
                };
                self.term_log.push(level, action.error_message(&message));
            }
            Outcome::TransportError { message } | Outcome::Malformed { message } => {
                self.term_log.push(LogLevel::Error, message);
            }
        }
    }

    fn apply_success(&mut self, action: &Action, envelope: Envelope) {
        match action {
            Action::CheckGitAvailability => {
                self.term_log.push(LogLevel::Info, "Git is available");
            }
            Action::Status => {
                let output = envelope.output.unwrap_or_default();
                self.term_log.push_output("Git Status:", &output);
            }
            Action::StageAll => {
                self.term_log
                    .push(LogLevel::Success, "Changes staged successfully");
            }
            Action::Commit { message } => {
                self.term_log
                    .push(LogLevel::Success, format!("Changes committed: {}", message));
            }
            Action::Push => {
                self.term_log
                    .push(LogLevel::Success, "Changes pushed to remote successfully");
            }
            Action::Pull => {
                self.term_log
                    .push(LogLevel::Success, "Changes pulled from remote successfully");
            }
            Action::Log => {
                let commits = envelope.commits.unwrap_or_default();
                self.term_log.push(
                    LogLevel::Success,
                    format!("Loaded commit history ({} commits)", commits.len()),
                );
                self.history_modal.show(commits);
            }
            Action::InitRepository => {
                self.term_log
                    .push(LogLevel::Success, "Git repository initialized successfully");
            }
            Action::ListBranches => {
                let branches = envelope.branches.unwrap_or_default();
                self.term_log.push(LogLevel::Heading, "Git Branches:");
                for branch in branches {
                    let prefix = if branch.current { "* " } else { "  " };
                    let level = if branch.current {
                        LogLevel::Success
                    } else {
                        LogLevel::Info
                    };
                    self.term_log
                        .push(level, format!("{}{}", prefix, branch.name));
                }
            }
            Action::LoadCheckoutBranches => {
                self.term_log.push(LogLevel::Info, "Branches loaded");
                self.checkout_modal.show(envelope.branches.unwrap_or_default());
            }
            Action::CreateBranch { name } => {
                self.term_log.push(
                    LogLevel::Success,
                    format!("Branch \"{}\" created successfully", name),
                );
            }
            Action::Checkout { branch } => {
                self.term_log
                    .push(LogLevel::Success, format!("Switched to branch \"{}\"", branch));
            }
            Action::ListRemotes => {
                let remotes = envelope.remotes.unwrap_or_default();
                if remotes.is_empty() {
                    self.term_log
                        .push(LogLevel::Info, "No remote repositories configured");
                } else {
                    self.term_log.push(LogLevel::Heading, "Git Remotes:");
                    for remote in remotes {
                        self.term_log
                            .push(LogLevel::Info, format!("{} ({})", remote.name, remote.url));
                    }
                }
            }
            Action::AddRemote { name, .. } => {
                self.term_log.push(
                    LogLevel::Success,
                    format!("Remote \"{}\" added successfully", name),
                );
            }
            Action::SwitchRepository { directory } => {
                self.repos.apply_switch(directory);
                self.term_log.push(
                    LogLevel::Success,
                    format!("Switched to repository: {}", directory),
                );
            }
            Action::PickDirectory => {
                let directory = envelope.directory.unwrap_or_default();
                self.term_log
                    .push(LogLevel::Success, format!("Directory selected: {}", directory));
            }
            Action::RefreshRepositories => {
                let repositories = envelope.repositories.unwrap_or_default();
                let count = repositories.len();
                self.repos.apply_refresh(repositories);
                self.term_log.push(
                    LogLevel::Success,
                    format!("Repositories refreshed ({} found)", count),
                );
            }
            Action::Shutdown => {
                self.term_log.push(
                    LogLevel::Success,
                    "Server is shutting down. You can close this window.",
                );
                self.should_quit = true;
            }
        }
    }

    fn tick_lifecycle(&mut self) {
        self.tick_lifecycle_at(Instant::now());
    }

    fn tick_lifecycle_at(&mut self, now: Instant) {
        if let Some(Transition::ForcedIdle { reason, .. }) = self.lifecycle.tick(now) {
            self.pending_job = None;
            match reason {
                ResetReason::Watchdog => {
                    self.term_log
                        .push(LogLevel::Warning, "Operation timed out. The UI has been reset.");
                }
                ResetReason::Sweep => {
                    self.term_log
                        .push(LogLevel::Warning, "Processing state reset due to timeout");
                }
            }
        }
    }

    // --- button grid --------------------------------------------------------

    fn button_enabled(&self, id: ButtonId) -> bool {
        match id {
            ButtonId::SwitchRepo
            | ButtonId::AddRepo
            | ButtonId::RefreshRepos
            | ButtonId::Theme
            | ButtonId::ClearLog
            | ButtonId::Shutdown
            | ButtonId::Quit => true,
            _ => self.repos.controls_enabled(),
        }
    }

    fn require_repository(&mut self) -> bool {
        if self.repos.controls_enabled() {
            true
        } else {
            self.set_status("Select a repository first");
            false
        }
    }

    pub(crate) fn activate_focused_button(&mut self) {
        let id = BUTTONS[self.focused_button].id;
        self.activate_button(id);
    }

    pub(crate) fn activate_button(&mut self, id: ButtonId) {
        match id {
            ButtonId::SwitchRepo => self.open_repo_picker(),
            ButtonId::AddRepo => self.dispatch(Action::PickDirectory),
            ButtonId::RefreshRepos => self.dispatch(Action::RefreshRepositories),
            ButtonId::Status => self.dispatch(Action::Status),
            ButtonId::StageAll => self.dispatch(Action::StageAll),
            ButtonId::Commit => {
                if self.require_repository() {
                    self.commit_modal.show();
                }
            }
            ButtonId::Push => self.dispatch(Action::Push),
            ButtonId::Pull => self.dispatch(Action::Pull),
            ButtonId::History => self.dispatch(Action::Log),
            ButtonId::Init => {
                if self.require_repository() {
                    self.confirm = Some(ConfirmAction::InitRepository);
                }
            }
            ButtonId::Branches => self.dispatch(Action::ListBranches),
            ButtonId::NewBranch => {
                if self.require_repository() {
                    self.branch_modal.show();
                }
            }
            ButtonId::Checkout => self.dispatch(Action::LoadCheckoutBranches),
            ButtonId::Remotes => self.dispatch(Action::ListRemotes),
            ButtonId::AddRemote => {
                if self.require_repository() {
                    self.remote_modal.show();
                }
            }
            ButtonId::Theme => self.toggle_theme(),
            ButtonId::ClearLog => self.term_log.clear(),
            ButtonId::Shutdown => self.confirm = Some(ConfirmAction::Shutdown),
            ButtonId::Quit => self.should_quit = true,
        }
    }

    pub(crate) fn move_button_focus(&mut self, dx: i32, dy: i32) {
        if dx != 0 {
            let len = BUTTONS.len() as i32;
            self.focused_button = (self.focused_button as i32 + dx).rem_euclid(len) as usize;
            return;
        }
        if dy == 0 {
            return;
        }

        let row = BUTTONS[self.focused_button].row as i32;
        let max_row = BUTTONS.last().map(|b| b.row).unwrap_or(0) as i32;
        let target = (row + dy).clamp(0, max_row);
        if target == row {
            return;
        }

        let col = BUTTONS
            .iter()
            .enumerate()
            .filter(|(_, b)| b.row as i32 == row)
            .position(|(i, _)| i == self.focused_button)
            .unwrap_or(0);
        let row_buttons: Vec<usize> = BUTTONS
            .iter()
            .enumerate()
            .filter(|(_, b)| b.row as i32 == target)
            .map(|(i, _)| i)
            .collect();
        if let Some(&idx) = row_buttons.get(col.min(row_buttons.len().saturating_sub(1))) {
            self.focused_button = idx;
        }
    }

    pub(crate) fn scroll_log(&mut self, delta: i32) {
        let limit = self.term_log.len() as i64 * 4;
        self.log_scroll = (self.log_scroll as i64 + delta as i64).clamp(0, limit) as usize;
    }

    // --- modal flows --------------------------------------------------------

    fn open_repo_picker(&mut self) {
        if self.repos.available().is_empty() {
            self.set_status("No repositories found - use Add Repo or Refresh");
            return;
        }
        let current_index = self
            .repos
            .current()
            .and_then(|cur| self.repos.available().iter().position(|p| p == cur));
        self.repo_picker
            .show(self.repos.available().len(), current_index);
    }

    pub(crate) fn confirm_repo_picker(&mut self) {
        let Some(idx) = self.repo_picker.list_state.selected() else {
            return;
        };
        let Some(directory) = self.repos.available().get(idx).cloned() else {
            return;
        };
        self.repo_picker.close();
        if !RepoSelection::is_selectable(&directory) {
            return;
        }
        self.dispatch(Action::SwitchRepository { directory });
    }

    pub(crate) fn confirm_checkout(&mut self) {
        let Some(branch) = self.checkout_modal.selected().cloned() else {
            self.checkout_modal.status = Some("Please select a branch to checkout".to_string());
            return;
        };
        if branch.current {
            self.checkout_modal.status = Some(format!("Already on \"{}\"", branch.name));
            return;
        }
        self.checkout_modal.close();
        self.dispatch(Action::Checkout {
            branch: branch.name,
        });
    }

    pub(crate) fn submit_commit(&mut self) {
        let message = self.commit_modal.message.value.trim().to_string();
        if message.is_empty() {
            self.commit_modal.status = Some("Commit message cannot be empty".to_string());
            self.term_log
                .push(LogLevel::Error, "Commit message cannot be empty");
            return;
        }
        self.commit_modal.close();
        self.dispatch(Action::Commit { message });
    }

    pub(crate) fn submit_new_branch(&mut self) {
        let name = self.branch_modal.name.value.trim().to_string();
        if name.is_empty() {
            self.branch_modal.status = Some("Branch name cannot be empty".to_string());
            self.term_log
                .push(LogLevel::Error, "Branch name cannot be empty");
            return;
        }
        self.branch_modal.close();
        self.dispatch(Action::CreateBranch { name });
    }

    pub(crate) fn submit_add_remote(&mut self) {
        let name = self.remote_modal.name.value.trim().to_string();
        let url = self.remote_modal.url.value.trim().to_string();
        if name.is_empty() || url.is_empty() {
            self.remote_modal.status = Some("Remote name and URL are required".to_string());
            self.term_log
                .push(LogLevel::Error, "Remote name and URL are required");
            return;
        }
        self.remote_modal.close();
        self.dispatch(Action::AddRemote { name, url });
    }

    pub(crate) fn confirm_pending(&mut self) {
        let Some(action) = self.confirm.take() else {
            return;
        };
        match action {
            ConfirmAction::InitRepository => self.dispatch(Action::InitRepository),
            ConfirmAction::Shutdown => self.dispatch(Action::Shutdown),
        }
    }

    fn close_all_modals(&mut self) {
        self.repo_picker.close();
        self.checkout_modal.close();
        self.history_modal.close();
        self.commit_modal.close();
        self.branch_modal.close();
        self.remote_modal.close();
        self.confirm = None;
    }

    // --- click handling -----------------------------------------------------

    pub(crate) fn handle_click(&mut self, row: u16, col: u16) {
        let mut action = AppAction::None;
        for zone in self.zones.iter().rev() {
            if row >= zone.rect.y
                && row < zone.rect.y + zone.rect.height
                && col >= zone.rect.x
                && col < zone.rect.x + zone.rect.width
            {
                action = zone.action.clone();
                break;
            }
        }
        self.apply_action(action);
    }

    fn apply_action(&mut self, action: AppAction) {
        match action {
            AppAction::Activate(id) => {
                if let Some(idx) = BUTTONS.iter().position(|b| b.id == id) {
                    self.focused_button = idx;
                }
                self.activate_button(id);
            }
            AppAction::SelectRepo(idx) => {
                self.repo_picker.list_state.select(Some(idx));
                self.confirm_repo_picker();
            }
            AppAction::SelectCheckoutBranch(idx) => {
                self.checkout_modal.list_state.select(Some(idx));
                self.confirm_checkout();
            }
            AppAction::SelectHistoryItem(idx) => {
                self.history_modal.list_state.select(Some(idx));
            }
            AppAction::SubmitCommit => self.submit_commit(),
            AppAction::SubmitNewBranch => self.submit_new_branch(),
            AppAction::SubmitAddRemote => self.submit_add_remote(),
            AppAction::Confirm => self.confirm_pending(),
            AppAction::Cancel => self.confirm = None,
            AppAction::CloseModal => self.close_all_modals(),
            AppAction::DismissBanner => self.banner_dismissed = true,
            AppAction::None => {}
        }
    }

    // --- persisted settings -------------------------------------------------

    fn load_persisted_ui_settings(&mut self) {
        let Some(path) = self.ui_settings_path.clone() else {
            return;
        };

        let Ok(data) = fs::read_to_string(&path) else {
            return;
        };

        let settings: PersistedUiSettings = match serde_json::from_str(&data) {
            Ok(s) => s,
            Err(_) => return,
        };

        if let Some(theme) = settings.theme {
            self.set_theme(theme);
        }
        self.last_activity_unix = settings.last_activity_unix;
    }

    fn save_persisted_ui_settings(&mut self) {
        let Some(path) = self.ui_settings_path.clone() else {
            return;
        };

        let settings = PersistedUiSettings {
            theme: Some(self.theme),
            last_activity_unix: self.last_activity_unix,
        };

        let content = match serde_json::to_string(&settings) {
            Ok(s) => s,
            Err(_) => return,
        };

        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }

        let tmp = path.with_extension("tmp");
        if fs::write(&tmp, content).is_err() || fs::rename(&tmp, &path).is_err() {
            let _ = fs::remove_file(&tmp);
            self.set_status("Failed to save settings");
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn ui_settings_file_path() -> Option<PathBuf> {
    let home = env::home_dir()?;
    let base = env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| home.join(".config"));
    Some(base.join("gitdeck").join("ui.json"))
}

// --- rendering --------------------------------------------------------------

fn centered_rect(area: Rect, w: u16, h: u16) -> Rect {
    let w = w.min(area.width);
    let h = h.min(area.height);
    let x = area.x + (area.width.saturating_sub(w)) / 2;
    let y = area.y + (area.height.saturating_sub(h)) / 2;
    Rect::new(x, y, w, h)
}

fn draw_ui(f: &mut Frame, app: &mut App) -> Vec<ClickZone> {
    let mut zones: Vec<ClickZone> = Vec::new();
    let area = f.area();

    f.render_widget(
        Block::default().style(Style::default().bg(app.palette.bg).fg(app.palette.fg)),
        area,
    );

    let show_banner = !app.repos.git_available() && !app.banner_dismissed;
    let mut constraints = vec![Constraint::Length(1)];
    if show_banner {
        constraints.push(Constraint::Length(1));
    }
    constraints.extend([
        Constraint::Length(1),
        Constraint::Length(BUTTON_ROWS),
        Constraint::Min(3),
        Constraint::Length(1),
    ]);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let mut idx = 0;
    let title_area = chunks[idx];
    idx += 1;
    let banner_area = if show_banner {
        let a = chunks[idx];
        idx += 1;
        Some(a)
    } else {
        None
    };
    let repo_area = chunks[idx];
    let buttons_area = chunks[idx + 1];
    let log_area = chunks[idx + 2];
    let status_area = chunks[idx + 3];

    render_title(app, f, title_area);
    if let Some(banner_area) = banner_area {
        render_banner(app, f, banner_area, &mut zones);
    }
    render_repo_line(app, f, repo_area);
    render_buttons(app, f, buttons_area, &mut zones);
    render_log(app, f, log_area, &mut zones);
    render_status_bar(app, f, status_area);

    render_modals(app, f, area, &mut zones);
    render_busy_overlay(app, f, area, &mut zones);

    zones
}

fn render_title(app: &App, f: &mut Frame, area: Rect) {
    let left = Paragraph::new(format!(" gitdeck {}", VERSION)).style(
        Style::default()
            .fg(app.palette.accent_primary)
            .add_modifier(Modifier::BOLD),
    );
    f.render_widget(left, area);

    let right_text = format!("backend {} ", app.client.base_url());
    let right_w = (right_text.len() as u16).min(area.width);
    let right_rect = Rect::new(area.x + area.width - right_w, area.y, right_w, 1);
    let right = Paragraph::new(right_text).style(Style::default().fg(app.palette.dim));
    f.render_widget(right, right_rect);
}

fn render_banner(app: &App, f: &mut Frame, area: Rect, zones: &mut Vec<ClickZone>) {
    let style = Style::default()
        .bg(app.palette.banner_bg)
        .fg(app.palette.banner_fg)
        .add_modifier(Modifier::BOLD);
    let banner = Paragraph::new(
        " Git not available - Install Git to enable full functionality  [click to dismiss]",
    )
    .style(style);
    f.render_widget(banner, area);
    zones.push(ClickZone {
        rect: area,
        action: AppAction::DismissBanner,
    });
}

fn render_repo_line(app: &App, f: &mut Frame, area: Rect) {
    let (path, style) = match app.repos.current() {
        Some(path) => (
            path.to_string(),
            Style::default().fg(app.palette.accent_secondary),
        ),
        None => (
            "No repository selected".to_string(),
            Style::default().fg(app.palette.dim),
        ),
    };
    let line = Line::from(vec![
        Span::styled(" Repository: ", Style::default().fg(app.palette.fg)),
        Span::styled(path, style),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn render_buttons(app: &App, f: &mut Frame, area: Rect, zones: &mut Vec<ClickZone>) {
    for row in 0..BUTTON_ROWS {
        let y = area.y + row;
        if y >= area.y + area.height {
            break;
        }
        let mut x = area.x + 1;

        for (idx, spec) in BUTTONS.iter().enumerate() {
            if u16::from(spec.row) != row {
                continue;
            }

            let w = spec.label.len() as u16;
            if x + w > area.x + area.width {
                break;
            }

            let enabled = app.button_enabled(spec.id);
            let color = match spec.id {
                ButtonId::Shutdown => app.palette.error,
                ButtonId::Theme | ButtonId::ClearLog | ButtonId::Quit => app.palette.btn_bg,
                ButtonId::SwitchRepo | ButtonId::AddRepo | ButtonId::RefreshRepos => {
                    app.palette.accent_tertiary
                }
                _ => app.palette.accent_primary,
            };
            let bg = if enabled {
                color
            } else {
                app.palette.border_inactive
            };
            let fg = if enabled {
                app.palette.btn_fg
            } else {
                app.palette.fg
            };
            let mut style = Style::default().bg(bg).fg(fg).add_modifier(Modifier::BOLD);
            if idx == app.focused_button {
                style = style.add_modifier(Modifier::REVERSED);
            }

            let rect = Rect::new(x, y, w, 1);
            f.render_widget(Paragraph::new(spec.label).style(style), rect);
            if enabled {
                zones.push(ClickZone {
                    rect,
                    action: AppAction::Activate(spec.id),
                });
            }
            x += w + 1;
        }
    }
}

fn render_log(app: &mut App, f: &mut Frame, area: Rect, zones: &mut Vec<ClickZone>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.palette.border_inactive))
        .title(" Output ");
    let inner = block.inner(area);
    f.render_widget(block, area);
    zones.push(ClickZone {
        rect: area,
        action: AppAction::None,
    });

    let now = Instant::now();
    let mut lines: Vec<Line> = Vec::new();
    for entry in app.term_log.entries() {
        let age = now.duration_since(entry.when).as_secs();
        let color = theme::level_color(&app.palette, entry.level);
        let mut style = Style::default().fg(color);
        if entry.level == LogLevel::Heading {
            style = style.add_modifier(Modifier::BOLD);
        }
        for (i, part) in entry.message.split('\n').enumerate() {
            if i == 0 {
                lines.push(Line::from(vec![
                    Span::styled(format!("+{age:>3}s "), Style::default().fg(app.palette.dim)),
                    Span::styled(part.to_string(), style),
                ]));
            } else {
                lines.push(Line::from(vec![
                    Span::raw("      "),
                    Span::styled(part.to_string(), style),
                ]));
            }
        }
    }

    let total = lines.len();
    let view_h = inner.height as usize;
    let max_scroll = total.saturating_sub(view_h);
    if app.log_scroll > max_scroll {
        app.log_scroll = max_scroll;
    }
    let offset = max_scroll - app.log_scroll;

    let para = Paragraph::new(lines).scroll((offset as u16, 0));
    f.render_widget(para, inner);
}

fn render_status_bar(app: &App, f: &mut Frame, area: Rect) {
    let (text, style) = match &app.status_message {
        Some((msg, _)) => (
            format!(" {}", msg),
            Style::default().fg(app.palette.accent_tertiary),
        ),
        None => (
            " arrows move · Enter run · r refresh · t theme · c clear · q quit".to_string(),
            Style::default().fg(app.palette.dim),
        ),
    };
    f.render_widget(Paragraph::new(text).style(style), area);
}

fn modal_block<'a>(app: &App, title: &'a str) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.palette.accent_primary))
        .title(title)
        .style(Style::default().bg(app.palette.bg).fg(app.palette.fg))
}

fn render_modal_buttons(
    app: &App,
    f: &mut Frame,
    x: u16,
    y: u16,
    buttons: &[(&str, AppAction)],
    zones: &mut Vec<ClickZone>,
) {
    let mut bx = x;
    for (label, action) in buttons {
        let bw = label.len() as u16;
        let rect = Rect::new(bx, y, bw, 1);
        let style = Style::default()
            .bg(app.palette.accent_primary)
            .fg(app.palette.btn_fg)
            .add_modifier(Modifier::BOLD);
        f.render_widget(Paragraph::new(*label).style(style), rect);
        zones.push(ClickZone {
            rect,
            action: action.clone(),
        });
        bx += bw + 2;
    }
}

fn field_line<'a>(field: &'a modal::TextField, focused: bool) -> Line<'a> {
    if !focused {
        return Line::raw(field.value.as_str());
    }

    let chars: Vec<char> = field.value.chars().collect();
    let before: String = chars[..field.cursor.min(chars.len())].iter().collect();
    let at: String = chars
        .get(field.cursor)
        .map(|c| c.to_string())
        .unwrap_or_else(|| " ".to_string());
    let after: String = if field.cursor < chars.len() {
        chars[(field.cursor + 1).min(chars.len())..].iter().collect()
    } else {
        String::new()
    };

    Line::from(vec![
        Span::raw(before),
        Span::styled(at, Style::default().add_modifier(Modifier::REVERSED)),
        Span::raw(after),
    ])
}

fn render_modals(app: &mut App, f: &mut Frame, area: Rect, zones: &mut Vec<ClickZone>) {
    if app.repo_picker.open {
        zones.push(ClickZone {
            rect: area,
            action: AppAction::CloseModal,
        });

        let len = app.repos.available().len() as u16;
        let modal = centered_rect(area, 70, (len + 4).clamp(6, 16));
        f.render_widget(Clear, modal);
        let block = modal_block(app, " Switch repository ");
        let inner = block.inner(modal);
        f.render_widget(block, modal);
        zones.push(ClickZone {
            rect: modal,
            action: AppAction::None,
        });

        let items: Vec<ListItem> = app
            .repos
            .available()
            .iter()
            .map(|p| ListItem::new(p.clone()))
            .collect();
        let list = List::new(items).highlight_style(
            Style::default()
                .bg(app.palette.selection_bg)
                .add_modifier(Modifier::BOLD),
        );
        f.render_stateful_widget(list, inner, &mut app.repo_picker.list_state);

        let offset = app.repo_picker.list_state.offset();
        for (row, item_idx) in (offset..app.repos.available().len())
            .take(inner.height as usize)
            .enumerate()
        {
            zones.push(ClickZone {
                rect: Rect::new(inner.x, inner.y + row as u16, inner.width, 1),
                action: AppAction::SelectRepo(item_idx),
            });
        }
    }

    if app.checkout_modal.open {
        zones.push(ClickZone {
            rect: area,
            action: AppAction::CloseModal,
        });

        let len = app.checkout_modal.branches.len() as u16;
        let modal = centered_rect(area, 60, (len + 5).clamp(7, 16));
        f.render_widget(Clear, modal);
        let block = modal_block(app, " Checkout branch ");
        let inner = block.inner(modal);
        f.render_widget(block, modal);
        zones.push(ClickZone {
            rect: modal,
            action: AppAction::None,
        });

        let list_h = inner.height.saturating_sub(1);
        let list_area = Rect::new(inner.x, inner.y, inner.width, list_h);

        let items: Vec<ListItem> = app
            .checkout_modal
            .branches
            .iter()
            .map(|b| {
                if b.current {
                    ListItem::new(format!("{} (current)", b.name))
                        .style(Style::default().fg(app.palette.dim))
                } else {
                    ListItem::new(b.name.clone())
                }
            })
            .collect();
        let list = List::new(items).highlight_style(
            Style::default()
                .bg(app.palette.selection_bg)
                .add_modifier(Modifier::BOLD),
        );
        f.render_stateful_widget(list, list_area, &mut app.checkout_modal.list_state);

        let offset = app.checkout_modal.list_state.offset();
        for (row, item_idx) in (offset..app.checkout_modal.branches.len())
            .take(list_area.height as usize)
            .enumerate()
        {
            zones.push(ClickZone {
                rect: Rect::new(list_area.x, list_area.y + row as u16, list_area.width, 1),
                action: AppAction::SelectCheckoutBranch(item_idx),
            });
        }

        let footer_y = inner.y + list_h;
        if let Some(status) = &app.checkout_modal.status {
            let para = Paragraph::new(status.as_str())
                .style(Style::default().fg(app.palette.accent_tertiary));
            f.render_widget(para, Rect::new(inner.x, footer_y, inner.width, 1));
        } else {
            let para = Paragraph::new("Enter checkout · Esc cancel")
                .style(Style::default().fg(app.palette.dim));
            f.render_widget(para, Rect::new(inner.x, footer_y, inner.width, 1));
        }
    }

    if app.history_modal.open {
        zones.push(ClickZone {
            rect: area,
            action: AppAction::CloseModal,
        });

        let modal = centered_rect(area, area.width.saturating_sub(8).max(50), 18);
        f.render_widget(Clear, modal);
        let block = modal_block(app, " Commit history ");
        let inner = block.inner(modal);
        f.render_widget(block, modal);
        zones.push(ClickZone {
            rect: modal,
            action: AppAction::None,
        });

        let list_h = inner.height.saturating_sub(1);
        let list_area = Rect::new(inner.x, inner.y, inner.width, list_h);

        if app.history_modal.commits.is_empty() {
            let para = Paragraph::new("No commits found in this repository")
                .style(Style::default().fg(app.palette.dim));
            f.render_widget(para, list_area);
        } else {
            let items: Vec<ListItem> = app
                .history_modal
                .commits
                .iter()
                .map(|c| {
                    let short: String = c.hash.chars().take(7).collect();
                    ListItem::new(Line::from(vec![
                        Span::styled(short, Style::default().fg(app.palette.accent_tertiary)),
                        Span::raw("  "),
                        Span::raw(c.message.clone()),
                        Span::styled(
                            format!("  {} · {}", c.author, c.date),
                            Style::default().fg(app.palette.dim),
                        ),
                    ]))
                })
                .collect();
            let list = List::new(items).highlight_style(
                Style::default()
                    .bg(app.palette.selection_bg)
                    .add_modifier(Modifier::BOLD),
            );
            f.render_stateful_widget(list, list_area, &mut app.history_modal.list_state);

            let offset = app.history_modal.list_state.offset();
            for (row, item_idx) in (offset..app.history_modal.commits.len())
                .take(list_area.height as usize)
                .enumerate()
            {
                zones.push(ClickZone {
                    rect: Rect::new(list_area.x, list_area.y + row as u16, list_area.width, 1),
                    action: AppAction::SelectHistoryItem(item_idx),
                });
            }
        }

        render_modal_buttons(
            app,
            f,
            inner.x,
            inner.y + list_h,
            &[(" Close (Esc) ", AppAction::CloseModal)],
            zones,
        );
    }

    if app.commit_modal.open {
        zones.push(ClickZone {
            rect: area,
            action: AppAction::CloseModal,
        });

        let modal = centered_rect(area, 64, 12);
        f.render_widget(Clear, modal);
        let block = modal_block(app, " Commit changes ");
        let inner = block.inner(modal);
        f.render_widget(block, modal);
        zones.push(ClickZone {
            rect: modal,
            action: AppAction::None,
        });

        let text_h = inner.height.saturating_sub(2);
        app.commit_modal.message.ensure_cursor_visible(text_h as usize);

        let (cursor_line, cursor_col) = app.commit_modal.message.cursor_line_col();
        let mut lines: Vec<Line> = Vec::new();
        let raw = &app.commit_modal.message.value;
        for (i, text) in raw.split('\n').enumerate() {
            if i == cursor_line {
                let chars: Vec<char> = text.chars().collect();
                let before: String = chars[..cursor_col.min(chars.len())].iter().collect();
                let at: String = chars
                    .get(cursor_col)
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| " ".to_string());
                let after: String = if cursor_col + 1 <= chars.len() {
                    chars[(cursor_col + 1).min(chars.len())..].iter().collect()
                } else {
                    String::new()
                };
                lines.push(Line::from(vec![
                    Span::raw(before),
                    Span::styled(at, Style::default().add_modifier(Modifier::REVERSED)),
                    Span::raw(after),
                ]));
            } else {
                lines.push(Line::raw(text.to_string()));
            }
        }

        let text_area = Rect::new(inner.x, inner.y, inner.width, text_h);
        let para = Paragraph::new(lines).scroll((app.commit_modal.message.scroll_y, 0));
        f.render_widget(para, text_area);

        if let Some(status) = &app.commit_modal.status {
            let para =
                Paragraph::new(status.as_str()).style(Style::default().fg(app.palette.error));
            f.render_widget(para, Rect::new(inner.x, inner.y + text_h, inner.width, 1));
        }

        render_modal_buttons(
            app,
            f,
            inner.x,
            inner.y + text_h + 1,
            &[
                (" Commit (Ctrl+Enter) ", AppAction::SubmitCommit),
                (" Cancel (Esc) ", AppAction::CloseModal),
            ],
            zones,
        );
    }

    if app.branch_modal.open {
        zones.push(ClickZone {
            rect: area,
            action: AppAction::CloseModal,
        });

        let modal = centered_rect(area, 50, 7);
        f.render_widget(Clear, modal);
        let block = modal_block(app, " New branch ");
        let inner = block.inner(modal);
        f.render_widget(block, modal);
        zones.push(ClickZone {
            rect: modal,
            action: AppAction::None,
        });

        let label = Paragraph::new("Branch name:").style(Style::default().fg(app.palette.dim));
        f.render_widget(label, Rect::new(inner.x, inner.y, inner.width, 1));

        let line = field_line(&app.branch_modal.name, true);
        f.render_widget(
            Paragraph::new(line),
            Rect::new(inner.x, inner.y + 1, inner.width, 1),
        );

        if let Some(status) = &app.branch_modal.status {
            let para =
                Paragraph::new(status.as_str()).style(Style::default().fg(app.palette.error));
            f.render_widget(para, Rect::new(inner.x, inner.y + 2, inner.width, 1));
        }

        render_modal_buttons(
            app,
            f,
            inner.x,
            inner.y + inner.height.saturating_sub(1),
            &[
                (" Create (Enter) ", AppAction::SubmitNewBranch),
                (" Cancel (Esc) ", AppAction::CloseModal),
            ],
            zones,
        );
    }

    if app.remote_modal.open {
        zones.push(ClickZone {
            rect: area,
            action: AppAction::CloseModal,
        });

        let modal = centered_rect(area, 60, 9);
        f.render_widget(Clear, modal);
        let block = modal_block(app, " Add remote ");
        let inner = block.inner(modal);
        f.render_widget(block, modal);
        zones.push(ClickZone {
            rect: modal,
            action: AppAction::None,
        });

        let name_focused = app.remote_modal.focus == modal::RemoteField::Name;

        let label = Paragraph::new("Name:").style(Style::default().fg(app.palette.dim));
        f.render_widget(label, Rect::new(inner.x, inner.y, 6, 1));
        let line = field_line(&app.remote_modal.name, name_focused);
        f.render_widget(
            Paragraph::new(line),
            Rect::new(inner.x + 6, inner.y, inner.width.saturating_sub(6), 1),
        );

        let label = Paragraph::new("URL:").style(Style::default().fg(app.palette.dim));
        f.render_widget(label, Rect::new(inner.x, inner.y + 1, 6, 1));
        let line = field_line(&app.remote_modal.url, !name_focused);
        f.render_widget(
            Paragraph::new(line),
            Rect::new(inner.x + 6, inner.y + 1, inner.width.saturating_sub(6), 1),
        );

        let hint = Paragraph::new("Tab switches fields").style(Style::default().fg(app.palette.dim));
        f.render_widget(hint, Rect::new(inner.x, inner.y + 2, inner.width, 1));

        if let Some(status) = &app.remote_modal.status {
            let para =
                Paragraph::new(status.as_str()).style(Style::default().fg(app.palette.error));
            f.render_widget(para, Rect::new(inner.x, inner.y + 3, inner.width, 1));
        }

        render_modal_buttons(
            app,
            f,
            inner.x,
            inner.y + inner.height.saturating_sub(1),
            &[
                (" Add (Enter) ", AppAction::SubmitAddRemote),
                (" Cancel (Esc) ", AppAction::CloseModal),
            ],
            zones,
        );
    }

    if let Some(confirm) = app.confirm {
        zones.push(ClickZone {
            rect: area,
            action: AppAction::Cancel,
        });

        let modal = centered_rect(area, 56, 7);
        f.render_widget(Clear, modal);
        let block = modal_block(app, confirm.title());
        let inner = block.inner(modal);
        f.render_widget(block, modal);
        zones.push(ClickZone {
            rect: modal,
            action: AppAction::None,
        });

        let para = Paragraph::new(confirm.prompt()).wrap(Wrap { trim: false });
        f.render_widget(
            para,
            Rect::new(inner.x, inner.y, inner.width, inner.height.saturating_sub(1)),
        );

        render_modal_buttons(
            app,
            f,
            inner.x,
            inner.y + inner.height.saturating_sub(1),
            &[
                (" Yes (Enter) ", AppAction::Confirm),
                (" No (Esc) ", AppAction::Cancel),
            ],
            zones,
        );
    }
}

fn render_busy_overlay(app: &App, f: &mut Frame, area: Rect, zones: &mut Vec<ClickZone>) {
    if !app.lifecycle.busy() {
        return;
    }

    // Absorb clicks while an operation is in flight; keyboard shortcuts
    // still work, so a second operation can preempt a stuck one.
    zones.push(ClickZone {
        rect: area,
        action: AppAction::None,
    });

    let spinner_chars = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
    let spinner = spinner_chars[app.spinner_frame % spinner_chars.len()];
    let text = format!(" {} {} ", spinner, app.lifecycle.description());

    let w = (display_width(&text) as u16 + 2).min(area.width);
    let modal = centered_rect(area, w, 3);
    f.render_widget(Clear, modal);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.palette.accent_tertiary))
        .style(Style::default().bg(app.palette.bg).fg(app.palette.fg));
    let inner = block.inner(modal);
    f.render_widget(block, modal);
    f.render_widget(Paragraph::new(text), inner);
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let _ = dotenvy::dotenv();

    // Handle --version / -V
    if let Some(arg) = env::args().nth(1)
        && (arg == "--version" || arg == "-V")
    {
        println!("gitdeck {}", VERSION);
        return Ok(());
    }

    let config = BackendConfig::from_env();
    let client = BackendClient::new(&config);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(client);
    app.load_persisted_ui_settings();
    app.dispatch(Action::RefreshRepositories);

    let mut event_stream = EventStream::new();

    loop {
        let mut zones = Vec::new();
        app.poll_pending_job();
        app.tick_lifecycle();
        app.maybe_expire_status();

        terminal.draw(|f| {
            zones = draw_ui(f, &mut app);
        })?;
        app.zones = zones;

        if app.lifecycle.busy() {
            app.spinner_frame = app.spinner_frame.wrapping_add(1);
        }

        let poll_timeout = tokio::time::sleep(Duration::from_millis(100));
        tokio::pin!(poll_timeout);

        tokio::select! {
            Some(event_result) = event_stream.next() => {
                if let Ok(event) = event_result {
                    match event {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            if let KeyEventResult::Quit = events::handle_key_event(&mut app, key) {
                                app.should_quit = true;
                            }
                        }
                        Event::Mouse(mouse) => {
                            events::handle_mouse_event(&mut app, mouse);
                        }
                        _ => {}
                    }
                }
            }
            // Timeout - allows background polling to continue
            _ = &mut poll_timeout => {}
        }

        if app.should_quit {
            break;
        }
    }

    app.save_persisted_ui_settings();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app() -> App {
        let client = BackendClient::new(&BackendConfig::new("http://127.0.0.1:1"));
        let mut app = App::new(client);
        // Keep tests off the real config directory.
        app.ui_settings_path = None;
        app
    }

    fn success_envelope(body: &str) -> Envelope {
        serde_json::from_str(body).unwrap()
    }

    fn warning_count(app: &App, needle: &str) -> usize {
        app.term_log
            .entries()
            .filter(|e| e.message.contains(needle))
            .count()
    }

    #[test]
    fn stale_job_result_is_ignored() {
        let mut app = test_app();
        let t0 = Instant::now();
        app.lifecycle.begin("Pushing changes to remote...", t0);
        let stale = app.lifecycle.generation();

        // Sweep declares the operation stuck and resets the UI.
        app.tick_lifecycle_at(t0 + Duration::from_secs(21));
        assert!(!app.lifecycle.busy());
        assert_eq!(warning_count(&app, "Processing state reset due to timeout"), 1);
        let entries_after_reset = app.term_log.len();

        app.handle_job_result(JobResult {
            action: Action::Push,
            generation: stale,
            exchange: Ok(RawResponse {
                status: 200,
                body: r#"{"success":true}"#.to_string(),
            }),
        });

        assert_eq!(app.term_log.len(), entries_after_reset);
        assert!(!app.lifecycle.busy());
    }

    #[test]
    fn sweep_warns_exactly_once() {
        let mut app = test_app();
        let t0 = Instant::now();
        app.lifecycle.begin("Pushing changes to remote...", t0);

        app.tick_lifecycle_at(t0 + Duration::from_secs(21));
        app.tick_lifecycle_at(t0 + Duration::from_secs(22));
        app.tick_lifecycle_at(t0 + Duration::from_secs(40));

        assert_eq!(warning_count(&app, "Processing state reset due to timeout"), 1);
    }

    #[test]
    fn watchdog_warns_with_its_own_message() {
        let mut app = test_app();
        let t0 = Instant::now();
        app.lifecycle.begin("Pulling changes from remote...", t0);

        // Sweep runs early and reschedules past the watchdog deadline.
        app.tick_lifecycle_at(t0 + Duration::from_secs(16));
        app.tick_lifecycle_at(t0 + Duration::from_secs(30));

        assert_eq!(
            warning_count(&app, "Operation timed out. The UI has been reset."),
            1
        );
        assert!(!app.lifecycle.busy());
    }

    #[test]
    fn preemption_logs_abandoned_operation() {
        let mut app = test_app();
        app.begin_operation(&Action::Push);
        app.begin_operation(&Action::Pull);

        assert_eq!(
            warning_count(&app, "Abandoned in-flight operation: Pushing changes to remote..."),
            1
        );
        assert!(app.lifecycle.busy());
        assert_eq!(app.lifecycle.description(), "Pulling changes from remote...");
    }

    #[test]
    fn matching_job_result_completes_operation() {
        let mut app = test_app();
        app.repos.apply_refresh(vec!["/repo1".to_string()]);
        app.repos.apply_switch("/repo1");

        let generation = app.begin_operation(&Action::Push);
        app.handle_job_result(JobResult {
            action: Action::Push,
            generation,
            exchange: Ok(RawResponse {
                status: 200,
                body: r#"{"success":true}"#.to_string(),
            }),
        });

        assert!(!app.lifecycle.busy());
        assert_eq!(
            warning_count(&app, "Changes pushed to remote successfully"),
            1
        );
    }

    #[test]
    fn git_unavailable_banner_is_idempotent() {
        let mut app = test_app();
        app.repos.apply_refresh(vec!["/repo1".to_string()]);
        app.repos.apply_switch("/repo1");

        for _ in 0..2 {
            app.handle_outcome(
                Action::Push,
                Outcome::DomainError {
                    message: "Git is not available".to_string(),
                    git_unavailable: true,
                },
            );
        }

        assert!(!app.repos.git_available());
        assert_eq!(warning_count(&app, "Git executable was not found"), 1);
        // The per-operation error entry still appears both times.
        assert_eq!(warning_count(&app, "Error pushing changes:"), 2);
    }

    #[test]
    fn switch_success_updates_selection() {
        let mut app = test_app();
        app.repos.apply_refresh(vec!["/repo1".to_string()]);

        app.handle_outcome(
            Action::SwitchRepository {
                directory: "/repo1".to_string(),
            },
            Outcome::Success(success_envelope(r#"{"success":true}"#)),
        );

        assert_eq!(app.repos.current(), Some("/repo1"));
        assert!(app.repos.controls_enabled());
        assert_eq!(warning_count(&app, "Switched to repository: /repo1"), 1);
    }

    #[test]
    fn switch_failure_leaves_selection_unchanged() {
        let mut app = test_app();
        app.repos.apply_refresh(vec!["/repo1".to_string()]);
        app.repos.apply_switch("/repo1");

        app.handle_outcome(
            Action::SwitchRepository {
                directory: "/repo2".to_string(),
            },
            Outcome::DomainError {
                message: "Directory does not exist".to_string(),
                git_unavailable: false,
            },
        );

        assert_eq!(app.repos.current(), Some("/repo1"));
        assert_eq!(warning_count(&app, "Failed to switch repository:"), 1);
    }

    #[test]
    fn refresh_success_replaces_list_and_reconciles_selection() {
        let mut app = test_app();
        app.repos.apply_refresh(vec!["/repo1".to_string()]);
        app.repos.apply_switch("/repo1");

        app.handle_outcome(
            Action::RefreshRepositories,
            Outcome::Success(success_envelope(
                r#"{"success":true,"repositories":["/repo2","/repo3"]}"#,
            )),
        );

        assert_eq!(app.repos.current(), None);
        assert!(!app.repos.controls_enabled());
        assert_eq!(warning_count(&app, "Repositories refreshed (2 found)"), 1);
    }

    #[test]
    fn status_output_lines_are_classified() {
        let mut app = test_app();
        app.handle_outcome(
            Action::Status,
            Outcome::Success(success_envelope(
                r#"{"success":true,"output":"On branch main\nnothing to commit, working tree clean"}"#,
            )),
        );

        let levels: Vec<LogLevel> = app.term_log.entries().map(|e| e.level).collect();
        assert_eq!(
            levels,
            vec![LogLevel::Heading, LogLevel::Info, LogLevel::Success]
        );
    }

    #[test]
    fn commit_submit_requires_message() {
        let mut app = test_app();
        app.repos.apply_refresh(vec!["/repo1".to_string()]);
        app.repos.apply_switch("/repo1");

        app.commit_modal.show();
        app.submit_commit();
        assert!(app.commit_modal.open);
        assert_eq!(warning_count(&app, "Commit message cannot be empty"), 1);
        assert!(!app.lifecycle.busy());

        for ch in "fix parser".chars() {
            app.commit_modal.message.insert_char(ch);
        }
        app.submit_commit();
        assert!(!app.commit_modal.open);
        assert!(app.lifecycle.busy());
        assert_eq!(app.lifecycle.description(), "Committing changes...");
    }

    #[test]
    fn dispatch_without_repository_is_refused() {
        let mut app = test_app();
        app.dispatch(Action::Push);
        assert!(!app.lifecycle.busy());
        assert!(app.pending_job.is_none());
        assert!(app.status_message.is_some());
    }

    #[test]
    fn settings_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ui.json");

        let mut app = test_app();
        app.ui_settings_path = Some(path.clone());
        app.set_theme(theme::Theme::Light);
        app.last_activity_unix = Some(42);
        app.save_persisted_ui_settings();

        let mut fresh = test_app();
        fresh.ui_settings_path = Some(path);
        fresh.load_persisted_ui_settings();
        assert_eq!(fresh.theme, theme::Theme::Light);
        assert_eq!(fresh.last_activity_unix, Some(42));
    }

    #[test]
    fn malformed_settings_are_ignored() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ui.json");
        fs::write(&path, "not json").unwrap();

        let mut app = test_app();
        app.ui_settings_path = Some(path);
        app.load_persisted_ui_settings();
        assert_eq!(app.theme, theme::Theme::Dark);
    }

    #[test]
    fn shutdown_success_quits() {
        let mut app = test_app();
        app.handle_outcome(
            Action::Shutdown,
            Outcome::Success(success_envelope(r#"{"success":true}"#)),
        );
        assert!(app.should_quit);
    }

    #[test]
    fn checkout_of_current_branch_is_refused() {
        let mut app = test_app();
        app.repos.apply_refresh(vec!["/repo1".to_string()]);
        app.repos.apply_switch("/repo1");

        app.handle_outcome(
            Action::LoadCheckoutBranches,
            Outcome::Success(success_envelope(
                r#"{"success":true,"branches":[{"name":"main","current":true}]}"#,
            )),
        );
        assert!(app.checkout_modal.open);

        app.checkout_modal.list_state.select(Some(0));
        app.confirm_checkout();
        assert!(app.checkout_modal.open);
        assert!(app.checkout_modal.status.is_some());
        assert!(!app.lifecycle.busy());
    }
}
