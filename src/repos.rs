//! Repository selection state: which directory is current, which are
//! available, and whether the backend's git executable works at all.
//!
//! Control enablement is always derived from `current` being set, never
//! stored separately.

#[derive(Clone, Debug)]
pub struct RepoSelection {
    current: Option<String>,
    available: Vec<String>,
    git_available: bool,
}

impl RepoSelection {
    pub fn new() -> Self {
        Self {
            current: None,
            available: Vec::new(),
            git_available: true,
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn available(&self) -> &[String] {
        &self.available
    }

    pub fn controls_enabled(&self) -> bool {
        self.current.is_some()
    }

    pub fn git_available(&self) -> bool {
        self.git_available
    }

    /// Empty or whitespace-only paths are never dispatched.
    pub fn is_selectable(path: &str) -> bool {
        !path.trim().is_empty()
    }

    /// Record a successful repository switch. Failures leave `current`
    /// untouched, so this is only called from the success continuation.
    pub fn apply_switch(&mut self, directory: &str) {
        if !Self::is_selectable(directory) {
            return;
        }
        self.current = Some(directory.to_string());
    }

    /// Replace the available list wholesale. The prior selection survives
    /// only if it still appears in the new list.
    pub fn apply_refresh(&mut self, repositories: Vec<String>) {
        let keep = self
            .current
            .as_ref()
            .is_some_and(|cur| repositories.contains(cur));
        self.available = repositories;
        if !keep {
            self.current = None;
        }
    }

    /// Flip the availability flag. Returns true only on the first flip so
    /// the warning banner is raised once per flag state.
    pub fn mark_git_unavailable(&mut self) -> bool {
        if self.git_available {
            self.git_available = false;
            true
        } else {
            false
        }
    }
}
