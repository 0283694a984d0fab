//! The dispatch table: every user-triggerable backend operation, with its
//! busy text, repository requirement, endpoint call, error wording, and
//! success follow-up.

use crate::client::{BackendClient, RawResponse};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    CheckGitAvailability,
    Status,
    StageAll,
    Commit { message: String },
    Push,
    Pull,
    Log,
    InitRepository,
    ListBranches,
    /// Same endpoint as [`Action::ListBranches`] but the continuation
    /// opens the checkout picker instead of logging the list.
    LoadCheckoutBranches,
    CreateBranch { name: String },
    Checkout { branch: String },
    ListRemotes,
    AddRemote { name: String, url: String },
    SwitchRepository { directory: String },
    PickDirectory,
    RefreshRepositories,
    Shutdown,
}

impl Action {
    /// Text shown in the busy overlay while the call is in flight.
    pub fn busy_message(&self) -> String {
        match self {
            Action::CheckGitAvailability => "Checking Git availability...".into(),
            Action::Status => "Getting git status...".into(),
            Action::StageAll => "Staging changes...".into(),
            Action::Commit { .. } => "Committing changes...".into(),
            Action::Push => "Pushing changes to remote...".into(),
            Action::Pull => "Pulling changes from remote...".into(),
            Action::Log => "Loading commit history...".into(),
            Action::InitRepository => "Initializing Git repository...".into(),
            Action::ListBranches => "Fetching branches...".into(),
            Action::LoadCheckoutBranches => "Loading branches...".into(),
            Action::CreateBranch { .. } => "Creating new branch...".into(),
            Action::Checkout { branch } => format!("Checking out branch \"{}\"...", branch),
            Action::ListRemotes => "Fetching remotes...".into(),
            Action::AddRemote { .. } => "Adding remote repository...".into(),
            Action::SwitchRepository { .. } => "Switching repository...".into(),
            Action::PickDirectory => "Opening directory selection dialog...".into(),
            Action::RefreshRepositories => "Refreshing repositories...".into(),
            Action::Shutdown => "Shutting down server...".into(),
        }
    }

    /// Git operations are gated on a selected repository; repository
    /// management, the availability probe, and shutdown are not.
    pub fn requires_repository(&self) -> bool {
        !matches!(
            self,
            Action::CheckGitAvailability
                | Action::SwitchRepository { .. }
                | Action::PickDirectory
                | Action::RefreshRepositories
                | Action::Shutdown
        )
    }

    /// Action chained after a successful completion.
    pub fn follow_up(&self) -> Option<Action> {
        match self {
            Action::StageAll
            | Action::Commit { .. }
            | Action::Pull
            | Action::InitRepository
            | Action::Checkout { .. } => Some(Action::Status),
            Action::CreateBranch { .. } => Some(Action::ListBranches),
            Action::AddRemote { .. } => Some(Action::ListRemotes),
            Action::PickDirectory => Some(Action::RefreshRepositories),
            Action::RefreshRepositories => Some(Action::CheckGitAvailability),
            _ => None,
        }
    }

    /// Wording for a domain-error log entry.
    pub fn error_message(&self, error: &str) -> String {
        match self {
            Action::CheckGitAvailability => format!("Backend: {}", error),
            Action::Status => format!("Error getting status: {}", error),
            Action::StageAll => format!("Error staging changes: {}", error),
            Action::Commit { .. } => format!("Error committing changes: {}", error),
            Action::Push => format!("Error pushing changes: {}", error),
            Action::Pull => format!("Error pulling changes: {}", error),
            Action::Log => format!("Error getting commit history: {}", error),
            Action::InitRepository => format!("Error initializing repository: {}", error),
            Action::ListBranches => format!("Error listing branches: {}", error),
            Action::LoadCheckoutBranches => format!("Error loading branches: {}", error),
            Action::CreateBranch { .. } => format!("Error creating branch: {}", error),
            Action::Checkout { .. } => format!("Error checking out branch: {}", error),
            Action::ListRemotes => format!("Error listing remotes: {}", error),
            Action::AddRemote { .. } => format!("Error adding remote: {}", error),
            Action::SwitchRepository { .. } => {
                format!("Failed to switch repository: {}", error)
            }
            Action::PickDirectory => {
                format!("No directory selected or error: {}", error)
            }
            Action::RefreshRepositories => {
                format!("Failed to refresh repositories: {}", error)
            }
            Action::Shutdown => format!("Failed to shut down the server: {}", error),
        }
    }

    /// Execute the backend call. Blocking; runs on a worker thread.
    pub fn call(&self, client: &BackendClient) -> Result<RawResponse, String> {
        match self {
            Action::CheckGitAvailability | Action::Status => client.status(),
            Action::StageAll => client.stage_all(),
            Action::Commit { message } => client.commit(message),
            Action::Push => client.push(),
            Action::Pull => client.pull(),
            Action::Log => client.log(),
            Action::InitRepository => client.init_repository(),
            Action::ListBranches | Action::LoadCheckoutBranches => client.list_branches(),
            Action::CreateBranch { name } => client.create_branch(name),
            Action::Checkout { branch } => client.checkout(branch),
            Action::ListRemotes => client.list_remotes(),
            Action::AddRemote { name, url } => client.add_remote(name, url),
            Action::SwitchRepository { directory } => client.switch_repository(directory),
            Action::PickDirectory => client.pick_directory(),
            Action::RefreshRepositories => client.list_repositories(),
            Action::Shutdown => client.shutdown(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_gating() {
        assert!(Action::Status.requires_repository());
        assert!(Action::Push.requires_repository());
        assert!(
            Action::Commit {
                message: "m".into()
            }
            .requires_repository()
        );
        assert!(!Action::RefreshRepositories.requires_repository());
        assert!(!Action::PickDirectory.requires_repository());
        assert!(
            !Action::SwitchRepository {
                directory: "/r".into()
            }
            .requires_repository()
        );
        assert!(!Action::Shutdown.requires_repository());
        assert!(!Action::CheckGitAvailability.requires_repository());
    }

    #[test]
    fn success_follow_ups() {
        assert_eq!(Action::StageAll.follow_up(), Some(Action::Status));
        assert_eq!(
            Action::Commit {
                message: "m".into()
            }
            .follow_up(),
            Some(Action::Status)
        );
        assert_eq!(Action::Pull.follow_up(), Some(Action::Status));
        assert_eq!(
            Action::Checkout {
                branch: "dev".into()
            }
            .follow_up(),
            Some(Action::Status)
        );
        assert_eq!(
            Action::CreateBranch { name: "f".into() }.follow_up(),
            Some(Action::ListBranches)
        );
        assert_eq!(
            Action::AddRemote {
                name: "origin".into(),
                url: "u".into()
            }
            .follow_up(),
            Some(Action::ListRemotes)
        );
        assert_eq!(
            Action::PickDirectory.follow_up(),
            Some(Action::RefreshRepositories)
        );
        assert_eq!(Action::Push.follow_up(), None);
        assert_eq!(Action::Status.follow_up(), None);
    }

    #[test]
    fn checkout_busy_message_names_the_branch() {
        let action = Action::Checkout {
            branch: "dev".into(),
        };
        assert_eq!(action.busy_message(), "Checking out branch \"dev\"...");
    }
}
