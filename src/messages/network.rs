//! Network messages - communication between App and Network layers
//!
//! Every command and response carries the view epoch it was issued under,
//! so the app can drop results for views that are gone.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::ApiError;
use crate::models::{GalleryImage, Id, ProgressSample, QueueItem, RegisterResponse, Session, User};

/// Read-only fetches
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Users,
    UserInfo(Id),
    UserImages(Id),
    /// Profile and images together, both must succeed
    UserDetails(Id),
    Queue(Id),
    /// One concurrent progress request per listed item
    Progress(Vec<Id>),
}

/// Prompt submission as entered, before the optional image is encoded
#[derive(Debug, Clone, PartialEq)]
pub struct PromptDraft {
    pub user_id: Id,
    pub prompt: String,
    pub negative_prompt: String,
    pub image_path: Option<PathBuf>,
}

/// State-changing calls. Each is exactly one request, never retried.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    SubmitPrompt(PromptDraft),
    CancelItem(Id),
    RemoveItem(Id),
    ClearQueue(Id),
    DeleteUser(Id),
    DeleteImage(Id),
    Logout(Id),
}

impl Mutation {
    /// Title and message shown after a 2xx
    pub fn success_notice(&self) -> (&'static str, &'static str) {
        match self {
            Mutation::SubmitPrompt(_) => ("Queued", "Your prompt has been queued for processing."),
            Mutation::CancelItem(_) => ("Cancelled", "Prompt cancelled during generation"),
            Mutation::RemoveItem(_) => ("Removed", "Prompt removed from queue"),
            Mutation::ClearQueue(_) => ("Cleared", "Your queue has been cleared."),
            Mutation::DeleteUser(_) => ("Deleted", "User removed."),
            Mutation::DeleteImage(_) => ("Deleted", "Image removed."),
            Mutation::Logout(_) => ("Logged Out", "Your session has been cleared."),
        }
    }

    /// Shown when the server rejected the call without a detail
    pub fn rejected_fallback(&self) -> &'static str {
        match self {
            Mutation::SubmitPrompt(_) => "Failed to queue.",
            Mutation::CancelItem(_) => "Failed to cancel",
            Mutation::RemoveItem(_) => "Failed to remove prompt",
            Mutation::ClearQueue(_) => "Failed to clear queue",
            Mutation::DeleteUser(_) => "Failed to delete user.",
            Mutation::DeleteImage(_) => "Failed to delete image.",
            Mutation::Logout(_) => "Failed to logout properly.",
        }
    }

    /// Shown when no usable response came back
    pub fn unreachable_fallback(&self) -> &'static str {
        match self {
            Mutation::SubmitPrompt(_) => "Network or server issue.",
            Mutation::CancelItem(_) => "Failed to cancel prompt",
            Mutation::ClearQueue(_) => "Could not clear the queue.",
            other => other.rejected_fallback(),
        }
    }

    /// Notice text for a failed call: server detail first, then the
    /// fallback matching how the call failed
    pub fn failure_message(&self, err: &ApiError) -> String {
        match err {
            ApiError::Server { .. } | ApiError::Validation(_) => {
                err.user_message(self.rejected_fallback())
            }
            ApiError::Transport(_) | ApiError::Decode(_) => {
                self.unreachable_fallback().to_string()
            }
        }
    }
}

/// Commands sent from App layer to Network layer
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkCommand {
    Login {
        epoch: u64,
        identifier: String,
        password: String,
    },
    Register {
        epoch: u64,
        username: String,
        email: String,
        password: String,
    },
    Fetch {
        epoch: u64,
        query: Query,
    },
    Mutate {
        epoch: u64,
        mutation: Mutation,
    },
    /// Shutdown the network actor
    Shutdown,
}

/// Responses sent from Network layer to App layer
#[derive(Debug, Clone)]
pub enum NetworkResponse {
    LoggedIn {
        epoch: u64,
        result: Result<Session, ApiError>,
    },
    Registered {
        epoch: u64,
        result: Result<RegisterResponse, ApiError>,
    },
    UsersLoaded {
        epoch: u64,
        result: Result<Vec<User>, ApiError>,
    },
    UserInfoLoaded {
        epoch: u64,
        result: Result<User, ApiError>,
    },
    ImagesLoaded {
        epoch: u64,
        result: Result<Vec<GalleryImage>, ApiError>,
    },
    UserDetailsLoaded {
        epoch: u64,
        user_id: Id,
        result: Result<(User, Vec<GalleryImage>), ApiError>,
    },
    QueueLoaded {
        epoch: u64,
        result: Result<Vec<QueueItem>, ApiError>,
    },
    /// Per-item failures are already dropped from the map
    ProgressLoaded {
        epoch: u64,
        samples: HashMap<Id, ProgressSample>,
    },
    Mutated {
        epoch: u64,
        mutation: Mutation,
        result: Result<(), ApiError>,
    },
}

impl NetworkResponse {
    /// Get the view epoch the originating command was issued under
    pub fn epoch(&self) -> u64 {
        match self {
            NetworkResponse::LoggedIn { epoch, .. } => *epoch,
            NetworkResponse::Registered { epoch, .. } => *epoch,
            NetworkResponse::UsersLoaded { epoch, .. } => *epoch,
            NetworkResponse::UserInfoLoaded { epoch, .. } => *epoch,
            NetworkResponse::ImagesLoaded { epoch, .. } => *epoch,
            NetworkResponse::UserDetailsLoaded { epoch, .. } => *epoch,
            NetworkResponse::QueueLoaded { epoch, .. } => *epoch,
            NetworkResponse::ProgressLoaded { epoch, .. } => *epoch,
            NetworkResponse::Mutated { epoch, .. } => *epoch,
        }
    }
}
