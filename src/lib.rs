//! # Imagine TUI
//!
//! A terminal client for an image-generation backend.
//!
//! ## Features
//! - Login and signup, with admin and regular roles
//! - Prompt submission with an optional negative prompt and input image
//! - Live generation queue with per-item progress
//! - Personal gallery and account summary
//! - Admin dashboard: browse users, delete users and images
//!
//! ## Architecture
//! Actor-based with channels:
//! - UI Layer (Ratatui) - synchronous
//! - App Layer (State machine + queue poller)
//! - Network Layer (Tokio runtime)

pub mod app;
pub mod config;
pub mod constants;
pub mod error;
pub mod messages;
pub mod models;
pub mod network;
pub mod ui;

// Re-export commonly used types
pub use app::{AppActor, AppState, Poller};
pub use config::Config;
pub use error::ApiError;
pub use messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};
pub use models::{format_seconds, Id, ProgressSample, QueueItem, QueueStatus, Role, Session};
pub use network::{ApiClient, NetworkActor};
