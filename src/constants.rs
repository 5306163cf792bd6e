//! Application constants
//!
//! Centralized location for configuration defaults.

/// Host used when nothing else is configured
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Port the generation server listens on
pub const DEFAULT_PORT: u16 = 8000;

/// Queue list refresh period while the queue screen is open
pub const DEFAULT_QUEUE_POLL_MS: u64 = 2_000;

/// Progress refresh period while the queue list is non-empty
pub const DEFAULT_PROGRESS_POLL_MS: u64 = 1_000;

/// Directory name under the platform config dir
pub const CONFIG_DIR_NAME: &str = "imagine";

/// Log file written next to the configuration
pub const LOG_FILE_NAME: &str = "imagine.log";

/// Application name
pub const APP_NAME: &str = "Imagine";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
