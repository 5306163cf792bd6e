//! App layer - central state management and command processing
//!
//! The App actor receives UI events, poll ticks and network responses,
//! updates state, and emits network commands and render state.

pub mod actor;
pub mod commands;
pub mod form;
pub mod poller;
pub mod state;

pub use actor::AppActor;
pub use poller::Poller;
pub use state::AppState;
