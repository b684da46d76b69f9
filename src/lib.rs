// Pattermer - batch file renaming with ordered regular-expression variables
//
// This is the library crate containing the rename engine, pattern store, session state
// and services. The binary crate (main.rs) provides the command line entry point.

pub mod config;
pub mod engine;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;
pub mod store;
pub mod ui;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use engine::{ExpressionLookup, RenameEngine, split_extension, transform};
pub use models::{Preset, SessionState, Settings};
pub use state::{StateChange, StateManager};
pub use store::{PatternStore, StoreError};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
