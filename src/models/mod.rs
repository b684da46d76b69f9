//! Data models for Pattermer.
//!
//! - [`SessionState`]: everything a rename session holds (store, template, listing, preview, run progress)
//! - [`Preset`]: persisted variables and search queue from `presets/<name>.yaml`
//! - [`Settings`]: user settings from `Pattermer Settings.yaml`
//!
//! # Architecture Note
//!
//! - **Serializable**: `Preset` and `Settings` derive `Serialize`/`Deserialize` for YAML persistence
//! - **Cloneable**: `SessionState` is wrapped in `Arc<RwLock<>>` by [`StateManager`](crate::state::StateManager)

pub mod config;
pub mod preset;
pub mod session;

pub use config::{DEFAULT_PRESET, Settings};
pub use preset::Preset;
pub use session::SessionState;
