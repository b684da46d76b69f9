//! Services module - filesystem work around the rename engine.
//!
//! The engine itself is pure; everything that touches the disk lives here and has no
//! dependency on any front end.
//!
//! # Components
//!
//! - [`list_filenames`]: Lists the rename candidates of one directory (async, sorted,
//!   UTF-8 names only).
//!
//! - [`RenameService`]: Turns a preview into renames. Handles:
//!   - Planning: checks each `old -> new` pair for unchanged, invalid, duplicate and
//!     already-existing names ([`RenamePlan`], [`PlanStatus`])
//!   - Execution: renames ready entries one by one with cancellation support
//!     ([`RenameResult`], [`RenameStatus`])
//!
//! # Usage Example
//!
//! ```ignore
//! use pattermer::services::{list_filenames, RenameService};
//!
//! let files = list_filenames(dir, false).await?;
//! let new_names = transform(store.queue(), &store, "%author%-%year%", &files);
//!
//! let service = RenameService::new();
//! let plan = service.plan(dir, &files, &new_names)?;
//! let results = service.execute(&plan, &cancel_rx, |result| println!("{:?}", result)).await;
//! ```

pub mod directory;
pub mod renaming;

pub use directory::list_filenames;
pub use renaming::{
    PlanStatus, PlannedRename, RenameError, RenamePlan, RenameResult, RenameService, RenameStatus,
};
