use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashSet;
use std::fs::{self, Metadata};
use std::io;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::watch;

/// Outcome of planning a single rename
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStatus {
    /// Safe to rename
    Ready,
    /// New name equals the old one
    Unchanged,
    /// New name is empty, `.`/`..`, or contains a path separator
    Invalid,
    /// An earlier file in the batch already claims this name
    Duplicate,
    /// A different file with this name already exists in the directory
    TargetExists,
}

/// One entry of a [`RenamePlan`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRename {
    pub from: String,
    pub to: String,
    pub status: PlanStatus,
    pub reason: Option<String>,
}

/// Checked renames for one directory, in listing order
#[derive(Debug, Clone)]
pub struct RenamePlan {
    pub directory: Utf8PathBuf,
    pub entries: Vec<PlannedRename>,
}

impl RenamePlan {
    pub fn count(&self, status: PlanStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }

    pub fn ready_count(&self) -> usize {
        self.count(PlanStatus::Ready)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Status of an executed rename
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameStatus {
    Renamed,
    Skipped,
    Failed,
}

impl RenameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenameStatus::Renamed => "renamed",
            RenameStatus::Skipped => "skipped",
            RenameStatus::Failed => "failed",
        }
    }
}

/// Result of renaming (or not renaming) one file
#[derive(Debug, Clone)]
pub struct RenameResult {
    pub from: String,
    pub to: String,
    pub status: RenameStatus,
    pub message: String,
    pub duration: Duration,
}

/// Errors that can occur while planning or executing renames
#[derive(Error, Debug)]
pub enum RenameError {
    #[error("Expected {expected} new names but got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Target {0} already exists")]
    TargetExists(String),

    #[error("Rename cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Service for turning a preview into filesystem renames
///
/// Planning is synchronous and only reads the filesystem to detect collisions.
/// Execution renames one file at a time with `tokio::fs::rename` and re-checks each
/// target right before renaming, since the directory may have changed after planning.
///
/// Existing files are never overwritten. A batch whose targets are also sources in the
/// same batch (swaps, shifts) is refused for those entries with
/// [`PlanStatus::TargetExists`].
#[derive(Debug, Default)]
pub struct RenameService;

impl RenameService {
    pub fn new() -> Self {
        Self
    }

    /// Check every `from -> to` pair and build a plan.
    ///
    /// # Errors
    /// [`RenameError::LengthMismatch`] when the two lists differ in length
    pub fn plan<S, T>(
        &self,
        directory: &Utf8Path,
        sources: &[S],
        targets: &[T],
    ) -> Result<RenamePlan, RenameError>
    where
        S: AsRef<str>,
        T: AsRef<str>,
    {
        if sources.len() != targets.len() {
            return Err(RenameError::LengthMismatch {
                expected: sources.len(),
                actual: targets.len(),
            });
        }

        let mut claimed: HashSet<&str> = HashSet::new();
        let mut entries = Vec::with_capacity(sources.len());

        for (source, target) in sources.iter().zip(targets) {
            let (from, to) = (source.as_ref(), target.as_ref());

            let (status, reason) = if from == to {
                claimed.insert(to);
                (PlanStatus::Unchanged, None)
            } else if let Some(reason) = invalid_reason(to) {
                (PlanStatus::Invalid, Some(reason))
            } else if !claimed.insert(to) {
                (
                    PlanStatus::Duplicate,
                    Some(format!("{} is already the target of another file", to)),
                )
            } else if target_taken(directory, from, to) {
                (
                    PlanStatus::TargetExists,
                    Some(format!("{} already exists", to)),
                )
            } else {
                (PlanStatus::Ready, None)
            };

            entries.push(PlannedRename {
                from: from.to_string(),
                to: to.to_string(),
                status,
                reason,
            });
        }

        let plan = RenamePlan {
            directory: directory.to_path_buf(),
            entries,
        };

        tracing::info!(
            "Planned renames in {}: {} ready, {} unchanged, {} invalid, {} duplicate, {} existing",
            directory,
            plan.ready_count(),
            plan.count(PlanStatus::Unchanged),
            plan.count(PlanStatus::Invalid),
            plan.count(PlanStatus::Duplicate),
            plan.count(PlanStatus::TargetExists)
        );

        Ok(plan)
    }

    /// Rename a single planned entry.
    ///
    /// Entries that are not [`PlanStatus::Ready`] are reported as skipped.
    pub async fn rename_entry(&self, directory: &Utf8Path, entry: &PlannedRename) -> RenameResult {
        let started = Instant::now();

        let (status, message) = if entry.status != PlanStatus::Ready {
            let reason = entry
                .reason
                .clone()
                .unwrap_or_else(|| "name unchanged".to_string());
            (RenameStatus::Skipped, reason)
        } else {
            match self.rename_file(directory, &entry.from, &entry.to).await {
                Ok(()) => (RenameStatus::Renamed, format!("Renamed to {}", entry.to)),
                Err(RenameError::TargetExists(to)) => (
                    RenameStatus::Skipped,
                    format!("{} appeared after planning", to),
                ),
                Err(e) => (RenameStatus::Failed, e.to_string()),
            }
        };

        match status {
            RenameStatus::Renamed => tracing::info!("{} -> {}", entry.from, entry.to),
            RenameStatus::Skipped => tracing::debug!("Skipped {}: {}", entry.from, message),
            RenameStatus::Failed => tracing::error!("Failed to rename {}: {}", entry.from, message),
        }

        RenameResult {
            from: entry.from.clone(),
            to: entry.to.clone(),
            status,
            message,
            duration: started.elapsed(),
        }
    }

    /// Execute a plan in order, reporting each result through `on_result`.
    ///
    /// Once `cancel` reads `true`, the remaining entries are reported as skipped
    /// without touching the filesystem.
    pub async fn execute<F>(
        &self,
        plan: &RenamePlan,
        cancel: &watch::Receiver<bool>,
        mut on_result: F,
    ) -> Vec<RenameResult>
    where
        F: FnMut(&RenameResult),
    {
        let mut results = Vec::with_capacity(plan.entries.len());

        for entry in &plan.entries {
            let result = if *cancel.borrow() {
                RenameResult {
                    from: entry.from.clone(),
                    to: entry.to.clone(),
                    status: RenameStatus::Skipped,
                    message: RenameError::Cancelled.to_string(),
                    duration: Duration::ZERO,
                }
            } else {
                self.rename_entry(&plan.directory, entry).await
            };

            on_result(&result);
            results.push(result);
        }

        results
    }

    async fn rename_file(&self, directory: &Utf8Path, from: &str, to: &str) -> Result<(), RenameError> {
        let (dir, source, target) = (directory.to_path_buf(), from.to_string(), to.to_string());
        let taken = tokio::task::spawn_blocking(move || target_taken(&dir, &source, &target))
            .await
            .map_err(io::Error::other)?;
        if taken {
            return Err(RenameError::TargetExists(to.to_string()));
        }

        tokio::fs::rename(directory.join(from), directory.join(to)).await?;
        Ok(())
    }
}

fn invalid_reason(name: &str) -> Option<String> {
    if name.is_empty() {
        Some("new name is empty".to_string())
    } else if name == "." || name == ".." {
        Some(format!("{} is not a valid filename", name))
    } else if name.contains('/') || name.contains('\\') {
        Some(format!("{} contains a path separator", name))
    } else if name.contains('\0') {
        Some("new name contains a NUL byte".to_string())
    } else {
        None
    }
}

/// Whether `to` is occupied by anything other than the file `from` itself.
///
/// On case-insensitive filesystems a case-only rename finds the source under the new
/// name; that is the only occupant that does not count.
fn target_taken(directory: &Utf8Path, from: &str, to: &str) -> bool {
    let (source, target) = (directory.join(from), directory.join(to));

    // symlink_metadata so a dangling link still counts as taken
    let Ok(target_meta) = fs::symlink_metadata(&target) else {
        return false;
    };
    match fs::symlink_metadata(&source) {
        Ok(source_meta) => !same_file(&source, &source_meta, &target, &target_meta),
        Err(_) => true,
    }
}

#[cfg(unix)]
fn same_file(_: &Utf8Path, source: &Metadata, _: &Utf8Path, target: &Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    source.dev() == target.dev() && source.ino() == target.ino()
}

#[cfg(not(unix))]
fn same_file(source: &Utf8Path, _: &Metadata, target: &Utf8Path, _: &Metadata) -> bool {
    match (fs::canonicalize(source), fs::canonicalize(target)) {
        (Ok(source), Ok(target)) => source == target,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_length_mismatch() {
        let service = RenameService::new();
        let err = service
            .plan(Utf8Path::new("/nonexistent"), &["a"], &["b", "c"])
            .unwrap_err();

        assert!(matches!(
            err,
            RenameError::LengthMismatch { expected: 1, actual: 2 }
        ));
    }

    #[test]
    fn test_plan_statuses() {
        let service = RenameService::new();
        let plan = service
            .plan(
                Utf8Path::new("/nonexistent-pattermer-dir"),
                &["same.jpg", "a.jpg", "b.jpg", "c.jpg", "d.jpg"],
                &["same.jpg", "x.jpg", "x.jpg", "", "sub/d.jpg"],
            )
            .unwrap();

        let statuses: Vec<PlanStatus> = plan.entries.iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![
                PlanStatus::Unchanged,
                PlanStatus::Ready,
                PlanStatus::Duplicate,
                PlanStatus::Invalid,
                PlanStatus::Invalid,
            ]
        );
        assert_eq!(plan.ready_count(), 1);
    }

    #[test]
    fn test_unchanged_name_is_claimed() {
        let service = RenameService::new();
        let plan = service
            .plan(
                Utf8Path::new("/nonexistent-pattermer-dir"),
                &["keep.txt", "other.txt"],
                &["keep.txt", "keep.txt"],
            )
            .unwrap();

        assert_eq!(plan.entries[1].status, PlanStatus::Duplicate);
    }

    #[test]
    fn test_invalid_reason() {
        assert!(invalid_reason("").is_some());
        assert!(invalid_reason("..").is_some());
        assert!(invalid_reason("a\\b").is_some());
        assert!(invalid_reason("fine.txt").is_none());
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(RenameStatus::Renamed.as_str(), "renamed");
        assert_eq!(RenameStatus::Failed.as_str(), "failed");
    }
}
