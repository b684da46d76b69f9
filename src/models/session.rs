use crate::engine::RenameEngine;
use crate::services::renaming::RenameStatus;
use crate::store::PatternStore;
use camino::Utf8PathBuf;
use std::collections::HashSet;

/// Single source of truth for a rename session.
///
/// Holds what a front end edits (patterns, queue, template, selection), what it
/// shows (the directory listing and its preview), and the progress of a rename run.
///
/// # Thread Safety
///
/// `SessionState` is wrapped in `Arc<RwLock<SessionState>>` by
/// [`crate::state::StateManager`]. Mutate it through
/// [`update()`](crate::state::StateManager::update) so the preview is recomputed and
/// change events are emitted.
#[derive(Clone, Debug, Default)]
pub struct SessionState {
    // Rename inputs
    pub store: PatternStore,
    pub template: String,

    // Working directory
    pub directory: Option<Utf8PathBuf>,
    pub files: Vec<String>,

    /// New names, aligned with `files`; empty when the queue or template is empty
    pub preview: Vec<String>,

    // Front end selection and persistence
    pub selected_variable: Option<String>,
    pub preset_name: Option<String>,
    pub is_dirty: bool,

    // Rename run
    pub is_renaming: bool,
    pub progress: usize,
    pub total_files: usize,

    // Results
    pub renamed_files: HashSet<String>,
    pub failed_files: HashSet<String>,
    pub skipped_files: HashSet<String>,
}

impl SessionState {
    /// Recompute the preview from the store, template and file listing.
    pub fn refresh_preview(&mut self) {
        self.preview = if self.template.is_empty() {
            Vec::new()
        } else {
            self.engine().apply(&self.template, &self.files)
        };
    }

    /// Compile the current queue.
    pub fn engine(&self) -> RenameEngine {
        RenameEngine::compile(self.store.queue(), &self.store)
    }

    /// `(old, new)` name pairs for display.
    pub fn preview_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files
            .iter()
            .zip(&self.preview)
            .map(|(old, new)| (old.as_str(), new.as_str()))
    }

    /// Expressions of the selected variable, empty when nothing is selected.
    pub fn selected_expressions(&self) -> &[String] {
        self.selected_variable
            .as_deref()
            .map(|name| self.store.expressions_for(name))
            .unwrap_or(&[])
    }

    /// Record the outcome for one file and advance progress.
    pub fn add_result(&mut self, file: String, status: RenameStatus) {
        match status {
            RenameStatus::Renamed => self.renamed_files.insert(file),
            RenameStatus::Failed => self.failed_files.insert(file),
            RenameStatus::Skipped => self.skipped_files.insert(file),
        };
        self.progress += 1;
    }

    pub fn reset_rename_state(&mut self) {
        self.is_renaming = false;
        self.progress = 0;
        self.total_files = 0;
        self.renamed_files.clear();
        self.failed_files.clear();
        self.skipped_files.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with_year() -> SessionState {
        let mut state = SessionState::default();
        state.store.add_variable("year", r"\d{4}").unwrap();
        state.store.enqueue("year");
        state.files = vec!["trip-2019.jpg".to_string(), "misc.png".to_string()];
        state
    }

    #[test]
    fn test_default_state() {
        let state = SessionState::default();
        assert!(state.store.is_empty());
        assert!(state.preview.is_empty());
        assert!(!state.is_renaming);
    }

    #[test]
    fn test_refresh_preview() {
        let mut state = session_with_year();
        state.template = "photo-%year%".to_string();
        state.refresh_preview();

        assert_eq!(state.preview, vec!["photo-2019.jpg", "photo-.png"]);
        assert_eq!(
            state.preview_pairs().collect::<Vec<_>>(),
            vec![("trip-2019.jpg", "photo-2019.jpg"), ("misc.png", "photo-.png")]
        );
    }

    #[test]
    fn test_empty_template_clears_preview() {
        let mut state = session_with_year();
        state.template = "%year%".to_string();
        state.refresh_preview();
        assert_eq!(state.preview.len(), 2);

        state.template.clear();
        state.refresh_preview();
        assert!(state.preview.is_empty());
    }

    #[test]
    fn test_selected_expressions() {
        let mut state = session_with_year();
        assert!(state.selected_expressions().is_empty());

        state.selected_variable = Some("year".to_string());
        assert_eq!(state.selected_expressions(), [r"\d{4}"]);
    }

    #[test]
    fn test_add_result_and_reset() {
        let mut state = SessionState::default();
        state.add_result("a.jpg".to_string(), RenameStatus::Renamed);
        state.add_result("b.jpg".to_string(), RenameStatus::Skipped);

        assert_eq!(state.progress, 2);
        assert!(state.renamed_files.contains("a.jpg"));

        state.reset_rename_state();
        assert_eq!(state.progress, 0);
        assert!(state.renamed_files.is_empty());
        assert!(state.skipped_files.is_empty());
    }
}
