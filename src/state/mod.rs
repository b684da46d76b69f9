// State management module
//
// This module provides the StateManager which wraps SessionState with thread-safe access
// using Arc<RwLock<T>>, keeps the rename preview current, and emits change events.

use crate::metrics::Metrics;
use crate::models::{Preset, SessionState};
use crate::services::renaming::{RenameResult, RenameStatus};
use crate::store::{PatternStore, StoreError};
use camino::Utf8PathBuf;
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};
use std::time::Instant;
use tokio::sync::broadcast;

/// Change events emitted when state is modified
///
/// These events let a front end redraw only what changed instead of polling the state.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// Variables or their expressions were added or removed
    VariablesChanged { count: usize },

    /// The search queue was edited
    QueueChanged { queue: Vec<String> },

    /// The rename template was edited
    TemplateChanged { template: String },

    /// A directory listing was loaded
    FilesLoaded {
        directory: Option<Utf8PathBuf>,
        count: usize,
    },

    /// The preview names were recomputed and differ from before
    PreviewUpdated { count: usize },

    /// The selected variable changed
    SelectionChanged { variable: Option<String> },

    /// The active preset or its saved status changed
    PresetChanged {
        name: Option<String>,
        is_dirty: bool,
    },

    /// A rename run has started
    RenameStarted { total_files: usize },

    /// Progress has been updated during a rename run
    ProgressUpdated { current: usize, total: usize },

    /// A rename run has finished
    RenameFinished {
        renamed: usize,
        failed: usize,
        skipped: usize,
    },

    /// A file has been processed during a rename run
    FileProcessed {
        file: String,
        status: RenameStatus,
        message: String,
    },

    /// Rename run state has been reset
    StateReset,
}

/// Thread-safe session manager with event emission
///
/// This is the central state component that:
/// - Provides thread-safe access to [`SessionState`] via `Arc<RwLock<T>>`
/// - Recomputes the rename preview whenever the store, template or listing changes
/// - Detects state changes and emits [`StateChange`] events
/// - Supports subscribing to state changes via tokio broadcast channels
///
/// # Usage
///
/// - [`read()`](Self::read) for reading state through a closure
/// - [`update()`](Self::update) / [`try_update()`](Self::try_update) for mutations
/// - [`subscribe()`](Self::subscribe) for listening to state changes
pub struct StateManager {
    state: Arc<RwLock<SessionState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,

    metrics: Arc<Metrics>,
}

impl StateManager {
    /// Create a new StateManager with an empty session
    ///
    /// The broadcast channel buffers 100 events.
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(SessionState::default())),
            state_tx,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Get a cloned snapshot of the current state
    pub fn snapshot(&self) -> SessionState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let queued = state_manager.read(|state| state.store.queue().len());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&SessionState) -> R,
    {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// 1. Captures the old state
    /// 2. Applies the update function
    /// 3. Recomputes the preview if its inputs changed
    /// 4. Emits an event for each detected change
    ///
    /// # Returns
    /// The StateChange events that were emitted
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut SessionState),
    {
        let mut state = self.write_state();
        let old_state = state.clone();

        update_fn(&mut state);

        self.finish_update(&old_state, &mut state)
    }

    /// Fallible variant of [`update()`](Self::update)
    ///
    /// If `update_fn` returns an error the state is restored and no events are emitted.
    pub fn try_update<F, E>(&self, update_fn: F) -> Result<Vec<StateChange>, E>
    where
        F: FnOnce(&mut SessionState) -> Result<(), E>,
    {
        let mut state = self.write_state();
        let old_state = state.clone();

        if let Err(e) = update_fn(&mut state) {
            *state = old_state;
            return Err(e);
        }

        Ok(self.finish_update(&old_state, &mut state))
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish_update(&self, old: &SessionState, new: &mut SessionState) -> Vec<StateChange> {
        if old.store != new.store || old.template != new.template || old.files != new.files {
            let started = Instant::now();
            new.refresh_preview();
            self.metrics.record_preview(started.elapsed());
        }
        self.metrics.record_state_update();

        let changes = self.detect_changes(old, new);
        for change in &changes {
            self.emit(change.clone());
        }

        changes
    }

    fn emit(&self, change: StateChange) {
        // Err only means there are no subscribers
        if self.state_tx.send(change).is_ok() {
            self.metrics.record_state_broadcast();
        }
    }

    /// Detect what changed between two states and generate events
    fn detect_changes(&self, old: &SessionState, new: &SessionState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.store.variables() != new.store.variables() {
            changes.push(StateChange::VariablesChanged {
                count: new.store.len(),
            });
        }

        if old.store.queue() != new.store.queue() {
            changes.push(StateChange::QueueChanged {
                queue: new.store.queue().to_vec(),
            });
        }

        if old.template != new.template {
            changes.push(StateChange::TemplateChanged {
                template: new.template.clone(),
            });
        }

        if old.directory != new.directory || old.files != new.files {
            changes.push(StateChange::FilesLoaded {
                directory: new.directory.clone(),
                count: new.files.len(),
            });
        }

        if old.preview != new.preview {
            changes.push(StateChange::PreviewUpdated {
                count: new.preview.len(),
            });
        }

        if old.selected_variable != new.selected_variable {
            changes.push(StateChange::SelectionChanged {
                variable: new.selected_variable.clone(),
            });
        }

        if old.preset_name != new.preset_name || old.is_dirty != new.is_dirty {
            changes.push(StateChange::PresetChanged {
                name: new.preset_name.clone(),
                is_dirty: new.is_dirty,
            });
        }

        if old.is_renaming != new.is_renaming {
            if new.is_renaming {
                changes.push(StateChange::RenameStarted {
                    total_files: new.total_files,
                });
            } else {
                changes.push(StateChange::RenameFinished {
                    renamed: new.renamed_files.len(),
                    failed: new.failed_files.len(),
                    skipped: new.skipped_files.len(),
                });
            }
        }

        if old.progress != new.progress || old.total_files != new.total_files {
            changes.push(StateChange::ProgressUpdated {
                current: new.progress,
                total: new.total_files,
            });
        }

        changes
    }

    // Convenience methods for common state updates

    /// Replace the store with a loaded preset and select its first variable
    pub fn load_preset(&self, name: &str, preset: &Preset) -> Vec<StateChange> {
        self.update(|state| {
            state.store = PatternStore::from_preset(preset);
            state.preset_name = Some(name.to_string());
            state.is_dirty = false;
            state.selected_variable = state.store.variable_names().next().map(str::to_string);

            tracing::info!(
                "Loaded preset {}: {} variables, {} queued",
                name,
                state.store.len(),
                state.store.queue().len()
            );
        })
    }

    /// Add an expression, creating the variable if it does not exist yet
    ///
    /// The first variable created in an empty selection becomes selected.
    pub fn define_variable(
        &self,
        name: &str,
        expression: &str,
    ) -> Result<Vec<StateChange>, StoreError> {
        self.try_update(|state| {
            let created = state.store.define(name, expression)?;
            state.is_dirty = true;

            if created && state.selected_variable.is_none() {
                state.selected_variable = Some(name.to_string());
            }
            Ok(())
        })
    }

    /// Remove a variable, clearing the selection if it was selected
    pub fn remove_variable(&self, name: &str) -> Result<Vec<StateChange>, StoreError> {
        self.try_update(|state| {
            state.store.remove_variable(name)?;
            state.is_dirty = true;

            if state.selected_variable.as_deref() == Some(name) {
                state.selected_variable = None;
            }
            Ok(())
        })
    }

    /// Append a variable name to the search queue
    pub fn enqueue(&self, name: &str) -> Vec<StateChange> {
        self.update(|state| {
            state.store.enqueue(name);
            state.is_dirty = true;
        })
    }

    /// Remove the search queue entry at `index`
    pub fn dequeue_at(&self, index: usize) -> Result<Vec<StateChange>, StoreError> {
        self.try_update(|state| {
            state.store.dequeue_at(index)?;
            state.is_dirty = true;
            Ok(())
        })
    }

    /// Replace the search queue
    pub fn reorder_queue(&self, order: Vec<String>) -> Vec<StateChange> {
        self.update(|state| {
            state.store.reorder_queue(order);
            state.is_dirty = true;
        })
    }

    pub fn set_template(&self, template: &str) -> Vec<StateChange> {
        self.update(|state| {
            state.template = template.to_string();
        })
    }

    /// Set the working directory and its listing
    pub fn set_directory(&self, directory: Utf8PathBuf, files: Vec<String>) -> Vec<StateChange> {
        self.update(|state| {
            state.directory = Some(directory);
            state.files = files;
        })
    }

    /// Select a variable for display; unknown names are ignored
    pub fn select_variable(&self, name: Option<&str>) -> Vec<StateChange> {
        self.update(|state| match name {
            Some(name) if !state.store.contains(name) => {
                tracing::debug!("Ignoring selection of unknown variable {}", name);
            }
            _ => state.selected_variable = name.map(str::to_string),
        })
    }

    /// Mark the active preset as saved
    pub fn mark_saved(&self) -> Vec<StateChange> {
        self.update(|state| {
            state.is_dirty = false;
        })
    }

    /// Start a rename run over `total_files` entries
    pub fn start_renaming(&self, total_files: usize) -> Vec<StateChange> {
        self.update(|state| {
            state.reset_rename_state();
            state.is_renaming = true;
            state.total_files = total_files;
        })
    }

    /// Stop the rename run
    pub fn stop_renaming(&self) -> Vec<StateChange> {
        self.update(|state| {
            state.is_renaming = false;
        })
    }

    /// Record the result of renaming one file
    pub fn add_file_result(&self, result: &RenameResult) -> Vec<StateChange> {
        let mut changes = self.update(|state| {
            state.add_result(result.from.clone(), result.status);
        });

        match result.status {
            RenameStatus::Renamed => self.metrics.record_file_renamed(),
            RenameStatus::Failed => self.metrics.record_file_failed(),
            RenameStatus::Skipped => self.metrics.record_file_skipped(),
        }

        let file_event = StateChange::FileProcessed {
            file: result.from.clone(),
            status: result.status,
            message: result.message.clone(),
        };
        self.emit(file_event.clone());
        changes.push(file_event);

        changes
    }

    /// Reset all rename run state
    pub fn reset_rename_state(&self) -> Vec<StateChange> {
        let mut changes = self.update(|state| {
            state.reset_rename_state();
        });

        let reset_event = StateChange::StateReset;
        self.emit(reset_event.clone());
        changes.push(reset_event);

        changes
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Clones share the same state, channel and metrics
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }
}
