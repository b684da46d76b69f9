// CLI Controller - Executes parsed commands against the session state
//
// This module contains the CliController which coordinates between:
// - Parsed commands (clap)
// - StateManager (session state and preview)
// - ConfigManager (settings and presets)
// - RenameService (planning and executing renames)
//
// Async work (directory listing, renames, Ctrl-C) runs on the tokio runtime through a
// Handle; the controller itself stays synchronous.

use crate::config::ConfigManager;
use crate::models::Settings;
use crate::services::{PlanStatus, RenamePlan, RenameService, RenameStatus, list_filenames};
use crate::state::StateManager;
use crate::store::StoreError;
use crate::ui::commands::{Command, PresetCommand, QueueCommand, TargetArgs, VarCommand};
use anyhow::{Context, Result, bail};
use std::io::Write;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;

/// Controller that runs one command per process
///
/// Every command first opens a preset (the `--preset` argument or the last one used).
/// Commands that edit variables or the queue save the preset afterwards; `preview` and
/// `apply` remember the preset and template in the settings file.
///
/// # Example
/// ```ignore
/// let runtime = tokio::runtime::Runtime::new()?;
/// let controller = CliController::new(
///     Arc::new(StateManager::new()),
///     ConfigManager::new("Pattermer Data")?,
///     settings,
///     runtime.handle().clone(),
/// );
/// controller.run(cli.command, cli.preset, &mut std::io::stdout())?;
/// ```
pub struct CliController {
    state_manager: Arc<StateManager>,
    config_manager: ConfigManager,
    settings: Settings,
    runtime: Handle,
    rename_service: RenameService,
}

impl CliController {
    /// Create a new CLI controller
    ///
    /// # Arguments
    /// * `state_manager` - Shared session state
    /// * `config_manager` - Settings and preset storage
    /// * `settings` - Settings already loaded (and overridden) by the caller
    /// * `runtime` - Handle of the runtime used for async work
    pub fn new(
        state_manager: Arc<StateManager>,
        config_manager: ConfigManager,
        settings: Settings,
        runtime: Handle,
    ) -> Self {
        Self {
            state_manager,
            config_manager,
            settings,
            runtime,
            rename_service: RenameService::new(),
        }
    }

    /// Run a command, writing its output to `out`
    ///
    /// Must not be called from inside the runtime, since it blocks on async work.
    pub fn run(mut self, command: Command, preset: Option<String>, out: &mut dyn Write) -> Result<()> {
        let preset_name = preset
            .clone()
            .unwrap_or_else(|| self.settings.preset_name().to_string());
        self.open_preset(&preset_name)?;

        tracing::debug!("Running {:?} with preset {}", command, preset_name);

        match command {
            Command::Preview {
                target,
                show_captures,
            } => {
                self.remember_target(preset, &target)?;
                self.preview(&target, show_captures, out)
            }
            Command::Apply { target, dry_run } => {
                self.remember_target(preset, &target)?;
                self.apply(&target, dry_run, out)
            }
            Command::Var(command) => self.run_var(command, out),
            Command::Queue(command) => self.run_queue(command, out),
            Command::Preset(command) => self.run_preset(command, out),
        }
    }

    fn open_preset(&self, name: &str) -> Result<()> {
        let preset = self
            .config_manager
            .load_preset(name)
            .with_context(|| format!("Failed to open preset {}", name))?;
        self.state_manager.load_preset(name, &preset);
        Ok(())
    }

    /// Save the active preset and mark the session clean
    fn save_session(&self) -> Result<()> {
        let (name, preset) = self.state_manager.read(|state| {
            let name = state
                .preset_name
                .clone()
                .unwrap_or_else(|| self.settings.preset_name().to_string());
            (name, state.store.to_preset())
        });

        self.config_manager.save_preset(&name, &preset)?;
        self.state_manager.mark_saved();
        Ok(())
    }

    /// Store the explicitly given preset and template as the new defaults
    fn remember_target(&mut self, preset: Option<String>, target: &TargetArgs) -> Result<()> {
        let mut settings = self.settings.clone();
        if preset.is_some() {
            settings.last_preset = preset;
        }
        if target.template.is_some() {
            settings.last_template = target.template.clone();
        }

        if settings != self.settings {
            self.config_manager.save_settings(&settings)?;
            self.settings = settings;
        }
        Ok(())
    }

    /// List the directory and set the template, which recomputes the preview
    fn load_target(&self, target: &TargetArgs) -> Result<()> {
        let template = target
            .template
            .clone()
            .or_else(|| self.settings.last_template.clone())
            .context("No rename template given; pass --template")?;
        if template.is_empty() {
            bail!("Rename template is empty");
        }

        let include_hidden = target.include_hidden || self.settings.include_hidden;
        let files = self
            .runtime
            .block_on(list_filenames(&target.directory, include_hidden))?;

        self.state_manager.set_template(&template);
        self.state_manager
            .set_directory(target.directory.clone(), files);
        Ok(())
    }

    fn preview(&self, target: &TargetArgs, show_captures: bool, out: &mut dyn Write) -> Result<()> {
        self.load_target(target)?;
        let state = self.state_manager.snapshot();

        if state.store.queue().is_empty() {
            writeln!(
                out,
                "The search queue is empty; add variables with `pattermer queue push <name>`"
            )?;
            return Ok(());
        }
        if state.files.is_empty() {
            writeln!(out, "No files in {}", target.directory)?;
            return Ok(());
        }

        let engine = show_captures.then(|| state.engine());
        let width = state
            .files
            .iter()
            .map(|f| f.chars().count())
            .max()
            .unwrap_or(0);

        for (old, new) in state.preview_pairs() {
            writeln!(out, "{:<width$}  ->  {}", old, new, width = width)?;

            if let Some(engine) = &engine {
                for (variable, value) in engine.extract(old).iter() {
                    writeln!(out, "    {} = {:?}", variable, value)?;
                }
            }
        }

        Ok(())
    }

    fn apply(&self, target: &TargetArgs, dry_run: bool, out: &mut dyn Write) -> Result<()> {
        self.load_target(target)?;
        let state = self.state_manager.snapshot();

        if state.store.queue().is_empty() {
            bail!("The search queue is empty; nothing to rename");
        }

        let plan = self
            .rename_service
            .plan(&target.directory, &state.files, &state.preview)?;
        print_plan(&plan, out)?;

        if dry_run {
            writeln!(
                out,
                "{} of {} files would be renamed",
                plan.ready_count(),
                plan.entries.len()
            )?;
            return Ok(());
        }
        if plan.ready_count() == 0 {
            writeln!(out, "Nothing to rename")?;
            return Ok(());
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let interrupt = self.runtime.spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, stopping after the current file");
                let _ = cancel_tx.send(true);
            }
        });

        self.state_manager.start_renaming(plan.entries.len());
        let state_manager = Arc::clone(&self.state_manager);
        let results = self.runtime.block_on(self.rename_service.execute(
            &plan,
            &cancel_rx,
            |result| {
                state_manager.add_file_result(result);
            },
        ));
        interrupt.abort();
        self.state_manager.stop_renaming();

        let count = |status: RenameStatus| results.iter().filter(|r| r.status == status).count();
        for result in results.iter().filter(|r| r.status == RenameStatus::Failed) {
            writeln!(out, "failed: {}: {}", result.from, result.message)?;
        }
        writeln!(
            out,
            "{} renamed, {} skipped, {} failed",
            count(RenameStatus::Renamed),
            count(RenameStatus::Skipped),
            count(RenameStatus::Failed)
        )?;

        let failed = count(RenameStatus::Failed);
        if failed > 0 {
            bail!("{} files could not be renamed", failed);
        }
        Ok(())
    }

    fn run_var(&self, command: VarCommand, out: &mut dyn Write) -> Result<()> {
        match command {
            VarCommand::Add { name, expression } => {
                let existed = self.state_manager.read(|s| s.store.contains(&name));
                self.state_manager.define_variable(&name, &expression)?;
                self.save_session()?;

                if existed {
                    writeln!(out, "Added expression to {}", name)?;
                } else {
                    writeln!(out, "Created variable {}", name)?;
                }
            }
            VarCommand::Remove { name } => {
                self.state_manager.remove_variable(&name)?;
                self.save_session()?;
                writeln!(out, "Removed variable {}", name)?;

                if self
                    .state_manager
                    .read(|s| s.store.queue().iter().any(|q| *q == name))
                {
                    writeln!(
                        out,
                        "{} is still queued and will substitute empty text",
                        name
                    )?;
                }
            }
            VarCommand::List => {
                let state = self.state_manager.snapshot();
                if state.store.is_empty() {
                    writeln!(out, "No variables defined")?;
                }
                for (name, expressions) in state.store.variables() {
                    let queued = state.store.queue().iter().any(|q| q == name);
                    writeln!(
                        out,
                        "{}{} ({} expressions)",
                        if queued { "* " } else { "  " },
                        name,
                        expressions.len()
                    )?;
                }
            }
            VarCommand::Show { name } => {
                if !self.state_manager.read(|s| s.store.contains(&name)) {
                    return Err(StoreError::UnknownVariable(name).into());
                }
                self.state_manager.select_variable(Some(&name));

                let expressions = self
                    .state_manager
                    .read(|s| s.selected_expressions().to_vec());
                for (i, expression) in expressions.iter().enumerate() {
                    writeln!(out, "{}. {}", i + 1, expression)?;
                }
            }
        }

        Ok(())
    }

    fn run_queue(&self, command: QueueCommand, out: &mut dyn Write) -> Result<()> {
        match command {
            QueueCommand::Show => {
                let state = self.state_manager.snapshot();
                if state.store.queue().is_empty() {
                    writeln!(out, "The search queue is empty")?;
                }
                for (i, name) in state.store.queue().iter().enumerate() {
                    let note = if state.store.contains(name) {
                        ""
                    } else {
                        " (undefined)"
                    };
                    writeln!(out, "{}. {}{}", i + 1, name, note)?;
                }
            }
            QueueCommand::Push { name } => {
                self.state_manager.enqueue(&name);
                self.save_session()?;

                if !self.state_manager.read(|s| s.store.contains(&name)) {
                    writeln!(
                        out,
                        "Queued {}, which is not defined yet and will substitute empty text",
                        name
                    )?;
                } else {
                    writeln!(out, "Queued {}", name)?;
                }
            }
            QueueCommand::Remove { position } => {
                let len = self.state_manager.read(|s| s.store.queue().len());
                if position == 0 || position > len {
                    bail!("Queue position {} is out of range (1-{})", position, len);
                }

                self.state_manager.dequeue_at(position - 1)?;
                self.save_session()?;
                writeln!(out, "Removed queue entry {}", position)?;
            }
            QueueCommand::Set { names } => {
                self.state_manager.reorder_queue(names);
                self.save_session()?;

                let queue = self.state_manager.read(|s| s.store.queue().join(", "));
                writeln!(out, "Queue: {}", queue)?;
            }
        }

        Ok(())
    }

    fn run_preset(&self, command: PresetCommand, out: &mut dyn Write) -> Result<()> {
        let active = self.state_manager.read(|s| s.preset_name.clone());

        match command {
            PresetCommand::List => {
                let presets = self.config_manager.list_presets()?;
                if presets.is_empty() {
                    writeln!(out, "No saved presets")?;
                }
                for name in presets {
                    let marker = if active.as_deref() == Some(name.as_str()) {
                        "* "
                    } else {
                        "  "
                    };
                    writeln!(out, "{}{}", marker, name)?;
                }
            }
            PresetCommand::Delete { name } => {
                if self.config_manager.delete_preset(&name)? {
                    writeln!(out, "Deleted preset {}", name)?;
                } else {
                    bail!("Preset {} does not exist", name);
                }
            }
        }

        Ok(())
    }
}

fn print_plan(plan: &RenamePlan, out: &mut dyn Write) -> Result<()> {
    for entry in &plan.entries {
        match entry.status {
            PlanStatus::Ready => writeln!(out, "{}  ->  {}", entry.from, entry.to)?,
            PlanStatus::Unchanged => {}
            _ => writeln!(
                out,
                "skip {}: {}",
                entry.from,
                entry.reason.as_deref().unwrap_or("not renamed")
            )?,
        }
    }
    Ok(())
}
