// Command line definitions
//
// Parsed with clap derive; executed by CliController.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Default configuration directory, relative to the working directory
pub const DEFAULT_CONFIG_DIR: &str = "Pattermer Data";

#[derive(Parser, Debug)]
#[command(name = "pattermer")]
#[command(version, about = "Batch rename files with ordered regular-expression variables")]
pub struct Cli {
    /// Directory holding settings and presets
    #[arg(long, global = true, env = "PATTERMER_CONFIG_DIR", default_value = DEFAULT_CONFIG_DIR)]
    pub config_dir: Utf8PathBuf,

    /// Preset to use (defaults to the last one used)
    #[arg(short, long, global = true)]
    pub preset: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the new name of every file in a directory
    Preview {
        #[command(flatten)]
        target: TargetArgs,

        /// Also print what each variable captured
        #[arg(long)]
        show_captures: bool,
    },

    /// Rename the files in a directory
    Apply {
        #[command(flatten)]
        target: TargetArgs,

        /// Print the plan without renaming anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Manage variables and their expressions
    #[command(subcommand)]
    Var(VarCommand),

    /// Manage the search queue
    #[command(subcommand)]
    Queue(QueueCommand),

    /// Manage saved presets
    #[command(subcommand)]
    Preset(PresetCommand),
}

/// Directory and template shared by `preview` and `apply`
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Directory whose files are renamed
    pub directory: Utf8PathBuf,

    /// Rename template with %variable% placeholders (defaults to the last one used)
    #[arg(short, long)]
    pub template: Option<String>,

    /// Include dotfiles
    #[arg(long)]
    pub include_hidden: bool,
}

#[derive(Subcommand, Debug)]
pub enum VarCommand {
    /// Add an expression, creating the variable if it does not exist
    Add {
        name: String,
        expression: String,
    },

    /// Remove a variable and all of its expressions
    Remove { name: String },

    /// List variables
    List,

    /// Show the expressions of one variable
    Show { name: String },
}

#[derive(Subcommand, Debug)]
pub enum QueueCommand {
    /// Print the search queue
    Show,

    /// Append a variable to the queue
    Push { name: String },

    /// Remove the entry at a 1-based position
    Remove { position: usize },

    /// Replace the queue with the given variables, in order
    Set {
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum PresetCommand {
    /// List saved presets
    List,

    /// Delete a saved preset
    Delete { name: String },
}
