// UI module - command line front end
//
// This module contains:
// - Cli: clap definitions of the commands and global options
// - CliController: runs a parsed command against state, config and services

pub mod commands;
pub mod controller;

pub use commands::{Cli, Command};
pub use controller::CliController;
