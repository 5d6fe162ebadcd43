use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use gl_scripts::DEFAULT_CHARACTER_ID;

pub(crate) const DEFAULT_LESSON_ID: &str = "grade9-science";

#[derive(Debug, Parser)]
#[command(name = "gl-cli")]
#[command(about = "Guided science lessons in the terminal")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    /// Play one module interactively.
    Play(PlayArgs),
    /// List the registered modules.
    Modules,
    /// Check every registered script for authoring mistakes.
    Validate,
}

#[derive(Debug, Args)]
pub(crate) struct PlayArgs {
    #[arg(long = "module")]
    pub(crate) module: String,
    #[arg(long = "lesson", default_value = DEFAULT_LESSON_ID)]
    pub(crate) lesson: String,
    #[arg(long = "character", default_value = DEFAULT_CHARACTER_ID)]
    pub(crate) character: String,
    #[arg(long = "offline")]
    pub(crate) offline: bool,
    #[arg(long = "config")]
    pub(crate) config: Option<PathBuf>,
}
