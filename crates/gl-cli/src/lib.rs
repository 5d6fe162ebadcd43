use std::ffi::OsString;

use clap::Parser;
use gl_core::LessonError;
use gl_scripts::ScriptRegistry;

mod catalog;
mod cli_args;
mod error_map;
mod logging;
mod play;
mod printer;

pub(crate) use catalog::{run_modules, run_validate};
pub(crate) use cli_args::{Cli, Mode, PlayArgs};
pub(crate) use error_map::{emit_error, map_cli_io, map_cli_runtime};
pub(crate) use logging::init_tracing;
pub(crate) use play::run_play;
#[cfg(test)]
pub(crate) use play::{handle_line_cmd, LineAction, PlaySession, HELP_LINE};
pub(crate) use printer::print_transcript;

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => return error.exit_code(),
    };
    init_tracing();
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, LessonError> {
    match cli.command {
        Mode::Play(args) => run_play(args),
        Mode::Modules => run_modules(&ScriptRegistry::builtin(), &mut std::io::stdout()),
        Mode::Validate => run_validate(&ScriptRegistry::builtin(), &mut std::io::stdout()),
    }
}

#[cfg(test)]
mod tests;
