//! Host command line definition
//!
//! The fixed part of the interface is declared with clap's derive API and
//! composed into a builder `Command`, so the discovered application can be
//! attached as `run` at runtime.

use std::path::PathBuf;

use clap::{Args, Command, Subcommand};

pub const PATH_OR_MODULE: &str = "path_or_module";
pub const APP: &str = "app";
pub const FUNC: &str = "func";
pub const RUN: &str = "run";

#[derive(Args, Debug, Clone, Default)]
pub struct HostArgs {
    /// Script file or dotted module name to load commands from
    #[arg(value_name = "PATH_OR_MODULE")]
    pub path_or_module: Option<String>,

    /// Application binding to use
    #[arg(long)]
    pub app: Option<String>,

    /// Function binding to convert into a command line application
    #[arg(long)]
    pub func: Option<String>,

    /// Show the completion script for the current shell.
    #[arg(long)]
    pub show_completion: bool,
}

#[derive(Subcommand, Debug)]
pub enum HostCommand {
    /// Extra utilities for command scripts
    Utils {
        #[command(subcommand)]
        command: UtilsCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum UtilsCommand {
    /// Generate Markdown docs for the application
    Docs(DocsArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct DocsArgs {
    /// Name of the program to use in the docs
    #[arg(long, default_value = "")]
    pub name: String,

    /// Output file to write the docs to, stdout when omitted
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// The host command before any application is attached
#[must_use]
pub fn root_command() -> Command {
    let command = Command::new("scriptcli")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Run command scripts as command line applications")
        .disable_help_subcommand(true);
    let command = <HostArgs as Args>::augment_args(command);
    <HostCommand as Subcommand>::augment_subcommands(command)
}

/// Lenient copy of the root used to read the source arguments only.
///
/// Help, version and unknown subcommands never stop it.
#[must_use]
pub fn preflight_command(root: &Command) -> Command {
    root.clone()
        .ignore_errors(true)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .allow_external_subcommands(true)
}
