//! The host command group and lazy attachment of the discovered `run` command
//!
//! The host's own interface (source argument, overrides, `utils`) is fixed.
//! The discovered application only becomes the `run` subcommand once the
//! source has been resolved, which happens on the first operation that needs
//! the command table: listing, lookup, invocation or completion.

use std::ffi::OsString;

use clap::error::ErrorKind;
use clap::{ArgMatches, Command, FromArgMatches};
use log::{debug, info};
use thiserror::Error;

use crate::cli::{self, APP, FUNC, HostArgs, HostCommand, PATH_OR_MODULE, RUN, UtilsCommand};
use crate::commands::app::CommandApp;
use crate::completion;
use crate::discover::DiscoverError;
use crate::docs::{self, DocsError};
use crate::exec::ExecError;
use crate::loader::{FsLoader, SourceLoader};
use crate::script_file::LoadError;
use crate::state::{ResolutionState, ResolveError};

const RUN_ABOUT: &str = "Run the provided application.";

#[derive(Error, Debug)]
pub enum HostError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Discover(#[from] DiscoverError),
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error(transparent)]
    Docs(#[from] DocsError),
    #[error(transparent)]
    Parse(#[from] clap::Error),
    #[error("Unable to complete: {0}")]
    Complete(#[from] std::io::Error),
}

/// What lazy augmentation decided about the `run` command
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RunSlot {
    /// Not resolved yet, the next operation with a source loads the script
    #[default]
    Pending,
    /// `run` is in the command table, backed by this application
    Attached(CommandApp),
    /// The script had nothing to expose, `run` stays absent
    Missing,
}

/// The root command group, extended on demand with `run`
pub struct HostGroup<L: SourceLoader = FsLoader> {
    command: Command,
    run: RunSlot,
    loader: L,
}

impl<L: SourceLoader> HostGroup<L> {
    #[must_use]
    pub fn new(loader: L) -> Self {
        HostGroup {
            command: cli::root_command(),
            run: RunSlot::Pending,
            loader,
        }
    }

    #[must_use]
    pub fn command(&self) -> &Command {
        &self.command
    }

    #[must_use]
    pub fn run_slot(&self) -> &RunSlot {
        &self.run
    }

    #[must_use]
    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Load and discover the application once, attaching it as `run`.
    ///
    /// Does nothing once `run` is attached or known to be missing, and
    /// nothing while no source has been resolved.
    ///
    /// # Errors
    ///
    /// Returns `HostError` if loading or discovery fails; the command table
    /// is left unchanged and a later call retries.
    pub fn ensure_run(&mut self, state: &ResolutionState) -> Result<(), HostError> {
        if self.run != RunSlot::Pending || !state.has_source() {
            return Ok(());
        }

        let Some(mut app) = crate::load_app(&self.loader, state)? else {
            debug!("Nothing to attach as `{RUN}`");
            self.run = RunSlot::Missing;
            return Ok(());
        };

        app.add_completion = false;
        let mut run = app.to_command().name(RUN);
        if run.get_about().is_none() {
            run = run.about(RUN_ABOUT);
        }
        self.command = std::mem::take(&mut self.command).subcommand(run);
        info!("Attached `{RUN}` with {} commands", app.all_commands().len());
        self.run = RunSlot::Attached(app);
        Ok(())
    }

    /// Update `state` from the root arguments alone, ignoring everything a
    /// full parse would reject.
    fn resolve_root(
        &self,
        state: &mut ResolutionState,
        args: &[OsString],
    ) -> Result<(), HostError> {
        let Ok(matches) = cli::preflight_command(&self.command).try_get_matches_from(args) else {
            return Ok(());
        };
        state.update(
            string_arg(&matches, PATH_OR_MODULE),
            string_arg(&matches, APP),
            string_arg(&matches, FUNC),
        )?;
        Ok(())
    }

    /// Names of the available subcommands, sorted.
    ///
    /// # Errors
    ///
    /// Returns `HostError` if lazy augmentation fails.
    pub fn list_commands(&mut self, state: &ResolutionState) -> Result<Vec<String>, HostError> {
        self.ensure_run(state)?;
        let mut names: Vec<String> = self
            .command
            .get_subcommands()
            .map(|c| c.get_name().to_string())
            .collect();
        names.sort();
        Ok(names)
    }

    /// Look up a subcommand by name.
    ///
    /// # Errors
    ///
    /// Returns `HostError` if lazy augmentation fails.
    pub fn get_command(
        &mut self,
        state: &ResolutionState,
        name: &str,
    ) -> Result<Option<&Command>, HostError> {
        self.ensure_run(state)?;
        Ok(self.command.find_subcommand(name))
    }

    /// Completion candidates for the words typed after the program name.
    ///
    /// # Errors
    ///
    /// Returns `HostError` if the source is invalid, lazy augmentation fails
    /// or path candidates cannot be listed.
    pub fn get_choices(
        &mut self,
        state: &mut ResolutionState,
        args: &[String],
        incomplete: &str,
    ) -> Result<Vec<(String, String)>, HostError> {
        let mut argv = vec![OsString::from(self.command.get_name())];
        argv.extend(args.iter().map(OsString::from));
        self.resolve_root(state, &argv)?;
        self.ensure_run(state)?;
        Ok(completion::choices(&self.command, args, incomplete)?)
    }

    /// Parse `args` (program name first) and run the selected command.
    ///
    /// Usage errors, help and version output are printed by clap and turned
    /// into clap's exit code.
    ///
    /// # Errors
    ///
    /// Returns `HostError` for an invalid source, a failed load or discovery,
    /// a failed docs write, or a command that cannot be started.
    pub fn invoke<I, T>(&mut self, state: &mut ResolutionState, args: I) -> Result<u8, HostError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        self.resolve_root(state, &args)?;
        self.ensure_run(state)?;

        let matches = match self.command.try_get_matches_from_mut(&args) {
            Ok(matches) => matches,
            Err(e) => return Ok(print_clap_error(&e)),
        };
        let host_args = HostArgs::from_arg_matches(&matches)?;
        if host_args.show_completion {
            print!("{}", completion::bash_script(self.command.get_name()));
            return Ok(0);
        }
        self.dispatch(&matches)
    }

    fn dispatch(&mut self, matches: &ArgMatches) -> Result<u8, HostError> {
        match matches.subcommand() {
            Some((RUN, run_matches)) => match &self.run {
                RunSlot::Attached(app) => Ok(app.dispatch(run_matches)?),
                _ => Err(ExecError::UnknownCommand(RUN.to_string()).into()),
            },
            Some(_) => match HostCommand::from_arg_matches(matches)? {
                HostCommand::Utils {
                    command: UtilsCommand::Docs(args),
                } => {
                    let app = match &self.run {
                        RunSlot::Attached(app) => Some(app),
                        _ => None,
                    };
                    docs::write_docs(app, &args.name, args.output.as_deref())?;
                    Ok(0)
                }
            },
            None => {
                let e = self
                    .command
                    .error(ErrorKind::MissingSubcommand, "Missing command.");
                Ok(print_clap_error(&e))
            }
        }
    }
}

fn string_arg<'a>(matches: &'a ArgMatches, id: &str) -> Option<&'a str> {
    matches
        .try_get_one::<String>(id)
        .ok()
        .flatten()
        .map(String::as_str)
}

fn print_clap_error(e: &clap::Error) -> u8 {
    let _ = e.print();
    u8::try_from(e.exit_code()).unwrap_or(2)
}
