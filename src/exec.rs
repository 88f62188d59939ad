//! Running script functions selected through the `run` command

use std::collections::HashMap;
use std::ffi::OsString;
use std::process::Command as ProcessCommand;

use clap::ArgMatches;
use log::debug;
use thiserror::Error;

use crate::commands::app::CommandApp;
use crate::commands::function::{Function, ParamKind};

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("Unable to run command `{name}`: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("No such command: {0}")]
    UnknownCommand(String),
}

fn raw_value(matches: &ArgMatches, id: &str) -> Option<OsString> {
    let mut values = matches.try_get_raw(id).ok().flatten()?;
    let first = values.next()?.to_os_string();
    Some(first)
}

impl Function {
    /// Positional values, in declaration order
    fn positional_values(&self, matches: &ArgMatches) -> Vec<OsString> {
        self.params
            .iter()
            .filter(|p| p.kind == ParamKind::Argument)
            .filter_map(|p| raw_value(matches, &p.name))
            .collect()
    }

    /// Every parameter that has a value, flags as `true`/`false`
    fn param_env(&self, matches: &ArgMatches) -> HashMap<String, OsString> {
        self.params
            .iter()
            .filter_map(|p| {
                let value = if p.is_flag() {
                    let set = matches.try_get_one::<bool>(&p.name).ok().flatten().copied();
                    Some(OsString::from(set.unwrap_or(false).to_string()))
                } else {
                    raw_value(matches, &p.name)
                };
                value.map(|v| (p.name.clone(), v))
            })
            .collect()
    }

    /// Run `exec` through `sh -c`, returning the child's exit code.
    ///
    /// Positional arguments are passed as `$1..`, `$0` is the command name.
    ///
    /// # Errors
    ///
    /// Returns `ExecError::Spawn` if the shell cannot be started.
    pub fn execute(&self, matches: &ArgMatches) -> Result<u8, ExecError> {
        let mut process = ProcessCommand::new("sh");
        process
            .arg("-c")
            .arg(&self.exec)
            .arg(&self.name)
            .args(self.positional_values(matches))
            .envs(&self.env)
            .envs(self.param_env(matches));
        if let Some(cwd) = &self.cwd {
            process.current_dir(cwd);
        }
        debug!("Running `{}`: {}", self.name, self.exec);

        let status = process.status().map_err(|e| ExecError::Spawn {
            name: self.name.clone(),
            source: e,
        })?;
        debug!("Command `{}` finished with {status}", self.name);
        // Killed by a signal
        Ok(status
            .code()
            .map_or(1, |code| u8::try_from(code).unwrap_or(1)))
    }
}

impl CommandApp {
    /// Walk the parsed subcommands down to a function and run it.
    ///
    /// # Errors
    ///
    /// Returns `ExecError` if the matched command is unknown or fails to start.
    pub fn dispatch(&self, matches: &ArgMatches) -> Result<u8, ExecError> {
        if self.is_single_command() {
            return self.commands[0].execute(matches);
        }
        self.dispatch_group(matches)
    }

    fn dispatch_group(&self, matches: &ArgMatches) -> Result<u8, ExecError> {
        let Some((name, sub_matches)) = matches.subcommand() else {
            return Err(ExecError::UnknownCommand(
                self.name.clone().unwrap_or_default(),
            ));
        };
        if let Some(function) = self.find_command(name) {
            return function.execute(sub_matches);
        }
        // Nested groups never collapse into a single command
        match self.find_group(name) {
            Some(group) => group.dispatch_group(sub_matches),
            None => Err(ExecError::UnknownCommand(name.to_string())),
        }
    }
}
