//! Conversion of script applications into clap command trees

use std::path::PathBuf;

use clap::builder::PossibleValuesParser;
use clap::{Arg, ArgAction, Command, value_parser};

use crate::commands::app::CommandApp;
use crate::commands::function::{Function, Param, ParamKind, ParamType};

pub const SHOW_COMPLETION: &str = "show_completion";
pub const HELP: &str = "help";

fn help_arg() -> Arg {
    Arg::new(HELP)
        .long("help")
        .action(ArgAction::Help)
        .help("Show this message and exit.")
}

fn completion_arg() -> Arg {
    Arg::new(SHOW_COMPLETION)
        .long("show-completion")
        .action(ArgAction::SetTrue)
        .help("Show the completion script for the current shell.")
}

impl Param {
    #[must_use]
    pub fn to_arg(&self) -> Arg {
        let mut arg = Arg::new(self.name.clone());
        arg = match self.kind {
            ParamKind::Argument => arg.required(self.default.is_none()),
            ParamKind::Option => {
                let arg = arg.long(self.flag_name()).required(self.required);
                match self.short {
                    Some(short) => arg.short(short),
                    None => arg,
                }
            }
        };
        if self.is_flag() {
            arg = arg.action(ArgAction::SetTrue);
        } else {
            arg = arg.action(ArgAction::Set).value_name(self.value_name());
            arg = if self.choices.is_empty() {
                match self.ty {
                    ParamType::Int => arg.value_parser(value_parser!(i64)),
                    ParamType::Float => arg.value_parser(value_parser!(f64)),
                    ParamType::Path => arg.value_parser(value_parser!(PathBuf)),
                    ParamType::Bool => arg.value_parser(value_parser!(bool)),
                    ParamType::Str => arg.value_parser(value_parser!(String)),
                }
            } else {
                arg.value_parser(PossibleValuesParser::new(self.choices.clone()))
            };
            if let Some(default) = &self.default {
                arg = arg.default_value(default.clone());
            }
        }
        if let Some(help) = &self.help {
            arg = arg.help(help.clone());
        }
        arg
    }
}

impl Function {
    /// Build a leaf command from this function's parameters
    #[must_use]
    pub fn to_command(&self) -> Command {
        let mut command = Command::new(self.name.clone()).disable_help_flag(true);
        if let Some(help) = &self.help {
            command = command.about(help.clone());
        }
        if let Some(epilog) = &self.epilog {
            command = command.after_help(epilog.clone());
        }
        for param in &self.params {
            command = command.arg(param.to_arg());
        }
        command
    }
}

impl CommandApp {
    /// Convert into a dispatchable clap command.
    ///
    /// A lone command without groups becomes that command itself, anything
    /// else becomes a group with one subcommand per command and group.
    #[must_use]
    pub fn to_command(&self) -> Command {
        let mut command = if self.is_single_command() {
            let mut command = self.commands[0].to_command();
            if command.get_about().is_none()
                && let Some(help) = &self.help
            {
                command = command.about(help.clone());
            }
            command
        } else {
            self.to_group()
        };
        if self.add_completion {
            command = command.arg(completion_arg());
        }
        command.arg(help_arg())
    }

    fn to_group(&self) -> Command {
        let mut command = Command::new(self.name.clone().unwrap_or_default())
            .disable_help_flag(true)
            .disable_help_subcommand(true)
            .subcommand_required(true);
        if let Some(help) = &self.help {
            command = command.about(help.clone());
        }
        if let Some(epilog) = &self.epilog {
            command = command.after_help(epilog.clone());
        }
        for function in &self.commands {
            command = command.subcommand(function.to_command().arg(help_arg()));
        }
        for group in &self.groups {
            command = command.subcommand(group.to_group().arg(help_arg()));
        }
        command
    }
}
