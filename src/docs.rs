//! Markdown documentation for a converted command tree

use std::path::{Path, PathBuf};

use clap::{Arg, Command};
use thiserror::Error;

use crate::commands::app::CommandApp;

/// Width of the one-line help shown in a group's command list
const SHORT_HELP_WIDTH: usize = 45;

#[derive(Error, Debug)]
pub enum DocsError {
    #[error("No application found")]
    NoApplication,
    #[error("Unable to write docs to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// First sentence of `help`, cut at a word boundary to fit `max_length`
#[must_use]
pub fn short_help(help: &str, max_length: usize) -> String {
    let words: Vec<&str> = help.split_whitespace().collect();
    let Some(last_index) = words.len().checked_sub(1) else {
        return String::new();
    };

    let mut total_length = 0;
    let mut cut = None;
    for (i, word) in words.iter().enumerate() {
        total_length += word.chars().count() + usize::from(i > 0);
        if total_length > max_length {
            cut = Some(i);
            break;
        }
        if word.ends_with('.') {
            return words[..=i].join(" ");
        }
        if total_length == max_length && i != last_index {
            cut = Some(i);
            break;
        }
    }
    let Some(mut i) = cut else {
        return words.join(" ");
    };

    // Drop words until the ellipsis fits
    total_length += 3;
    while i > 0 {
        total_length -= words[i].chars().count() + usize::from(i > 0);
        if total_length <= max_length {
            break;
        }
        i -= 1;
    }
    format!("{}...", words[..i].join(" "))
}

fn value_name(arg: &Arg) -> String {
    arg.get_value_names()
        .and_then(|names| names.first())
        .map_or_else(|| arg.get_id().as_str().to_uppercase(), ToString::to_string)
}

fn takes_value(arg: &Arg) -> bool {
    arg.get_action().takes_values()
}

fn usage_metavar(arg: &Arg) -> String {
    let name = value_name(arg);
    if arg.is_required_set() {
        name
    } else {
        format!("[{name}]")
    }
}

fn usage_pieces(command: &Command) -> Vec<String> {
    let mut pieces = Vec::new();
    if command.get_arguments().any(|a| !a.is_positional()) {
        pieces.push("[OPTIONS]".to_string());
    }
    pieces.extend(command.get_positionals().map(usage_metavar));
    if command.has_subcommands() {
        pieces.push("COMMAND [ARGS]...".to_string());
    }
    pieces
}

/// Help text followed by `[default: x; required]` when either applies
fn help_text(arg: &Arg) -> String {
    let mut extra = Vec::new();
    if takes_value(arg)
        && let Some(default) = arg.get_default_values().first()
    {
        extra.push(format!("default: {}", default.to_string_lossy()));
    }
    if arg.is_required_set() {
        extra.push("required".to_string());
    }

    let help = arg.get_help().map(ToString::to_string).unwrap_or_default();
    match (help.is_empty(), extra.is_empty()) {
        (_, true) => help,
        (true, false) => format!("[{}]", extra.join("; ")),
        (false, false) => format!("{help}  [{}]", extra.join("; ")),
    }
}

fn option_name(arg: &Arg) -> String {
    let mut opts = Vec::new();
    if let Some(short) = arg.get_short() {
        opts.push(format!("-{short}"));
    }
    if let Some(long) = arg.get_long() {
        opts.push(format!("--{long}"));
    }
    let mut name = opts.join(", ");
    if takes_value(arg) {
        name.push(' ');
        name.push_str(&value_name(arg));
    }
    name
}

fn push_records(docs: &mut String, title: &str, records: &[(String, String)]) {
    if records.is_empty() {
        return;
    }
    docs.push_str(&format!("**{title}**:\n\n"));
    for (name, help) in records {
        docs.push_str(&format!("* `{name}`"));
        if !help.is_empty() {
            docs.push_str(&format!(": {help}"));
        }
        docs.push('\n');
    }
    docs.push('\n');
}

fn render_command(command: &Command, name: &str, depth: usize, call_prefix: &str) -> String {
    let mut docs = "#".repeat(depth + 1);
    let mut command_name = if name.is_empty() {
        command.get_name().to_string()
    } else {
        name.to_string()
    };
    if !call_prefix.is_empty() {
        command_name = format!("{call_prefix} {command_name}");
    }
    if command_name.is_empty() {
        docs.push_str(" CLI\n\n");
    } else {
        docs.push_str(&format!(" `{command_name}`\n\n"));
    }

    if let Some(about) = command.get_about() {
        docs.push_str(&format!("{about}\n\n"));
    }

    let pieces = usage_pieces(command);
    if !pieces.is_empty() {
        docs.push_str("**Usage**:\n\n```console\n$ ");
        if !command_name.is_empty() {
            docs.push_str(&command_name);
            docs.push(' ');
        }
        docs.push_str(&pieces.join(" "));
        docs.push_str("\n```\n\n");
    }

    let visible = || command.get_arguments().filter(|a| !a.is_hide_set());
    let arguments: Vec<(String, String)> = visible()
        .filter(|a| a.is_positional())
        .map(|a| (usage_metavar(a), help_text(a)))
        .collect();
    let options: Vec<(String, String)> = visible()
        .filter(|a| !a.is_positional())
        .map(|a| (option_name(a), help_text(a)))
        .collect();
    push_records(&mut docs, "Arguments", &arguments);
    push_records(&mut docs, "Options", &options);

    if let Some(epilog) = command.get_after_help() {
        docs.push_str(&format!("{epilog}\n\n"));
    }

    let children: Vec<&Command> = command.get_subcommands().filter(|c| !c.is_hide_set()).collect();
    if !children.is_empty() {
        let records: Vec<(String, String)> = children
            .iter()
            .map(|child| {
                let about = child.get_about().map(ToString::to_string).unwrap_or_default();
                (child.get_name().to_string(), short_help(&about, SHORT_HELP_WIDTH))
            })
            .collect();
        push_records(&mut docs, "Commands", &records);
        for child in children {
            docs.push_str(&render_command(child, "", depth + 1, &command_name));
        }
    }
    docs
}

/// Render `command` and every subcommand below it as Markdown.
///
/// `name` replaces the root command's own name in headings and usage lines.
/// Each tree level gets one more `#`, children follow their parent in
/// listing order.
#[must_use]
pub fn render(command: &Command, name: &str) -> String {
    render_command(command, name, 0, "")
}

/// Docs for a discovered application, trimmed and ending in a single newline
#[must_use]
pub fn generate(app: &CommandApp, name: &str) -> String {
    let mut app = app.clone();
    app.add_completion = true;
    let docs = render(&app.to_command(), name);
    format!("{}\n", docs.trim())
}

/// Write the generated docs to `output`, or print them when not given.
///
/// # Errors
///
/// Returns `DocsError::NoApplication` if nothing was discovered, or
/// `DocsError::Write` if the output file cannot be written.
pub fn write_docs(
    app: Option<&CommandApp>,
    name: &str,
    output: Option<&Path>,
) -> Result<(), DocsError> {
    let app = app.ok_or(DocsError::NoApplication)?;
    let docs = generate(app, name);
    match output {
        Some(path) => {
            std::fs::write(path, docs).map_err(|e| DocsError::Write {
                path: path.to_path_buf(),
                source: e,
            })?;
            println!("Docs saved to: {}", path.display());
        }
        None => print!("{docs}"),
    }
    Ok(())
}
