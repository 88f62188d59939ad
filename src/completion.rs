//! Bash completion for the host command tree

use std::ffi::OsString;
use std::io;

use clap::Command;
use clap_complete::engine;

/// Set to `complete_bash` by the completion hook to request candidates
pub const COMPLETE_VAR: &str = "_SCRIPTCLI_COMPLETE";
pub const COMPLETE_BASH: &str = "complete_bash";

/// Shell hook printed by `--show-completion`
#[must_use]
pub fn bash_script(prog: &str) -> String {
    let func = format!("_{}_completion", prog.replace(['-', '.'], "_"));
    format!(
        r#"{func}() {{
    local IFS=$'\n'
    COMPREPLY=( $( env COMP_WORDS="${{COMP_WORDS[*]}}" \
                   COMP_CWORD=$COMP_CWORD \
                   {COMPLETE_VAR}={COMPLETE_BASH} $1 ) )
    return 0
}}

complete -o default -F {func} {prog}
"#
    )
}

/// Split `COMP_WORDS`/`COMP_CWORD` into the finished words after the
/// program name and the word being completed
#[must_use]
pub fn split_words(comp_words: &str, comp_cword: usize) -> (Vec<String>, String) {
    let words: Vec<String> = comp_words.lines().map(ToString::to_string).collect();
    let incomplete = words.get(comp_cword).cloned().unwrap_or_default();
    let args = words
        .iter()
        .take(comp_cword)
        .skip(1)
        .cloned()
        .collect();
    (args, incomplete)
}

/// Completion candidates with their help text.
///
/// `args` are the words already typed after the program name; `incomplete`
/// is the partial word under the cursor. Candidates come from clap's own
/// completion engine, so they cover subcommands, flags, `--opt=value`,
/// option and positional values, and paths relative to the current directory.
///
/// # Errors
///
/// Returns the I/O error raised while listing path candidates.
pub fn choices(
    command: &Command,
    args: &[String],
    incomplete: &str,
) -> io::Result<Vec<(String, String)>> {
    let mut command = command.clone();
    let mut words = Vec::with_capacity(args.len() + 2);
    words.push(OsString::from(command.get_name()));
    words.extend(args.iter().map(OsString::from));
    words.push(OsString::from(incomplete));
    let index = args.len() + 1;

    let current_dir = std::env::current_dir().ok();
    let candidates = engine::complete(&mut command, words, index, current_dir.as_deref())?;
    Ok(candidates
        .into_iter()
        .map(|c| {
            let help = c.get_help().map(ToString::to_string).unwrap_or_default();
            (c.get_value().to_string_lossy().into_owned(), help)
        })
        .collect())
}
