use std::path::{Path, PathBuf};

use scriptcli::discover::DiscoverError;
use scriptcli::host::{HostError, HostGroup, RunSlot};
use scriptcli::loader::FsLoader;
use scriptcli::script_file::LoadError;
use scriptcli::state::{ResolutionState, ResolveError};

fn write_script(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn invoke(path: &Path, args: &[&str]) -> (HostGroup, ResolutionState, Result<u8, HostError>) {
    let mut host = HostGroup::new(FsLoader::default());
    let mut state = ResolutionState::default();
    let mut argv = vec!["scriptcli".to_string(), path.to_string_lossy().into_owned()];
    argv.extend(args.iter().map(ToString::to_string));
    let result = host.invoke(&mut state, argv);
    (host, state, result)
}

fn attach(path: &Path) -> (HostGroup, ResolutionState) {
    let mut host = HostGroup::new(FsLoader::default());
    let mut state = ResolutionState::default();
    state.update(path.to_str(), None, None).unwrap();
    host.ensure_run(&state).unwrap();
    (host, state)
}

#[test]
fn test_single_function_becomes_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(
        dir.path(),
        "greet.yaml",
        r#"
greet:
  help: Say hello.
  params:
    - name: name
  exec: echo "hello $1"
"#,
    );
    let (mut host, state) = attach(&path);
    let RunSlot::Attached(app) = host.run_slot() else {
        panic!("run should be attached");
    };
    assert_eq!(app.commands.len(), 1);
    assert_eq!(app.commands[0].name, "greet");

    let run = host.get_command(&state, "run").unwrap().unwrap();
    assert!(!run.has_subcommands());
    let name = run
        .get_arguments()
        .find(|a| a.get_id().as_str() == "name")
        .unwrap();
    assert!(name.is_positional());
    assert!(name.is_required_set());
    assert_eq!(run.get_positionals().count(), 1);
}

#[test]
fn test_app_wins_over_main() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(
        dir.path(),
        "tools.yaml",
        r"
build:
  exec: echo build
deploy:
  exec: echo deploy
main:
  exec: echo main
app:
  help: Project tools.
  commands: [build, deploy]
",
    );
    let (mut host, state) = attach(&path);
    let run = host.get_command(&state, "run").unwrap().unwrap();
    let names: Vec<&str> = run.get_subcommands().map(clap::Command::get_name).collect();
    assert_eq!(names, vec!["build", "deploy"]);
    assert_eq!(
        run.get_about().map(ToString::to_string).as_deref(),
        Some("Project tools.")
    );
}

#[test]
fn test_nothing_callable_has_no_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(dir.path(), "consts.yaml", "version: 3\nname: tools\n");

    let (host, state, result) = invoke(&path, &["run"]);
    assert_eq!(result.unwrap(), 2);
    assert_eq!(*host.run_slot(), RunSlot::Missing);
    assert_eq!(state.source_path(), Some(path.as_path()));
    assert!(host.command().find_subcommand("run").is_none());
}

#[test]
fn test_docs_written_with_single_trailing_newline() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(
        dir.path(),
        "tools.yaml",
        r"
greet:
  help: Say hello.
  epilog: 'Trailing whitespace   '
  params:
    - name: name
  exec: echo hi
",
    );
    let output = dir.path().join("README.md");
    let output_arg = output.to_string_lossy().into_owned();
    let (_, _, result) = invoke(
        &path,
        &["utils", "docs", "--name", "greet", "--output", &output_arg],
    );
    assert_eq!(result.unwrap(), 0);

    let docs = std::fs::read_to_string(&output).unwrap();
    assert!(docs.starts_with("# `greet`\n"));
    let tail: Vec<char> = docs.chars().rev().take(2).collect();
    assert_eq!(tail[0], '\n');
    assert!(!tail[1].is_whitespace());
}

#[test]
fn test_run_executes_nested_command() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("work")).unwrap();
    let path = write_script(
        dir.path(),
        "tools.yaml",
        r#"
app:
  cwd: work
  env:
    TARGET: staging
  commands:
    - name: status
      exec: "true"
  groups:
    - name: db
      commands:
        - name: migrate
          params:
            - name: steps
              type: int
              default: 1
          exec: echo "$TARGET $steps" > migrated.txt
"#,
    );
    let (_, _, result) = invoke(&path, &["run", "db", "migrate", "--steps", "4"]);
    assert_eq!(result.unwrap(), 0);
    let marker = std::fs::read_to_string(dir.path().join("work/migrated.txt")).unwrap();
    assert_eq!(marker.trim(), "staging 4");
}

#[test]
fn test_run_returns_command_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(dir.path(), "tools.yaml", "main:\n  exec: exit 3\n");
    let (_, _, result) = invoke(&path, &["run"]);
    assert_eq!(result.unwrap(), 3);
}

#[test]
fn test_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(
        dir.path(),
        "tools.yaml",
        r"
hello:
  exec: echo hello
other:
  commands: [hello]
count: 3
",
    );

    let (_, _, result) = invoke(&path, &["--func", "count", "run"]);
    match result {
        Err(HostError::Discover(DiscoverError::NotCallable(name))) => assert_eq!(name, "count"),
        other => panic!("Expected NotCallable, got: {other:?}"),
    }

    let (_, _, result) = invoke(&path, &["--app", "hello", "run"]);
    match result {
        Err(HostError::Discover(DiscoverError::NotAnApp(name))) => assert_eq!(name, "hello"),
        other => panic!("Expected NotAnApp, got: {other:?}"),
    }

    let (host, _, result) = invoke(&path, &["--func", "hello", "run"]);
    assert_eq!(result.unwrap(), 0);
    let RunSlot::Attached(app) = host.run_slot() else {
        panic!("run should be attached");
    };
    assert_eq!(app.commands[0].name, "hello");
    assert_eq!(app.name, None);
}

#[test]
fn test_invalid_source() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.yaml");
    let (host, _, result) = invoke(&missing, &["run"]);
    match result {
        Err(HostError::Resolve(ResolveError::InvalidSource(source))) => {
            assert_eq!(source, missing.to_string_lossy());
        }
        other => panic!("Expected InvalidSource, got: {other:?}"),
    }
    assert_eq!(*host.run_slot(), RunSlot::Pending);
}

#[test]
fn test_broken_script_is_import_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(dir.path(), "broken.yaml", "greet: [unclosed\n");
    let (host, _, result) = invoke(&path, &["run"]);
    assert!(matches!(result, Err(HostError::Load(LoadError::Yaml { .. }))));
    assert!(host.command().find_subcommand("run").is_none());
}

#[test]
fn test_help_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(dir.path(), "tools.yaml", "main:\n  exec: echo hi\n");
    let (_, _, result) = invoke(&path, &["run", "--help"]);
    assert_eq!(result.unwrap(), 0);
}

#[test]
fn test_clashing_flags_are_import_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(
        dir.path(),
        "tools.yaml",
        r"
greet:
  params:
    - name: dry_run
      type: bool
    - name: Dry_run
      type: bool
  exec: 'true'
",
    );
    let (host, _, result) = invoke(&path, &["run"]);
    assert!(matches!(result, Err(HostError::Load(LoadError::Invalid { .. }))));
    assert_eq!(*host.run_slot(), RunSlot::Pending);
    assert!(host.command().find_subcommand("run").is_none());
}

#[test]
fn test_empty_application_is_import_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(dir.path(), "tools.yaml", "app:\n  commands: []\n");
    let (host, _, result) = invoke(&path, &["utils", "docs"]);
    assert!(matches!(result, Err(HostError::Load(LoadError::Invalid { .. }))));
    assert!(host.command().find_subcommand("run").is_none());
}
