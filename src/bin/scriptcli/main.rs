mod complete;

use std::process::ExitCode;

use scriptcli::host::HostGroup;
use scriptcli::loader::FsLoader;
use scriptcli::state::ResolutionState;

fn main() -> ExitCode {
    if let Err(e) = scriptcli::logger::init() {
        eprintln!("Unable to initialize logging: {e}");
    }

    let mut state = ResolutionState::default();
    let mut host = HostGroup::new(FsLoader::from_env());

    let result = match complete::request() {
        Some(request) => complete::run(&mut host, &mut state, &request),
        None => host
            .invoke(&mut state, std::env::args_os())
            .map(ExitCode::from),
    };
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
