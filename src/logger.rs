use std::io::Write;
use std::path::Path;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use parking_lot::Mutex;

/// Environment variable naming a file that receives a copy of every log line
pub const LOG_FILE_ENV: &str = "SCRIPTCLI_LOG_FILE";

struct ScriptcliLogger {
    file: Option<Mutex<std::fs::File>>,
    filter: LevelFilter,
    start: Instant,
}

impl Log for ScriptcliLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.filter
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        // stderr only, stdout belongs to the script and generated docs
        eprintln!("[{} {}] {}", record.level(), record.target(), record.args());

        if let Some(ref file) = self.file {
            let elapsed = Instant::now().duration_since(self.start).as_secs_f64();
            let _ = writeln!(
                file.lock(),
                "[{elapsed:.3}s] [{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        if let Some(ref file) = self.file {
            let _ = file.lock().flush();
        }
    }
}

/// Parse `RUST_LOG`, falling back to warnings only
fn level_filter(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(LevelFilter::Warn)
}

fn open_log_file(path: &Path) -> Option<std::fs::File> {
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .inspect_err(|e| eprintln!("Unable to open log file {}: {e}", path.display()))
        .ok()
}

/// Initialize the global logger from `RUST_LOG` and `SCRIPTCLI_LOG_FILE`.
///
/// # Errors
///
/// Returns `SetLoggerError` if a logger was already installed.
pub fn init() -> Result<(), SetLoggerError> {
    let filter = level_filter(std::env::var("RUST_LOG").ok().as_deref());
    let file = std::env::var_os(LOG_FILE_ENV)
        .filter(|p| !p.is_empty())
        .and_then(|p| open_log_file(Path::new(&p)));

    let logger = ScriptcliLogger {
        file: file.map(Mutex::new),
        filter,
        start: Instant::now(),
    };

    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(filter);
    Ok(())
}
