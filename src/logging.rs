use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;
use tracing::Level;
use tracing::warn;

use crate::schema::Flags;

/// Level requested by `--debug` / `--debug-file`.
pub(crate) fn level(flags: &Flags) -> Level {
    if flags.debug() || flags.debug_file().is_some() {
        Level::DEBUG
    } else {
        Level::WARN
    }
}

/// Install the global subscriber. Stdout carries the protocol, so logs go to
/// stderr or to the debug file. A subscriber that is already installed wins.
pub(crate) fn init(flags: &Flags) {
    let level = level(flags);
    if let Some(path) = flags.debug_file() {
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(fs) => {
                let _ = tracing_subscriber::fmt()
                    .with_max_level(level)
                    .with_ansi(false)
                    .with_writer(Mutex::new(fs))
                    .try_init();
                return;
            }
            Err(e) => {
                init_stderr(level);
                warn!("unable to open debug file {}: {}", path.display(), e);
                return;
            }
        }
    }
    init_stderr(level);
}

fn init_stderr(level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .try_init();
}
