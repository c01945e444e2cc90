//! Logging for padforge.
//!
//! The binary calls `initialize()` exactly once during startup. All
//! messages go to stderr, since stdout carries the compiled VDF. When
//! `RUST_LOG` is set, `env_logger` takes over instead.

use std::io::{self, LineWriter, Stderr, Write};
use std::sync::Mutex;

use log::{self, Level};

use crate::cli::Options;

pub fn initialize(options: &Options) -> Result<(), log::SetLoggerError> {
    log::set_max_level(options.log_level());

    if std::env::var_os("RUST_LOG").is_some() {
        env_logger::try_init()
    } else {
        log::set_boxed_logger(Box::new(Logger::new()))
    }
}

struct Logger {
    stderr: Mutex<LineWriter<Stderr>>,
}

impl Logger {
    fn new() -> Self {
        Logger { stderr: Mutex::new(LineWriter::new(io::stderr())) }
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) || !record.target().starts_with("padforge") {
            return;
        }

        let message = if record.level() >= Level::Trace {
            format!(
                "[{}] [{}:{}] {}\n",
                record.level(),
                record.file().unwrap_or("?"),
                record.line().map(|l| l.to_string()).unwrap_or_else(|| "?".into()),
                record.args()
            )
        } else {
            format!("[{}] {}\n", record.level(), record.args())
        };

        if let Ok(ref mut stderr) = self.stderr.lock() {
            let _ = stderr.write_all(message.as_bytes());
        }
    }

    fn flush(&self) {
        if let Ok(ref mut stderr) = self.stderr.lock() {
            let _ = stderr.flush();
        }
    }
}
