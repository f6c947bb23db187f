use log::{Level, LevelFilter, Log, Metadata, Record};

/// Forwards `log` records from the game core to the browser console.
struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!("{}: {}", record.target(), record.args());
        match record.level() {
            Level::Error => gloo::console::error!(line),
            Level::Warn => gloo::console::warn!(line),
            Level::Info => gloo::console::info!(line),
            Level::Debug | Level::Trace => gloo::console::debug!(line),
        }
    }

    fn flush(&self) {}
}

pub(crate) fn level_from_env(raw: Option<&str>) -> LevelFilter {
    raw.and_then(|value| value.trim().parse().ok())
        .unwrap_or(LevelFilter::Info)
}

pub(crate) fn init() {
    let level = level_from_env(option_env!("ODD1OUT_LOG"));
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
