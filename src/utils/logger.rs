use colored::{Color, Colorize};
use env_logger::Builder;
use log::{Level, LevelFilter};
use std::io::Write;

/// Install the CLI logger: this crate at info (debug when `verbose`), dependencies at warn.
/// `RUST_LOG` still applies on top.
pub fn setup_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // try_init: a second call (tests, repeated handlers) keeps the first logger.
    let _ = Builder::from_default_env()
        .filter_level(LevelFilter::Warn)
        .filter_module(env!("CARGO_PKG_NAME"), level)
        .format(|buf, record| {
            let name = env!("CARGO_PKG_NAME").cyan();
            let line = match record.level() {
                Level::Error => format!("[{} {}] {}", name, "ERROR".red(), record.args()),
                Level::Warn => format!("[{} {}] {}", name, "WARN".yellow(), record.args()),
                Level::Info => format!("[{}] {}", name, record.args()),
                // Worker and pipeline chatter: keep the module so threads can be told apart.
                Level::Debug | Level::Trace => format!(
                    "[{} {}] {}",
                    name,
                    record.target().dimmed(),
                    record.args().to_string().dimmed()
                ),
            };
            writeln!(buf, "{}", line)
        })
        .try_init();
}

/// Colors for the batch summary line.
pub struct Colors;

impl Colors {
    pub const STORED: Color = Color::Green;
    pub const SKIPPED: Color = Color::BrightBlack;
    pub const FAILED: Color = Color::Red;

    pub fn colorize(color: Color, text: &str) -> String {
        text.color(color).to_string()
    }
}
