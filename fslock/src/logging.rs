//! A logging module that prints lock diagnostics with color coding.
//!
//! The locks themselves only talk to the `log` facade. This module provides
//! `LockLogger`, which writes records to stderr colored by severity using ANSI
//! escape codes, for hosts that do not install a logger of their own.

use core::fmt;

use log::{self, Level, LevelFilter, Log, Metadata, Record};
use spin::Once;

static LOGGER_INIT: Once = Once::new();

/// # Initialization
/// Installs `LockLogger` with a level taken from the `LOG` environment
/// variable at build time:
/// - "ERROR" -> `LevelFilter::Error`
/// - "WARN" -> `LevelFilter::Warn`
/// - "INFO" -> `LevelFilter::Info`
/// - "DEBUG" -> `LevelFilter::Trace`
/// - Any other value -> `LevelFilter::Off`
///
/// Safe to call any number of times. If another logger was installed first,
/// that one is kept.
pub fn init() {
    LOGGER_INIT.call_once(|| {
        static LOGGER: LockLogger = LockLogger;
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(match option_env!("LOG") {
                Some("ERROR") => LevelFilter::Error,
                Some("WARN") => LevelFilter::Warn,
                Some("INFO") => LevelFilter::Info,
                Some("DEBUG") => LevelFilter::Trace,
                _ => LevelFilter::Off,
            });
        }
    });
}

struct LockLogger;

impl Log for LockLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let thread = std::thread::current();
        print_in_color(
            format_args!(
                "[FSLOCK][{:>5}][{}] {}",
                record.level(),
                thread.name().unwrap_or("-"),
                record.args()
            ),
            level_to_color_code(record.level()),
        );
    }

    fn flush(&self) {}
}

/// Adds escape sequences to the formatted string to print with a specific color.
macro_rules! with_color {
    ($args: ident, $color_code: ident) => {{
        format_args!("\u{1B}[{}m{}\u{1B}[0m", $color_code as u8, $args)
    }};
}

fn print_in_color(args: fmt::Arguments, color_code: u8) {
    eprintln!("{}", with_color!(args, color_code));
}

/// Converts a log level to the corresponding ANSI color code.
///
/// - `Level::Error` -> Red (31)
/// - `Level::Warn` -> Bright Yellow (93)
/// - `Level::Info` -> Blue (34)
/// - `Level::Debug` -> Green (32)
/// - `Level::Trace` -> Bright Black (90)
fn level_to_color_code(level: Level) -> u8 {
    match level {
        Level::Error => 31, // Red
        Level::Warn => 93,  // BrightYellow
        Level::Info => 34,  // Blue
        Level::Debug => 32, // Green
        Level::Trace => 90, // BrightBlack
    }
}
