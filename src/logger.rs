//! Leveled terminal logging with colored module prefixes.
//!
//! A [`Logger`] is built once in `main` with a minimum [`Level`] and handed to
//! every component that reports progress. Nothing here is global.
//!
//! # Example
//!
//! ```ignore
//! let logger = Logger::new(Level::Info, None);
//! log!(logger, Info, "latex"; "Running {}...", "pdflatex");
//! log!(logger, Error, "error"; "! See \"{}.log\" for details.", name);
//! ```

use crate::notify::Notifier;
use colored::{ColoredString, Colorize};
use crossterm::terminal::size;
use std::{
    io::{Write, stderr, stdout},
    sync::OnceLock,
};

#[cfg(test)]
use std::cell::RefCell;

/// Cached terminal width (fetched once on first use)
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

/// Length of brackets around module name: "[]"
const BRACKET_LEN: usize = 2;
/// Space after prefix: "[module] " <- this space
const SPACE_AFTER_PREFIX: usize = 1;

/// Summary line of desktop notifications mirroring error messages.
const ERROR_SUMMARY: &str = "LatexMk error:";

/// Calculate total prefix length for a module name.
///
/// Returns: `module.len() + 3` (for `[`, `]`, and trailing space)
#[inline]
const fn calc_prefix_len(module_len: usize) -> usize {
    module_len + BRACKET_LEN + SPACE_AFTER_PREFIX
}

/// Get terminal width, cached after first call.
/// Falls back to 120 columns if detection fails.
fn get_terminal_width() -> u16 {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(120))
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message at the given level with a colored module prefix.
///
/// # Usage
/// ```ignore
/// log!(logger, Warn, "bibtex"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:ident, $module:expr; $($arg:tt)*) => {{
        $logger.log($crate::logger::Level::$level, $module, &format!($($arg)*))
    }};
}

// ============================================================================
// Level
// ============================================================================

/// Message severity, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Level {
    /// Map the `-q`/`-d` command-line flags to a minimum level.
    ///
    /// `-d` wins over any number of `-q`. One `-q` hides status messages,
    /// two or more hide error messages as well.
    pub const fn from_flags(quiet: u8, debug: bool) -> Self {
        if debug {
            return Self::Debug;
        }
        match quiet {
            0 => Self::Info,
            1 => Self::Error,
            _ => Self::Fatal,
        }
    }

    /// Warnings and errors go to stderr, status messages to stdout.
    pub const fn is_diagnostic(self) -> bool {
        matches!(self, Self::Warn | Self::Error | Self::Fatal)
    }
}

// ============================================================================
// Logger
// ============================================================================

enum Sink {
    Terminal,
    #[cfg(test)]
    Memory(RefCell<Vec<(Level, String)>>),
}

/// Terminal logger with an injected minimum level.
///
/// Error-level messages are mirrored to the desktop when a [`Notifier`] is
/// attached.
pub struct Logger {
    level: Level,
    notifier: Option<Notifier>,
    sink: Sink,
}

impl Logger {
    pub const fn new(level: Level, notifier: Option<Notifier>) -> Self {
        Self {
            level,
            notifier,
            sink: Sink::Terminal,
        }
    }

    /// Logger that records messages instead of printing them.
    #[cfg(test)]
    pub fn memory(level: Level) -> Self {
        Self {
            level,
            notifier: None,
            sink: Sink::Memory(RefCell::new(Vec::new())),
        }
    }

    /// Memory logger with a recording desktop notifier attached.
    #[cfg(test)]
    pub fn memory_with_notifier(level: Level) -> Self {
        Self {
            notifier: Some(Notifier::memory()),
            ..Self::memory(level)
        }
    }

    #[inline]
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.level
    }

    /// Log `message` under `module` if `level` passes the threshold.
    pub fn log(&self, level: Level, module: &str, message: &str) {
        if !self.enabled(level) {
            return;
        }

        match &self.sink {
            Sink::Terminal => print_line(level, module, message),
            #[cfg(test)]
            Sink::Memory(lines) => lines.borrow_mut().push((level, message.to_owned())),
        }

        if level >= Level::Error
            && let Some(notifier) = &self.notifier
        {
            notifier.send(ERROR_SUMMARY, Some(message));
        }
    }

    /// Send a desktop notification, if notifications are enabled.
    pub fn notify(&self, summary: &str) {
        if let Some(notifier) = &self.notifier {
            notifier.send(summary, None);
        }
    }

    /// Messages recorded by a [`Logger::memory`] logger.
    #[cfg(test)]
    pub fn messages(&self) -> Vec<(Level, String)> {
        match &self.sink {
            Sink::Memory(lines) => lines.borrow().clone(),
            Sink::Terminal => Vec::new(),
        }
    }

    /// Notifications recorded by the attached notifier.
    #[cfg(test)]
    pub fn notifications(&self) -> Vec<crate::notify::Notification> {
        self.notifier.as_ref().map(Notifier::sent).unwrap_or_default()
    }

    /// Whether any recorded message contains `needle`.
    #[cfg(test)]
    pub fn contains(&self, needle: &str) -> bool {
        self.messages().iter().any(|(_, m)| m.contains(needle))
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Print one message with its colored prefix.
///
/// Status messages go to stdout, warnings and errors to stderr.
fn print_line(level: Level, module: &str, message: &str) {
    let prefix = colorize_prefix(level, module);
    let message = fit_message(level, module, message, get_terminal_width() as usize);

    if level.is_diagnostic() {
        let mut stderr = stderr().lock();
        writeln!(stderr, "{prefix} {message}").ok();
    } else {
        let mut stdout = stdout().lock();
        writeln!(stdout, "{prefix} {message}").ok();
        stdout.flush().ok();
    }
}

/// Cut a single-line status message to the terminal width.
///
/// Multi-line messages (compiler error excerpts) and errors are kept whole.
fn fit_message<'m>(level: Level, module: &str, message: &'m str, width: usize) -> &'m str {
    if level >= Level::Error || message.contains('\n') {
        return message;
    }
    truncate_str(message, width.saturating_sub(calc_prefix_len(module.len())))
}

/// Apply color to a module prefix based on severity.
#[inline]
fn colorize_prefix(level: Level, module: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match level {
        Level::Debug => prefix.dimmed(),
        Level::Info => prefix.bright_yellow().bold(),
        Level::Warn => prefix.bright_magenta().bold(),
        Level::Error | Level::Fatal => prefix.bright_red().bold(),
    }
}

/// Truncate a string to fit within `max_len` bytes.
///
/// Ensures the result is valid UTF-8 by finding the nearest character boundary.
#[inline]
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ============================================================================
// Tests
// ============================================================================
