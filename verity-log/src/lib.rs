//! Verity Logging
//!
//! Structured logging for the Verity validation crates, controlled by the
//! `VERITY_DEBUG` family of environment variables or configured at runtime.
//!
//! # Usage
//!
//! ```rust
//! use verity_log::{debug, info, warn, error, trace};
//!
//! debug!("Validating record");
//! info!("Loaded {} schemas", 3);
//! warn!("Schema document has no schemas");
//! error!("Failed to read schema file");
//!
//! let schema = "User";
//! debug!(target: "verity::engine", "Running schema '{}'", schema);
//! ```
//!
//! # Environment Variables
//!
//! - `VERITY_DEBUG=1` - Enable debug logging
//! - `VERITY_LOG_LEVEL=trace|debug|info|warn|error|off` - Set log level
//! - `VERITY_LOG_FORMAT=pretty|json|compact` - Set output format
//! - `VERITY_LOG_TIMESTAMPS=1|0` - Include timestamps
//! - `VERITY_LOG_TARGET=1|0` - Include the log target

use once_cell::sync::Lazy;
use std::env;
use std::fmt;
use std::io::Write;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Severity of a log record, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    /// Disables output entirely
    Off = 5,
}

const LEVELS: [Level; 6] = [
    Level::Trace,
    Level::Debug,
    Level::Info,
    Level::Warn,
    Level::Error,
    Level::Off,
];

impl Level {
    /// Parse a level name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        let name = s.trim().to_lowercase();
        match name.as_str() {
            "warning" => Some(Level::Warn),
            "none" => Some(Level::Off),
            _ => LEVELS
                .into_iter()
                .find(|level| level.as_str().eq_ignore_ascii_case(&name)),
        }
    }

    /// Upper-case name used in rendered records
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Off => "OFF",
        }
    }

    #[cfg(feature = "log-facade")]
    fn to_facade(self) -> Option<log::Level> {
        match self {
            Level::Trace => Some(log::Level::Trace),
            Level::Debug => Some(log::Level::Debug),
            Level::Info => Some(log::Level::Info),
            Level::Warn => Some(log::Level::Warn),
            Level::Error => Some(log::Level::Error),
            Level::Off => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How records are rendered on stderr.
///
/// `Json` needs the `json` feature; without it JSON output falls back to
/// `Pretty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `2026-01-01 12:00:00.000 INFO  [target] message`
    Pretty,
    /// `12:00:00 I target: message`
    Compact,
    /// One JSON object per line
    Json,
}

impl Format {
    /// Parse a format name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Some(Format::Pretty),
            "compact" => Some(Format::Compact),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

// ============================================================================
// Global state
// ============================================================================

// Level and debug flag are read on every macro call, so they live outside
// the lock.
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);
static LOG_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);

static CONFIG: Lazy<RwLock<LogConfig>> = Lazy::new(|| {
    let config = LogConfig::from_env();
    store_levels(&config);
    RwLock::new(config)
});

/// Logger settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Emit debug records regardless of `level`
    pub debug: bool,
    pub level: Level,
    pub format: Format,
    pub timestamps: bool,
    /// Include the record target (e.g. `verity::engine`)
    pub target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            debug: false,
            level: Level::Info,
            format: Format::Json,
            timestamps: true,
            target: true,
        }
    }
}

impl LogConfig {
    /// Read `VERITY_DEBUG` and the `VERITY_LOG_*` variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`LogConfig::from_env`], reading variables through `lookup`.
    ///
    /// Unset or unparseable variables fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |key: &str, default: bool| {
            lookup(key)
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(default)
        };

        let debug = flag("VERITY_DEBUG", false);
        let fallback_level = if debug { Level::Debug } else { Level::Info };

        Self {
            debug,
            level: lookup("VERITY_LOG_LEVEL")
                .and_then(|s| Level::parse(&s))
                .unwrap_or(fallback_level),
            format: lookup("VERITY_LOG_FORMAT")
                .and_then(|s| Format::parse(&s))
                .unwrap_or(Format::Json),
            timestamps: flag("VERITY_LOG_TIMESTAMPS", true),
            target: flag("VERITY_LOG_TARGET", true),
        }
    }
}

fn store_levels(config: &LogConfig) {
    DEBUG_ENABLED.store(config.debug, Ordering::SeqCst);
    LOG_LEVEL.store(config.level as u8, Ordering::SeqCst);
}

/// Load settings from the environment now instead of on the first check.
///
/// Level checks and setters call this first.
#[inline]
pub fn init() {
    Lazy::force(&CONFIG);
}

/// Replace the active configuration.
pub fn configure(config: LogConfig) {
    let mut active = CONFIG.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    store_levels(&config);
    *active = config;
}

/// Snapshot of the active configuration.
pub fn config() -> LogConfig {
    CONFIG
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

#[inline]
pub fn is_debug_enabled() -> bool {
    init();
    DEBUG_ENABLED.load(Ordering::Relaxed)
}

/// `Off` is never enabled.
#[inline]
pub fn is_level_enabled(level: Level) -> bool {
    init();
    level != Level::Off && level as u8 >= LOG_LEVEL.load(Ordering::Relaxed)
}

/// Whether a record at `level` would be written; the debug flag forces
/// debug records on.
#[inline]
pub fn enabled(level: Level) -> bool {
    is_level_enabled(level) || (level == Level::Debug && is_debug_enabled())
}

pub fn current_level() -> Level {
    init();
    LEVELS
        .get(LOG_LEVEL.load(Ordering::Relaxed) as usize)
        .copied()
        .unwrap_or(Level::Off)
}

pub fn set_level(level: Level) {
    init();
    LOG_LEVEL.store(level as u8, Ordering::SeqCst);
}

/// Turning debug on also lowers the level to `Debug` if it is higher.
pub fn set_debug(enabled: bool) {
    init();
    DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
    if enabled && current_level() > Level::Debug {
        set_level(Level::Debug);
    }
}

/// Write one record to stderr. Used by the macros.
#[doc(hidden)]
pub fn log(level: Level, target: &str, message: &str) {
    if !enabled(level) {
        return;
    }

    let line = render(level, target, message, &config());
    let _ = writeln!(std::io::stderr().lock(), "{}", line);

    #[cfg(feature = "log-facade")]
    if let Some(facade_level) = level.to_facade() {
        log::log!(target: target, facade_level, "{}", message);
    }
}

/// Render one record in the configured format, without a trailing newline.
pub fn render(level: Level, target: &str, message: &str, config: &LogConfig) -> String {
    let show_target = config.target && !target.is_empty();
    let mut line = String::new();

    match config.format {
        Format::Compact => {
            if config.timestamps {
                line.push_str(&format!("{} ", chrono::Local::now().format("%H:%M:%S")));
            }
            line.push(level.as_str().chars().next().unwrap_or('?'));
            line.push(' ');
            if show_target {
                line.push_str(target);
                line.push_str(": ");
            }
        }
        #[cfg(feature = "json")]
        Format::Json => return render_json(level, target, message),
        _ => {
            if config.timestamps {
                let now = chrono::Local::now();
                line.push_str(&format!("{} ", now.format("%Y-%m-%d %H:%M:%S%.3f")));
            }
            line.push_str(&format!("{:5} ", level.as_str()));
            if show_target {
                line.push_str(&format!("[{}] ", target));
            }
        }
    }

    line.push_str(message);
    line
}

#[cfg(feature = "json")]
fn render_json(level: Level, target: &str, message: &str) -> String {
    #[derive(serde::Serialize)]
    struct Record<'a> {
        timestamp: String,
        level: &'a str,
        target: &'a str,
        message: &'a str,
    }

    let record = Record {
        timestamp: chrono::Utc::now().to_rfc3339(),
        level: level.as_str(),
        target,
        message,
    };

    serde_json::to_string(&record).unwrap_or_else(|_| message.to_string())
}

// ============================================================================
// Macros
// ============================================================================

#[doc(hidden)]
#[macro_export]
macro_rules! __emit {
    ($level:expr, $target:expr, $($arg:tt)+) => {
        if $crate::enabled($level) {
            $crate::log($level, $target, &format!($($arg)+));
        }
    };
}

/// Log a trace message.
#[macro_export]
macro_rules! trace {
    (target: $target:expr, $($arg:tt)+) => { $crate::__emit!($crate::Level::Trace, $target, $($arg)+) };
    ($($arg:tt)+) => { $crate::__emit!($crate::Level::Trace, module_path!(), $($arg)+) };
}

/// Log a debug message.
///
/// Enabled when `VERITY_DEBUG=1` or the level is `debug` or lower.
///
/// ```rust
/// use verity_log::debug;
///
/// let fields = 4;
/// debug!("Schema has {} fields", fields);
/// debug!(target: "verity::engine", "Starting run");
/// ```
#[macro_export]
macro_rules! debug {
    (target: $target:expr, $($arg:tt)+) => { $crate::__emit!($crate::Level::Debug, $target, $($arg)+) };
    ($($arg:tt)+) => { $crate::__emit!($crate::Level::Debug, module_path!(), $($arg)+) };
}

#[macro_export]
macro_rules! info {
    (target: $target:expr, $($arg:tt)+) => { $crate::__emit!($crate::Level::Info, $target, $($arg)+) };
    ($($arg:tt)+) => { $crate::__emit!($crate::Level::Info, module_path!(), $($arg)+) };
}

#[macro_export]
macro_rules! warn {
    (target: $target:expr, $($arg:tt)+) => { $crate::__emit!($crate::Level::Warn, $target, $($arg)+) };
    ($($arg:tt)+) => { $crate::__emit!($crate::Level::Warn, module_path!(), $($arg)+) };
}

#[macro_export]
macro_rules! error {
    (target: $target:expr, $($arg:tt)+) => { $crate::__emit!($crate::Level::Error, $target, $($arg)+) };
    ($($arg:tt)+) => { $crate::__emit!($crate::Level::Error, module_path!(), $($arg)+) };
}
