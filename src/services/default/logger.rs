use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::panic::{self, PanicHookInfo};
use std::path::Path;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::bootstrap::{LoggingSettings, APP_CONFIG};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }

    pub fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Trace => "\x1b[90m",
            LogLevel::Debug => "\x1b[36m",
            LogLevel::Info => "\x1b[32m",
            LogLevel::Warning => "\x1b[33m",
            LogLevel::Error => "\x1b[31m",
        }
    }
}

pub struct ImageryLogger;

impl ImageryLogger {
    fn settings() -> &'static LoggingSettings {
        static FALLBACK: OnceLock<LoggingSettings> = OnceLock::new();

        match APP_CONFIG.get() {
            Some(config) => &config.logging,
            None => FALLBACK.get_or_init(LoggingSettings::default),
        }
    }

    pub fn log(level: LogLevel, message: &str) {
        let settings = Self::settings();
        if level < settings.min_level {
            return;
        }

        Self::write_entry(Path::new(&settings.directory), level, message, settings.stdout);
    }

    /// Appends one line to `<dir>/<level>.log`, echoing a colored copy to stdout when asked.
    pub fn write_entry(dir: &Path, level: LogLevel, message: &str, echo: bool) {
        if let Err(e) = fs::create_dir_all(dir) {
            eprintln!("Failed to create log directory {}: {}", dir.display(), e);
            return;
        }
        let file_path = dir.join(format!("{}.log", level.as_str().to_lowercase()));

        let unix_ts = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
        let local_time = Local::now().format("%Y-%m-%d %H:%M:%S %Z").to_string();
        let timestamp = format!("{}-{}", unix_ts, local_time);

        let file_log_entry = format!("{} [{}] {}\n", timestamp, level.as_str(), message);

        if let Err(e) = OpenOptions::new().append(true).create(true).open(&file_path).and_then(|mut file| file.write_all(file_log_entry.as_bytes())) {
            eprintln!("Failed to write log: {}", e);
        }

        if echo {
            println!("{} [{}{}\x1b[0m] {}", timestamp, level.color_code(), level.as_str(), message);
        }
    }
}

pub fn setup_panic_hook() {
    panic::set_hook(Box::new(|panic_info: &PanicHookInfo| {
        let payload = panic_info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| panic_info.payload().downcast_ref::<String>().map(|s| s.as_str()))
            .unwrap_or("Unknown panic");
        let location = match panic_info.location() {
            Some(loc) => format!("{}:{}", loc.file(), loc.line()),
            None => "unknown location".to_string(),
        };
        ImageryLogger::log(LogLevel::Error, &format!("Panic at {}: {}", location, payload));
    }));
}

#[macro_export]
macro_rules! img_log {
    ($level:ident, $msg:expr) => {{
        let src_loc = format!("{}:{}", file!().rsplit('/').next().unwrap_or(file!()), line!());
        let full_msg = format!("[{}] {}", src_loc, $msg);
        $crate::services::logger::ImageryLogger::log($crate::services::logger::LogLevel::$level, &full_msg);
    }};
}
