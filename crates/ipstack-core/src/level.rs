use std::fmt;
use std::str::FromStr;

/// A log level named by configuration.
///
/// Accepts the syslog-style names (`notice`, `critical`, `alert`,
/// `emergency`) next to the usual ones and folds them onto the five
/// `tracing` levels when an event is emitted via [`event_at!`](crate::event_at).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Notice => "notice",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
            LogLevel::Alert => "alert",
            LogLevel::Emergency => "emergency",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "notice" => Ok(LogLevel::Notice),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            "critical" => Ok(LogLevel::Critical),
            "alert" => Ok(LogLevel::Alert),
            "emergency" => Ok(LogLevel::Emergency),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emit a `tracing` event at a level chosen at runtime.
///
/// ```ignore
/// event_at!(config.success_level, client_ip = %ip, "ipstack lookup succeeded");
/// ```
#[macro_export]
macro_rules! event_at {
    ($level:expr, $($arg:tt)+) => {
        match $level {
            $crate::level::LogLevel::Trace => $crate::tracing::trace!($($arg)+),
            $crate::level::LogLevel::Debug => $crate::tracing::debug!($($arg)+),
            $crate::level::LogLevel::Info | $crate::level::LogLevel::Notice => {
                $crate::tracing::info!($($arg)+)
            }
            $crate::level::LogLevel::Warning => $crate::tracing::warn!($($arg)+),
            _ => $crate::tracing::error!($($arg)+),
        }
    };
}
