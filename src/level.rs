use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Severity levels of the logging side, ordered from least to most severe.
///
/// The derived `Ord` is the filtering order: `Fatal > Panic > DPanic >
/// Error > Warn > Info > Debug`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    /// Panics in development builds, logs as an error otherwise.
    DPanic,
    Panic,
    Fatal,
}

impl LogLevel {
    /// All levels, most severe first.
    pub const ALL: [LogLevel; 7] = [
        LogLevel::Fatal,
        LogLevel::Panic,
        LogLevel::DPanic,
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
    ];

    /// Remote severity used when tagging records of this level.
    pub fn severity(self) -> SeverityLevel {
        match self {
            LogLevel::Debug => SeverityLevel::Verbose,
            LogLevel::Info => SeverityLevel::Information,
            LogLevel::Warn => SeverityLevel::Warning,
            LogLevel::Error => SeverityLevel::Error,
            LogLevel::DPanic | LogLevel::Panic | LogLevel::Fatal => SeverityLevel::Critical,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::DPanic => "dpanic",
            LogLevel::Panic => "panic",
            LogLevel::Fatal => "fatal",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&tracing::Level> for LogLevel {
    fn from(level: &tracing::Level) -> Self {
        if *level == tracing::Level::ERROR {
            LogLevel::Error
        } else if *level == tracing::Level::WARN {
            LogLevel::Warn
        } else if *level == tracing::Level::INFO {
            LogLevel::Info
        } else {
            LogLevel::Debug
        }
    }
}

/// Error returned when a level name is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown log level: {0:?}")]
pub struct ParseLevelError(pub String);

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "dpanic" => Ok(LogLevel::DPanic),
            "panic" => Ok(LogLevel::Panic),
            "fatal" => Ok(LogLevel::Fatal),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// Severity vocabulary of the ingestion service.
///
/// The discriminants are the service's numeric codes; `Verbose` is the
/// zero value and doubles as the fallback for unknown wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum SeverityLevel {
    #[default]
    Verbose = 0,
    Information = 1,
    Warning = 2,
    Error = 3,
    Critical = 4,
}

impl SeverityLevel {
    /// Wire name of the severity. These five strings are fixed by the
    /// ingestion protocol.
    pub fn as_str(self) -> &'static str {
        match self {
            SeverityLevel::Verbose => "Verbose",
            SeverityLevel::Information => "Information",
            SeverityLevel::Warning => "Warning",
            SeverityLevel::Error => "Error",
            SeverityLevel::Critical => "Critical",
        }
    }

    /// Exact, case-sensitive lookup of a wire name.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "Critical" => Some(SeverityLevel::Critical),
            "Error" => Some(SeverityLevel::Error),
            "Warning" => Some(SeverityLevel::Warning),
            "Information" => Some(SeverityLevel::Information),
            "Verbose" => Some(SeverityLevel::Verbose),
            _ => None,
        }
    }

    /// Like [`SeverityLevel::from_wire`], but unknown or missing names fall
    /// back to the zero value ([`SeverityLevel::Verbose`]).
    pub fn from_wire_or_default(name: Option<&str>) -> Self {
        name.and_then(Self::from_wire).unwrap_or_default()
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
