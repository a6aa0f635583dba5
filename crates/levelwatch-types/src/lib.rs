//! Shared types for levelwatch
//!
//! This crate contains data structures used across multiple levelwatch crates.

use std::fmt;

// ============================================================================
// Kubernetes Resource Types
// ============================================================================

/// Pod information
#[derive(Clone, Debug)]
pub struct PodInfo {
    pub name: String,
    pub namespace: String,
    pub status: PodStatus,
    pub containers: Vec<ContainerInfo>,
    pub node_name: Option<String>,
}

impl PodInfo {
    pub fn new(name: String, namespace: String) -> Self {
        Self {
            name,
            namespace,
            status: PodStatus::Unknown,
            containers: Vec::new(),
            node_name: None,
        }
    }

    /// Pick the container to tail: the requested one if it exists, else the first
    pub fn resolve_container(&self, requested: Option<&str>) -> Option<&ContainerInfo> {
        match requested {
            Some(name) => self.containers.iter().find(|c| c.name == name),
            None => self.containers.first(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PodStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl From<&str> for PodStatus {
    fn from(s: &str) -> Self {
        match s {
            "Pending" => Self::Pending,
            "Running" => Self::Running,
            "Succeeded" => Self::Succeeded,
            "Failed" => Self::Failed,
            _ => Self::Unknown,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ContainerInfo {
    pub name: String,
}

impl ContainerInfo {
    pub fn new(name: String) -> Self {
        Self { name }
    }
}

// ============================================================================
// Log Types
// ============================================================================

/// Log severity level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
    Unknown,
}

impl LogLevel {
    /// The six canonical levels, in summary order
    pub const CANONICAL: [LogLevel; 6] = [
        Self::Fatal,
        Self::Error,
        Self::Warn,
        Self::Info,
        Self::Debug,
        Self::Trace,
    ];

    /// Look up a canonical level by its exact lowercase name
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "fatal" => Some(Self::Fatal),
            "error" => Some(Self::Error),
            "warn" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fatal => "fatal",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_canonical(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single classified log line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogLine {
    /// First token, carried as-is
    pub timestamp: String,

    /// Detected log level
    pub level: LogLevel,

    /// Second token exactly as it appeared (e.g. `level=error`)
    pub level_token: String,

    /// Remaining tokens joined with single spaces
    pub message: String,
}

/// Counts per log level
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelCounts {
    pub fatal: u64,
    pub error: u64,
    pub warn: u64,
    pub info: u64,
    pub debug: u64,
    pub trace: u64,
    pub unknown: u64,
}

impl LevelCounts {
    pub fn increment(&mut self, level: LogLevel) {
        match level {
            LogLevel::Fatal => self.fatal += 1,
            LogLevel::Error => self.error += 1,
            LogLevel::Warn => self.warn += 1,
            LogLevel::Info => self.info += 1,
            LogLevel::Debug => self.debug += 1,
            LogLevel::Trace => self.trace += 1,
            LogLevel::Unknown => self.unknown += 1,
        }
    }

    pub fn get(&self, level: LogLevel) -> u64 {
        match level {
            LogLevel::Fatal => self.fatal,
            LogLevel::Error => self.error,
            LogLevel::Warn => self.warn,
            LogLevel::Info => self.info,
            LogLevel::Debug => self.debug,
            LogLevel::Trace => self.trace,
            LogLevel::Unknown => self.unknown,
        }
    }

    /// Sum over the six canonical levels (excludes `unknown`)
    pub fn canonical_total(&self) -> u64 {
        LogLevel::CANONICAL.iter().map(|l| self.get(*l)).sum()
    }

    pub fn total(&self) -> u64 {
        self.canonical_total() + self.unknown
    }
}

/// Decode one raw line, dropping the line terminator
///
/// Invalid UTF-8 is replaced with U+FFFD instead of failing the read.
pub fn decode_line(mut buf: Vec<u8>) -> String {
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    String::from_utf8(buf).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_names_are_case_sensitive() {
        assert_eq!(LogLevel::from_name("warn"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_name("WARN"), None);
        assert_eq!(LogLevel::from_name("warning"), None);
        assert_eq!(LogLevel::from_name("unknown"), None);
    }

    #[test]
    fn test_canonical_names_round_trip() {
        for level in LogLevel::CANONICAL {
            assert!(level.is_canonical());
            assert_eq!(LogLevel::from_name(level.as_str()), Some(level));
        }
        assert!(!LogLevel::Unknown.is_canonical());
    }

    #[test]
    fn test_counts_totals() {
        let mut counts = LevelCounts::default();
        counts.increment(LogLevel::Error);
        counts.increment(LogLevel::Error);
        counts.increment(LogLevel::Trace);
        counts.increment(LogLevel::Unknown);

        assert_eq!(counts.get(LogLevel::Error), 2);
        assert_eq!(counts.canonical_total(), 3);
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn test_resolve_container() {
        let mut pod = PodInfo::new("api-0".to_string(), "default".to_string());
        assert!(pod.resolve_container(None).is_none());

        pod.containers.push(ContainerInfo::new("app".to_string()));
        pod.containers.push(ContainerInfo::new("sidecar".to_string()));

        assert_eq!(pod.resolve_container(None).unwrap().name, "app");
        assert_eq!(pod.resolve_container(Some("sidecar")).unwrap().name, "sidecar");
        assert!(pod.resolve_container(Some("missing")).is_none());
    }

    #[test]
    fn test_decode_line() {
        assert_eq!(decode_line(b"T level=info ok\r\n".to_vec()), "T level=info ok");
        assert_eq!(decode_line(b"no terminator".to_vec()), "no terminator");
        assert_eq!(decode_line(b"T level=error caf\xe9\n".to_vec()), "T level=error caf\u{FFFD}");
        assert_eq!(decode_line(Vec::new()), "");
    }
}
