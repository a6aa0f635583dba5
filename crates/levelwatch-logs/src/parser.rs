use levelwatch_types::{LogLevel, LogLine};

use crate::error::ClassifyError;

/// Log parser for extracting structure from raw log lines
pub struct LogParser;

impl LogParser {
    /// Parse a raw `<timestamp> level=<name> <message...>` line
    ///
    /// Lines with fewer than two tokens are malformed. A second token that is
    /// not a `level=<canonical>` pair still yields a line, with
    /// `LogLevel::Unknown` and the token kept verbatim.
    pub fn parse(raw: &str) -> Result<LogLine, ClassifyError> {
        let mut tokens = Self::tokens(raw);

        let (Some(timestamp), Some(level_token)) = (tokens.next(), tokens.next()) else {
            return Err(ClassifyError::Malformed {
                tokens: Self::tokens(raw).count(),
            });
        };

        let message = tokens.collect::<Vec<_>>().join(" ");

        Ok(LogLine {
            timestamp: timestamp.to_string(),
            level: Self::extract_level(level_token),
            level_token: level_token.to_string(),
            message,
        })
    }

    /// Space-separated tokens; runs of spaces collapse, other whitespace is kept
    fn tokens(raw: &str) -> impl Iterator<Item = &str> {
        raw.split(' ').filter(|t| !t.is_empty())
    }

    /// Extract the level from a `key=value` token
    fn extract_level(token: &str) -> LogLevel {
        token
            .split_once('=')
            .and_then(|(_, value)| LogLevel::from_name(value))
            .unwrap_or(LogLevel::Unknown)
    }
}
