//! Echo and summary formats
//!
//! Both formats are byte-exact and consumed by downstream tooling.

use levelwatch_types::{LevelCounts, LogLevel, LogLine};

/// Whether a summary is due before handling the line with this zero-based count
pub fn should_summarize(line_count: u64, interval: u64) -> bool {
    interval != 0 && line_count % interval == 0
}

/// `<timestamp> -- <level token> -- <message>`
pub fn format_echo(line: &LogLine) -> String {
    format!(
        "{} -- {} -- {}\n",
        line.timestamp, line.level_token, line.message
    )
}

/// `TOTALS:` header followed by one right-aligned row per canonical level
pub fn format_summary(counts: &LevelCounts) -> String {
    let mut out = String::from("TOTALS:\n");
    for level in LogLevel::CANONICAL {
        out.push_str(&format!(" {:<5} {:>8}\n", level.as_str(), counts.get(level)));
    }
    out
}
