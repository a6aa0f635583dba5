use std::io::{self, Write};
use std::num::NonZeroU64;

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use levelwatch_types::{LevelCounts, LogLine};

use crate::error::TallyError;
use crate::parser::LogParser;
use crate::report::{format_echo, format_summary, should_summarize};

/// Lines between summary blocks
pub const DEFAULT_SUMMARY_INTERVAL: NonZeroU64 = NonZeroU64::new(60).unwrap();

/// Why a run stopped consuming lines
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamEnd {
    /// The source reported end of stream
    Exhausted,
    /// The caller cancelled between lines
    Cancelled,
}

/// Final state of a completed run
#[derive(Clone, Debug)]
pub struct RunOutcome {
    pub end: StreamEnd,
    pub lines: u64,
    pub malformed: u64,
    pub counts: LevelCounts,
}

/// Owns the level counters for one log source and writes the report
///
/// Every classified line is echoed. A summary block is written before the
/// echo whenever the zero-based line count is a multiple of the interval,
/// so the very first line always produces one.
pub struct LevelAggregator<W> {
    /// Report sink
    out: W,

    counts: LevelCounts,

    /// Classified lines seen so far (drives summary cadence)
    line_count: u64,

    /// Lines dropped before classification
    malformed: u64,

    interval: NonZeroU64,

    /// Write one more summary when the run ends
    final_summary: bool,
}

impl<W: Write> LevelAggregator<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            counts: LevelCounts::default(),
            line_count: 0,
            malformed: 0,
            interval: DEFAULT_SUMMARY_INTERVAL,
            final_summary: false,
        }
    }

    pub fn with_interval(mut self, interval: NonZeroU64) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_final_summary(mut self, enabled: bool) -> Self {
        self.final_summary = enabled;
        self
    }

    pub fn counts(&self) -> &LevelCounts {
        &self.counts
    }

    pub fn line_count(&self) -> u64 {
        self.line_count
    }

    pub fn malformed(&self) -> u64 {
        self.malformed
    }

    /// Consume the aggregator and return the sink
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Count a classified line, writing a summary if one is due and the echo
    pub fn observe(&mut self, line: &LogLine) -> Result<(), TallyError> {
        if !line.level.is_canonical() {
            tracing::debug!(token = %line.level_token, "unrecognized level, counted as unknown");
        }
        self.counts.increment(line.level);

        if should_summarize(self.line_count, self.interval.get()) {
            self.write(&format_summary(&self.counts))?;
        }
        self.write(&format_echo(line))?;

        self.line_count += 1;
        Ok(())
    }

    /// Classify and count one raw line; malformed lines are dropped with a warning
    pub fn observe_raw(&mut self, raw: &str) -> Result<(), TallyError> {
        match LogParser::parse(raw) {
            Ok(line) => self.observe(&line),
            Err(e) => {
                self.malformed += 1;
                tracing::warn!(line = raw, malformed = self.malformed, "{}", e);
                Ok(())
            }
        }
    }

    /// Pull lines from a blocking source until it ends or fails
    pub fn run<I>(&mut self, lines: I) -> Result<RunOutcome, TallyError>
    where
        I: IntoIterator<Item = io::Result<String>>,
    {
        for line in lines {
            let line = line.map_err(TallyError::Source)?;
            self.observe_raw(&line)?;
        }
        self.finish(StreamEnd::Exhausted)
    }

    /// Pull lines from an async source until it ends, fails or `cancel` fires
    pub async fn run_stream<S>(
        &mut self,
        lines: S,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, TallyError>
    where
        S: Stream<Item = io::Result<String>>,
    {
        let mut lines = std::pin::pin!(lines);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::debug!(lines = self.line_count, "log stream cancelled");
                    return self.finish(StreamEnd::Cancelled);
                }

                next = lines.next() => {
                    match next {
                        Some(Ok(line)) => self.observe_raw(&line)?,
                        Some(Err(e)) => return Err(TallyError::Source(e)),
                        None => return self.finish(StreamEnd::Exhausted),
                    }
                }
            }
        }
    }

    fn finish(&mut self, end: StreamEnd) -> Result<RunOutcome, TallyError> {
        if self.final_summary {
            self.write(&format_summary(&self.counts))?;
        }
        self.out.flush().map_err(TallyError::Output)?;

        tracing::debug!(
            ?end,
            lines = self.line_count,
            malformed = self.malformed,
            unknown = self.counts.unknown,
            "log stream finished"
        );

        Ok(RunOutcome {
            end,
            lines: self.line_count,
            malformed: self.malformed,
            counts: self.counts.clone(),
        })
    }

    fn write(&mut self, text: &str) -> Result<(), TallyError> {
        self.out
            .write_all(text.as_bytes())
            .map_err(TallyError::Output)
    }
}
