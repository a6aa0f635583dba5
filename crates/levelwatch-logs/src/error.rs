use std::io;

use thiserror::Error;

/// Why a raw line could not be classified
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    #[error("malformed line: expected at least 2 tokens, found {tokens}")]
    Malformed { tokens: usize },
}

/// Errors that stop the aggregation loop
#[derive(Debug, Error)]
pub enum TallyError {
    #[error("failed to read from log source")]
    Source(#[source] io::Error),

    #[error("failed to write report output")]
    Output(#[source] io::Error),
}
