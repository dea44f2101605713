use thiserror::Error;

use super::planner::ByteRange;

/// Why a single chunk did not finish its range.
#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("server answered the ranged request with status {0}")]
    Status(u16),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("file write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("body ended after {received} of {expected} bytes")]
    Incomplete { expected: u64, received: u64 },
    #[error("server sent more than the {expected} requested bytes")]
    Overrun { expected: u64 },
    #[error("worker task panicked")]
    Panicked,
}

#[derive(Debug)]
pub enum ChunkOutcome {
    Finished,
    Cancelled,
    Failed(ChunkError),
}

/// What a worker reports back when it exits.
#[derive(Debug)]
pub struct ChunkReport {
    pub index: usize,
    /// `None` when the size is unknown and the body was streamed without a range.
    pub range: Option<ByteRange>,
    pub written: u64,
    pub outcome: ChunkOutcome,
}

#[derive(Debug)]
pub struct ChunkFailure {
    pub index: usize,
    pub range: Option<ByteRange>,
    pub written: u64,
    pub error: ChunkError,
}

/// Terminal result of `Downloader::start`.
#[derive(Debug)]
pub enum Outcome {
    Completed { bytes: u64 },
    Cancelled,
    PartialFailure { failed: Vec<ChunkFailure> },
}

impl Outcome {
    /// Folds worker reports into one result. Cancellation wins over failures since the
    /// output is discarded either way.
    pub(super) fn aggregate(reports: Vec<ChunkReport>, cancelled: bool) -> Self {
        if cancelled {
            return Outcome::Cancelled;
        }
        let mut bytes = 0;
        let mut failed = vec![];
        for report in reports {
            bytes += report.written;
            match report.outcome {
                ChunkOutcome::Finished => {}
                // Only the session token cancels a worker, so this is a task that was
                // aborted without the session being cancelled.
                ChunkOutcome::Cancelled => failed.push(ChunkFailure {
                    index: report.index,
                    range: report.range,
                    written: report.written,
                    error: ChunkError::Incomplete {
                        expected: report.range.map_or(report.written, |r| r.len()),
                        received: report.written,
                    },
                }),
                ChunkOutcome::Failed(error) => failed.push(ChunkFailure {
                    index: report.index,
                    range: report.range,
                    written: report.written,
                    error,
                }),
            }
        }
        if failed.is_empty() {
            Outcome::Completed { bytes }
        } else {
            failed.sort_by_key(|f| f.index);
            Outcome::PartialFailure { failed }
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(index: usize, outcome: ChunkOutcome) -> ChunkReport {
        ChunkReport {
            index,
            range: Some(ByteRange::new(index as u64 * 10, index as u64 * 10 + 9)),
            written: 10,
            outcome,
        }
    }

    #[test]
    fn all_finished_is_completed() {
        let reports = vec![report(0, ChunkOutcome::Finished), report(1, ChunkOutcome::Finished)];
        assert!(matches!(
            Outcome::aggregate(reports, false),
            Outcome::Completed { bytes: 20 }
        ));
    }

    #[test]
    fn one_failure_names_the_failed_range() {
        let reports = vec![
            report(1, ChunkOutcome::Failed(ChunkError::Status(500))),
            report(0, ChunkOutcome::Finished),
        ];
        match Outcome::aggregate(reports, false) {
            Outcome::PartialFailure { failed } => {
                assert_eq!(failed.len(), 1);
                assert_eq!(failed[0].index, 1);
                assert_eq!(failed[0].range, Some(ByteRange::new(10, 19)));
                assert!(matches!(failed[0].error, ChunkError::Status(500)));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn cancellation_overrides_failures() {
        let reports = vec![report(0, ChunkOutcome::Failed(ChunkError::Panicked))];
        assert!(matches!(Outcome::aggregate(reports, true), Outcome::Cancelled));
    }
}
