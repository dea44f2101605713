use std::sync::atomic::{AtomicU64, Ordering};

/// Receives byte counts as workers write them. Invoked concurrently from every worker
/// in no particular order, so implementations must be thread-safe on their own.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, written: u64, total: Option<u64>);
}

impl<F> ProgressSink for F
where
    F: Fn(u64, Option<u64>) + Send + Sync,
{
    fn on_progress(&self, written: u64, total: Option<u64>) {
        self(written, total)
    }
}

/// Lock-free accumulator of bytes written across all workers.
#[derive(Debug, Default)]
pub struct ProgressCounter {
    written: AtomicU64,
}

impl ProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }
}

impl ProgressSink for ProgressCounter {
    fn on_progress(&self, written: u64, _total: Option<u64>) {
        self.written.fetch_add(written, Ordering::Relaxed);
    }
}
