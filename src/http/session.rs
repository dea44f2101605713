use std::{path::PathBuf, sync::Arc, time::Duration};

use parking_lot::Mutex;
use reqwest::Url;
use tokio::{sync::watch, task::AbortHandle};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{SessionState, TransferMode, info::HttpDownloadInfo};

/// The one download a `Downloader` is working on.
pub(super) struct Session {
    pub(super) id: Uuid,
    pub(super) url: Option<Url>,
    pub(super) file_path: Option<PathBuf>,
    pub(super) info: Option<HttpDownloadInfo>,
    pub(super) mode: Option<TransferMode>,
    pub(super) chunk_count: u64,
    pub(super) state: SessionState,
    pub(super) cancelled: bool,
    pub(super) control: Option<Arc<SessionControl>>,
}

impl Session {
    pub(super) fn idle() -> Self {
        Self {
            id: Uuid::new_v4(),
            url: None,
            file_path: None,
            info: None,
            mode: None,
            chunk_count: 0,
            state: SessionState::Idle,
            cancelled: false,
            control: None,
        }
    }

    pub(super) fn probed(
        url: Url,
        file_path: PathBuf,
        info: HttpDownloadInfo,
        mode: TransferMode,
        chunk_count: u64,
    ) -> Self {
        Self {
            url: Some(url),
            file_path: Some(file_path),
            info: Some(info),
            mode: Some(mode),
            chunk_count,
            state: SessionState::Probed,
            ..Self::idle()
        }
    }

    /// Clears everything but the id, leaving the session in `Cancelled`.
    pub(super) fn reset_cancelled(&mut self) {
        *self = Self {
            id: self.id,
            state: SessionState::Cancelled,
            cancelled: true,
            ..Self::idle()
        };
    }

    pub(super) fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Downloading | SessionState::Paused)
    }
}

struct Workers {
    handles: Vec<AbortHandle>,
    aborted: bool,
}

/// State shared between the orchestrator, its control calls, and every worker of one run.
pub(super) struct SessionControl {
    pub(super) token: CancellationToken,
    paused: watch::Sender<bool>,
    remaining: Arc<watch::Sender<usize>>,
    workers: Mutex<Workers>,
}

impl SessionControl {
    pub(super) fn new(workers: usize) -> Self {
        Self {
            token: CancellationToken::new(),
            paused: watch::Sender::new(false),
            remaining: Arc::new(watch::Sender::new(workers)),
            workers: Mutex::new(Workers {
                handles: Vec::with_capacity(workers),
                aborted: false,
            }),
        }
    }

    pub(super) fn pause(&self) {
        self.paused.send_replace(true);
    }

    pub(super) fn resume(&self) {
        self.paused.send_replace(false);
    }

    pub(super) fn pause_receiver(&self) -> watch::Receiver<bool> {
        self.paused.subscribe()
    }

    /// Hands out one slot of the countdown. Each worker must hold exactly one.
    pub(super) fn completion_guard(&self) -> CompletionGuard {
        CompletionGuard {
            remaining: Arc::clone(&self.remaining),
        }
    }

    pub(super) fn register(&self, handle: AbortHandle) {
        let mut workers = self.workers.lock();
        if workers.aborted {
            handle.abort();
        }
        workers.handles.push(handle);
    }

    pub(super) fn abort_all(&self) {
        let mut workers = self.workers.lock();
        workers.aborted = true;
        for handle in &workers.handles {
            handle.abort();
        }
    }

    pub(super) fn remaining(&self) -> usize {
        *self.remaining.borrow()
    }

    /// Waits until every worker has signalled completion. Returns `false` if `limit` elapsed first.
    pub(super) async fn wait_finished(&self, limit: Duration) -> bool {
        let mut receiver = self.remaining.subscribe();
        tokio::time::timeout(limit, receiver.wait_for(|remaining| *remaining == 0))
            .await
            .is_ok_and(|result| result.is_ok())
    }
}

/// Decrements the session countdown when dropped, which covers normal return,
/// cancellation, panics, and forced aborts alike.
pub(super) struct CompletionGuard {
    remaining: Arc<watch::Sender<usize>>,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.remaining
            .send_modify(|remaining| *remaining = remaining.saturating_sub(1));
    }
}

/// Blocks while the session is paused. Returns `false` if cancellation arrived first.
pub(super) async fn wait_while_paused(
    paused: &mut watch::Receiver<bool>,
    token: &CancellationToken,
) -> bool {
    if !*paused.borrow() {
        return !token.is_cancelled();
    }
    tokio::select! {
        _ = token.cancelled() => {}
        _ = paused.wait_for(|paused| !*paused) => {}
    }
    !token.is_cancelled()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn countdown_reaches_zero_when_guards_drop() {
        let control = SessionControl::new(3);
        let guards: Vec<_> = (0..3).map(|_| control.completion_guard()).collect();
        assert_eq!(control.remaining(), 3);
        assert!(!control.wait_finished(Duration::from_millis(10)).await);
        drop(guards);
        assert!(control.wait_finished(Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn no_workers_is_already_finished() {
        let control = SessionControl::new(0);
        assert!(control.wait_finished(Duration::from_millis(1)).await);
    }

    #[tokio::test]
    async fn paused_wait_resumes() {
        let control = Arc::new(SessionControl::new(1));
        control.pause();
        let mut receiver = control.pause_receiver();
        let token = control.token.clone();
        let waiter = tokio::spawn(async move { wait_while_paused(&mut receiver, &token).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        control.resume();
        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn paused_wait_yields_to_cancellation() {
        let control = Arc::new(SessionControl::new(1));
        control.pause();
        let mut receiver = control.pause_receiver();
        let token = control.token.clone();
        let waiter = tokio::spawn(async move { wait_while_paused(&mut receiver, &token).await });
        control.token.cancel();
        assert!(!waiter.await.unwrap());
    }

    #[tokio::test]
    async fn late_registration_is_aborted() {
        let control = SessionControl::new(1);
        control.abort_all();
        let task = tokio::spawn(std::future::pending::<()>());
        control.register(task.abort_handle());
        assert!(task.await.unwrap_err().is_cancelled());
    }
}
