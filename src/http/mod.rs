mod config;
mod extension;
mod file_writer;
mod filename_utils;
mod info;
mod options;
mod outcome;
mod planner;
mod probe;
mod progress;
mod request_utils;
mod session;
mod setup;
mod worker;

pub use info::HttpDownloadInfo;
pub use outcome::{ChunkError, ChunkFailure, ChunkOutcome, ChunkReport, Outcome};
pub use planner::{ByteRange, ChunkPlan};
pub use progress::{ProgressCounter, ProgressSink};
pub use setup::{ClientRequired, DownloaderSetupBuilder, SetupBuilder};

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use config::DownloadConfig;
use parking_lot::Mutex;
use reqwest::Client;
use session::{CompletionGuard, Session, SessionControl};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use worker::{ChunkTask, WorkerContext};

/// Upper bound on how long aborted workers get to unwind after the grace period.
const ABORT_SETTLE_PERIOD: Duration = Duration::from_millis(500);

/// Fetches one file over several concurrent range requests.
///
/// A downloader holds at most one session. Share it behind an `Arc` to call
/// [`pause`](Self::pause), [`resume`](Self::resume), or [`cancel`](Self::cancel)
/// while [`start`](Self::start) is running on another task.
pub struct Downloader {
    client: Arc<Client>,
    config: DownloadConfig,
    session: Mutex<Session>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    /// Size unknown: one request without a range, streamed until EOF.
    Stream,
    /// Size known but ranges not advertised: one ranged request.
    Single,
    /// Size known and ranges advertised: one request per planned range.
    Split,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Probed,
    Downloading,
    Paused,
    Completed,
    Cancelled,
    Failed,
}

#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("tasks count must be at least 1")]
    InvalidTasksCount,
    #[error("buffer size must be at least 1 byte")]
    InvalidBufferSize,
    #[error("an HTTP client is required")]
    MissingClient,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// `code` is the HTTP status, or `None` when the host could not be reached.
    #[error(
        "connection to {url} failed{}",
        code.map(|code| format!(" with HTTP response code {code}")).unwrap_or_default()
    )]
    Connection { code: Option<u16>, url: String },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("a download is already in progress")]
    SessionActive,
    #[error("initiate must succeed before start")]
    NotProbed,
    #[error("start was called with {given} but the probed URL is {probed}")]
    UrlMismatch { given: String, probed: String },
    #[error("no free file name found for {0}")]
    NameExhausted(String),
}

/// What `start` needs from the probed session, captured under the lock.
struct RunPlan {
    id: Uuid,
    control: Arc<SessionControl>,
    context: WorkerContext,
    tasks: Vec<(ChunkTask, CompletionGuard)>,
}

impl Downloader {
    pub fn setup() -> DownloaderSetupBuilder<ClientRequired> {
        DownloaderSetupBuilder::default()
    }

    /// Probes `url` and prepares a session for it. Returns the resolved file name,
    /// already de-duplicated against the target directory.
    pub async fn initiate(&self, url: &str) -> Result<String, Error> {
        let url = probe::validate_url(url)?;
        if self.session.lock().is_active() {
            return Err(Error::SessionActive);
        }

        let info = probe::probe(&self.client, &url, self.config.timeout).await?;
        let mode = planner::determine_mode(self.config.tasks_count, &info);
        let chunk_count =
            planner::chunk_count(mode, self.config.tasks_count, info.content_length());
        let file_path =
            filename_utils::resolve_duplicate(&self.config.directory, info.filename())?;
        let filename = file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut session = self.session.lock();
        if session.is_active() {
            return Err(Error::SessionActive);
        }
        info!(
            "probed {}: size {:?}, ranges {}, {:?} mode with {} chunk(s), saving to {}",
            url,
            info.content_length(),
            info.accepts_ranges(),
            mode,
            chunk_count,
            file_path.display()
        );
        *session = Session::probed(url, file_path, info, mode, chunk_count);
        Ok(filename)
    }

    /// Runs the probed session to a terminal state. Progress is reported to `sink` as
    /// `(bytes_just_written, total_size)` from every worker concurrently.
    ///
    /// Dropping the returned future aborts the workers and discards the partial file.
    pub async fn start(&self, url: &str, sink: Arc<dyn ProgressSink>) -> Result<Outcome, Error> {
        let url = probe::validate_url(url)?;
        let plan = self.begin(&url, sink)?;
        let mut teardown = Teardown {
            downloader: self,
            id: plan.id,
            armed: true,
        };

        let span = info_span!("session", id = %plan.id);
        let result = self.run(plan).instrument(span).await;
        teardown.armed = false;

        match &result {
            Ok(outcome) => {
                let state = match outcome {
                    Outcome::Completed { .. } => SessionState::Completed,
                    Outcome::Cancelled => SessionState::Cancelled,
                    Outcome::PartialFailure { .. } => SessionState::Failed,
                };
                self.finish(teardown.id, state);
            }
            Err(_) => self.finish(teardown.id, SessionState::Failed),
        }
        result
    }

    fn begin(&self, url: &reqwest::Url, sink: Arc<dyn ProgressSink>) -> Result<RunPlan, Error> {
        let mut session = self.session.lock();
        match session.state {
            SessionState::Probed => {}
            SessionState::Downloading | SessionState::Paused => return Err(Error::SessionActive),
            _ => return Err(Error::NotProbed),
        }
        let (Some(probed), Some(file_path), Some(info), Some(mode)) = (
            session.url.clone(),
            session.file_path.clone(),
            session.info.as_ref(),
            session.mode,
        ) else {
            return Err(Error::NotProbed);
        };
        if probed != *url {
            return Err(Error::UrlMismatch {
                given: url.to_string(),
                probed: probed.to_string(),
            });
        }

        let total = info.content_length();
        let tasks: Vec<ChunkTask> = match (mode, total) {
            (TransferMode::Stream, _) | (_, None) => vec![ChunkTask {
                index: 0,
                range: None,
            }],
            (_, Some(total)) => ChunkPlan::new(total, session.chunk_count)
                .ranges()
                .iter()
                .enumerate()
                .map(|(index, range)| ChunkTask {
                    index,
                    range: Some(*range),
                })
                .collect(),
        };

        // Guards are handed out before any await so an early failure in `run` still
        // releases the countdown that `cancel` waits on.
        let control = Arc::new(SessionControl::new(tasks.len()));
        let tasks = tasks
            .into_iter()
            .map(|task| (task, control.completion_guard()))
            .collect();
        let context = WorkerContext {
            client: Arc::clone(&self.client),
            url: Arc::new(probed),
            file_path: Arc::new(file_path),
            sink,
            total,
            buffer_size: self.config.buffer_size,
            timeout: self.config.timeout,
            token: control.token.clone(),
        };
        session.state = SessionState::Downloading;
        session.cancelled = false;
        session.control = Some(Arc::clone(&control));

        Ok(RunPlan {
            id: session.id,
            control,
            context,
            tasks,
        })
    }

    async fn run(&self, plan: RunPlan) -> Result<Outcome, Error> {
        let RunPlan {
            control,
            context,
            tasks,
            ..
        } = plan;
        let path = Arc::clone(&context.file_path);

        tokio::fs::create_dir_all(&self.config.directory).await?;
        file_writer::preallocate(&path, context.total).await?;
        if control.token.is_cancelled() {
            // `cancel` may already have settled the session and removed the file
            // while it was being created.
            discard_file(&path);
            return Ok(Outcome::Cancelled);
        }
        info!(
            "downloading {} into {} with {} worker(s)",
            context.url,
            path.display(),
            tasks.len()
        );

        let mut workers = JoinSet::new();
        let mut assigned = HashMap::with_capacity(tasks.len());
        for (task, guard) in tasks {
            let chunk = worker::run_chunk(context.clone(), task, control.pause_receiver(), guard);
            let handle = workers.spawn(chunk.in_current_span());
            assigned.insert(handle.id(), task);
            control.register(handle);
        }
        drop(context);

        let mut reports = Vec::with_capacity(assigned.len());
        while let Some(joined) = workers.join_next_with_id().await {
            match joined {
                Ok((_, report)) => reports.push(report),
                Err(e) => {
                    let Some(task) = assigned.get(&e.id()).copied() else {
                        continue;
                    };
                    let outcome = if e.is_panic() {
                        ChunkOutcome::Failed(ChunkError::Panicked)
                    } else {
                        debug!("chunk {} aborted", task.index);
                        ChunkOutcome::Cancelled
                    };
                    reports.push(ChunkReport {
                        index: task.index,
                        range: task.range,
                        written: 0,
                        outcome,
                    });
                }
            }
        }

        let outcome = Outcome::aggregate(reports, control.token.is_cancelled());
        match &outcome {
            Outcome::Completed { bytes } => info!("download completed, {} bytes", bytes),
            Outcome::Cancelled => info!("download cancelled"),
            Outcome::PartialFailure { failed } => warn!(
                "download incomplete, {} chunk(s) failed: {:?}",
                failed.len(),
                failed.iter().map(|f| f.index).collect::<Vec<_>>()
            ),
        }
        Ok(outcome)
    }

    /// Settles the session `id` in its terminal `state`. Anything but `Completed`
    /// discards the output file. Safe to call more than once for the same session.
    fn finish(&self, id: Uuid, state: SessionState) {
        let mut session = self.session.lock();
        if session.id != id || !session.is_active() {
            return;
        }
        if state != SessionState::Completed {
            if let Some(path) = &session.file_path {
                discard_file(path);
            }
        }
        match state {
            SessionState::Cancelled => session.reset_cancelled(),
            state => {
                session.state = state;
                session.control = None;
            }
        }
    }

    pub fn pause(&self) {
        let mut session = self.session.lock();
        if session.state != SessionState::Downloading {
            return;
        }
        if let Some(control) = &session.control {
            control.pause();
        }
        session.state = SessionState::Paused;
        debug!("download paused");
    }

    pub fn resume(&self) {
        let mut session = self.session.lock();
        if session.state != SessionState::Paused {
            return;
        }
        if let Some(control) = &session.control {
            control.resume();
        }
        session.state = SessionState::Downloading;
        debug!("download resumed");
    }

    /// Stops the running session and removes its partial file. Workers get the
    /// configured grace period to stop on their own before they are aborted, so this
    /// returns promptly even if a worker is stuck.
    ///
    /// A no-op while idle or after the session already ended.
    pub async fn cancel(&self) {
        let (id, control) = {
            let mut session = self.session.lock();
            match session.state {
                SessionState::Probed => {
                    debug!("cancelled before start");
                    session.reset_cancelled();
                    return;
                }
                SessionState::Downloading | SessionState::Paused => {}
                _ => return,
            }
            session.cancelled = true;
            (session.id, session.control.clone())
        };

        info!("cancelling download");
        if let Some(control) = control {
            control.token.cancel();
            control.resume();
            if !control.wait_finished(self.config.cancel_grace_period).await {
                warn!(
                    "{} worker(s) still running after {:?}, aborting",
                    control.remaining(),
                    self.config.cancel_grace_period
                );
                control.abort_all();
                if !control.wait_finished(ABORT_SETTLE_PERIOD).await {
                    warn!("{} aborted worker(s) have not unwound yet", control.remaining());
                }
            }
        }
        self.finish(id, SessionState::Cancelled);
    }

    pub fn is_cancelled(&self) -> bool {
        self.session.lock().cancelled
    }

    pub fn is_paused(&self) -> bool {
        self.session.lock().state == SessionState::Paused
    }

    pub fn state(&self) -> SessionState {
        self.session.lock().state
    }

    pub fn file_path(&self) -> Option<PathBuf> {
        self.session.lock().file_path.clone()
    }

    pub fn info(&self) -> Option<HttpDownloadInfo> {
        self.session.lock().info.clone()
    }

    pub fn content_length(&self) -> Option<u64> {
        self.session
            .lock()
            .info
            .as_ref()
            .and_then(HttpDownloadInfo::content_length)
    }

    pub fn chunk_count(&self) -> u64 {
        self.session.lock().chunk_count
    }

    pub fn mode(&self) -> Option<TransferMode> {
        self.session.lock().mode
    }
}

/// Settles the session as cancelled if `start` is dropped before it finishes.
struct Teardown<'a> {
    downloader: &'a Downloader,
    id: Uuid,
    armed: bool,
}

impl Drop for Teardown<'_> {
    fn drop(&mut self) {
        if self.armed {
            if let Some(control) = self.downloader.session.lock().control.as_ref() {
                control.token.cancel();
            }
            self.downloader.finish(self.id, SessionState::Cancelled);
        }
    }
}

fn discard_file(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("could not remove {}: {}", path.display(), e),
    }
}
