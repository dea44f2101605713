use std::{path::PathBuf, sync::Arc, time::Duration};

use reqwest::{Client, StatusCode, Url};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use super::{
    file_writer::FileWriter,
    outcome::{ChunkError, ChunkOutcome, ChunkReport},
    planner::ByteRange,
    progress::ProgressSink,
    request_utils::RequestBuilderExt,
    session::{self, CompletionGuard},
};

/// One worker's assignment. A `None` range streams the whole body from offset 0.
#[derive(Debug, Clone, Copy)]
pub(super) struct ChunkTask {
    pub(super) index: usize,
    pub(super) range: Option<ByteRange>,
}

/// Everything a worker shares with its siblings.
#[derive(Clone)]
pub(super) struct WorkerContext {
    pub(super) client: Arc<Client>,
    pub(super) url: Arc<Url>,
    pub(super) file_path: Arc<PathBuf>,
    pub(super) sink: Arc<dyn ProgressSink>,
    pub(super) total: Option<u64>,
    pub(super) buffer_size: usize,
    pub(super) timeout: Option<Duration>,
    pub(super) token: CancellationToken,
}

enum Flow {
    Done,
    Cancelled,
}

pub(super) async fn run_chunk(
    context: WorkerContext,
    task: ChunkTask,
    mut paused: watch::Receiver<bool>,
    guard: CompletionGuard,
) -> ChunkReport {
    let _guard = guard;
    let mut written = 0;
    let label = task.range.map_or_else(|| String::from("whole body"), |r| r.to_string());
    debug!("chunk {} ({}) started", task.index, label);

    let outcome = match transfer(&context, task, &mut paused, &mut written).await {
        Ok(Flow::Done) => {
            debug!("chunk {} ({}) finished, {} bytes", task.index, label, written);
            ChunkOutcome::Finished
        }
        Ok(Flow::Cancelled) => {
            debug!(
                "chunk {} ({}) stopped by cancellation after {} bytes",
                task.index, label, written
            );
            ChunkOutcome::Cancelled
        }
        Err(e) if context.token.is_cancelled() => {
            debug!("chunk {} ({}) error during cancellation: {}", task.index, label, e);
            ChunkOutcome::Cancelled
        }
        Err(e) => {
            error!("chunk {} ({}) failed after {} bytes: {}", task.index, label, written, e);
            ChunkOutcome::Failed(e)
        }
    };

    ChunkReport {
        index: task.index,
        range: task.range,
        written,
        outcome,
    }
}

async fn transfer(
    context: &WorkerContext,
    task: ChunkTask,
    paused: &mut watch::Receiver<bool>,
    written: &mut u64,
) -> Result<Flow, ChunkError> {
    let token = &context.token;
    if token.is_cancelled() {
        return Ok(Flow::Cancelled);
    }

    let offset = task.range.map_or(0, |range| range.start);
    let expected = task.range.map(|range| range.len());
    let mut writer = FileWriter::open_at(&context.file_path, offset).await?;

    let request = context
        .client
        .get(context.url.as_str())
        .with_range(task.range)
        .with_optional_timeout(context.timeout);

    let mut response = tokio::select! {
        _ = token.cancelled() => return Ok(Flow::Cancelled),
        response = request.send() => response?,
    };

    let status = response.status();
    if status != StatusCode::OK && status != StatusCode::PARTIAL_CONTENT {
        return Err(ChunkError::Status(status.as_u16()));
    }

    loop {
        let chunk = tokio::select! {
            _ = token.cancelled() => return Ok(Flow::Cancelled),
            chunk = response.chunk() => chunk?,
        };
        let Some(mut chunk) = chunk else {
            break;
        };

        while !chunk.is_empty() {
            let buffer = chunk.split_to(chunk.len().min(context.buffer_size));
            let len = buffer.len() as u64;
            if let Some(expected) = expected {
                if *written + len > expected {
                    return Err(ChunkError::Overrun { expected });
                }
            }
            if !session::wait_while_paused(paused, token).await {
                return Ok(Flow::Cancelled);
            }
            writer.write(buffer).await?;
            *written += len;
            context.sink.on_progress(len, context.total);
        }
    }

    writer.finish().await?;
    match expected {
        Some(expected) if *written < expected => Err(ChunkError::Incomplete {
            expected,
            received: *written,
        }),
        _ => Ok(Flow::Done),
    }
}
