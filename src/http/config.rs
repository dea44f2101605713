use std::{path::PathBuf, time::Duration};

use super::BuilderError;

const DEFAULT_TASKS_COUNT: u8 = 8;
const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;
const DEFAULT_DIRECTORY: &str = "downloads";
const DEFAULT_CANCEL_GRACE_PERIOD: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub(super) struct DownloadConfig {
    pub(super) tasks_count: u8,
    pub(super) directory: PathBuf,
    pub(super) buffer_size: usize,
    pub(super) cancel_grace_period: Duration,
    pub(super) timeout: Option<Duration>,
}

impl DownloadConfig {
    pub(super) fn default() -> Self {
        Self {
            tasks_count: DEFAULT_TASKS_COUNT,
            directory: PathBuf::from(DEFAULT_DIRECTORY),
            buffer_size: DEFAULT_BUFFER_SIZE,
            cancel_grace_period: DEFAULT_CANCEL_GRACE_PERIOD,
            timeout: None,
        }
    }

    pub(super) fn try_set_tasks_count(
        mut self,
        tasks_count: Option<u8>,
    ) -> Result<Self, BuilderError> {
        if let Some(count) = tasks_count {
            if count == 0 {
                return Err(BuilderError::InvalidTasksCount);
            }
            self.tasks_count = count;
        }
        Ok(self)
    }

    pub(super) fn try_set_buffer_size(
        mut self,
        buffer_size: Option<usize>,
    ) -> Result<Self, BuilderError> {
        if let Some(size) = buffer_size {
            if size == 0 {
                return Err(BuilderError::InvalidBufferSize);
            }
            self.buffer_size = size;
        }
        Ok(self)
    }

    pub(super) fn set_directory(mut self, directory: Option<PathBuf>) -> Self {
        if let Some(directory) = directory {
            self.directory = directory;
        }
        self
    }

    pub(super) fn set_cancel_grace_period(mut self, grace_period: Option<Duration>) -> Self {
        if let Some(grace_period) = grace_period {
            self.cancel_grace_period = grace_period;
        }
        self
    }

    pub(super) fn set_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}
