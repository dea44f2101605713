use std::{path::PathBuf, time::Duration};

pub(super) struct DownloadOptions {
    pub(super) tasks_count: Option<u8>,
    pub(super) buffer_size: Option<usize>,
    pub(super) directory: Option<PathBuf>,
    pub(super) cancel_grace_period: Option<Duration>,
    pub(super) timeout: Option<Duration>,
}

impl DownloadOptions {
    pub(super) fn default() -> Self {
        Self {
            tasks_count: None,
            buffer_size: None,
            directory: None,
            cancel_grace_period: None,
            timeout: None,
        }
    }
}
