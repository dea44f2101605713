use std::{marker::PhantomData, path::PathBuf, sync::Arc, time::Duration};

use parking_lot::Mutex;
use reqwest::Client;

use super::{
    BuilderError, Downloader, config::DownloadConfig, options::DownloadOptions, session::Session,
};

pub struct ClientRequired;
pub struct SetupBuilder;

pub struct DownloaderSetupBuilder<State = SetupBuilder> {
    client: Option<Client>,
    state: PhantomData<State>,
    options: DownloadOptions,
}

impl DownloaderSetupBuilder<ClientRequired> {
    pub fn client(self, client: Client) -> DownloaderSetupBuilder<SetupBuilder> {
        DownloaderSetupBuilder {
            client: Some(client),
            state: PhantomData::<SetupBuilder>,
            options: self.options,
        }
    }
}

impl DownloaderSetupBuilder {
    pub(super) fn default() -> DownloaderSetupBuilder<ClientRequired> {
        DownloaderSetupBuilder::<ClientRequired> {
            client: None,
            state: PhantomData::<ClientRequired>,
            options: DownloadOptions::default(),
        }
    }

    /// Number of concurrent range requests used when the server advertises
    /// `Accept-Ranges: bytes`. Defaults to 8.
    pub fn tasks_count(mut self, count: u8) -> Self {
        self.options.tasks_count = Some(count);
        self
    }

    /// Directory the output file is resolved against. Defaults to `downloads`.
    pub fn directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.directory = Some(path.into());
        self
    }

    /// Upper bound on a single buffer write. Defaults to 8 KiB.
    pub fn buffer_size(mut self, bytes: usize) -> Self {
        self.options.buffer_size = Some(bytes);
        self
    }

    /// How long `cancel` waits for workers before aborting them. Defaults to 5 seconds.
    pub fn cancel_grace_period(mut self, grace_period: Duration) -> Self {
        self.options.cancel_grace_period = Some(grace_period);
        self
    }

    /// Per-request timeout. None by default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    fn generate_config(&mut self) -> Result<DownloadConfig, BuilderError> {
        Ok(DownloadConfig::default()
            .try_set_tasks_count(self.options.tasks_count)?
            .try_set_buffer_size(self.options.buffer_size)?
            .set_directory(self.options.directory.take())
            .set_cancel_grace_period(self.options.cancel_grace_period)
            .set_timeout(self.options.timeout))
    }

    pub fn build(mut self) -> Result<Downloader, BuilderError> {
        let config = self.generate_config()?;
        let client = self.client.ok_or(BuilderError::MissingClient)?;
        Ok(Downloader {
            client: Arc::new(client),
            config,
            session: Mutex::new(Session::idle()),
        })
    }
}
