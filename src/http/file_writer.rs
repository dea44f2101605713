use std::{io::SeekFrom, path::Path};

use bytes::Bytes;
use tokio::{
    fs::{File, OpenOptions},
    io::{AsyncSeekExt, AsyncWriteExt},
};

/// Creates (or truncates) the output file and sizes it to `length` bytes when known.
pub(super) async fn preallocate(path: &Path, length: Option<u64>) -> Result<(), std::io::Error> {
    let file = File::create(path).await?;
    if let Some(length) = length {
        file.set_len(length).await?;
    }
    Ok(())
}

/// A worker's own handle on the shared output file. Writes are sequential from the
/// position the writer was opened at.
pub(super) struct FileWriter {
    file: File,
}

impl FileWriter {
    pub(super) async fn open_at(path: &Path, offset: u64) -> Result<Self, std::io::Error> {
        let mut file = OpenOptions::new().write(true).open(path).await?;
        file.seek(SeekFrom::Start(offset)).await?;
        Ok(Self { file })
    }

    pub(super) async fn write(&mut self, buffer: Bytes) -> Result<(), std::io::Error> {
        self.file.write_all(&buffer).await
    }

    /// Flushes pending writes; tokio files buffer writes on a background thread.
    pub(super) async fn finish(mut self) -> Result<(), std::io::Error> {
        self.file.flush().await
    }
}
