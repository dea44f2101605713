//! # SplitFetch
//!
//! `SplitFetch` downloads a single file over HTTP(S) by splitting it into concurrent
//! byte-range requests that write straight into their offsets of a preallocated file.
//!
//! ```no_run
//! use std::sync::Arc;
//! use splitfetch::{Downloader, Outcome, ProgressCounter};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = Arc::new(
//!     Downloader::setup()
//!         .client(reqwest::Client::new())
//!         .directory("downloads")
//!         .build()?,
//! );
//! let url = "https://example.com/archive.zip";
//! let filename = downloader.initiate(url).await?;
//! let progress = Arc::new(ProgressCounter::new());
//! match downloader.start(url, progress.clone()).await? {
//!     Outcome::Completed { bytes } => println!("{filename}: {bytes} bytes"),
//!     Outcome::Cancelled => println!("{filename}: cancelled"),
//!     Outcome::PartialFailure { failed } => {
//!         println!("{filename}: {} chunk(s) failed", failed.len())
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # 💡 Tips
//!
//! **⚠️ Avoid Native TLS Memory Leaks**
//!
//! To prevent potential memory leaks, configure `reqwest` to use the **rustls-tls** backend.
//! This issue originates from native TLS behavior, not from this crate itself.
//!
//! ```toml
//! reqwest = { version = "VERSION", default-features = false, features = ["rustls-tls"] }
//! ```
mod http;
pub use http::{
    BuilderError, ByteRange, ChunkError, ChunkFailure, ChunkOutcome, ChunkPlan, ChunkReport,
    ClientRequired, Downloader, DownloaderSetupBuilder, Error, HttpDownloadInfo, Outcome,
    ProgressCounter, ProgressSink, SessionState, SetupBuilder, TransferMode,
};
