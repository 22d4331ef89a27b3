//! A log tail library that follows a growing file line by line.
//!
//! The reader polls file metadata to tell apart a file that grew, a file that was replaced by a
//! new one under the same name (rotation), a file truncated in place, and a file that
//! disappeared. Lines come out complete and in file order across all of these.
//!
//! # Example
//!
//! ```rust,no_run
//! use log_tail::{TailConfig, follow};
//! use tokio_stream::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut stream = follow("app.log", TailConfig::default()).await?;
//!
//!     while let Some(line) = stream.next().await {
//!         match line {
//!             Ok(content) => println!("{}", content),
//!             Err(e) => eprintln!("Error: {}", e),
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod file_id;
mod reader;
mod stream;
mod watcher;

#[cfg(test)]
mod test_helpers;

// Public API exports
pub use config::{TailConfig, TruncationPolicy, WatchMode};
pub use error::{Error, Result};
pub use file_id::FileId;
pub use reader::TailReader;
pub use stream::TailStream;

use std::path::Path;

/// Follows a file from its beginning and streams its lines.
///
/// Open, seek and configuration errors are returned here rather than through the stream.
///
/// # Example
///
/// ```rust,no_run
/// use log_tail::{TailConfig, follow};
/// use std::time::Duration;
/// use tokio_stream::StreamExt;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = TailConfig::default().with_poll_interval(Duration::from_millis(250));
///     let mut stream = follow("app.log", config).await?;
///
///     while let Some(line) = stream.next().await {
///         println!("{}", line?);
///     }
///
///     Ok(())
/// }
/// ```
pub async fn follow<P: AsRef<Path>>(path: P, config: TailConfig) -> Result<TailStream> {
    follow_from(path, 0, config).await
}

/// Like [`follow`], starting at a byte offset saved from [`TailReader::offset`].
pub async fn follow_from<P: AsRef<Path>>(
    path: P,
    offset: u64,
    config: TailConfig,
) -> Result<TailStream> {
    let reader = TailReader::open(path, offset, config).await?;
    Ok(TailStream::new(reader))
}
