//! Line reader for a file that keeps growing and may be rotated, truncated or deleted.

use crate::config::{TailConfig, TruncationPolicy};
use crate::error::{Error, Result};
use crate::file_id::{FileId, FileSnapshot};
use crate::watcher::ChangeWaker;
use std::io::{self, ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// What a metadata check says about the followed path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Grew,
    Truncated,
    Replaced,
    Unchanged,
}

/// Compares two snapshots of the followed path. Identity wins over size.
fn classify(previous: &FileSnapshot, current: &FileSnapshot) -> Change {
    if !previous.same_file(current) {
        Change::Replaced
    } else if current.len < previous.len {
        Change::Truncated
    } else if current.len > previous.len {
        Change::Grew
    } else {
        Change::Unchanged
    }
}

/// Opens `path` for reading, refusing directories.
async fn open_regular(path: &Path) -> io::Result<(File, std::fs::Metadata)> {
    let file = File::open(path).await?;
    let metadata = file.metadata().await?;
    if metadata.is_dir() {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            "path is a directory, not a file",
        ));
    }
    Ok((file, metadata))
}

/// Length of the file behind an open handle, which may no longer be reachable by path.
async fn handle_len(reader: &BufReader<File>) -> Option<u64> {
    reader.get_ref().metadata().await.ok().map(|metadata| metadata.len())
}

fn unavailable(ended: bool, path: &Path) -> Error {
    if ended {
        Error::EndOfStream {
            path: path.to_path_buf(),
        }
    } else {
        Error::Closed
    }
}

/// Follows one file by path and hands out complete lines in file order.
///
/// Lines keep flowing across rotation (the path now names a different file), in-place
/// truncation and short deletions. Once the path has been unreachable for longer than the
/// stale timeout the reader releases its handle and every later read fails with
/// [`Error::EndOfStream`].
///
/// A reader is meant to be owned by one task; see [`TailStream`](crate::TailStream) for a
/// ready-made owner that publishes lines over a channel.
///
/// # Cancellation
///
/// Dropping a pending [`next_line`](Self::next_line) future loses nothing: bytes of an
/// unterminated line stay in the reader and are completed by the next call.
pub struct TailReader {
    path: PathBuf,
    config: TailConfig,
    reader: Option<BufReader<File>>,
    snapshot: FileSnapshot,
    /// Position in the current file just past the last delivered line.
    delivered: u64,
    /// Unterminated line bytes, never containing a newline between calls.
    partial: Vec<u8>,
    /// Leading bytes of `partial` that came from a file we have since switched away from.
    carried: usize,
    /// The handle must be rewound to 0 before the next read.
    rewind_pending: bool,
    /// The path was reported missing since the last reopen.
    path_vanished: bool,
    /// Last time the path was known to be reachable while waiting; survives cancelled reads.
    last_seen: Option<Instant>,
    ended: bool,
    waker: ChangeWaker,
}

impl TailReader {
    /// Opens `path` and positions the reader at `offset` (0 reads from the beginning).
    ///
    /// The configuration is validated before the file is touched.
    pub async fn open<P: AsRef<Path>>(path: P, offset: u64, config: TailConfig) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref().to_path_buf();

        if config.stale_timeout_too_short() {
            warn!(
                path = %path.display(),
                poll_interval = ?config.poll_interval,
                stale_timeout = ?config.stale_timeout,
                "stale timeout does not exceed the poll interval; a recreated file may be reported as deleted"
            );
        }

        let open_error = |source| Error::Open {
            path: path.clone(),
            source,
        };
        let (mut file, metadata) = open_regular(&path).await.map_err(open_error)?;
        let snapshot = FileSnapshot::from_metadata(&metadata);

        if offset != 0 {
            let seek_error = |source| Error::Seek {
                path: path.clone(),
                offset,
                source,
            };
            if offset > snapshot.len {
                return Err(seek_error(io::Error::new(
                    ErrorKind::InvalidInput,
                    format!("offset is past the end of the file ({} bytes)", snapshot.len),
                )));
            }
            file.seek(SeekFrom::Start(offset))
                .await
                .map_err(seek_error)?;
        }

        let waker = ChangeWaker::for_mode(config.watch_mode, &path)?;

        debug!(
            path = %path.display(),
            offset,
            file_id = %snapshot.id,
            len = snapshot.len,
            "opened file for tailing"
        );

        Ok(Self {
            path,
            config,
            reader: Some(BufReader::new(file)),
            snapshot,
            delivered: offset,
            partial: Vec::new(),
            carried: 0,
            rewind_pending: false,
            path_vanished: false,
            last_seen: None,
            ended: false,
            waker,
        })
    }

    /// Returns the next complete line with its trailing `\n` removed, decoded as UTF-8.
    ///
    /// A line that is not valid UTF-8 is consumed and reported as [`Error::Utf8`]; the reader
    /// stays usable.
    pub async fn next_line(&mut self) -> Result<String> {
        let bytes = self.next_line_bytes().await?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Returns the next complete line with its trailing `\n` removed, as raw bytes.
    ///
    /// Waits for the file to change when no complete line is available.
    pub async fn next_line_bytes(&mut self) -> Result<Vec<u8>> {
        loop {
            let reader = self
                .reader
                .as_mut()
                .ok_or_else(|| unavailable(self.ended, &self.path))?;

            if self.rewind_pending {
                reader.seek(SeekFrom::Start(0)).await?;
                self.rewind_pending = false;
            }

            reader.read_until(b'\n', &mut self.partial).await?;

            if self.partial.last() == Some(&b'\n') {
                self.delivered += (self.partial.len() - self.carried) as u64;
                self.carried = 0;
                self.last_seen = None;
                let mut line = std::mem::take(&mut self.partial);
                line.pop();
                return Ok(line);
            }

            self.wait_for_changes().await?;
        }
    }

    /// Byte offset in the current file just past the last delivered line.
    ///
    /// Passing it back to [`open`](Self::open) resumes with the next undelivered line, as long
    /// as the file has not been rotated or truncated in between.
    pub fn offset(&self) -> Result<u64> {
        if self.reader.is_none() {
            return Err(unavailable(self.ended, &self.path));
        }
        Ok(self.delivered)
    }

    /// Releases the file handle. Safe to call any number of times.
    pub fn close(&mut self) {
        if self.reader.take().is_some() {
            debug!(path = %self.path.display(), "closed tail reader");
        }
        self.partial.clear();
        self.carried = 0;
    }

    /// True once the handle has been released by `close` or by the stale timeout.
    pub fn is_closed(&self) -> bool {
        self.reader.is_none()
    }

    /// The path being followed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The validated configuration this reader was opened with.
    pub fn config(&self) -> &TailConfig {
        &self.config
    }

    /// Identity of the file currently open; changes after a rotation is followed.
    pub fn identity(&self) -> FileId {
        self.snapshot.id
    }

    /// Bytes consumed from the current handle.
    fn consumed(&self) -> u64 {
        self.delivered + (self.partial.len() - self.carried) as u64
    }

    /// Polls the path until there is something new to read.
    async fn wait_for_changes(&mut self) -> Result<()> {
        // The last read hit end of data, so everything the handle holds has been consumed.
        self.snapshot.len = self.consumed();
        // Kept from an earlier, cancelled wait so the stale clock keeps running.
        self.last_seen.get_or_insert_with(Instant::now);

        loop {
            self.waker.wait(self.config.poll_interval).await;

            let metadata = match tokio::fs::metadata(&self.path).await {
                Ok(metadata) => metadata,
                Err(e) => {
                    if e.kind() == ErrorKind::NotFound {
                        self.path_vanished = true;
                    }
                    warn!(path = %self.path.display(), error = %e, "failed to stat file");

                    let last_seen = *self.last_seen.get_or_insert_with(Instant::now);
                    if last_seen.elapsed() > self.config.stale_timeout {
                        warn!(
                            path = %self.path.display(),
                            stale_timeout = ?self.config.stale_timeout,
                            "file unavailable past the stale timeout, giving up"
                        );
                        self.end();
                        return Err(unavailable(true, &self.path));
                    }
                    continue;
                }
            };
            self.last_seen = Some(Instant::now());

            let current = FileSnapshot::from_metadata(&metadata);
            // A path that went missing names a new file now, whatever its identity says.
            let change = if self.path_vanished {
                Change::Replaced
            } else {
                classify(&self.snapshot, &current)
            };

            match change {
                Change::Unchanged => {}
                Change::Grew => {
                    debug!(
                        path = %self.path.display(),
                        from = self.snapshot.len,
                        to = current.len,
                        "file grew"
                    );
                    self.snapshot = current;
                    return Ok(());
                }
                Change::Truncated => {
                    info!(
                        path = %self.path.display(),
                        from = self.snapshot.len,
                        to = current.len,
                        "file was truncated"
                    );
                    self.reset_cursor();
                    self.rewind_pending = true;
                    self.snapshot = current;
                    return Ok(());
                }
                Change::Replaced => {
                    let consumed = self.consumed();
                    let unread = match self.reader.as_ref() {
                        Some(reader) => handle_len(reader).await.is_some_and(|len| len > consumed),
                        None => false,
                    };
                    if unread {
                        debug!(path = %self.path.display(), "draining replaced file before reopening");
                        return Ok(());
                    }
                    match self.reopen().await {
                        Ok(()) => return Ok(()),
                        // The writer may still be creating the replacement.
                        Err(e) => {
                            warn!(path = %self.path.display(), error = %e, "failed to reopen file");
                        }
                    }
                }
            }
        }
    }

    async fn reopen(&mut self) -> Result<()> {
        let (file, metadata) = open_regular(&self.path).await?;
        let snapshot = FileSnapshot::from_metadata(&metadata);

        info!(
            path = %self.path.display(),
            old_id = %self.snapshot.id,
            new_id = %snapshot.id,
            "file was replaced, reopening"
        );

        // Dropping the previous reader releases the old handle.
        self.reader = Some(BufReader::new(file));
        self.snapshot = snapshot;
        self.rewind_pending = false;
        self.path_vanished = false;
        self.last_seen = None;
        self.carried = self.partial.len();
        self.delivered = 0;
        Ok(())
    }

    /// Moves the cursor to the start of the same file, applying the truncation policy.
    fn reset_cursor(&mut self) {
        match self.config.truncation {
            TruncationPolicy::PreservePartial => self.carried = self.partial.len(),
            TruncationPolicy::DiscardPartial => {
                if !self.partial.is_empty() {
                    debug!(
                        path = %self.path.display(),
                        bytes = self.partial.len(),
                        "discarding partial line after truncation"
                    );
                }
                self.partial.clear();
                self.carried = 0;
            }
        }
        self.delivered = 0;
    }

    fn end(&mut self) {
        self.reader = None;
        self.ended = true;
        self.partial.clear();
        self.carried = 0;
    }
}
