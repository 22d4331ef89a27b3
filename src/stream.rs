//! Stream of lines produced by a background task that owns a [`TailReader`].

use crate::error::Result;
use crate::reader::TailReader;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::debug;

/// A stream that yields each line of a followed file.
///
/// The stream ends after forwarding a terminal error such as
/// [`Error::EndOfStream`](crate::Error::EndOfStream).
pub struct TailStream {
    receiver: mpsc::UnboundedReceiver<Result<String>>,
    _shutdown_tx: broadcast::Sender<()>,
    _task_handle: JoinHandle<()>,
}

impl TailStream {
    /// Moves `reader` into a background task and streams its lines.
    pub fn new(reader: TailReader) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task_handle = tokio::spawn(tail_task(reader, tx, shutdown_rx));

        TailStream {
            receiver: rx,
            _shutdown_tx: shutdown_tx,
            _task_handle: task_handle,
        }
    }

    /// Check if the background task has stopped sending
    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.receiver.is_closed()
    }
}

impl Drop for TailStream {
    fn drop(&mut self) {
        // Ignore errors if the task already exited
        let _ = self._shutdown_tx.send(());
    }
}

/// Background task that reads lines until shutdown, a terminal error, or a dropped receiver
async fn tail_task(
    mut reader: TailReader,
    tx: mpsc::UnboundedSender<Result<String>>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                debug!(path = %reader.path().display(), "tail stream shut down");
                break;
            }

            line = reader.next_line() => {
                let stop = match &line {
                    Ok(_) => false,
                    Err(e) => e.is_terminal() || matches!(e, crate::Error::Io(_)),
                };
                if tx.send(line).is_err() || stop {
                    break;
                }
            }
        }
    }

    reader.close();
}

impl Stream for TailStream {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_recv(cx)
    }
}
