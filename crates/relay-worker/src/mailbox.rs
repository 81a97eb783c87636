//! Write mailbox — the one path onto a chat connection's socket.
//!
//! Any number of producers queue lines; a single consumer writes them
//! in arrival order, each followed by `\r\n`, and tells the producer how
//! it went. Empty lines are acknowledged without touching the socket.
//!
//! ```text
//! Do() ─┐
//! reply ─┼─► Mailbox ──► MailboxReceiver::drain ──► LineSink ──► socket
//! JOIN ─┘     (unbounded)        │
//!                                └─► completion per line
//! ```
//!
//! On shutdown the consumer closes the queue, writes whatever was
//! already in it, and returns `WorkerError::Stopped`. Producers that
//! queue after that get `Stopped` back immediately.

use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{trace, warn};

use crate::error::{WorkerError, WorkerResult};
use crate::stop_requested;

struct Envelope {
    line: String,
    done: Option<oneshot::Sender<WorkerResult<()>>>,
}

/// Producer handle. Clone freely.
#[derive(Clone)]
pub struct Mailbox {
    tx: mpsc::UnboundedSender<Envelope>,
}

/// Consumer half. Exactly one exists per mailbox.
pub struct MailboxReceiver {
    rx: mpsc::UnboundedReceiver<Envelope>,
}

/// Create a connected producer/consumer pair.
pub fn mailbox() -> (Mailbox, MailboxReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Mailbox { tx }, MailboxReceiver { rx })
}

impl Mailbox {
    /// Queue `line` and wait until it has been written (or skipped, if empty).
    pub async fn send(&self, line: impl Into<String>) -> WorkerResult<()> {
        let (done, rx) = oneshot::channel();
        self.tx
            .send(Envelope {
                line: line.into(),
                done: Some(done),
            })
            .map_err(|_| WorkerError::Stopped)?;
        // The consumer dropping the envelope unanswered means it stopped.
        rx.await.unwrap_or(Err(WorkerError::Stopped))
    }

    /// Queue `line` without waiting for the write.
    pub fn post(&self, line: impl Into<String>) -> WorkerResult<()> {
        self.tx
            .send(Envelope {
                line: line.into(),
                done: None,
            })
            .map_err(|_| WorkerError::Stopped)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Buffered writer that terminates and flushes every line.
pub struct LineSink<W> {
    inner: BufWriter<W>,
}

impl<W: AsyncWrite + Unpin> LineSink<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: BufWriter::new(inner),
        }
    }

    /// Write `line` plus `\r\n` and flush.
    pub async fn write_line(&mut self, line: &str) -> std::io::Result<()> {
        self.inner.write_all(line.as_bytes()).await?;
        self.inner.write_all(b"\r\n").await?;
        self.inner.flush().await
    }
}

impl MailboxReceiver {
    /// Write queued lines to `sink` until `shutdown` fires.
    ///
    /// Always returns `Stopped`; write failures go to the producer of
    /// the failing line and do not end the loop.
    pub async fn drain<W: AsyncWrite + Unpin>(
        mut self,
        sink: &mut LineSink<W>,
        mut shutdown: watch::Receiver<bool>,
    ) -> WorkerError {
        loop {
            tokio::select! {
                biased;
                _ = stop_requested(&mut shutdown) => break,
                envelope = self.rx.recv() => match envelope {
                    Some(envelope) => deliver(sink, envelope).await,
                    None => break,
                },
            }
        }

        self.rx.close();
        while let Some(envelope) = self.rx.recv().await {
            deliver(sink, envelope).await;
        }
        WorkerError::Stopped
    }
}

async fn deliver<W: AsyncWrite + Unpin>(sink: &mut LineSink<W>, envelope: Envelope) {
    let result = if envelope.line.is_empty() {
        Ok(())
    } else {
        trace!(line = %envelope.line, "write");
        sink.write_line(&envelope.line)
            .await
            .map_err(WorkerError::Write)
    };

    if let Err(e) = &result {
        warn!(error = %e, "line write failed");
    }
    if let Some(done) = envelope.done {
        let _ = done.send(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn lines_are_terminated_and_ordered() {
        let (mailbox, inbox) = mailbox();
        let (_stop_tx, stop_rx) = watch::channel(false);
        let (client, mut server) = tokio::io::duplex(1024);

        tokio::spawn(async move {
            let mut sink = LineSink::new(client);
            inbox.drain(&mut sink, stop_rx).await
        });

        mailbox.send("PRIVMSG #a :one").await.unwrap();
        mailbox.send("PRIVMSG #a :two").await.unwrap();

        let expected = b"PRIVMSG #a :one\r\nPRIVMSG #a :two\r\n";
        let mut buf = vec![0u8; expected.len()];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, expected);
    }

    #[tokio::test]
    async fn empty_line_is_acknowledged_without_bytes() {
        let (mailbox, inbox) = mailbox();
        let (_stop_tx, stop_rx) = watch::channel(false);
        let (client, mut server) = tokio::io::duplex(1024);

        tokio::spawn(async move {
            let mut sink = LineSink::new(client);
            inbox.drain(&mut sink, stop_rx).await
        });

        mailbox.send("").await.unwrap();
        mailbox.send("X").await.unwrap();

        let mut buf = [0u8; 3];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"X\r\n");
    }

    #[tokio::test]
    async fn shutdown_drains_queued_lines_then_refuses() {
        let (mailbox, inbox) = mailbox();
        let (stop_tx, stop_rx) = watch::channel(false);
        let (client, mut server) = tokio::io::duplex(1024);

        // Queue before the consumer starts, then signal stop.
        mailbox.post("A").unwrap();
        mailbox.post("B").unwrap();
        stop_tx.send(true).unwrap();

        let mut sink = LineSink::new(client);
        let err = inbox.drain(&mut sink, stop_rx).await;
        assert!(matches!(err, WorkerError::Stopped));
        drop(sink);

        let mut out = String::new();
        server.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "A\r\nB\r\n");

        assert!(mailbox.is_closed());
        assert!(matches!(mailbox.send("C").await, Err(WorkerError::Stopped)));
        assert!(matches!(mailbox.post("C"), Err(WorkerError::Stopped)));
    }

    #[tokio::test]
    async fn write_failure_goes_to_the_sender() {
        let (mailbox, inbox) = mailbox();
        let (_stop_tx, stop_rx) = watch::channel(false);
        let (client, server) = tokio::io::duplex(64);
        drop(server);

        tokio::spawn(async move {
            let mut sink = LineSink::new(client);
            inbox.drain(&mut sink, stop_rx).await
        });

        let err = mailbox.send("PRIVMSG #a :lost").await.unwrap_err();
        assert!(matches!(err, WorkerError::Write(_)));

        // The consumer is still alive for the next line.
        assert!(!mailbox.is_closed());
        let again = tokio::time::timeout(Duration::from_secs(1), mailbox.send(""))
            .await
            .unwrap();
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn dropped_consumer_reports_stopped() {
        let (mailbox, inbox) = mailbox();
        drop(inbox);
        assert!(matches!(mailbox.send("x").await, Err(WorkerError::Stopped)));
    }
}
