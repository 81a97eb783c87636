//! Inbound line pump.
//!
//! Reads the chat socket line by line and hands every non-empty line to
//! the application peer on its own task, so a slow peer never stalls
//! the socket. Whatever the peer answers is queued on the mailbox.
//!
//! Read outcomes:
//! - a line: dispatched (or dropped if over the size limit)
//! - end of stream: `ConnectionClosed`, fatal
//! - would-block / timed-out / interrupted: sleep one read interval, retry
//!   (a partly read line is kept and completed by the next read)
//! - any other I/O error: fatal
//!
//! A line never holds more than `message_limit` bytes plus its line
//! ending in memory; the rest of an oversized line is skipped as it
//! arrives.

use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::connection::ConnectionSettings;
use crate::error::WorkerError;
use crate::mailbox::Mailbox;
use crate::peer::ApplicationPeer;
use crate::stop_requested;

pub struct InboundPump {
    peer: Arc<dyn ApplicationPeer>,
    mailbox: Mailbox,
    shutdown: watch::Receiver<bool>,
    read_interval: Duration,
    message_limit: usize,
}

impl InboundPump {
    pub fn new(
        settings: &ConnectionSettings,
        peer: Arc<dyn ApplicationPeer>,
        mailbox: Mailbox,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            peer,
            mailbox,
            shutdown,
            read_interval: settings.read_interval,
            message_limit: settings.message_limit,
        }
    }

    /// Pump `source` until it fails or shutdown fires. Never returns `Ok`.
    pub async fn run<R: AsyncRead + Unpin>(mut self, source: R) -> WorkerError {
        let mut reader = BufReader::new(source);
        let mut line = LineBuffer::new(self.message_limit);

        loop {
            let read = tokio::select! {
                biased;
                _ = stop_requested(&mut self.shutdown) => return WorkerError::Stopped,
                read = line.read_from(&mut reader) => read,
            };

            match read {
                Ok(false) => {
                    debug!("chat server closed the connection");
                    return WorkerError::ConnectionClosed;
                }
                Ok(true) => {
                    self.dispatch(&line);
                    line.clear();
                }
                Err(e) if is_transient(&e) => {
                    trace!(error = %e, "nothing to read yet");
                    tokio::select! {
                        biased;
                        _ = stop_requested(&mut self.shutdown) => return WorkerError::Stopped,
                        _ = tokio::time::sleep(self.read_interval) => {}
                    }
                }
                Err(e) => {
                    warn!(error = %e, "chat read failed");
                    return WorkerError::Io(e);
                }
            }
        }
    }

    fn dispatch(&self, line: &LineBuffer) {
        if line.overflowed {
            warn!(
                len = line.seen,
                limit = self.message_limit,
                "dropping oversized inbound line"
            );
            return;
        }

        let text = String::from_utf8_lossy(&line.bytes);
        let text = text.trim_end_matches(['\r', '\n']);
        if text.is_empty() {
            return;
        }
        if text.len() > self.message_limit {
            warn!(
                len = text.len(),
                limit = self.message_limit,
                "dropping oversized inbound line"
            );
            return;
        }

        let line = text.to_string();
        let peer = self.peer.clone();
        let mailbox = self.mailbox.clone();
        let mut shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            trace!(%line, "inbound");
            let reply = tokio::select! {
                biased;
                _ = stop_requested(&mut shutdown) => return,
                reply = peer.call(&line) => reply,
            };

            let reply = match reply {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(error = %e, %line, "application peer call failed");
                    String::new()
                }
            };

            match mailbox.send(reply).await {
                Ok(()) | Err(WorkerError::Stopped) => {}
                Err(e) => debug!(error = %e, "reply not written"),
            }
        });
    }
}

/// One inbound line being assembled, possibly across several reads.
struct LineBuffer {
    bytes: Vec<u8>,
    /// Most bytes kept, line ending included.
    capacity: usize,
    /// The line outgrew `capacity`; its bytes are skipped up to the newline.
    overflowed: bool,
    /// Bytes of the current line seen so far, kept or not.
    seen: usize,
}

impl LineBuffer {
    fn new(message_limit: usize) -> Self {
        let capacity = message_limit.saturating_add(2);
        Self {
            bytes: Vec::with_capacity(capacity),
            capacity,
            overflowed: false,
            seen: 0,
        }
    }

    fn clear(&mut self) {
        self.bytes.clear();
        self.overflowed = false;
        self.seen = 0;
    }

    /// Read up to and including the next `\n`.
    ///
    /// `Ok(true)` means a line is complete (an unterminated last line
    /// counts); `Ok(false)` means end of stream with nothing pending. On
    /// error the partial line is kept, so calling again resumes it.
    /// Cancel safe: consumed bytes are always recorded first.
    async fn read_from<R: AsyncBufRead + Unpin>(&mut self, reader: &mut R) -> std::io::Result<bool> {
        loop {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(self.seen > 0);
            }

            let (chunk, complete) = match available.iter().position(|&b| b == b'\n') {
                Some(end) => (&available[..=end], true),
                None => (available, false),
            };
            let used = chunk.len();
            self.seen += used;
            if !self.overflowed {
                if self.bytes.len() + used <= self.capacity {
                    self.bytes.extend_from_slice(chunk);
                } else {
                    self.overflowed = true;
                    self.bytes.clear();
                }
            }
            reader.consume(used);

            if complete {
                return Ok(true);
            }
        }
    }
}

fn is_transient(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
    )
}
