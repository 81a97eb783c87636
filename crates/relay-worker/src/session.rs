//! One chat connection from dial to teardown, shared by readers and writers.
//!
//! ```text
//! dial ─► PASS/NICK ─► LoggedIn ─► spawn drain ─► Running ─► pump (inline)
//!                                                               │
//!            flush queued lines (bounded) ◄── fire shutdown ◄───┘
//! ```
//!
//! The pump decides how the session ends: `Stopped` on a stop request,
//! anything else is fatal.

use std::sync::Arc;
use std::time::Duration;

use relay_core::WorkerState;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::connection::{dial, ConnectionSettings};
use crate::error::WorkerError;
use crate::inbound::InboundPump;
use crate::mailbox::{LineSink, Mailbox, MailboxReceiver};
use crate::peer::ApplicationPeer;

/// How long the write loop gets to flush after the pump exits.
const FLUSH_GRACE: Duration = Duration::from_secs(5);

pub(crate) struct Session<'a> {
    pub settings: &'a ConnectionSettings,
    pub peer: Arc<dyn ApplicationPeer>,
    pub mailbox: &'a Mailbox,
    pub shutdown: &'a watch::Sender<bool>,
    pub state: &'a watch::Sender<WorkerState>,
}

impl Session<'_> {
    pub async fn run(self, inbox: MailboxReceiver) -> WorkerError {
        let stream = match dial(&self.settings.server).await {
            Ok(stream) => stream,
            Err(e) => return e,
        };
        let (read_half, write_half) = stream.into_split();

        // Written before the mailbox is drained, so nothing queued earlier
        // can reach the server ahead of the login.
        let mut sink = LineSink::new(write_half);
        for line in self.settings.handshake() {
            if let Err(e) = sink.write_line(&line).await {
                return WorkerError::Io(e);
            }
        }
        self.set_state(WorkerState::LoggedIn);

        let stop = self.shutdown.subscribe();
        let writer = tokio::spawn(async move { inbox.drain(&mut sink, stop).await });

        self.set_state(WorkerState::Running);
        let pump = InboundPump::new(
            self.settings,
            self.peer.clone(),
            self.mailbox.clone(),
            self.shutdown.subscribe(),
        );
        let err = pump.run(read_half).await;

        self.shutdown.send_replace(true);
        if tokio::time::timeout(FLUSH_GRACE, writer).await.is_err() {
            warn!("write loop did not finish flushing");
        }
        err
    }

    fn set_state(&self, state: WorkerState) {
        debug!(?state, server = %self.settings.server, "connection state");
        self.state.send_replace(state);
    }
}
