//! Reader worker — joins and parts chat channels on command.
//!
//! `Do` grammar (whitespace-separated tokens):
//!
//! ```text
//! HALT             stop the worker
//! JOIN <channel>   join, and remember the channel
//! PART <channel>   leave a channel joined earlier
//! ```
//!
//! `do_work` only records the intent; a channel-manager task turns
//! intents into `JOIN`/`PART` lines on the mailbox, so a burst of
//! commands never waits on the socket.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use relay_core::{
    epoch_millis, ConcurrentStringSet, NodeStatus, RelayConfig, WorkerRole, WorkerState,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::activity::Activity;
use crate::connection::ConnectionSettings;
use crate::error::{WorkerError, WorkerResult};
use crate::mailbox::{mailbox, Mailbox, MailboxReceiver};
use crate::message::Message;
use crate::peer::{ApplicationPeer, RpcPeer};
use crate::session::Session;
use crate::{stop_requested, Worker, QUIT_LINE};

/// One parsed reader command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderCommand<'a> {
    Halt,
    Join(&'a str),
    Part(&'a str),
}

impl<'a> ReaderCommand<'a> {
    pub fn parse(work: &'a str) -> WorkerResult<Self> {
        let tokens: Vec<&str> = work.split_whitespace().collect();
        match tokens.as_slice() {
            [] => Err(WorkerError::InvalidWork(
                "work given was an empty string".to_string(),
            )),
            ["HALT"] => Ok(ReaderCommand::Halt),
            ["JOIN", channel] => Ok(ReaderCommand::Join(*channel)),
            ["PART", channel] => Ok(ReaderCommand::Part(*channel)),
            [verb @ ("HALT" | "JOIN" | "PART"), ..] => Err(WorkerError::InvalidWork(format!(
                "wrong number of arguments for {verb}: {work:?}"
            ))),
            _ => Err(WorkerError::InvalidWork(format!(
                "work did not start with an accepted command: {work:?}"
            ))),
        }
    }
}

type Intents = (mpsc::UnboundedReceiver<String>, mpsc::UnboundedReceiver<String>);

pub struct ReaderWorker {
    settings: ConnectionSettings,
    peer: Arc<dyn ApplicationPeer>,
    channels: Arc<ConcurrentStringSet>,
    to_join: mpsc::UnboundedSender<String>,
    to_part: mpsc::UnboundedSender<String>,
    intents: Mutex<Option<Intents>>,
    mailbox: Mailbox,
    inbox: Mutex<Option<MailboxReceiver>>,
    state: watch::Sender<WorkerState>,
    shutdown: watch::Sender<bool>,
    activity: Activity,
}

impl ReaderWorker {
    pub fn new(settings: ConnectionSettings, peer: Arc<dyn ApplicationPeer>) -> Self {
        let (mailbox, inbox) = mailbox();
        let (to_join, join_rx) = mpsc::unbounded_channel();
        let (to_part, part_rx) = mpsc::unbounded_channel();
        Self {
            settings,
            peer,
            channels: Arc::new(ConcurrentStringSet::new()),
            to_join,
            to_part,
            intents: Mutex::new(Some((join_rx, part_rx))),
            mailbox,
            inbox: Mutex::new(Some(inbox)),
            state: watch::Sender::new(WorkerState::Connecting),
            shutdown: watch::Sender::new(false),
            activity: Activity::new(),
        }
    }

    pub async fn connect(config: &RelayConfig) -> WorkerResult<Self> {
        let peer = RpcPeer::connect(&config.address.app.to_string(), &config.app.method).await?;
        Ok(Self::new(ConnectionSettings::from(&config.irc), Arc::new(peer)))
    }

    pub fn subscribe_state(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    /// Channels this reader believes it has joined.
    pub fn channels(&self) -> Vec<String> {
        self.channels.list()
    }

    fn set_state(&self, state: WorkerState) {
        debug!(?state, "reader state");
        self.state.send_replace(state);
    }

    fn join(&self, channel: &str) -> WorkerResult<()> {
        self.channels.add(channel);
        if self.to_join.send(channel.to_string()).is_err() {
            self.channels.remove(channel);
            return Err(WorkerError::Stopped);
        }
        info!(%channel, "join requested");
        Ok(())
    }

    fn part(&self, channel: &str) -> WorkerResult<()> {
        // Check and removal happen under one lock.
        if !self.channels.remove(channel) {
            return Err(WorkerError::InvalidWork(format!(
                "not currently listening on {channel}"
            )));
        }
        if self.to_part.send(channel.to_string()).is_err() {
            self.channels.add(channel);
            return Err(WorkerError::Stopped);
        }
        info!(%channel, "part requested");
        Ok(())
    }

    fn halt(&self) {
        self.state.send_if_modified(|state| {
            if *state == WorkerState::Stopped {
                return false;
            }
            *state = WorkerState::Stopping;
            true
        });
        self.shutdown.send_replace(true);
    }
}

/// Turn join/part intents into protocol lines until stopped.
async fn manage_channels(
    mut joins: mpsc::UnboundedReceiver<String>,
    mut parts: mpsc::UnboundedReceiver<String>,
    mailbox: Mailbox,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let line = tokio::select! {
            _ = stop_requested(&mut shutdown) => break,
            Some(channel) = joins.recv() => Message::join(&channel),
            Some(channel) = parts.recv() => Message::part(&channel),
            else => break,
        };
        if mailbox.post(line.to_string()).is_err() {
            break;
        }
    }
    debug!("channel manager stopped");
}

#[async_trait]
impl Worker for ReaderWorker {
    fn role(&self) -> WorkerRole {
        WorkerRole::Reader
    }

    async fn do_work(&self, work: &str) -> WorkerResult<String> {
        self.activity.record();
        match ReaderCommand::parse(work)? {
            ReaderCommand::Halt => {
                info!("halt requested");
                self.halt();
            }
            ReaderCommand::Join(channel) => self.join(channel)?,
            ReaderCommand::Part(channel) => self.part(channel)?,
        }
        Ok(String::new())
    }

    fn status(&self, requested_at_ms: u64) -> NodeStatus {
        NodeStatus {
            role: WorkerRole::Reader,
            state: *self.state.borrow(),
            requested_at_ms,
            reported_at_ms: epoch_millis(),
            idle_ms: self.activity.idle_ms(),
            handled: self.activity.handled(),
            channels: self.channels.list(),
        }
    }

    async fn work(&self) -> WorkerResult<()> {
        let inbox = self
            .inbox
            .lock()
            .expect("inbox lock")
            .take()
            .ok_or(WorkerError::AlreadyRunning)?;
        let intents = self
            .intents
            .lock()
            .expect("intents lock")
            .take()
            .ok_or(WorkerError::AlreadyRunning)?;

        info!(server = %self.settings.server, nickname = %self.settings.nickname, "reader starting");
        let (join_rx, part_rx) = intents;
        let manager = tokio::spawn(manage_channels(
            join_rx,
            part_rx,
            self.mailbox.clone(),
            self.shutdown.subscribe(),
        ));
        let err = Session {
            settings: &self.settings,
            peer: self.peer.clone(),
            mailbox: &self.mailbox,
            shutdown: &self.shutdown,
            state: &self.state,
        }
        .run(inbox)
        .await;
        manager.abort();

        self.shutdown.send_replace(true);
        self.set_state(WorkerState::Stopped);
        match &err {
            WorkerError::Stopped => info!("reader stopped"),
            other => warn!(error = %other, "reader failed"),
        }
        Err(err)
    }

    async fn shutdown(&self) {
        info!("reader shutting down");
        self.peer.close();
        if self.mailbox.post(QUIT_LINE).is_err() {
            debug!("mailbox already closed, skipping quit");
        }
        self.halt();
    }
}
