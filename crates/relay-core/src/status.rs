//! Node status — the single report shape every relaygrid node returns.
//!
//! Nodes answer `NodeService/Status` with a `NodeStatus`; the balancer side
//! keeps the last one it fetched and refreshes it in place from the raw
//! response.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;

/// Which side of the connection a node plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerRole {
    Reader,
    Writer,
    App,
}

impl std::fmt::Display for WorkerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerRole::Reader => write!(f, "reader"),
            WorkerRole::Writer => write!(f, "writer"),
            WorkerRole::App => write!(f, "app"),
        }
    }
}

/// Lifecycle of a worker's connection.
///
/// `LoggedIn` means the handshake lines are on the wire; `Running`
/// means queued work is being written. App nodes have no chat
/// connection and go straight to `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    #[default]
    Connecting,
    LoggedIn,
    Running,
    Stopping,
    Stopped,
}

/// Point-in-time report from a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub role: WorkerRole,
    pub state: WorkerState,
    /// Timestamp (ms since epoch) the requester attached to the call.
    pub requested_at_ms: u64,
    /// Timestamp (ms since epoch) the node built this report.
    pub reported_at_ms: u64,
    /// Time since the node last accepted work.
    pub idle_ms: u64,
    /// Work items accepted since start.
    pub handled: u64,
    /// Channels a reader believes it has joined. Empty for other roles.
    #[serde(default)]
    pub channels: Vec<String>,
}

impl NodeStatus {
    /// A blank status for a node that has not reported yet.
    pub fn new(role: WorkerRole) -> Self {
        Self {
            role,
            state: WorkerState::Connecting,
            requested_at_ms: 0,
            reported_at_ms: 0,
            idle_ms: 0,
            handled: 0,
            channels: Vec::new(),
        }
    }

    /// How long the node had been idle when it reported.
    pub fn idle_time(&self) -> Duration {
        Duration::from_millis(self.idle_ms)
    }

    /// Replace this status with a raw `NodeService/Status` response.
    ///
    /// On a decode error the cached status is left untouched.
    pub fn update(&mut self, raw: serde_json::Value) -> CoreResult<()> {
        *self = serde_json::from_value(raw)?;
        Ok(())
    }
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {:?} idle={}ms handled={}",
            self.role, self.state, self.idle_ms, self.handled
        )?;
        if !self.channels.is_empty() {
            write!(f, " channels={}", self.channels.join(","))?;
        }
        Ok(())
    }
}

/// Milliseconds since the unix epoch.
pub fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_replaces_cached_status() {
        let mut status = NodeStatus::new(WorkerRole::Reader);

        let raw = serde_json::json!({
            "role": "reader",
            "state": "running",
            "requested_at_ms": 10,
            "reported_at_ms": 12,
            "idle_ms": 1500,
            "handled": 4,
            "channels": ["#rust"]
        });
        status.update(raw).unwrap();

        assert_eq!(status.state, WorkerState::Running);
        assert_eq!(status.idle_time(), Duration::from_millis(1500));
        assert_eq!(status.channels, vec!["#rust"]);
    }

    #[test]
    fn bad_update_keeps_previous_status() {
        let mut status = NodeStatus::new(WorkerRole::Writer);
        status.handled = 7;

        assert!(status.update(serde_json::json!({"role": 3})).is_err());
        assert_eq!(status.handled, 7);
        assert_eq!(status.role, WorkerRole::Writer);
    }

    #[test]
    fn channels_default_when_missing() {
        let raw = serde_json::json!({
            "role": "writer",
            "state": "logged_in",
            "requested_at_ms": 0,
            "reported_at_ms": 0,
            "idle_ms": 0,
            "handled": 0
        });
        let mut status = NodeStatus::new(WorkerRole::App);
        status.update(raw).unwrap();
        assert_eq!(status.state, WorkerState::LoggedIn);
        assert!(status.channels.is_empty());
    }

    #[test]
    fn display_lists_channels() {
        let mut status = NodeStatus::new(WorkerRole::Reader);
        status.channels = vec!["#a".into(), "#b".into()];
        assert!(status.to_string().contains("channels=#a,#b"));
    }
}
