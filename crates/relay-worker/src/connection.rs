//! Chat connection setup shared by readers and writers.

use std::time::Duration;

use relay_core::config::IrcConfig;
use tokio::net::TcpStream;
use tracing::info;

use crate::error::{WorkerError, WorkerResult};
use crate::message::Message;

/// What a worker needs to open and run one chat connection.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    /// `host:port` of the chat server.
    pub server: String,
    pub nickname: String,
    pub password: String,
    /// Back-off after a read that returned nothing usable.
    pub read_interval: Duration,
    /// Inbound lines longer than this (in bytes) are dropped.
    pub message_limit: usize,
}

impl ConnectionSettings {
    /// The two handshake lines, in the order they must go out.
    pub fn handshake(&self) -> [String; 2] {
        [
            Message::pass(&self.password).to_string(),
            Message::nick(&self.nickname).to_string(),
        ]
    }
}

impl From<&IrcConfig> for ConnectionSettings {
    fn from(irc: &IrcConfig) -> Self {
        Self {
            server: irc.server.clone(),
            nickname: irc.nickname.clone(),
            password: irc.password.clone(),
            read_interval: irc.read_interval(),
            message_limit: irc.message_limit,
        }
    }
}

pub(crate) async fn dial(server: &str) -> WorkerResult<TcpStream> {
    let stream = TcpStream::connect(server)
        .await
        .map_err(|source| WorkerError::Connect {
            addr: server.to_string(),
            source,
        })?;
    stream.set_nodelay(true)?;
    info!(%server, "connected to chat server");
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_is_pass_then_nick() {
        let settings = ConnectionSettings {
            server: "127.0.0.1:6667".into(),
            nickname: "relaybot".into(),
            password: "oauth:secret".into(),
            read_interval: Duration::from_millis(250),
            message_limit: 512,
        };
        assert_eq!(
            settings.handshake(),
            ["PASS oauth:secret".to_string(), "NICK relaybot".to_string()]
        );
    }

    #[test]
    fn from_irc_config() {
        let config = relay_core::RelayConfig::scaffold("irc.example.net:6667", "bot");
        let settings = ConnectionSettings::from(&config.irc);
        assert_eq!(settings.server, "irc.example.net:6667");
        assert_eq!(settings.read_interval, Duration::from_millis(250));
        assert_eq!(settings.message_limit, 512);
    }
}
