//! relay.toml configuration parser.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    pub address: AddressConfig,
    pub irc: IrcConfig,
    #[serde(default)]
    pub app: AppConfig,
}

/// A `hostname:port` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnInfo {
    pub hostname: String,
    pub port: u16,
}

impl std::fmt::Display for ConnInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.hostname, self.port)
    }
}

/// Where each role's node listens for RPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressConfig {
    pub app: ConnInfo,
    pub reader: ConnInfo,
    pub writer: ConnInfo,
}

/// The chat connection every reader and writer holds open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrcConfig {
    /// `host:port` of the chat server.
    pub server: String,
    pub nickname: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_read_interval_ms")]
    pub read_interval_ms: u64,
    #[serde(default = "default_message_limit")]
    pub message_limit: usize,
}

impl IrcConfig {
    pub fn read_interval(&self) -> Duration {
        Duration::from_millis(self.read_interval_ms)
    }
}

/// How workers reach the application peer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_method")]
    pub method: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            method: default_app_method(),
        }
    }
}

fn default_read_interval_ms() -> u64 {
    250
}

fn default_message_limit() -> usize {
    512
}

fn default_app_method() -> String {
    "NodeService.DoWork".to_string()
}

impl RelayConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RelayConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject configs a node could not run with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.irc.server.trim().is_empty() {
            return Err(CoreError::InvalidConfig("irc.server must not be empty".into()));
        }
        if self.irc.nickname.trim().is_empty() {
            return Err(CoreError::InvalidConfig("irc.nickname must not be empty".into()));
        }
        if self.irc.message_limit == 0 {
            return Err(CoreError::InvalidConfig(
                "irc.message_limit must be greater than zero".into(),
            ));
        }
        if self.app.method.trim().is_empty() {
            return Err(CoreError::InvalidConfig("app.method must not be empty".into()));
        }
        for (role, conn) in [
            ("app", &self.address.app),
            ("reader", &self.address.reader),
            ("writer", &self.address.writer),
        ] {
            if conn.hostname.trim().is_empty() {
                return Err(CoreError::InvalidConfig(format!(
                    "address.{role}.hostname must not be empty"
                )));
            }
            if conn.port == 0 {
                return Err(CoreError::InvalidConfig(format!(
                    "address.{role}.port must not be zero"
                )));
            }
        }
        Ok(())
    }

    /// A local single-machine config, handy for tests and first runs.
    pub fn scaffold(server: &str, nickname: &str) -> Self {
        let local = |port| ConnInfo {
            hostname: "127.0.0.1".to_string(),
            port,
        };
        RelayConfig {
            address: AddressConfig {
                app: local(7300),
                reader: local(7301),
                writer: local(7302),
            },
            irc: IrcConfig {
                server: server.to_string(),
                nickname: nickname.to_string(),
                password: String::new(),
                read_interval_ms: default_read_interval_ms(),
                message_limit: default_message_limit(),
            },
            app: AppConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[address.app]
hostname = "127.0.0.1"
port = 7300

[address.reader]
hostname = "0.0.0.0"
port = 7301

[address.writer]
hostname = "0.0.0.0"
port = 7302

[irc]
server = "irc.example.net:6667"
nickname = "relaybot"
"#;

    #[test]
    fn parse_minimal_applies_defaults() {
        let config: RelayConfig = toml::from_str(MINIMAL).unwrap();
        config.validate().unwrap();

        assert_eq!(config.address.app.to_string(), "127.0.0.1:7300");
        assert_eq!(config.irc.read_interval(), Duration::from_millis(250));
        assert_eq!(config.irc.message_limit, 512);
        assert_eq!(config.irc.password, "");
        assert_eq!(config.app.method, "NodeService.DoWork");
    }

    #[test]
    fn parse_overrides() {
        let toml_str = format!(
            "{MINIMAL}password = \"oauth:abc\"\nread_interval_ms = 10\n\n[app]\nmethod = \"Master.Work\"\n"
        );
        let config: RelayConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.irc.password, "oauth:abc");
        assert_eq!(config.irc.read_interval_ms, 10);
        assert_eq!(config.app.method, "Master.Work");
    }

    #[test]
    fn validate_rejects_empty_server() {
        let mut config = RelayConfig::scaffold("irc.example.net:6667", "bot");
        config.irc.server = " ".into();
        assert!(matches!(config.validate(), Err(CoreError::InvalidConfig(_))));
    }

    #[test]
    fn validate_rejects_zero_port() {
        let mut config = RelayConfig::scaffold("irc.example.net:6667", "bot");
        config.address.writer.port = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("address.writer.port"), "{err}");
    }

    #[test]
    fn validate_rejects_empty_hostname() {
        let mut config = RelayConfig::scaffold("irc.example.net:6667", "bot");
        config.address.app.hostname = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("address.app.hostname"), "{err}");
    }

    #[test]
    fn validate_rejects_zero_message_limit() {
        let mut config = RelayConfig::scaffold("irc.example.net:6667", "bot");
        config.irc.message_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn scaffold_roundtrips_through_toml() {
        let config = RelayConfig::scaffold("irc.example.net:6667", "bot");
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("irc.example.net:6667"));

        let back: RelayConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(back.address.writer, config.address.writer);
    }

    #[test]
    fn from_file_reads_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.toml");
        std::fs::write(&path, MINIMAL).unwrap();

        let config = RelayConfig::from_file(&path).unwrap();
        assert_eq!(config.irc.nickname, "relaybot");
    }
}
