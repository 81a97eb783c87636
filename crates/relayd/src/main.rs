//! relayd — the relaygrid daemon.
//!
//! One binary for every node role plus a few operator commands:
//! - `reader` — holds a chat connection, joins/parts channels on `Do`
//! - `writer` — holds a chat connection, sends `Do` payloads verbatim
//! - `app` — answers inbound lines for readers and writers
//! - `send` / `status` — talk to a running node through `NodeProxy`
//! - `init` — write a starter `relay.toml`
//!
//! # Usage
//!
//! ```text
//! relayd init --server irc.chat.twitch.tv:6667 --nickname relaybot
//! relayd --config relay.toml app
//! relayd --config relay.toml reader
//! relayd send reader JOIN '#rust'
//! relayd status reader
//! ```

mod node;
mod ops;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use relay_core::{RelayConfig, WorkerRole};

#[derive(Parser)]
#[command(name = "relayd", about = "relaygrid daemon")]
struct Cli {
    /// Path to the node configuration.
    #[arg(long, global = true, default_value = "relay.toml")]
    config: PathBuf,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a reader node.
    Reader,

    /// Run a writer node.
    Writer,

    /// Run the application node.
    App,

    /// Send one work string to a node and print its reply.
    Send {
        /// Which node to address; its RPC address comes from the config.
        role: RoleArg,

        /// Address the node directly instead (`host:port`).
        #[arg(long)]
        node: Option<String>,

        /// The work, e.g. `JOIN #rust`. Words are joined with spaces.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        work: Vec<String>,
    },

    /// Print a node's status report.
    Status {
        role: RoleArg,

        #[arg(long)]
        node: Option<String>,

        /// Print the raw JSON report.
        #[arg(long)]
        json: bool,
    },

    /// Write a starter config for a single machine.
    Init {
        /// Chat server `host:port`.
        #[arg(long)]
        server: String,

        #[arg(long)]
        nickname: String,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RoleArg {
    Reader,
    Writer,
    App,
}

impl From<RoleArg> for WorkerRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Reader => WorkerRole::Reader,
            RoleArg::Writer => WorkerRole::Writer,
            RoleArg::App => WorkerRole::App,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,relayd=debug,relay=debug".parse().unwrap());
    if cli.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    match cli.command {
        Command::Reader => node::run_node(WorkerRole::Reader, load(&cli.config)?).await,
        Command::Writer => node::run_node(WorkerRole::Writer, load(&cli.config)?).await,
        Command::App => node::run_node(WorkerRole::App, load(&cli.config)?).await,
        Command::Send { role, node, work } => {
            let addr = ops::resolve_node(role.into(), node, &cli.config)?;
            ops::send(role.into(), &addr, &work.join(" ")).await
        }
        Command::Status { role, node, json } => {
            let addr = ops::resolve_node(role.into(), node, &cli.config)?;
            ops::status(role.into(), &addr, json).await
        }
        Command::Init {
            server,
            nickname,
            force,
        } => ops::init(&cli.config, &server, &nickname, force),
    }
}

fn load(path: &Path) -> anyhow::Result<RelayConfig> {
    RelayConfig::from_file(path)
        .with_context(|| format!("failed to load config {}", path.display()))
}
