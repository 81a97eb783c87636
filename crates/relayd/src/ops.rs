//! Operator commands: talk to a running node, or scaffold a config.

use std::path::Path;

use anyhow::Context;
use relay_balancer::{NodeConnection, NodeProxyFactory};
use relay_core::{RelayConfig, WorkerRole};
use tracing::debug;

/// `--node` if given, otherwise the role's address from the config.
pub fn resolve_node(
    role: WorkerRole,
    node: Option<String>,
    config_path: &Path,
) -> anyhow::Result<String> {
    if let Some(node) = node {
        return Ok(node);
    }
    let config = RelayConfig::from_file(config_path)
        .with_context(|| format!("no --node given and failed to load {}", config_path.display()))?;
    let conn = match role {
        WorkerRole::Reader => config.address.reader,
        WorkerRole::Writer => config.address.writer,
        WorkerRole::App => config.address.app,
    };
    Ok(conn.to_string())
}

pub async fn send(role: WorkerRole, addr: &str, work: &str) -> anyhow::Result<()> {
    let proxy = NodeProxyFactory::new(role).create(addr)?;
    debug!(node = %addr, %work, "sending work");

    proxy.add_job();
    let reply = proxy.send(work).await;
    proxy.finish_job();

    let reply = reply?;
    if !reply.is_empty() {
        println!("{reply}");
    }
    Ok(())
}

pub async fn status(role: WorkerRole, addr: &str, json: bool) -> anyhow::Result<()> {
    let proxy = NodeProxyFactory::new(role).create(addr)?;
    proxy.update_status().await?;
    let status = proxy.status();

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("{addr}: {status}");
    }
    Ok(())
}

pub fn init(path: &Path, server: &str, nickname: &str, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let config = RelayConfig::scaffold(server, nickname);
    config.validate()?;
    std::fs::write(path, config.to_toml_string()?)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(())
}
