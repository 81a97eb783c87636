//! Shared harness: a scripted chat server and a fake application peer.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use relay_rpc::RpcError;
use relay_worker::{ApplicationPeer, ConnectionSettings};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};

const LINE_TIMEOUT: Duration = Duration::from_secs(2);

/// Accepts one client, records every line it sends, and writes lines back on demand.
pub struct MockChatServer {
    pub addr: String,
    received: mpsc::UnboundedReceiver<String>,
    outbound: mpsc::UnboundedSender<String>,
    hangup: Option<oneshot::Sender<()>>,
}

impl MockChatServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let (received_tx, received) = mpsc::unbounded_channel();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        let (hangup, mut hangup_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let (read_half, mut write_half) = stream.into_split();

            let reader = tokio::spawn(async move {
                let mut lines = BufReader::new(read_half).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if received_tx.send(line).is_err() {
                        break;
                    }
                }
            });

            loop {
                tokio::select! {
                    line = outbound_rx.recv() => {
                        let Some(line) = line else { break };
                        let frame = format!("{line}\r\n");
                        if write_half.write_all(frame.as_bytes()).await.is_err() {
                            break;
                        }
                    }
                    _ = &mut hangup_rx => break,
                }
            }
            reader.abort();
        });

        Self {
            addr,
            received,
            outbound,
            hangup: Some(hangup),
        }
    }

    /// Next line the client wrote, without its line ending.
    pub async fn next_line(&mut self) -> String {
        tokio::time::timeout(LINE_TIMEOUT, self.received.recv())
            .await
            .expect("timed out waiting for a line")
            .expect("client connection ended")
    }

    /// Skip the PASS/NICK handshake.
    pub async fn expect_handshake(&mut self, password: &str, nickname: &str) {
        assert_eq!(self.next_line().await, format!("PASS {password}"));
        assert_eq!(self.next_line().await, format!("NICK {nickname}"));
    }

    /// Assert nothing arrives for `ms` milliseconds.
    pub async fn expect_silence(&mut self, ms: u64) {
        let next = tokio::time::timeout(Duration::from_millis(ms), self.received.recv()).await;
        assert!(next.is_err(), "unexpected line: {next:?}");
    }

    pub fn send(&self, line: &str) {
        self.outbound.send(line.to_string()).unwrap();
    }

    /// Close the connection from the server side.
    pub fn hang_up(&mut self) {
        if let Some(hangup) = self.hangup.take() {
            let _ = hangup.send(());
        }
    }
}

/// Answers `PING x` with `PONG x`, fails on `FAIL`, replies empty otherwise.
#[derive(Default)]
pub struct FakePeer {
    pub calls: Mutex<Vec<String>>,
    pub closed: AtomicBool,
}

impl FakePeer {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ApplicationPeer for FakePeer {
    async fn call(&self, line: &str) -> Result<String, RpcError> {
        self.calls.lock().unwrap().push(line.to_string());
        if line == "FAIL" {
            return Err(RpcError::Closed);
        }
        match line.strip_prefix("PING") {
            Some(rest) => Ok(format!("PONG{rest}")),
            None => Ok(String::new()),
        }
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

pub fn settings(server: &str) -> ConnectionSettings {
    ConnectionSettings {
        server: server.to_string(),
        nickname: "relaybot".to_string(),
        password: "oauth:test".to_string(),
        read_interval: Duration::from_millis(10),
        message_limit: 512,
    }
}

/// An address nothing is listening on.
pub fn dead_address() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);
    addr
}
