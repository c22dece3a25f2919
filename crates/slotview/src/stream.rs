//! Push boundary: WebSocket client for entry updates and network statistics.
//!
//! Connects, forwards decoded frames over an `mpsc` channel, and reconnects after a fixed
//! delay (plus optional jitter) whenever the connection closes or errors. Malformed frames
//! are dropped; they never close the connection.

use crate::config::{ExplorerConfig, ReconnectionConfig};
use crate::entry::{decode_push_message, PushMessage};
use anyhow::{Context, Result};
use futures_util::StreamExt;
use rand::Rng;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// What the push loop reports to its consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Connected,
    Disconnected,
    Message(PushMessage),
}

/// Push-stream client. Run from a spawned task.
#[derive(Debug, Clone)]
pub struct PushStream {
    ws_url: String,
    reconnection: ReconnectionConfig,
}

impl PushStream {
    pub fn new(ws_url: impl Into<String>, reconnection: ReconnectionConfig) -> Self {
        Self {
            ws_url: ws_url.into(),
            reconnection,
        }
    }

    pub fn from_config(config: &ExplorerConfig) -> Self {
        Self::new(config.ws_url.clone(), config.reconnection.clone())
    }

    /// Run until the receiving side of `tx` is dropped.
    pub async fn run(self, tx: mpsc::Sender<StreamEvent>) -> Result<()> {
        loop {
            let result = run_once(&self.ws_url, &tx).await;
            if tx.is_closed() {
                return Ok(());
            }
            match result {
                Ok(()) => tracing::info!(url = %self.ws_url, "push stream closed, reconnecting"),
                Err(e) => tracing::warn!(reason = %e, "push stream failed, reconnecting..."),
            }
            if tx.send(StreamEvent::Disconnected).await.is_err() {
                return Ok(());
            }
            sleep(self.reconnect_delay()).await;
        }
    }

    fn reconnect_delay(&self) -> Duration {
        let base = Duration::from_millis(self.reconnection.delay_ms);
        if self.reconnection.jitter_ms == 0 {
            return base;
        }
        let jitter = rand::thread_rng().gen_range(0..self.reconnection.jitter_ms);
        base + Duration::from_millis(jitter)
    }
}

async fn run_once(ws_url: &str, tx: &mpsc::Sender<StreamEvent>) -> Result<()> {
    let (mut ws_stream, _) = connect_async(ws_url).await.context("WS connect")?;
    tracing::info!(url = ws_url, "push stream connected");
    if tx.send(StreamEvent::Connected).await.is_err() {
        return Ok(());
    }

    while let Some(msg) = ws_stream.next().await {
        let text = match msg.context("ws read")? {
            Message::Text(t) => t,
            Message::Close(_) => break,
            _ => continue,
        };
        match decode_push_message(&text) {
            Ok(message) => {
                if tx.send(StreamEvent::Message(message)).await.is_err() {
                    return Ok(());
                }
            }
            Err(e) => tracing::debug!(reason = %e, "dropping malformed push frame"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_delay_without_jitter() {
        let s = PushStream::new("ws://localhost:1/ws", ReconnectionConfig::default());
        assert_eq!(s.reconnect_delay(), Duration::from_secs(3));
    }

    #[test]
    fn jitter_stays_in_bounds() {
        let s = PushStream::new(
            "ws://localhost:1/ws",
            ReconnectionConfig {
                delay_ms: 100,
                jitter_ms: 50,
            },
        );
        for _ in 0..32 {
            let d = s.reconnect_delay();
            assert!(d >= Duration::from_millis(100) && d < Duration::from_millis(150));
        }
    }

    #[tokio::test]
    async fn stops_when_consumer_is_gone() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        // Nothing listens on port 1, so the attempt fails and the closed channel ends the loop.
        let s = PushStream::new(
            "ws://127.0.0.1:1/ws",
            ReconnectionConfig {
                delay_ms: 10,
                jitter_ms: 0,
            },
        );
        assert!(s.run(tx).await.is_ok());
    }
}
