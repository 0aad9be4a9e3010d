//! Test helpers for integration tests
//!
//! Provides utilities for spawning a relay on an ephemeral port, opening
//! authenticated WebSocket clients, and waiting on hub state.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chat_common::{AppConfig, JwtService};
use chat_core::Identity;
use chat_db::MemoryMessageStore;
use chat_relay::protocol::{ChatDelivered, ServerMessage};
use chat_relay::{create_app, create_relay, HubStats};
use futures_util::{SinkExt, StreamExt};
use reqwest::{Client, Response};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use crate::fixtures::TEST_SECRET;

/// How long a test waits for any single expected event
pub const WAIT: Duration = Duration::from_secs(5);

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    pub store: Arc<MemoryMessageStore>,
    jwt: JwtService,
    _server: JoinHandle<()>,
    _hub: JoinHandle<()>,
}

impl TestServer {
    /// Start a relay backed by an empty in-memory store
    pub async fn start() -> Result<Self> {
        Self::start_with_store(MemoryMessageStore::new()).await
    }

    /// Start a relay backed by a prepared store
    pub async fn start_with_store(store: MemoryMessageStore) -> Result<Self> {
        let config = AppConfig::local(TEST_SECRET);
        let store = Arc::new(store);

        let (state, hub) = create_relay(&config, store.clone());
        let hub_task = tokio::spawn(hub.run(std::future::pending()));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = create_app(state);

        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let client = Client::builder().timeout(WAIT).build()?;

        Ok(Self {
            addr,
            client,
            store,
            jwt: JwtService::new(TEST_SECRET),
            _server: server,
            _hub: hub_task,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// WebSocket URL carrying `token`
    pub fn ws_url(&self, token: &str) -> String {
        format!("ws://{}/ws?token={}", self.addr, token)
    }

    /// Issue a token the server will accept
    pub fn token_for(&self, identity: &Identity) -> Result<String> {
        Ok(self.jwt.issue(identity)?)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Hub counts as reported by `/health`
    pub async fn stats(&self) -> Result<HubStats> {
        let body: Value = self.get("/health").await?.json().await?;
        Ok(HubStats {
            sessions: body["sessions"].as_u64().context("missing sessions")? as usize,
            channels: body["channels"].as_u64().context("missing channels")? as usize,
        })
    }

    /// Poll `/health` until `check` accepts the counts
    pub async fn wait_for_stats(&self, check: impl Fn(HubStats) -> bool) -> Result<HubStats> {
        let deadline = tokio::time::Instant::now() + WAIT;
        loop {
            let stats = self.stats().await?;
            if check(stats) {
                return Ok(stats);
            }
            if tokio::time::Instant::now() >= deadline {
                bail!("hub never reached the expected state, last saw {stats:?}");
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    /// Wait until exactly `count` sessions are registered
    pub async fn wait_for_sessions(&self, count: usize) -> Result<()> {
        self.wait_for_stats(|stats| stats.sessions == count).await?;
        Ok(())
    }

    /// Connect an authenticated client and wait for it to be registered
    pub async fn connect(&self, identity: &Identity) -> Result<TestClient> {
        let before = self.stats().await?.sessions;
        let token = self.token_for(identity)?;
        let (ws, _) = connect_async(self.ws_url(&token)).await?;
        self.wait_for_stats(|stats| stats.sessions > before).await?;
        Ok(TestClient { ws })
    }
}

/// A WebSocket client speaking the relay protocol
pub struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    /// Send a JSON frame
    pub async fn send_json(&mut self, frame: &Value) -> Result<()> {
        self.ws.send(Message::Text(frame.to_string())).await?;
        Ok(())
    }

    /// Send a raw frame
    pub async fn send(&mut self, frame: Message) -> Result<()> {
        self.ws.send(frame).await?;
        Ok(())
    }

    /// Next chat frame, skipping control frames
    pub async fn next_chat(&mut self) -> Result<ChatDelivered> {
        match tokio::time::timeout(WAIT, self.next_text()).await {
            Ok(result) => result,
            Err(_) => bail!("no chat frame within {WAIT:?}"),
        }
    }

    /// Collect `count` chat frames
    pub async fn next_chats(&mut self, count: usize) -> Result<Vec<ChatDelivered>> {
        let mut chats = Vec::with_capacity(count);
        for _ in 0..count {
            chats.push(self.next_chat().await?);
        }
        Ok(chats)
    }

    /// Fail if a chat frame arrives within `window`
    pub async fn expect_no_chat(&mut self, window: Duration) -> Result<()> {
        match tokio::time::timeout(window, self.next_text()).await {
            Err(_) => Ok(()),
            Ok(Ok(chat)) => bail!("unexpected chat frame: {chat:?}"),
            Ok(Err(e)) => Err(e),
        }
    }

    /// Wait for the server to close the connection
    pub async fn expect_closed(&mut self) -> Result<()> {
        let closed = tokio::time::timeout(WAIT, async {
            while let Some(frame) = self.ws.next().await {
                match frame {
                    Ok(Message::Close(_)) | Err(_) => return,
                    Ok(_) => {}
                }
            }
        })
        .await;
        if closed.is_err() {
            bail!("connection still open after {WAIT:?}");
        }
        Ok(())
    }

    /// Close from the client side
    pub async fn close(mut self) -> Result<()> {
        self.ws.close(None).await?;
        Ok(())
    }

    async fn next_text(&mut self) -> Result<ChatDelivered> {
        while let Some(frame) = self.ws.next().await {
            match frame? {
                Message::Text(json) => {
                    let ServerMessage::Chat(chat) = ServerMessage::from_json(&json)?;
                    return Ok(chat);
                }
                Message::Close(_) => bail!("connection closed"),
                _ => {}
            }
        }
        bail!("connection ended")
    }
}
