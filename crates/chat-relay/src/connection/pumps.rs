//! Read and write pumps for one WebSocket connection
//!
//! Both pumps are generic over the socket halves so they can be driven by an
//! in-memory stream in tests.

use super::{Outbox, SessionError, SessionHandle, SessionId};
use crate::hub::HubHandle;
use crate::protocol::ClientMessage;
use axum::extract::ws::Message;
use chat_common::RelayConfig;
use chat_core::ChannelId;
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::fmt;
use std::time::Duration;
use tokio::time::{interval_at, timeout, timeout_at, Instant, MissedTickBehavior};

/// Keepalive and frame limits for a session
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    /// Period between pings
    pub ping_interval: Duration,
    /// How long to wait for a pong before giving up on the peer
    pub pong_wait: Duration,
    /// Deadline for each write
    pub write_wait: Duration,
    /// Largest accepted inbound text frame
    pub max_message_bytes: usize,
    /// Outbox capacity
    pub outbox_capacity: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&RelayConfig::default())
    }
}

impl From<&RelayConfig> for SessionSettings {
    fn from(config: &RelayConfig) -> Self {
        Self {
            ping_interval: config.ping_interval(),
            pong_wait: config.pong_wait(),
            write_wait: config.write_wait(),
            max_message_bytes: config.max_message_bytes,
            outbox_capacity: config.outbox_capacity,
        }
    }
}

/// Drive a registered session until either pump stops
///
/// Registers the handle, runs both pumps, and unregisters once either side
/// finishes. When the read side ends first the write side is given one write
/// deadline to send its close frame.
pub async fn run_session<K, S, E>(
    sink: K,
    stream: S,
    session: SessionHandle,
    outbox: Outbox,
    hub: HubHandle,
    settings: SessionSettings,
) where
    K: Sink<Message> + Unpin + Send + 'static,
    K::Error: fmt::Display,
    S: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let session_id = session.id();
    if hub.register(session).is_err() {
        tracing::warn!(session_id = %session_id, "Hub is not running, dropping session");
        return;
    }

    let mut write_task = tokio::spawn(write_pump(sink, outbox, session_id, settings));
    let mut read_task = tokio::spawn(read_pump(stream, hub.clone(), session_id, settings));

    tokio::select! {
        result = &mut read_task => {
            log_exit(session_id, "read", result);
            let _ = hub.unregister(session_id);
            match timeout(settings.write_wait, &mut write_task).await {
                Ok(result) => log_exit(session_id, "write", result),
                Err(_) => write_task.abort(),
            }
        }
        result = &mut write_task => {
            log_exit(session_id, "write", result);
            let _ = hub.unregister(session_id);
            read_task.abort();
        }
    }

    tracing::info!(session_id = %session_id, "Session closed");
}

fn log_exit(
    session_id: SessionId,
    side: &'static str,
    result: Result<Result<(), SessionError>, tokio::task::JoinError>,
) {
    match result {
        Ok(Ok(())) => tracing::debug!(session_id = %session_id, side, "Pump finished"),
        Ok(Err(e)) if e.is_timeout() || e.is_protocol() => {
            tracing::info!(session_id = %session_id, side, reason = %e, "Pump stopped");
        }
        Ok(Err(e)) => tracing::warn!(session_id = %session_id, side, error = %e, "Pump failed"),
        Err(e) => tracing::error!(session_id = %session_id, side, error = %e, "Pump task panicked"),
    }
}

/// Read frames from the peer and forward them to the hub
///
/// Returns `Ok` when the peer closes cleanly. The read deadline starts at
/// `pong_wait` and is pushed back only when a pong arrives.
pub async fn read_pump<S, E>(
    mut stream: S,
    hub: HubHandle,
    session_id: SessionId,
    settings: SessionSettings,
) -> Result<(), SessionError>
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
{
    let mut deadline = Instant::now() + settings.pong_wait;

    loop {
        let frame = match timeout_at(deadline, stream.next()).await {
            Err(_) => return Err(SessionError::ReadTimeout),
            Ok(None) => return Ok(()),
            Ok(Some(Err(e))) => return Err(SessionError::Read(e.to_string())),
            Ok(Some(Ok(frame))) => frame,
        };

        match frame {
            Message::Text(text) => {
                if text.len() > settings.max_message_bytes {
                    return Err(SessionError::FrameTooLarge {
                        size: text.len(),
                        max: settings.max_message_bytes,
                    });
                }
                handle_text(&hub, session_id, &text).await?;
            }
            Message::Binary(_) => {
                return Err(SessionError::Protocol(
                    "binary frames are not supported".to_string(),
                ));
            }
            Message::Pong(_) => {
                tracing::trace!(session_id = %session_id, "Pong received");
                deadline = Instant::now() + settings.pong_wait;
            }
            Message::Ping(_) => {
                tracing::trace!(session_id = %session_id, "Ping received");
            }
            Message::Close(_) => {
                tracing::debug!(session_id = %session_id, "Client closed connection");
                return Ok(());
            }
        }
    }
}

async fn handle_text(hub: &HubHandle, session_id: SessionId, text: &str) -> Result<(), SessionError> {
    let message =
        ClientMessage::from_json(text).map_err(|e| SessionError::Protocol(e.to_string()))?;

    match message {
        ClientMessage::Chat {
            content,
            channel_id,
        } => {
            if content.trim().is_empty() {
                tracing::trace!(session_id = %session_id, "Ignoring empty message");
                return Ok(());
            }
            let channel_id = ChannelId::or_general(channel_id.filter(ChannelId::is_valid));
            hub.broadcast(session_id, channel_id, content).await?;
        }
        ClientMessage::SwitchChannel { channel_id } => {
            if !channel_id.is_valid() {
                tracing::debug!(session_id = %session_id, channel_id = %channel_id, "Ignoring switch to invalid channel");
                return Ok(());
            }
            hub.switch_channel(session_id, channel_id).await?;
        }
        ClientMessage::Unsupported => {
            tracing::trace!(session_id = %session_id, "Ignoring unsupported frame type");
        }
    }
    Ok(())
}

/// Write queued frames and keepalive pings to the peer
///
/// Returns `Ok` after sending a close frame once the hub closes the outbox.
pub async fn write_pump<K>(
    mut sink: K,
    mut outbox: Outbox,
    session_id: SessionId,
    settings: SessionSettings,
) -> Result<(), SessionError>
where
    K: Sink<Message> + Unpin,
    K::Error: fmt::Display,
{
    let mut keepalive = interval_at(Instant::now() + settings.ping_interval, settings.ping_interval);
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            queued = outbox.recv() => match queued {
                Some(message) => {
                    let json = message.to_json()?;
                    send_frame(&mut sink, Message::Text(json), settings.write_wait).await?;
                }
                None => {
                    tracing::debug!(session_id = %session_id, "Outbox closed, sending close frame");
                    if let Err(e) = send_frame(&mut sink, Message::Close(None), settings.write_wait).await {
                        tracing::debug!(session_id = %session_id, error = %e, "Close frame not delivered");
                    }
                    return Ok(());
                }
            },
            _ = keepalive.tick() => {
                send_frame(&mut sink, Message::Ping(Vec::new()), settings.write_wait).await?;
            }
        }
    }
}

async fn send_frame<K>(sink: &mut K, frame: Message, write_wait: Duration) -> Result<(), SessionError>
where
    K: Sink<Message> + Unpin,
    K::Error: fmt::Display,
{
    match timeout(write_wait, sink.send(frame)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(SessionError::Write(e.to_string())),
        Err(_) => Err(SessionError::WriteTimeout),
    }
}
