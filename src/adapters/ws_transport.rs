//! WebSocket feed transport.
//!
//! Implements [`FeedTransport`].  Outbound calls (connect, subscribe, ping,
//! close) go straight to the client; everything the client reports comes
//! back through the [`events`](crate::events) channel, never by touching
//! monitor state from the client task.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::ws::client::EspWebSocketClient`.
//!   Its built-in reconnect is disabled; the
//!   [`ConnectionManager`](crate::feed::ConnectionManager) owns backoff.
//! - **all other targets**: an in-process stand-in that opens instantly,
//!   hands out a session id and answers pings.

use log::{debug, info, warn};

use crate::app::ports::FeedTransport;
use crate::events::{push_event, push_message, TransportEvent};

#[cfg(target_os = "espidf")]
use core::time::Duration;
#[cfg(target_os = "espidf")]
use esp_idf_svc::io::EspIOError;
#[cfg(target_os = "espidf")]
use esp_idf_svc::ws::client::{
    EspWebSocketClient, EspWebSocketClientConfig, FrameType, WebSocketEvent, WebSocketEventType,
};

/// Client receive buffer; matches the channel's frame cap.
#[cfg(target_os = "espidf")]
const RX_BUFFER: usize = crate::events::FRAME_CAP;

/// How long a blocking send may wait for the socket.
#[cfg(target_os = "espidf")]
const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Session id handed out by the simulated node.
#[cfg(not(target_os = "espidf"))]
pub const SIM_SESSION_ID: &str = "sim-session";

fn is_ws_url(url: &str) -> bool {
    url.starts_with("ws://") || url.starts_with("wss://")
}

pub struct WsTransport {
    #[cfg(target_os = "espidf")]
    client: Option<EspWebSocketClient<'static>>,
    #[cfg(not(target_os = "espidf"))]
    sim_open: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_sent: Vec<String>,
    frames_sent: u32,
}

impl Default for WsTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl WsTransport {
    pub fn new() -> Self {
        Self {
            #[cfg(target_os = "espidf")]
            client: None,
            #[cfg(not(target_os = "espidf"))]
            sim_open: false,
            #[cfg(not(target_os = "espidf"))]
            sim_sent: Vec::new(),
            frames_sent: 0,
        }
    }

    /// Text frames sent since construction.
    pub fn frames_sent(&self) -> u32 {
        self.frames_sent
    }

    /// Frames the simulated node has received.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_sent(&self) -> &[String] {
        &self.sim_sent
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF client
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn on_client_event(event: &Result<WebSocketEvent, EspIOError>) {
    let event = match event {
        Ok(event) => event,
        Err(e) => {
            warn!("WS: client error: {}", e);
            push_event(TransportEvent::Error);
            return;
        }
    };
    match event.event_type {
        WebSocketEventType::Connected => {
            push_event(TransportEvent::Opened);
        }
        WebSocketEventType::Disconnected | WebSocketEventType::Closed => {
            push_event(TransportEvent::Closed);
        }
        WebSocketEventType::Close(_) => debug!("WS: closing"),
        WebSocketEventType::Text(text) => {
            push_message(text);
        }
        WebSocketEventType::Binary(bytes) => debug!("WS: ignoring {}-byte binary frame", bytes.len()),
        WebSocketEventType::Ping => {
            push_event(TransportEvent::Ping);
        }
        WebSocketEventType::Pong => {
            push_event(TransportEvent::Pong);
        }
        WebSocketEventType::BeforeConnect => debug!("WS: connecting"),
    }
}

#[cfg(target_os = "espidf")]
impl FeedTransport for WsTransport {
    fn connect(&mut self, url: &str) -> bool {
        if !is_ws_url(url) {
            warn!("WS: refusing non-WebSocket URL {}", url);
            return false;
        }
        self.client = None;
        let config = EspWebSocketClientConfig {
            disable_auto_reconnect: true,
            buffer_size: RX_BUFFER,
            ..Default::default()
        };
        match EspWebSocketClient::new(url, &config, SEND_TIMEOUT, on_client_event) {
            Ok(client) => {
                info!("WS: client started for {}", url);
                self.client = Some(client);
                true
            }
            Err(e) => {
                warn!("WS: client start failed: {}", e);
                false
            }
        }
    }

    fn send(&mut self, text: &str) -> bool {
        let Some(client) = self.client.as_mut() else {
            return false;
        };
        match client.send(FrameType::Text(false), text.as_bytes()) {
            Ok(()) => {
                self.frames_sent = self.frames_sent.wrapping_add(1);
                true
            }
            Err(e) => {
                warn!("WS: send failed: {}", e);
                false
            }
        }
    }

    fn ping(&mut self) -> bool {
        let Some(client) = self.client.as_mut() else {
            return false;
        };
        client.send(FrameType::Ping, &[]).is_ok()
    }

    fn close(&mut self) {
        if self.client.take().is_some() {
            info!("WS: client closed");
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl FeedTransport for WsTransport {
    fn connect(&mut self, url: &str) -> bool {
        if !is_ws_url(url) {
            warn!("WS(sim): refusing non-WebSocket URL {}", url);
            return false;
        }
        self.sim_open = true;
        info!("WS(sim): opened {}", url);
        push_event(TransportEvent::Opened);
        let mut handshake = String::from(r#"{"uid":""#);
        handshake.push_str(SIM_SESSION_ID);
        handshake.push_str(r#""}"#);
        push_message(&handshake);
        true
    }

    fn send(&mut self, text: &str) -> bool {
        if !self.sim_open {
            return false;
        }
        debug!("WS(sim): -> {}", text);
        self.sim_sent.push(text.to_owned());
        self.frames_sent = self.frames_sent.wrapping_add(1);
        true
    }

    fn ping(&mut self) -> bool {
        if !self.sim_open {
            return false;
        }
        push_event(TransportEvent::Pong)
    }

    fn close(&mut self) {
        if self.sim_open {
            self.sim_open = false;
            info!("WS(sim): closed");
        }
    }
}
