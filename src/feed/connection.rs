//! Feed connection state machine.
//!
//! ```text
//!                 link up, backoff elapsed
//!  Disconnected ───────────────────────────▶ Connecting
//!       ▲  ▲                                    │ Opened
//!       │  │ close / error / pong timeout       ▼
//!       │  └──────────────────────── AwaitingHandshakeId
//!       │                                       │ {"uid":..}  → send subscribe
//!       │  close / error / pong timeout         ▼
//!       └─────────────────────────────────  Subscribed
//! ```
//!
//! Connect failures (a refused `connect`, a close while `Connecting`, or a
//! connect timeout) bump a consecutive-failure counter.  Below
//! `max_failures` the next attempt waits the short backoff, at or above it
//! the long one.  The counter resets when a connection opens and when the
//! network link drops under an open connection.  A liveness timeout (no
//! pong, or no ping leaving for a full ping interval plus pong timeout)
//! reconnects without counting as a failure; a memory-pressure disconnect
//! pins the counter at the maximum so the long backoff applies, and a link
//! drop while already disconnected leaves it pinned.
//!
//! [`tick`](ConnectionManager::tick) performs at most one transition per
//! call.

use heapless::String;
use log::{debug, info, warn};

use crate::app::ports::{FeedTransport, PayloadDecoder};
use crate::config::{FeedConfig, URL_CAP};
use crate::error::{DecodeError, FrameError};
use crate::events::TransportEvent;
use crate::record::EventRecord;

use super::dedup::Deduplicator;
use super::frame::{EventFrame, Frame, SessionId, parse_frame, subscribe_request};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    AwaitingHandshakeId,
    Subscribed,
}

/// What became of one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Not relevant in the current state, or an acknowledgement.
    Ignored,
    /// Handshake received and the subscribe request sent.
    Subscribed,
    /// Signed by someone other than the configured signer.
    Filtered,
    /// The envelope was unusable.
    Discarded(FrameError),
    /// The payload failed to decode.
    Rejected(DecodeError),
    /// The identifier was seen recently.
    Duplicate,
    /// A novel, valid event.
    Admitted(EventRecord),
}

pub struct ConnectionManager<D> {
    decoder: D,
    dedup: Deduplicator,
    config: FeedConfig,
    url: Option<String<URL_CAP>>,
    state: ConnectionState,
    failures: u8,
    last_attempt: Option<u64>,
    /// Last ping the transport accepted.
    last_ping: Option<u64>,
    awaiting_pong: bool,
    opened_at: u64,
    ping_failures: u32,
    session: Option<SessionId>,
    link_up: bool,
}

impl<D: PayloadDecoder> ConnectionManager<D> {
    pub fn new(config: &FeedConfig, decoder: D) -> Self {
        let mut manager = Self {
            decoder,
            dedup: Deduplicator::new(),
            config: config.clone(),
            url: None,
            state: ConnectionState::Disconnected,
            failures: 0,
            last_attempt: None,
            last_ping: None,
            awaiting_pong: false,
            opened_at: 0,
            ping_failures: 0,
            session: None,
            link_up: false,
        };
        manager.initialize(config);
        manager
    }

    /// Reset every piece of connection state, including the dedup window.
    pub fn initialize(&mut self, config: &FeedConfig) {
        self.config = config.clone();
        self.url = config.websocket_url();
        self.dedup.reset();
        self.state = ConnectionState::Disconnected;
        self.failures = 0;
        self.last_attempt = None;
        self.last_ping = None;
        self.awaiting_pong = false;
        self.opened_at = 0;
        self.ping_failures = 0;
        self.session = None;
        self.link_up = false;

        match &self.url {
            Some(url) => info!("Feed: endpoint {}", url),
            None => warn!("Feed: no usable node URL configured, feed disabled"),
        }
        match config.signer_filter() {
            Some(key) => info!("Feed: signer filter {}...", prefix(key)),
            None => info!("Feed: signer filter disabled"),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// True while subscribed to the event channel.
    pub fn is_live(&self) -> bool {
        self.state == ConnectionState::Subscribed
    }

    /// Consecutive connect failures.
    pub fn failures(&self) -> u8 {
        self.failures
    }

    pub fn last_attempt(&self) -> Option<u64> {
        self.last_attempt
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.as_deref()
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn dedup(&self) -> &Deduplicator {
        &self.dedup
    }

    /// Delay that must pass after the last attempt before the next one.
    pub fn backoff_ms(&self) -> u64 {
        if self.failures >= self.config.max_failures {
            u64::from(self.config.long_backoff_ms)
        } else {
            u64::from(self.config.short_backoff_ms)
        }
    }

    // ── Per-cycle driving ─────────────────────────────────────

    /// Advance the state machine once.
    pub fn tick(&mut self, now: u64, link_up: bool, transport: &mut impl FeedTransport) {
        if !link_up {
            if self.link_up || self.state != ConnectionState::Disconnected {
                warn!("Feed: network link down");
                if matches!(
                    self.state,
                    ConnectionState::AwaitingHandshakeId | ConnectionState::Subscribed
                ) {
                    self.failures = 0;
                }
                if self.state != ConnectionState::Disconnected {
                    transport.close();
                    self.session = None;
                    self.enter(ConnectionState::Disconnected);
                }
            }
            self.link_up = false;
            return;
        }
        self.link_up = true;

        match self.state {
            ConnectionState::Disconnected => self.try_connect(now, transport),
            ConnectionState::Connecting => {
                let timeout = u64::from(self.config.connect_timeout_ms);
                if self.last_attempt.is_some_and(|t| now.saturating_sub(t) >= timeout) {
                    warn!("Feed: connect timed out after {} ms", timeout);
                    transport.close();
                    self.record_failure(now);
                    self.enter(ConnectionState::Disconnected);
                }
            }
            ConnectionState::AwaitingHandshakeId | ConnectionState::Subscribed => {
                transport.poll();
                self.check_liveness(now, transport);
            }
        }
    }

    /// Apply one event reported by the transport.
    ///
    /// Returns the frame outcome for [`TransportEvent::Message`], `None`
    /// for lifecycle events.
    pub fn on_transport_event(
        &mut self,
        event: TransportEvent,
        now: u64,
        transport: &mut impl FeedTransport,
    ) -> Option<FrameOutcome> {
        match event {
            TransportEvent::Opened => {
                if self.state == ConnectionState::Connecting {
                    self.failures = 0;
                    self.opened_at = now;
                    self.last_ping = None;
                    self.awaiting_pong = false;
                    self.ping_failures = 0;
                    self.session = None;
                    info!("Feed: connected, waiting for session id");
                    self.enter(ConnectionState::AwaitingHandshakeId);
                } else {
                    debug!("Feed: ignoring open in {:?}", self.state);
                }
            }
            TransportEvent::Closed | TransportEvent::Error => match self.state {
                ConnectionState::Connecting => {
                    self.record_failure(now);
                    self.enter(ConnectionState::Disconnected);
                }
                ConnectionState::AwaitingHandshakeId | ConnectionState::Subscribed => {
                    warn!("Feed: connection lost ({:?})", event);
                    self.session = None;
                    self.enter(ConnectionState::Disconnected);
                }
                ConnectionState::Disconnected => {}
            },
            TransportEvent::Ping => debug!("Feed: ping from server"),
            TransportEvent::Pong => {
                self.awaiting_pong = false;
                debug!("Feed: pong");
            }
            TransportEvent::Message(text) => return Some(self.on_frame(&text, transport)),
        }
        None
    }

    /// Handle one raw text frame.
    pub fn on_frame(&mut self, raw: &str, transport: &mut impl FeedTransport) -> FrameOutcome {
        let frame = match parse_frame(raw) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Feed: discarding frame ({} bytes): {}", raw.len(), e);
                return FrameOutcome::Discarded(e);
            }
        };

        match frame {
            Frame::Handshake(session) => self.subscribe(session, transport),
            Frame::Event(event) => self.admit(&event),
            Frame::Other => {
                debug!("Feed: acknowledgement frame");
                FrameOutcome::Ignored
            }
        }
    }

    /// Drop the connection because memory is critically low.
    ///
    /// The failure counter is pinned at the maximum so the next attempt
    /// waits the long backoff.
    pub fn force_disconnect(&mut self, now: u64, transport: &mut impl FeedTransport) {
        if self.state != ConnectionState::Disconnected {
            transport.close();
            self.session = None;
            self.enter(ConnectionState::Disconnected);
        }
        self.failures = self.config.max_failures;
        self.last_attempt = Some(now);
        warn!(
            "Feed: forced disconnect, next attempt in {} ms",
            self.backoff_ms()
        );
    }

    // ── Internals ─────────────────────────────────────────────

    fn enter(&mut self, next: ConnectionState) {
        if next != self.state {
            info!("Feed: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    fn try_connect(&mut self, now: u64, transport: &mut impl FeedTransport) {
        if let Some(last) = self.last_attempt {
            if now.saturating_sub(last) < self.backoff_ms() {
                return;
            }
        }
        let Some(url) = self.url.as_ref() else {
            return;
        };

        if self.failures >= self.config.max_failures {
            info!("Feed: retrying after {} consecutive failures", self.failures);
        }
        info!("Feed: connecting to {}", url);
        self.last_attempt = Some(now);
        if transport.connect(url) {
            self.enter(ConnectionState::Connecting);
        } else {
            self.record_failure(now);
        }
    }

    fn record_failure(&mut self, now: u64) {
        self.failures = self.failures.saturating_add(1);
        self.last_attempt = Some(now);
        warn!(
            "Feed: connect failed ({} consecutive), next attempt in {} ms",
            self.failures,
            self.backoff_ms()
        );
    }

    fn check_liveness(&mut self, now: u64, transport: &mut impl FeedTransport) {
        let timeout = u64::from(self.config.pong_timeout_ms);
        if let Some(ping_at) = self.last_ping {
            if self.awaiting_pong && now.saturating_sub(ping_at) > timeout {
                warn!("Feed: no pong within {} ms, reconnecting", timeout);
                self.drop_dead_connection(now, transport);
                return;
            }
        }

        let interval = u64::from(self.config.ping_interval_ms);
        if self.last_ping.is_some_and(|t| now.saturating_sub(t) < interval) {
            return;
        }
        if transport.ping() {
            self.last_ping = Some(now);
            self.awaiting_pong = true;
            self.ping_failures = 0;
            debug!("Feed: ping sent");
            return;
        }

        self.ping_failures = self.ping_failures.saturating_add(1);
        let since = self.last_ping.unwrap_or(self.opened_at);
        if now.saturating_sub(since) > interval + timeout {
            warn!(
                "Feed: no ping sent for {} ms ({} failed), reconnecting",
                now.saturating_sub(since),
                self.ping_failures
            );
            self.drop_dead_connection(now, transport);
        } else if self.ping_failures == 1 {
            warn!("Feed: ping send failed, retrying each cycle");
        }
    }

    /// Liveness lost: reconnect after the backoff without counting a
    /// failure.
    fn drop_dead_connection(&mut self, now: u64, transport: &mut impl FeedTransport) {
        transport.close();
        self.session = None;
        self.awaiting_pong = false;
        self.ping_failures = 0;
        self.last_attempt = Some(now);
        self.enter(ConnectionState::Disconnected);
    }

    fn subscribe(&mut self, session: SessionId, transport: &mut impl FeedTransport) -> FrameOutcome {
        if self.state != ConnectionState::AwaitingHandshakeId {
            debug!("Feed: ignoring session id in {:?}", self.state);
            return FrameOutcome::Ignored;
        }
        let Some(request) = subscribe_request(&session, &self.config.address) else {
            return FrameOutcome::Ignored;
        };
        if !transport.send(&request) {
            warn!("Feed: subscribe request failed, dropping connection");
            transport.close();
            self.enter(ConnectionState::Disconnected);
            return FrameOutcome::Ignored;
        }
        info!("Feed: session {} subscribed to confirmedAdded/{}", session, self.config.address);
        self.session = Some(session);
        self.enter(ConnectionState::Subscribed);
        FrameOutcome::Subscribed
    }

    fn admit(&mut self, event: &EventFrame) -> FrameOutcome {
        if self.state != ConnectionState::Subscribed {
            debug!("Feed: event frame before subscription, ignoring");
            return FrameOutcome::Ignored;
        }
        if let Some(expected) = self.config.signer_filter() {
            if event.signer != expected {
                return FrameOutcome::Filtered;
            }
        }

        let record = match self.decoder.decode(&event.payload) {
            Ok(record) => record,
            Err(e) => {
                warn!("Feed: rejecting {}...: {}", prefix(&event.identifier), e);
                return FrameOutcome::Rejected(e);
            }
        };

        if !self.dedup.admit(&event.identifier) {
            info!("Feed: duplicate {}... skipped", prefix(&event.identifier));
            return FrameOutcome::Duplicate;
        }

        info!(
            "Feed: new event {}... {} M{:.1} {} depth={}km tsunami={}",
            prefix(&event.identifier),
            record.location(),
            record.magnitude(),
            record.severity(),
            record.depth_km(),
            record.secondary_effect(),
        );
        FrameOutcome::Admitted(record)
    }
}

fn prefix(s: &str) -> &str {
    s.get(..16).unwrap_or(s)
}
