//! System configuration parameters
//!
//! All tunable parameters for the QuakeWatch monitor, grouped by subsystem.
//! Values can be overridden from a JSON document (missing fields keep their
//! defaults) and are validated before the monitor is constructed.

use core::fmt::Write;

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Longest accepted REST node URL.
pub const NODE_URL_CAP: usize = 200;
/// Capacity of a derived WebSocket or history URL.
pub const URL_CAP: usize = 320;
/// Capacity of an account address or signer public key.
pub const KEY_CAP: usize = 64;
/// Account addresses are 39 base32 characters.
pub const ADDRESS_LEN: usize = 39;
/// Signer public keys are 64 hex characters.
pub const PUBLIC_KEY_LEN: usize = 64;

/// Port the upstream node serves its REST API on.
const REST_PORT_SUFFIX: &str = ":3001";
/// Port the same node serves its WebSocket feed on.
const WS_PORT_SUFFIX: &str = ":3000";

/// Core system configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub feed: FeedConfig,
    pub notify: NotifyConfig,
    pub list: ListConfig,
    pub watchdog: WatchdogConfig,
}

/// Feed connection and liveness settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// REST node URL, e.g. `https://node.example.jp:3001`.
    pub node_url: String<NODE_URL_CAP>,
    /// Account address whose confirmed transactions carry events.
    pub address: String<KEY_CAP>,
    /// Only accept events signed by this key. Empty disables the filter.
    pub signer_public_key: String<KEY_CAP>,
    /// Delay between attempts while failures are below `max_failures`.
    pub short_backoff_ms: u32,
    /// Delay between attempts once `max_failures` is reached.
    pub long_backoff_ms: u32,
    /// Consecutive connect failures before switching to the long backoff.
    pub max_failures: u8,
    /// Give up on a pending connect after this long.
    pub connect_timeout_ms: u32,
    /// Liveness ping interval while connected.
    pub ping_interval_ms: u32,
    /// Maximum wait for a pong after a ping.
    pub pong_timeout_ms: u32,
    /// Number of historical events fetched at boot.
    pub history_page_size: u8,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            node_url: String::new(),
            address: String::new(),
            signer_public_key: String::new(),
            short_backoff_ms: 5_000,
            long_backoff_ms: 60_000,
            max_failures: 5,
            connect_timeout_ms: 10_000,
            ping_interval_ms: 60_000,
            pong_timeout_ms: 30_000,
            history_page_size: 10,
        }
    }
}

impl FeedConfig {
    /// True once a node and an address have been provisioned.
    pub fn is_provisioned(&self) -> bool {
        !self.node_url.is_empty() && !self.address.is_empty()
    }

    /// The signer filter, or `None` when every signer is accepted.
    pub fn signer_filter(&self) -> Option<&str> {
        if self.signer_public_key.is_empty() {
            None
        } else {
            Some(self.signer_public_key.as_str())
        }
    }

    /// Check the provisioned node, address and signer key.  Empty fields
    /// are unprovisioned and pass.
    pub fn validate_identity(&self) -> Result<(), ConfigError> {
        if !self.node_url.is_empty() && !self.node_url.starts_with("https://") {
            return Err(ConfigError::ValidationFailed("node URL must start with https://"));
        }
        if !self.address.is_empty()
            && (self.address.len() != ADDRESS_LEN || !self.address.starts_with(['N', 'T']))
        {
            return Err(ConfigError::ValidationFailed(
                "address must be 39 characters starting with N or T",
            ));
        }
        if !self.signer_public_key.is_empty()
            && (self.signer_public_key.len() != PUBLIC_KEY_LEN
                || !self.signer_public_key.bytes().all(|b| b.is_ascii_hexdigit()))
        {
            return Err(ConfigError::ValidationFailed(
                "signer public key must be 64 hex characters",
            ));
        }
        Ok(())
    }

    /// Derive the feed URL from the REST node URL.
    ///
    /// `https://host:3001/any/path` becomes `ws://host:3000/ws`.  Returns
    /// `None` when the node URL is empty or has no `http(s)://` scheme.
    pub fn websocket_url(&self) -> Option<String<URL_CAP>> {
        let rest = self
            .node_url
            .strip_prefix("https://")
            .or_else(|| self.node_url.strip_prefix("http://"))?;
        let authority = rest.split('/').next().unwrap_or_default();
        if authority.is_empty() {
            return None;
        }

        let mut url = String::new();
        match authority.strip_suffix(REST_PORT_SUFFIX) {
            Some(host) => write!(url, "ws://{host}{WS_PORT_SUFFIX}/ws").ok()?,
            None => write!(url, "ws://{authority}/ws").ok()?,
        }
        Some(url)
    }

    /// REST query for the most recent `history_page_size` confirmed
    /// transactions addressed to the monitored account, newest first.
    pub fn history_url(&self) -> Option<String<URL_CAP>> {
        if !self.is_provisioned() {
            return None;
        }
        let node = self.node_url.trim_end_matches('/');
        let mut url = String::new();
        write!(
            url,
            "{node}/transactions/confirmed?address={}&pageSize={}&order=desc",
            self.address, self.history_page_size
        )
        .ok()?;
        Some(url)
    }
}

/// Audio and visual notification timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub tone_hz: u16,
    pub volume: u8,
    /// Duration of one beep.
    pub beep_on_ms: u32,
    /// Silence between two beeps.
    pub beep_gap_ms: u32,
    /// Total length of the screen flash.
    pub flash_duration_ms: u32,
    /// Length of one colour/background half-period of the flash.
    pub flash_toggle_ms: u32,
    /// Admitted events are not notified below this much free heap.
    pub min_free_heap_bytes: u32,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            tone_hz: 1000,
            volume: 96,
            beep_on_ms: 150,
            beep_gap_ms: 100,
            flash_duration_ms: 1500,
            flash_toggle_ms: 300,
            min_free_heap_bytes: 15_000,
        }
    }
}

impl NotifyConfig {
    /// Time from the start of one beep to the start of the next.
    pub fn beep_period_ms(&self) -> u32 {
        self.beep_on_ms + self.beep_gap_ms
    }
}

/// Event list layout (pixels) and scroll physics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    pub item_height: i32,
    pub item_margin: i32,
    /// Height of the scrollable viewport.
    pub visible_height: i32,
    /// Touches above this line belong to the header and never scroll.
    pub header_height: i32,
    /// Velocity multiplier applied once per inertia step.
    pub inertia_decay: f32,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            item_height: 75,
            item_margin: 8,
            visible_height: 210,
            header_height: 30,
            inertia_decay: 0.92,
        }
    }
}

impl ListConfig {
    /// Distance between the tops of two consecutive items.
    pub fn pitch(&self) -> i32 {
        self.item_height + self.item_margin
    }
}

/// Free-memory watchdog thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    pub interval_ms: u32,
    /// Below this many free bytes a warning is raised.
    pub soft_threshold_bytes: u32,
    /// Below this many free bytes the feed is forcibly disconnected.
    pub hard_threshold_bytes: u32,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            interval_ms: 10_000,
            soft_threshold_bytes: 20_000,
            hard_threshold_bytes: 15_000,
        }
    }
}

impl SystemConfig {
    /// Parse a JSON override document.  Absent fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|_| ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the monitor misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let f = &self.feed;
        f.validate_identity()?;
        if f.short_backoff_ms == 0 || f.long_backoff_ms < f.short_backoff_ms {
            return Err(ConfigError::ValidationFailed(
                "long backoff must be at least the short backoff",
            ));
        }
        if f.max_failures == 0 {
            return Err(ConfigError::ValidationFailed("max_failures must be non-zero"));
        }
        if f.pong_timeout_ms == 0 || f.pong_timeout_ms >= f.ping_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "pong timeout must be shorter than the ping interval",
            ));
        }

        let n = &self.notify;
        if n.beep_on_ms == 0 || n.flash_toggle_ms == 0 || n.flash_duration_ms < n.flash_toggle_ms {
            return Err(ConfigError::ValidationFailed("notification timing out of range"));
        }

        let l = &self.list;
        if l.item_height <= 0 || l.item_margin < 0 || l.visible_height <= 0 || l.header_height < 0 {
            return Err(ConfigError::ValidationFailed("list geometry must be positive"));
        }
        if !(0.0..1.0).contains(&l.inertia_decay) {
            return Err(ConfigError::ValidationFailed("inertia decay must be in [0, 1)"));
        }

        let w = &self.watchdog;
        if w.interval_ms == 0 || w.hard_threshold_bytes > w.soft_threshold_bytes {
            return Err(ConfigError::ValidationFailed(
                "watchdog hard threshold must not exceed the soft threshold",
            ));
        }
        Ok(())
    }
}
