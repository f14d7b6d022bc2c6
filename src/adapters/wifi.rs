//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`], the boundary the device loop uses to
//! bring the network link up and keep it up.  The feed connection reads
//! the result through [`SystemPort::link_up`](crate::app::ports::SystemPort).
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stubs for host-side tests.
//!
//! ## Reconnection policy
//!
//! On disconnect the adapter waits an exponential backoff (2 s → 4 s →
//! 8 s … capped at 60 s) before retrying.

use core::fmt;
use log::{error, info, warn};

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

// ───────────────────────────────────────────────────────────────
// Port trait
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
    AlreadyConnected,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
            Self::AlreadyConnected => write!(f, "already connected to AP"),
        }
    }
}

pub trait ConnectivityPort {
    fn connect(&mut self, now_ms: u64) -> Result<(), ConnectivityError>;
    fn disconnect(&mut self);
    fn is_connected(&self) -> bool;
    fn poll(&mut self, now_ms: u64);
    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError>;
}

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
}

const MIN_BACKOFF_MS: u64 = 2_000;
const MAX_BACKOFF_MS: u64 = 60_000;

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    backoff_ms: u64,
    next_attempt: u64,
    #[cfg(target_os = "espidf")]
    driver: Option<BlockingWifi<EspWifi<'static>>>,
    /// Simulation: counts platform_connect() calls for deterministic failures.
    #[cfg(not(target_os = "espidf"))]
    sim_connect_counter: u32,
    /// Simulation: the access point dropped us.
    #[cfg(not(target_os = "espidf"))]
    sim_link_lost: bool,
}

impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl WifiAdapter {
    pub fn new() -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            backoff_ms: MIN_BACKOFF_MS,
            next_attempt: 0,
            #[cfg(target_os = "espidf")]
            driver: None,
            #[cfg(not(target_os = "espidf"))]
            sim_connect_counter: 0,
            #[cfg(not(target_os = "espidf"))]
            sim_link_lost: false,
        }
    }

    /// Hand over the driver built from the modem peripheral in `main`.
    #[cfg(target_os = "espidf")]
    pub fn attach(&mut self, driver: BlockingWifi<EspWifi<'static>>) {
        self.driver = Some(driver);
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    /// Delay before the next reconnect attempt.
    pub fn backoff_ms(&self) -> u64 {
        self.backoff_ms
    }

    /// Simulate the access point dropping the station.
    #[cfg(not(target_os = "espidf"))]
    pub fn simulate_link_loss(&mut self) {
        self.sim_link_lost = true;
    }

    fn schedule_retry(&mut self, now_ms: u64, attempt: u32) {
        self.next_attempt = now_ms.saturating_add(self.backoff_ms);
        self.state = WifiState::Reconnecting { attempt };
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        let Some(wifi) = self.driver.as_mut() else {
            error!("WiFi(espidf): no driver attached");
            return Err(ConnectivityError::ConnectionFailed);
        };
        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let config = Configuration::Client(ClientConfiguration {
            ssid: self
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidSsid)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });
        bring_up(wifi, &config).map_err(|e| {
            warn!("WiFi(espidf): {}", e);
            ConnectivityError::ConnectionFailed
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        self.sim_connect_counter = self.sim_connect_counter.wrapping_add(1);
        // Every 10th attempt fails to exercise the reconnect backoff.
        if self.sim_connect_counter % 10 == 3 {
            warn!(
                "WiFi(sim): simulated association failure (attempt {})",
                self.sim_connect_counter
            );
            return Err(ConnectivityError::ConnectionFailed);
        }
        self.sim_link_lost = false;
        info!("WiFi(sim): connected to '{}' (attempt {})", self.ssid, self.sim_connect_counter);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Some(wifi) = self.driver.as_mut() {
            if let Err(e) = wifi.disconnect() {
                warn!("WiFi(espidf): disconnect failed: {}", e);
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        info!("WiFi(sim): disconnected");
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.driver
            .as_ref()
            .is_some_and(|wifi| wifi.is_connected().unwrap_or(false))
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        !self.sim_link_lost
    }
}

#[cfg(target_os = "espidf")]
fn bring_up(
    wifi: &mut BlockingWifi<EspWifi<'static>>,
    config: &Configuration,
) -> Result<(), esp_idf_svc::sys::EspError> {
    wifi.set_configuration(config)?;
    if !wifi.is_started()? {
        wifi.start()?;
    }
    wifi.connect()?;
    wifi.wait_netif_up()
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn connect(&mut self, now_ms: u64) -> Result<(), ConnectivityError> {
        if self.ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        if self.state == WifiState::Connected {
            return Err(ConnectivityError::AlreadyConnected);
        }

        info!("WiFi: connecting to '{}'", self.ssid);
        self.state = WifiState::Connecting;

        match self.platform_connect() {
            Ok(()) => {
                self.state = WifiState::Connected;
                self.backoff_ms = MIN_BACKOFF_MS;
                info!("WiFi: connected");
                Ok(())
            }
            Err(e) => {
                error!("WiFi: connection failed: {}", e);
                self.schedule_retry(now_ms, 0);
                Err(e)
            }
        }
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
        self.state = WifiState::Disconnected;
        info!("WiFi: disconnected");
    }

    fn is_connected(&self) -> bool {
        self.state == WifiState::Connected && self.platform_is_connected()
    }

    fn poll(&mut self, now_ms: u64) {
        match self.state {
            WifiState::Reconnecting { attempt } if now_ms >= self.next_attempt => {
                info!("WiFi: reconnect attempt {} (backoff {} ms)", attempt, self.backoff_ms);
                match self.platform_connect() {
                    Ok(()) => {
                        self.state = WifiState::Connected;
                        self.backoff_ms = MIN_BACKOFF_MS;
                        info!("WiFi: reconnected");
                    }
                    Err(_) => {
                        self.backoff_ms = (self.backoff_ms * 2).min(MAX_BACKOFF_MS);
                        self.schedule_retry(now_ms, attempt + 1);
                    }
                }
            }
            WifiState::Connected if !self.platform_is_connected() => {
                warn!("WiFi: connection lost, entering reconnect");
                self.schedule_retry(now_ms, 0);
            }
            _ => {}
        }
    }

    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|()| ConnectivityError::InvalidSsid)?;
        self.password.clear();
        self.password
            .push_str(password)
            .map_err(|()| ConnectivityError::InvalidPassword)?;
        info!("WiFi: credentials updated (SSID='{}')", self.ssid);
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
