//! QuakeWatch Firmware: main entry point
//!
//! Hexagonal architecture with a single cooperative loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  WsTransport      ConsoleOutput    HeapMonitor   WifiAdapter   │
//! │  (FeedTransport)  (Audio+Display)  (memory)      (link)        │
//! │  LogEventSink     MonotonicClock   fetch_history               │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            MonitorService (pure logic)                 │    │
//! │  │  Feed · Watchdog · Notifications · List                │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Transport event channel (WS client task → main loop)          │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sntp::EspSntp;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

use quakewatch::adapters::history::fetch_history;
use quakewatch::adapters::log_sink::LogEventSink;
use quakewatch::adapters::platform::DevicePlatform;
use quakewatch::adapters::time::MonotonicClock;
use quakewatch::adapters::wifi::{ConnectivityPort, WifiAdapter};
use quakewatch::app::ports::TouchPort;
use quakewatch::app::service::MonitorService;
use quakewatch::config::SystemConfig;
use quakewatch::events;
use quakewatch::feed::HexJsonDecoder;

/// Main loop period.
const LOOP_INTERVAL_MS: u32 = 20;

/// Heap status is logged every this many cycles (~1 min).
const HEAP_LOG_CYCLES: u64 = 3_000;

/// Build-time configuration overrides.
fn load_config() -> SystemConfig {
    let Some(json) = option_env!("QUAKEWATCH_CONFIG") else {
        info!("Config: no overrides, using defaults");
        return SystemConfig::default();
    };
    match SystemConfig::from_json(json) {
        Ok(cfg) => {
            info!("Config: overrides applied");
            cfg
        }
        Err(e) => {
            warn!("Config: overrides rejected ({}), using defaults", e);
            SystemConfig::default()
        }
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  QuakeWatch v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let clock = MonotonicClock::new();

    // ── 2. Configuration ──────────────────────────────────────
    let config = load_config();
    if !config.feed.is_provisioned() {
        warn!("Feed: node URL or address missing, running offline");
    }

    // ── 3. Network link ───────────────────────────────────────
    let mut wifi = WifiAdapter::new();
    wifi.attach(BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?,
        sysloop,
    )?);
    match (option_env!("QUAKEWATCH_WIFI_SSID"), option_env!("QUAKEWATCH_WIFI_PASS")) {
        (Some(ssid), pass) => {
            if let Err(e) = wifi.set_credentials(ssid, pass.unwrap_or_default()) {
                warn!("WiFi: invalid credentials: {}", e);
            } else if let Err(e) = wifi.connect(clock.now_ms()) {
                warn!("WiFi: initial connect failed ({}), will retry", e);
            }
        }
        (None, _) => warn!("WiFi: no credentials built in"),
    }
    // Wall clock for log timestamps.
    let _sntp = EspSntp::new_default()?;

    // ── 4. Adapters + service ─────────────────────────────────
    let mut platform = DevicePlatform::new(wifi, config.notify.volume);
    let mut sink = LogEventSink::new();
    let mut app = MonitorService::new(&config, HexJsonDecoder);
    app.start(&mut platform, &mut sink);

    // ── 5. History seed ───────────────────────────────────────
    if config.feed.is_provisioned() && platform.wifi.is_connected() {
        match fetch_history(&config.feed, &HexJsonDecoder) {
            Ok(page) => {
                app.enqueue_historical(page.records, &mut platform, &mut sink);
            }
            Err(e) => warn!("History: fetch failed: {}", e),
        }
    }

    info!("System ready. Entering main loop.");

    // ── 6. Main loop ──────────────────────────────────────────
    loop {
        let now = clock.now_ms();

        events::drain_events(|event| {
            app.on_transport_event(event, now, &mut platform, &mut sink);
        });

        let touch = platform.poll_touch();
        app.on_touch(touch, now, &mut platform, &mut sink);

        app.tick(now, &mut platform, &mut sink);
        platform.wifi.poll(now);

        if app.tick_count() % HEAP_LOG_CYCLES == 0 {
            platform.heap.log_status();
        }

        FreeRtos::delay_ms(LOOP_INTERVAL_MS);
    }
}
