//! Historical event fetch.
//!
//! One HTTP GET against the node's confirmed-transactions endpoint at boot,
//! decoded with [`decode_history`] and handed to
//! [`MonitorService::enqueue_historical`](crate::app::service::MonitorService::enqueue_historical).
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::http::client::EspHttpConnection`
//!   with the ESP-IDF certificate bundle for `https://` nodes.
//! - **all other targets**: the simulated node has no history and answers
//!   with an empty page.

use log::{info, warn};

use crate::app::ports::PayloadDecoder;
use crate::config::FeedConfig;
use crate::error::{ConfigError, DecodeError, Error, Result};
use crate::feed::{HistoryPage, decode_history};

#[cfg(target_os = "espidf")]
use core::time::Duration;
#[cfg(target_os = "espidf")]
use esp_idf_svc::http::Method;
#[cfg(target_os = "espidf")]
use esp_idf_svc::http::client::{Configuration as HttpConfiguration, EspHttpConnection};

/// Largest response body accepted.
pub const MAX_BODY: usize = 32 * 1024;

/// Fetch and decode the most recent page of events for the configured
/// address, newest first.
pub fn fetch_history(config: &FeedConfig, decoder: &impl PayloadDecoder) -> Result<HistoryPage> {
    let url = config
        .history_url()
        .ok_or(Error::Config(ConfigError::ValidationFailed("feed not provisioned")))?;
    info!("History: GET {}", url);

    let body = fetch_body(&url)?;
    let text = core::str::from_utf8(&body).map_err(|_| DecodeError::NotUtf8)?;
    let page = decode_history(
        text,
        config.signer_filter(),
        usize::from(config.history_page_size),
        decoder,
    )?;
    Ok(page)
}

#[cfg(target_os = "espidf")]
fn fetch_body(url: &str) -> Result<Vec<u8>> {
    let mut conn = EspHttpConnection::new(&HttpConfiguration {
        timeout: Some(Duration::from_secs(10)),
        crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
        ..Default::default()
    })
    .map_err(|_| Error::Transport("http client init failed"))?;

    conn.initiate_request(Method::Get, url, &[("accept", "application/json")])
        .map_err(|_| Error::Transport("http request failed"))?;
    conn.initiate_response()
        .map_err(|_| Error::Transport("http response failed"))?;

    let status = conn.status();
    if !(200..300).contains(&status) {
        warn!("History: HTTP {}", status);
        return Err(Error::Transport("http status not 2xx"));
    }

    let mut body = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = conn
            .read(&mut chunk)
            .map_err(|_| Error::Transport("http read failed"))?;
        if n == 0 {
            break;
        }
        if body.len() + n > MAX_BODY {
            warn!("History: body exceeds {} bytes", MAX_BODY);
            return Err(Error::Transport("http body too large"));
        }
        body.extend_from_slice(&chunk[..n]);
    }
    Ok(body)
}

#[cfg(not(target_os = "espidf"))]
fn fetch_body(url: &str) -> Result<Vec<u8>> {
    warn!("History(sim): no node behind {}, returning an empty page", url);
    Ok(br#"{"data":[]}"#.to_vec())
}
