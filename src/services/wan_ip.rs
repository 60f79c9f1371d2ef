//! WAN-IP discovery with exponential backoff (§4.9), grounded exactly on
//! the original `setIP`: fetch the configured IP-detect URL with a 10s
//! timeout; on failure, retry with backoff doubling each time and capped at
//! 120s; on success, publish the discovered address.

use parking_lot::RwLock;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{info, warn};

const INITIAL_RETRY_DELAY_SECS: u64 = 1;
const MAX_RETRY_DELAY_SECS: u64 = 120;
const FETCH_TIMEOUT_SECS: u64 = 10;

#[derive(Default)]
pub struct WanIpState {
    pub server_ip: RwLock<Option<Ipv4Addr>>,
    pub start_datetime: RwLock<Option<DateTime<Utc>>>,
}

/// Doubles `current`, capped at [`MAX_RETRY_DELAY_SECS`] (§4.9).
pub fn next_backoff(current: Duration) -> Duration {
    let doubled = current.as_secs().saturating_mul(2);
    Duration::from_secs(doubled.min(MAX_RETRY_DELAY_SECS))
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("IP-detect service returned an unparseable address")]
    BadResponse,
}

/// Probes for the WAN IP once. If `configured` is `Some` and not `"auto"`,
/// uses that value directly without a network call (§4.9, §10.1).
pub async fn probe_once(
    client: &reqwest::Client,
    url: &str,
    configured: Option<&str>,
) -> Result<Ipv4Addr, ProbeError> {
    if let Some(ip) = configured.filter(|value| *value != "auto") {
        if let Ok(parsed) = ip.parse() {
            return Ok(parsed);
        }
    }

    let response = client
        .get(url)
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .send()
        .await?
        .text()
        .await?;

    response.trim().parse().map_err(|_| ProbeError::BadResponse)
}

/// Runs the probe loop: on success, publishes to `state` and returns; on
/// failure, retries with capped exponential backoff forever (the loop is
/// spawned once at startup and again on an admin "requery" request, §10.5).
pub async fn run(state: Arc<WanIpState>, client: reqwest::Client, url: String, configured: Option<String>) {
    let mut delay = Duration::from_secs(INITIAL_RETRY_DELAY_SECS);

    loop {
        match probe_once(&client, &url, configured.as_deref()).await {
            Ok(ip) => {
                info!("WAN IP discovered: {ip}");
                *state.server_ip.write() = Some(ip);
                if state.start_datetime.read().is_none() {
                    *state.start_datetime.write() = Some(Utc::now());
                }
                return;
            }
            Err(err) => {
                warn!("WAN IP probe failed, retrying in {}s: {err:?}", delay.as_secs());
                tokio::time::sleep(delay).await;
                delay = next_backoff(delay);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let mut delay = Duration::from_secs(1);
        let mut seen = Vec::new();
        for _ in 0..10 {
            seen.push(delay.as_secs());
            delay = next_backoff(delay);
        }
        assert_eq!(seen, vec![1, 2, 4, 8, 16, 32, 64, 120, 120, 120]);
    }
}
