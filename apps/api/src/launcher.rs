//! Startup wait for the LLM endpoint.
//!
//! Any HTTP response below 500 counts as reachable; 5xx and connection
//! errors trigger another attempt after `interval`.

use std::future::Future;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::Client;
use tracing::{info, warn};

/// Attempt policy for `wait_for_llm`. `max_attempts == 0` waits forever.
#[derive(Debug, Clone, Copy)]
pub struct WaitPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl WaitPolicy {
    /// Fails on a negative, non-finite, or unrepresentably large interval.
    pub fn new(interval_secs: f64, max_attempts: u32) -> Result<Self> {
        let interval = Duration::try_from_secs_f64(interval_secs)
            .with_context(|| format!("--llm-interval {interval_secs} is not a valid duration"))?;
        Ok(Self {
            interval,
            max_attempts,
        })
    }
}

/// Probes `url` with a plain GET until it answers with a non-5xx status.
pub async fn wait_for_llm(url: &str, policy: WaitPolicy) -> Result<()> {
    let client = Client::builder().timeout(Duration::from_secs(5)).build()?;
    wait_until_reachable(url, policy, |target| {
        let request = client.get(target);
        async move {
            let response = request.send().await.map_err(|e| e.to_string())?;
            Ok(response.status().as_u16())
        }
    })
    .await
}

pub(crate) async fn wait_until_reachable<F, Fut>(
    url: &str,
    policy: WaitPolicy,
    mut probe: F,
) -> Result<()>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = std::result::Result<u16, String>>,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match probe(url.to_string()).await {
            Ok(status) if status < 500 => {
                info!("LLM endpoint {url} reachable (HTTP {status})");
                return Ok(());
            }
            Ok(status) => warn!("LLM endpoint {url} returned HTTP {status} (attempt {attempt})"),
            Err(e) => warn!("LLM endpoint {url} unreachable (attempt {attempt}): {e}"),
        }

        if policy.max_attempts != 0 && attempt >= policy.max_attempts {
            bail!(
                "LLM endpoint {url} was not reachable after {} attempts",
                policy.max_attempts
            );
        }
        tokio::time::sleep(policy.interval).await;
    }
}
