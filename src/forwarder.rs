
use std::future::Future;
use tokio::time::{sleep, Duration, Instant};

use crate::config::Config;
use crate::ecowitt::EcowittClient;
use crate::error::{ForwarderError, Result, Stage};
use crate::record;
use crate::thingspeak::ThingSpeakClient;

/// What a single poll cycle ended with. Every variant is already logged.
#[derive(Debug)]
pub enum CycleOutcome {
    Published { response: String },
    ProviderRejected { code: i64, message: String },
    FetchFailed(ForwarderError),
    PublishFailed(ForwarderError),
}

pub struct Forwarder {
    config: Config,
    ecowitt: EcowittClient,
    thingspeak: ThingSpeakClient,
}

impl Forwarder {
    pub fn new(config: Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(ForwarderError::HttpClient)?;
        let ecowitt = EcowittClient::new(http.clone(), config.endpoints.ecowitt_url.clone());
        let thingspeak = ThingSpeakClient::new(http, config.endpoints.thingspeak_url.clone());
        Ok(Self {
            config,
            ecowitt,
            thingspeak,
        })
    }

    /// Polls forever: once immediately, then once per interval.
    pub async fn run(&self) {
        run_every(self.config.poll_interval, move || async move {
            self.run_cycle().await;
        })
        .await
    }

    pub async fn run_cycle(&self) -> CycleOutcome {
        let credentials = &self.config.credentials;
        tracing::debug!(mac = %credentials.mac, "polling Ecowitt");

        let reading = match self.ecowitt.fetch(credentials).await {
            Ok(reading) => reading,
            Err(err) => {
                tracing::warn!(
                    stage = %Stage::Fetch,
                    timeout = err.is_timeout(),
                    error = %err,
                    "failed to fetch Ecowitt data"
                );
                return CycleOutcome::FetchFailed(err);
            }
        };

        let observed_at = reading.server_time();
        let reading = match reading.into_checked() {
            Ok(reading) => reading,
            Err(ForwarderError::Provider { code, message }) => {
                tracing::warn!(code, message = %message, "Ecowitt API reported an error");
                return CycleOutcome::ProviderRejected { code, message };
            }
            Err(err) => {
                tracing::warn!(stage = %Stage::Fetch, error = %err, "failed to check Ecowitt data");
                return CycleOutcome::FetchFailed(err);
            }
        };

        let output = record::transform(&reading);
        tracing::debug!(fields = ?output.fields().collect::<Vec<_>>(), "mapped reading");
        match self
            .thingspeak
            .publish(&credentials.write_api_key, &output)
            .await
        {
            Ok(response) => {
                tracing::info!(
                    response = %response,
                    observed_at = ?observed_at,
                    "relayed reading to ThingSpeak"
                );
                CycleOutcome::Published { response }
            }
            Err(err) => {
                tracing::warn!(
                    stage = %Stage::Publish,
                    timeout = err.is_timeout(),
                    error = %err,
                    "failed to send data to ThingSpeak"
                );
                CycleOutcome::PublishFailed(err)
            }
        }
    }
}

/// Remaining sleep after a cycle that took `elapsed`. Overruns get no sleep
/// and no catch-up, so the phase drifts.
pub fn remaining_wait(elapsed: Duration, interval: Duration) -> Option<Duration> {
    interval.checked_sub(elapsed).filter(|wait| !wait.is_zero())
}

/// Runs `cycle` back to back, starting each run at least `interval` after the
/// previous one started. Never returns.
pub async fn run_every<F, Fut>(interval: Duration, mut cycle: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    loop {
        let started = Instant::now();
        cycle().await;
        if let Some(wait) = remaining_wait(started.elapsed(), interval) {
            sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod timing_tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn waits_out_the_rest_of_the_interval() {
        let interval = Duration::from_secs(60);
        assert_eq!(
            remaining_wait(Duration::from_secs(4), interval),
            Some(Duration::from_secs(56))
        );
        assert_eq!(
            remaining_wait(Duration::ZERO, interval),
            Some(Duration::from_secs(60))
        );
    }

    #[test]
    fn overrun_cycles_do_not_sleep() {
        let interval = Duration::from_secs(60);
        assert_eq!(remaining_wait(Duration::from_secs(60), interval), None);
        assert_eq!(remaining_wait(Duration::from_secs(75), interval), None);
    }

    async fn record_starts(work: Duration, horizon: Duration) -> Vec<u64> {
        let origin = Instant::now();
        let starts = Arc::new(Mutex::new(Vec::new()));
        let recorded = starts.clone();
        let schedule = run_every(Duration::from_secs(60), move || {
            let recorded = recorded.clone();
            async move {
                recorded.lock().unwrap().push(origin.elapsed().as_secs());
                sleep(work).await;
            }
        });
        let _ = tokio::time::timeout(horizon, schedule).await;
        let starts = starts.lock().unwrap().clone();
        starts
    }

    #[tokio::test(start_paused = true)]
    async fn short_cycles_start_on_the_interval() {
        let starts = record_starts(Duration::from_secs(5), Duration::from_secs(150)).await;
        assert_eq!(starts, vec![0, 60, 120]);
    }

    #[tokio::test(start_paused = true)]
    async fn long_cycles_start_back_to_back() {
        let starts = record_starts(Duration::from_secs(70), Duration::from_secs(150)).await;
        assert_eq!(starts, vec![0, 70, 140]);
    }
}
