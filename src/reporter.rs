//! Periodic metrics reporter
//!
//! Drives the farm on a timer: at each tick it gathers every registered
//! group, emits the JSON dump through tracing, and optionally forwards the
//! values to the registered sink.
//!
//! Runs as an async task and shuts down cleanly on cancellation.

use std::time::Duration;

use serde::Deserialize;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::farm::farm;

/// Reporter configuration
///
/// # Example
///
/// ```toml
/// [metrics]
/// # All fields optional
/// enabled = true
/// interval = "60s"
/// publish = false
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReporterConfig {
    /// Enable periodic reporting
    /// Default: true
    pub enabled: bool,

    /// Gather interval
    /// Default: 60s
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// Also forward values to the registered sink at each tick
    /// Default: false
    pub publish: bool,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(60),
            publish: false,
        }
    }
}

/// Periodic farm reporter
pub struct Reporter {
    config: ReporterConfig,
}

impl Reporter {
    pub fn new(config: ReporterConfig) -> Self {
        Self { config }
    }

    /// Run the reporter until cancellation
    ///
    /// This is the main entry point - spawn this as a tokio task.
    pub async fn run(self, cancel: CancellationToken) {
        if !self.config.enabled {
            info!("metrics reporting disabled");
            return;
        }

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!(
            interval_secs = self.config.interval.as_secs(),
            publish = self.config.publish,
            "metrics reporter started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("metrics reporter shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.report();
                }
            }
        }
    }

    /// Gather and report once
    fn report(&self) {
        let dump = farm().gather();
        info!("{dump}");

        if self.config.publish {
            farm().publish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ReporterConfig::default();
        assert!(config.enabled);
        assert_eq!(config.interval, Duration::from_secs(60));
        assert!(!config.publish);
    }

    #[test]
    fn test_config_deserializes_humantime_interval() {
        let config: ReporterConfig =
            serde_json::from_str(r#"{"interval": "250ms", "publish": true}"#).unwrap();
        assert!(config.enabled);
        assert_eq!(config.interval, Duration::from_millis(250));
        assert!(config.publish);
    }

    #[tokio::test]
    async fn test_run_disabled_returns_immediately() {
        let config = ReporterConfig {
            enabled: false,
            ..Default::default()
        };

        let reporter = Reporter::new(config);
        reporter.run(CancellationToken::new()).await;
    }

    #[tokio::test]
    async fn test_run_exits_on_cancellation() {
        let config = ReporterConfig {
            enabled: true,
            interval: Duration::from_millis(10),
            ..Default::default()
        };

        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            cancel_clone.cancel();
        });

        Reporter::new(config).run(cancel).await;
    }
}
