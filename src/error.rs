//! Error types
//!
//! The aggregation core itself never fails: hot-path recording has no error
//! path, and API misuse (recording into an unregistered group, registering a
//! descriptor after sealing, double-registering a group) is a programming
//! error that panics. The only runtime fallible operation is forwarding
//! values to an external sink.

use thiserror::Error;

/// Failure reported by a sink adapter while publishing one metric.
///
/// Publish failures never affect aggregation; the collector logs them and
/// moves on to the next metric.
#[derive(Debug, Error)]
#[error("sink rejected metric `{metric}`: {reason}")]
pub struct SinkError {
    /// Dump key of the metric that failed
    pub metric: String,
    /// Adapter-specific failure description
    pub reason: String,
}

impl SinkError {
    pub fn new(metric: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias for sink operations
pub type Result<T> = std::result::Result<T, SinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SinkError::new("req_totalrequests", "connection refused");
        assert!(err.to_string().contains("req_totalrequests"));
        assert!(err.to_string().contains("connection refused"));
    }
}
