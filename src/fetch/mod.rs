//! Image retrieval.
//!
//! Retrieval is the only I/O-bound, per-item step of an extraction and the
//! only one allowed to fail without aborting the run. Every failure is a
//! [`RetrievalError`] that names the offending locator; the caller logs it,
//! counts it and moves on.

mod http;
mod local;

pub use http::HttpFetcher;
pub use local::LocalDirFetcher;

use std::time::Duration;

use thiserror::Error;

use crate::ir::ImageRecord;

/// Retrieves the raw bytes of an image.
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, image: &ImageRecord) -> Result<Vec<u8>, RetrievalError>;
}

/// A recoverable, per-image retrieval failure.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("invalid locator '{locator}': {message}")]
    InvalidLocator { locator: String, message: String },

    #[error("HTTP status {status} while fetching {locator}")]
    Http { locator: String, status: u16 },

    #[error("transport error while fetching {locator}: {message}")]
    Transport { locator: String, message: String },

    #[error("I/O error while reading {locator}: {source}")]
    Io {
        locator: String,
        #[source]
        source: std::io::Error,
    },

    #[error("payload from {locator} is not a recognizable image ({len} bytes)")]
    NotAnImage { locator: String, len: usize },

    #[error("response from {locator} exceeds {limit} bytes")]
    TooLarge { locator: String, limit: u64 },
}

impl RetrievalError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            RetrievalError::Http { status, .. } => *status == 429 || *status >= 500,
            RetrievalError::Transport { .. } => true,
            _ => false,
        }
    }
}

/// Timeout and retry budget for a single image.
#[derive(Clone, Debug)]
pub struct FetchOptions {
    /// Extra attempts after the first one, for retryable failures only.
    pub retries: u32,
    /// Whole-request timeout per attempt.
    pub timeout_secs: u64,
    /// Delay before the first retry; doubled on each further retry.
    pub backoff_ms: u64,
    /// Upper bound on a single response body.
    pub max_bytes: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            retries: 2,
            timeout_secs: 30,
            backoff_ms: 500,
            max_bytes: 64 * 1024 * 1024,
        }
    }
}

/// Runs `attempt` until it succeeds, fails permanently, or the retry budget
/// in `options` is spent.
pub(crate) fn with_retries<T>(
    options: &FetchOptions,
    locator: &str,
    mut attempt: impl FnMut() -> Result<T, RetrievalError>,
) -> Result<T, RetrievalError> {
    let mut delay = Duration::from_millis(options.backoff_ms);
    let mut tries = 0u32;

    loop {
        match attempt() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && tries < options.retries => {
                tries += 1;
                log::warn!(
                    "attempt {}/{} for {} failed: {}; retrying in {:?}",
                    tries,
                    options.retries + 1,
                    locator,
                    err,
                    delay
                );
                std::thread::sleep(delay);
                delay = delay.saturating_mul(2);
            }
            Err(err) => return Err(err),
        }
    }
}

/// Rejects payloads that do not start with a known image header, such as
/// HTML error pages served with a 200 status.
pub fn ensure_image_payload(locator: &str, bytes: &[u8]) -> Result<(), RetrievalError> {
    imagesize::blob_size(bytes)
        .map(|_| ())
        .map_err(|_| RetrievalError::NotAnImage {
            locator: locator.to_string(),
            len: bytes.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fast_options(retries: u32) -> FetchOptions {
        FetchOptions {
            retries,
            backoff_ms: 0,
            ..Default::default()
        }
    }

    fn transport_error() -> RetrievalError {
        RetrievalError::Transport {
            locator: "http://x".into(),
            message: "connection reset".into(),
        }
    }

    #[test]
    fn retries_transient_failures_until_success() {
        let calls = Cell::new(0);
        let result = with_retries(&fast_options(2), "http://x", || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(transport_error())
            } else {
                Ok(7)
            }
        });
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn gives_up_after_budget() {
        let calls = Cell::new(0);
        let result: Result<(), _> = with_retries(&fast_options(1), "http://x", || {
            calls.set(calls.get() + 1);
            Err(transport_error())
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn does_not_retry_permanent_failures() {
        let calls = Cell::new(0);
        let result: Result<(), _> = with_retries(&fast_options(5), "http://x", || {
            calls.set(calls.get() + 1);
            Err(RetrievalError::Http {
                locator: "http://x".into(),
                status: 404,
            })
        });
        assert!(matches!(result, Err(RetrievalError::Http { status: 404, .. })));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn server_errors_are_retryable() {
        let err = RetrievalError::Http {
            locator: String::new(),
            status: 503,
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn oversized_body_is_not_retried() {
        let calls = Cell::new(0);
        let result: Result<(), _> = with_retries(&fast_options(3), "http://x", || {
            calls.set(calls.get() + 1);
            Err(RetrievalError::TooLarge {
                locator: "http://x".into(),
                limit: 16,
            })
        });
        assert!(matches!(result, Err(RetrievalError::TooLarge { limit: 16, .. })));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn html_payload_is_not_an_image() {
        let err = ensure_image_payload("http://x", b"<html>Not Found</html>").unwrap_err();
        assert!(matches!(err, RetrievalError::NotAnImage { len: 22, .. }));
    }
}
