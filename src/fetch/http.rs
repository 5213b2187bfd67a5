use std::time::Duration;

use super::{with_retries, FetchOptions, ImageFetcher, RetrievalError};
use crate::ir::ImageRecord;

/// Downloads images from their HTTP(S) locator.
pub struct HttpFetcher {
    agent: ureq::Agent,
    options: FetchOptions,
}

impl HttpFetcher {
    pub fn new(options: FetchOptions) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(options.timeout_secs)))
            .build();
        let agent: ureq::Agent = config.into();

        Self { agent, options }
    }

    fn fetch_once(&self, url: &url::Url) -> Result<Vec<u8>, RetrievalError> {
        let mut response = self.agent.get(url.as_str()).call().map_err(|err| match err {
            ureq::Error::StatusCode(status) => RetrievalError::Http {
                locator: url.to_string(),
                status,
            },
            other => RetrievalError::Transport {
                locator: url.to_string(),
                message: other.to_string(),
            },
        })?;

        response
            .body_mut()
            .with_config()
            .limit(self.options.max_bytes)
            .read_to_vec()
            .map_err(|err| body_error(url, self.options.max_bytes, err))
    }
}

fn body_error(url: &url::Url, limit: u64, err: ureq::Error) -> RetrievalError {
    match err {
        ureq::Error::BodyExceedsLimit(_) => RetrievalError::TooLarge {
            locator: url.to_string(),
            limit,
        },
        other => RetrievalError::Transport {
            locator: url.to_string(),
            message: other.to_string(),
        },
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch(&self, image: &ImageRecord) -> Result<Vec<u8>, RetrievalError> {
        let url = parse_locator(&image.remote_locator)?;
        with_retries(&self.options, &image.remote_locator, || self.fetch_once(&url))
    }
}

fn parse_locator(locator: &str) -> Result<url::Url, RetrievalError> {
    if locator.trim().is_empty() {
        return Err(RetrievalError::InvalidLocator {
            locator: locator.to_string(),
            message: "image record has no remote locator".to_string(),
        });
    }

    let url = url::Url::parse(locator).map_err(|source| RetrievalError::InvalidLocator {
        locator: locator.to_string(),
        message: source.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(RetrievalError::InvalidLocator {
            locator: locator.to_string(),
            message: format!("unsupported scheme '{other}'"),
        }),
    }
}
