use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use log::{info, warn};
use thiserror::Error;

use crate::config::FetchConfig;

/// Why the feed could not be retrieved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("invalid feed request: {0}")]
    InvalidRequest(String),
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("server returned HTTP {status}")]
    Status { status: u16 },
    #[error("reading response body: {0}")]
    Body(String),
    #[error("{0}")]
    Other(String),
}

impl FetchError {
    /// Transient failures worth another attempt.
    pub fn is_retriable(&self) -> bool {
        match self {
            FetchError::Timeout | FetchError::Connect(_) | FetchError::Body(_) => true,
            FetchError::Status { status } => *status == 429 || *status >= 500,
            FetchError::InvalidRequest(_) | FetchError::Other(_) => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_connect() {
            FetchError::Connect(e.to_string())
        } else if e.is_builder() {
            FetchError::InvalidRequest(e.to_string())
        } else if let Some(status) = e.status() {
            FetchError::Status {
                status: status.as_u16(),
            }
        } else if e.is_body() || e.is_decode() {
            FetchError::Body(e.to_string())
        } else {
            FetchError::Other(e.to_string())
        }
    }
}

/// Run `attempt` until it succeeds, fails with a non-retriable error, or
/// `max_attempts` is used up. The delay doubles after every failure.
pub fn retry_with<T>(
    config: &FetchConfig,
    mut attempt: impl FnMut(u32) -> Result<T, FetchError>,
    mut sleep: impl FnMut(Duration),
) -> Result<T, FetchError> {
    let max_attempts = config.max_attempts.max(1);
    let mut delay = config.initial_backoff();
    let mut n = 1;
    loop {
        match attempt(n) {
            Ok(v) => return Ok(v),
            Err(e) if e.is_retriable() && n < max_attempts => {
                warn!("feed attempt {n}/{max_attempts} failed: {e}; retrying in {delay:?}");
                sleep(delay);
                delay *= 2;
                n += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// GET the feed body as text.
pub fn fetch_feed(url: &str, config: &FetchConfig) -> Result<String, FetchError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(config.timeout())
        .build()?;

    let body = retry_with(
        config,
        |_| {
            let resp = client.get(url).send()?;
            let status = resp.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                });
            }
            Ok(resp.text()?)
        },
        std::thread::sleep,
    )?;

    info!("fetched {} bytes from {url}", body.len());
    Ok(body)
}

// ---------------------------------------------------------------------------
// Background retrieval
// ---------------------------------------------------------------------------

/// A feed retrieval running on a worker thread. The UI polls it once per
/// frame and never waits on it.
pub struct FeedTask {
    url: String,
    rx: Receiver<Result<String, FetchError>>,
}

impl FeedTask {
    /// Run `fetch` for `url` on a new thread.
    pub fn spawn<F>(url: String, fetch: F) -> Self
    where
        F: FnOnce(&str) -> Result<String, FetchError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let worker_url = url.clone();
        thread::spawn(move || {
            // The receiver is gone if the app closed first; nothing to do.
            let _ = tx.send(fetch(&worker_url));
        });
        FeedTask { url, rx }
    }

    /// Start [`fetch_feed`] for `url` with the given retry policy.
    pub fn fetch(url: String, config: FetchConfig) -> Self {
        Self::spawn(url, move |url| fetch_feed(url, &config))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The outcome once the worker has finished, `None` while it is running.
    pub fn poll(&self) -> Option<Result<String, FetchError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                Some(Err(FetchError::Other("feed worker stopped".to_string())))
            }
        }
    }
}
