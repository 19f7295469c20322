//! HTTP transport to the media-control server.

use std::time::Duration;

use tracing::{debug, warn};

/// Bodies above this are rejected so a bad cover-art URL cannot exhaust
/// memory on the device.
pub const MAX_BODY_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server answered HTTP {0}")]
    Status(u16),
    #[error("response body exceeds {MAX_BODY_BYTES} bytes")]
    TooLarge,
    #[error("cover art could not be decoded: {0}")]
    Decode(#[from] image::ImageError),
    #[error("decoded cover art has no pixels")]
    EmptyImage,
}

/// Playback control requests the dispatcher can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Play,
    Pause,
    Next,
    Previous,
    Volume(u8),
}

impl Command {
    pub fn endpoint(self) -> String {
        match self {
            Command::Play => "play".to_string(),
            Command::Pause => "pause".to_string(),
            Command::Next => "next".to_string(),
            Command::Previous => "previous".to_string(),
            Command::Volume(pct) => format!("volume?volume_percent={}", pct.min(100)),
        }
    }
}

/// Thin wrapper over a shared `reqwest::Client`, bound to one server.
#[derive(Clone)]
pub struct FetchClient {
    http: reqwest::Client,
    base: String,
}

impl FetchClient {
    pub fn new(address: &str, port: u16) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base: format!("http://{}:{}", address, port),
        })
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base, endpoint)
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!("GET {}", url);
        let mut resp = self.http.get(url).send().await?;
        let status = resp.status();
        if status.as_u16() != 200 {
            return Err(FetchError::Status(status.as_u16()));
        }
        if resp.content_length().is_some_and(|len| len > MAX_BODY_BYTES) {
            return Err(FetchError::TooLarge);
        }
        // Chunked responses carry no length up front; the cap is enforced
        // while streaming, before the body is ever buffered whole.
        let mut body = Vec::new();
        while let Some(chunk) = resp.chunk().await? {
            if (body.len() + chunk.len()) as u64 > MAX_BODY_BYTES {
                return Err(FetchError::TooLarge);
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }

    /// Fetch a JSON payload from `endpoint`.
    pub async fn fetch_text(&self, endpoint: &str) -> Result<String, FetchError> {
        let body = self.get_bytes(&self.url(endpoint)).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Download cover art from an absolute URL.
    pub async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.get_bytes(url).await
    }

    /// Fire a control request on a background task. Failures only get
    /// logged; the next now-playing poll shows the real outcome.
    pub fn send_command(&self, command: Command) {
        let url = self.url(&command.endpoint());
        let client = self.clone();
        tokio::spawn(async move {
            if let Err(e) = client.get_bytes(&url).await {
                warn!("control request {} failed: {}", url, e);
            }
        });
    }
}
