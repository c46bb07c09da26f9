//! Image acquisition for canvas rendering.
//!
//! Remote image elements reference arbitrary URLs, so every fetch runs
//! behind a guard that rejects private, loopback, and link-local hosts
//! before a single packet leaves the process. Fetched bytes are turned
//! into data URIs so renderers never perform network I/O themselves.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;
use url::Url;

use easel_core::{CanvasState, ElementId, ElementKind, ImageSource};

/// Per-request fetch deadline.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
/// Maximum accepted image payload in bytes.
const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
/// User agent sent with image fetches.
const USER_AGENT: &str = concat!("easel/", env!("CARGO_PKG_VERSION"));

/// Errors from acquiring a single image.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// URL scheme other than http/https.
    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    /// Host resolves into a blocked network range.
    #[error("blocked host: {0}")]
    BlockedHost(String),

    /// The URL could not be parsed.
    #[error("invalid image URL: {0}")]
    InvalidUrl(String),

    /// Response did not carry an image content type.
    #[error("URL does not point to an image: {0}")]
    NotAnImage(String),

    /// Fetch exceeded the deadline.
    #[error("image fetch timed out")]
    FetchTimeout,

    /// Payload exceeded the size cap.
    #[error("image too large: {0} bytes")]
    TooLarge(usize),

    /// Network-level fetch failure.
    #[error("image fetch failed: {0}")]
    Fetch(String),

    /// Malformed inline data URI.
    #[error("invalid data URI: {0}")]
    InvalidDataUri(String),

    /// Payload bytes do not decode as an image.
    #[error("image decoding failed: {0}")]
    Decode(String),
}

/// An image acquired and normalized for rendering.
#[derive(Debug, Clone)]
pub struct AcquiredImage {
    /// Raw image bytes.
    pub bytes: Vec<u8>,
    /// MIME type, e.g. `image/png`.
    pub mime: String,
    /// `data:<mime>;base64,<payload>` form for embedding in markup.
    pub data_uri: String,
}

impl AcquiredImage {
    /// Decode the payload into pixels.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::Decode`] if the bytes are not a supported
    /// raster format.
    pub fn decode(&self) -> Result<image::DynamicImage, AcquireError> {
        image::load_from_memory(&self.bytes).map_err(|e| AcquireError::Decode(e.to_string()))
    }
}

/// Outcome of resolving one image element's source.
#[derive(Debug, Clone)]
pub enum ImageResolution {
    /// Image bytes are available.
    Resolved(AcquiredImage),
    /// Acquisition failed; renderers substitute a placeholder.
    Failed,
}

/// Resolved images keyed by the element that references them.
pub type ImageMap = HashMap<ElementId, ImageResolution>;

/// Fetches remote images with SSRF guarding, timeouts, and size caps.
#[derive(Debug, Clone)]
pub struct ImageFetcher {
    client: reqwest::Client,
    max_bytes: usize,
    guard_hosts: bool,
}

impl Default for ImageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageFetcher {
    /// Create a fetcher with the standard 10s timeout and 10MB cap.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(FETCH_TIMEOUT, MAX_IMAGE_BYTES)
    }

    /// Create a fetcher with explicit limits.
    #[must_use]
    pub fn with_limits(timeout: Duration, max_bytes: usize) -> Self {
        // Redirects re-run the host guard so a public URL cannot bounce
        // the request into an internal address.
        let redirect = reqwest::redirect::Policy::custom(|attempt| {
            if attempt.previous().len() > 3 {
                return attempt.error("too many redirects");
            }
            match attempt.url().host_str() {
                Some(host) if !is_blocked_host(host) => attempt.follow(),
                _ => attempt.error("redirect into blocked host"),
            }
        });

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(redirect)
            .build()
            .unwrap_or_else(|error| {
                tracing::warn!(%error, "http client builder failed, using defaults");
                reqwest::Client::new()
            });

        Self {
            client,
            max_bytes,
            guard_hosts: true,
        }
    }

    /// Build a fetcher with the host guard disabled so tests can hit
    /// local fixture servers.
    #[cfg(test)]
    fn permissive(timeout: Duration, max_bytes: usize) -> Self {
        Self {
            guard_hosts: false,
            ..Self::with_limits(timeout, max_bytes)
        }
    }

    /// Resolve a single image source into bytes.
    ///
    /// Inline data URIs are decoded locally; URLs are fetched subject to
    /// the host guard, timeout, content-type check, and size cap.
    ///
    /// # Errors
    ///
    /// Returns an [`AcquireError`] describing the first check that failed.
    pub async fn resolve(&self, source: &ImageSource) -> Result<AcquiredImage, AcquireError> {
        match source {
            ImageSource::Data { image_data } => decode_data_uri(image_data),
            ImageSource::Url { image_url } => self.fetch(image_url).await,
        }
    }

    /// Resolve every image element on the canvas concurrently.
    ///
    /// Failures never abort the pass: a failed element maps to
    /// [`ImageResolution::Failed`] and renderers draw a placeholder.
    pub async fn resolve_all(&self, state: &CanvasState) -> ImageMap {
        let pending: Vec<(ElementId, ImageSource)> = state
            .elements
            .iter()
            .filter_map(|element| match &element.kind {
                ElementKind::Image { source, .. } => Some((element.id, source.clone())),
                _ => None,
            })
            .collect();

        let results = futures::future::join_all(pending.iter().map(|(id, source)| async move {
            (*id, self.resolve(source).await)
        }))
        .await;

        let mut map = ImageMap::with_capacity(results.len());
        for (id, outcome) in results {
            match outcome {
                Ok(acquired) => {
                    map.insert(id, ImageResolution::Resolved(acquired));
                }
                Err(error) => {
                    tracing::warn!(element_id = %id, %error, "image acquisition failed");
                    map.insert(id, ImageResolution::Failed);
                }
            }
        }
        map
    }

    async fn fetch(&self, raw_url: &str) -> Result<AcquiredImage, AcquireError> {
        let url = Url::parse(raw_url).map_err(|e| AcquireError::InvalidUrl(e.to_string()))?;
        check_url(&url, self.guard_hosts)?;

        tracing::debug!(url = %url, "fetching remote image");
        let mut response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                AcquireError::FetchTimeout
            } else {
                AcquireError::Fetch(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(AcquireError::Fetch(format!(
                "HTTP {} from {url}",
                response.status()
            )));
        }

        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase())
            .unwrap_or_default();
        if !mime.starts_with("image/") {
            return Err(AcquireError::NotAnImage(format!(
                "content type {mime:?} from {url}"
            )));
        }

        if let Some(length) = response.content_length() {
            let length = usize::try_from(length).unwrap_or(usize::MAX);
            if length > self.max_bytes {
                return Err(AcquireError::TooLarge(length));
            }
        }

        // Stream the body so a response without a Content-Length header
        // is cut off at the cap instead of buffered whole.
        let mut bytes: Vec<u8> = Vec::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    if bytes.len() + chunk.len() > self.max_bytes {
                        return Err(AcquireError::TooLarge(bytes.len() + chunk.len()));
                    }
                    bytes.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                Err(e) => {
                    return Err(if e.is_timeout() {
                        AcquireError::FetchTimeout
                    } else {
                        AcquireError::Fetch(e.to_string())
                    })
                }
            }
        }

        // SVG payloads are passed through as-is; raster payloads must at
        // least carry a recognizable magic number.
        if mime != "image/svg+xml" && image::guess_format(&bytes).is_err() {
            return Err(AcquireError::NotAnImage(format!(
                "payload from {url} is not a recognizable image"
            )));
        }

        let data_uri = format!("data:{mime};base64,{}", STANDARD.encode(&bytes));
        Ok(AcquiredImage {
            bytes,
            mime,
            data_uri,
        })
    }
}

/// Decode an inline `data:<mime>;base64,<payload>` URI.
fn decode_data_uri(uri: &str) -> Result<AcquiredImage, AcquireError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| AcquireError::InvalidDataUri("missing data: prefix".to_string()))?;
    let (mime, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| AcquireError::InvalidDataUri("missing ;base64, marker".to_string()))?;

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| AcquireError::InvalidDataUri(e.to_string()))?;
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(AcquireError::TooLarge(bytes.len()));
    }

    Ok(AcquiredImage {
        bytes,
        mime: mime.to_ascii_lowercase(),
        data_uri: uri.to_string(),
    })
}

/// Scheme and host checks applied before any request is sent.
fn check_url(url: &Url, guard_hosts: bool) -> Result<(), AcquireError> {
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(AcquireError::UnsupportedScheme(other.to_string())),
    }
    let host = url
        .host_str()
        .ok_or_else(|| AcquireError::InvalidUrl(format!("no host in {url}")))?;
    if guard_hosts && is_blocked_host(host) {
        return Err(AcquireError::BlockedHost(host.to_string()));
    }
    Ok(())
}

/// Whether a hostname is off-limits for image fetches.
///
/// Blocks `localhost`, IPv4 loopback/private/link-local ranges, the IPv6
/// loopback, unique-local `fc00::/7`, and link-local `fe80::/10`.
#[must_use]
pub fn is_blocked_host(host: &str) -> bool {
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    // IPv6 hosts in URLs keep their brackets.
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    match bare.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => is_blocked_v4(ip),
        Ok(IpAddr::V6(ip)) => is_blocked_v6(ip),
        Err(_) => false,
    }
}

fn is_blocked_v4(ip: Ipv4Addr) -> bool {
    ip.is_loopback() || ip.is_private() || ip.is_link_local() || ip.is_unspecified()
}

fn is_blocked_v6(ip: Ipv6Addr) -> bool {
    let segments = ip.segments();
    ip.is_loopback()
        || ip.is_unspecified()
        || (segments[0] & 0xfe00) == 0xfc00
        || (segments[0] & 0xffc0) == 0xfe80
}
