use std::time::Duration;

use reqwest::StatusCode;
use tracing::{error, warn};

use crate::utils::http::get_http_client;

/// A client-supplied product photo handed to the image model for fidelity.
#[derive(Debug, Clone)]
pub struct ReferenceImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ReferenceImage {
    pub fn new(bytes: Vec<u8>) -> Self {
        let mime_type = detect_mime_type(&bytes).unwrap_or_else(|| "image/png".to_string());
        Self { bytes, mime_type }
    }
}

pub fn detect_mime_type(data: &[u8]) -> Option<String> {
    // `infer` misses bare HEIC brands, which phone uploads use a lot.
    if data.len() > 12 {
        let ftyp = &data[4..12];
        if ftyp.starts_with(b"ftyp") {
            let brand = &ftyp[4..8];
            if brand == b"heic" || brand == b"heif" || brand == b"hevc" {
                return Some("image/heic".to_string());
            }
        }
    }

    infer::get(data).map(|kind| kind.mime_type().to_string())
}

const MEDIA_DOWNLOAD_MAX_ATTEMPTS: usize = 3;
const MEDIA_DOWNLOAD_BASE_DELAY_MS: u64 = 400;

fn should_retry_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

/// Fetches a URL-supplied reference image with bounded retries. Returns
/// `None` on exhaustion; the caller decides whether a missing reference is
/// fatal.
pub async fn download_media(url: &str) -> Option<Vec<u8>> {
    let client = get_http_client();
    for attempt in 0..MEDIA_DOWNLOAD_MAX_ATTEMPTS {
        let response = match client.get(url).send().await {
            Ok(resp) => resp,
            Err(err) => {
                warn!(
                    "Failed to fetch reference image {url}: {err} (attempt={}/{})",
                    attempt + 1,
                    MEDIA_DOWNLOAD_MAX_ATTEMPTS
                );
                if !should_retry_error(&err) || attempt + 1 == MEDIA_DOWNLOAD_MAX_ATTEMPTS {
                    return None;
                }
                let delay = Duration::from_millis(MEDIA_DOWNLOAD_BASE_DELAY_MS << attempt);
                tokio::time::sleep(delay).await;
                continue;
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            warn!("Reference image download failed for {url} with status {status}");
            if !should_retry_status(status) || attempt + 1 == MEDIA_DOWNLOAD_MAX_ATTEMPTS {
                return None;
            }
            let delay = Duration::from_millis(MEDIA_DOWNLOAD_BASE_DELAY_MS << attempt);
            tokio::time::sleep(delay).await;
            continue;
        }

        match response.bytes().await {
            Ok(bytes) => return Some(bytes.to_vec()),
            Err(err) => {
                error!(
                    "Failed to read reference image bytes {url}: {err} (attempt={}/{})",
                    attempt + 1,
                    MEDIA_DOWNLOAD_MAX_ATTEMPTS
                );
                if attempt + 1 == MEDIA_DOWNLOAD_MAX_ATTEMPTS {
                    return None;
                }
                let delay = Duration::from_millis(MEDIA_DOWNLOAD_BASE_DELAY_MS << attempt);
                tokio::time::sleep(delay).await;
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_png_signature() {
        let png = [
            0x89u8, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D, 0x49, 0x48, 0x44,
            0x52,
        ];
        assert_eq!(detect_mime_type(&png).as_deref(), Some("image/png"));
    }

    #[test]
    fn detects_bare_heic_brand() {
        let mut heic = vec![0u8, 0, 0, 0x18];
        heic.extend_from_slice(b"ftypheic");
        heic.extend_from_slice(&[0u8; 16]);
        assert_eq!(detect_mime_type(&heic).as_deref(), Some("image/heic"));
    }

    #[test]
    fn unknown_bytes_yield_none() {
        assert_eq!(detect_mime_type(b"not an image"), None);
    }

    #[test]
    fn reference_image_defaults_to_png_mime() {
        let reference = ReferenceImage::new(b"opaque".to_vec());
        assert_eq!(reference.mime_type, "image/png");
    }
}
