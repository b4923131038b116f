//! Shared HTTP client, header, and multipart utilities.

use std::sync::OnceLock;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::GptKitError;

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .pool_max_idle_per_host(10)
            .build()
            .expect("Failed to build HTTP client")
    })
}

/// Build default headers for a Bearer-token API.
pub fn bearer_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {api_key}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Bearer headers plus the opt-in header the assistants endpoints require.
pub fn beta_headers(api_key: &str) -> HeaderMap {
    let mut headers = bearer_headers(api_key);
    headers.insert("OpenAI-Beta", HeaderValue::from_static("assistants=v1"));
    headers
}

/// Map a non-success HTTP status to an error.
pub fn status_to_error(status: u16, body: &str) -> GptKitError {
    match status {
        401 | 403 => GptKitError::Authentication(body.to_string()),
        429 => GptKitError::RateLimited {
            retry_after_ms: extract_retry_after(body),
        },
        _ => GptKitError::api(status, body),
    }
}

fn extract_retry_after(body: &str) -> Option<u64> {
    // Try to parse retry-after from JSON error body
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("retry_after"))
                .and_then(|r| r.as_f64())
                .map(|s| (s * 1000.0) as u64)
        })
}

/// Build a `multipart/form-data` body for a file upload.
pub fn build_file_multipart(
    boundary: &str,
    purpose: &str,
    filename: &str,
    bytes: &[u8],
) -> Vec<u8> {
    let mut body = Vec::with_capacity(bytes.len() + 256);

    append_field(&mut body, boundary, "purpose", purpose);

    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    body
}

fn append_field(body: &mut Vec<u8>, boundary: &str, name: &str, value: &str) {
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
    );
    body.extend_from_slice(value.as_bytes());
    body.extend_from_slice(b"\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert!(matches!(
            status_to_error(401, "nope"),
            GptKitError::Authentication(_)
        ));
        assert!(matches!(
            status_to_error(429, "{}"),
            GptKitError::RateLimited { .. }
        ));
        assert!(matches!(
            status_to_error(500, "boom"),
            GptKitError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn retry_after_parsed_from_body() {
        let err = status_to_error(429, r#"{"error": {"retry_after": 1.5}}"#);
        assert!(matches!(
            err,
            GptKitError::RateLimited {
                retry_after_ms: Some(1500)
            }
        ));
    }

    #[test]
    fn multipart_contains_purpose_and_payload() {
        let body = build_file_multipart("b0", "assistants", "file", b"hello");
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("name=\"purpose\"\r\n\r\nassistants"));
        assert!(text.contains("filename=\"file\""));
        assert!(text.contains("hello"));
        assert!(text.ends_with("--b0--\r\n"));
    }
}
