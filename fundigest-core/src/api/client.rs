//! HTTP client for the digest endpoint.

use reqwest::{Response, StatusCode};
use serde::Serialize;
use serde_json::Value;

use super::error::ApiError;
use super::DigestApi;
use crate::models::{DigestRecord, DigestRoot};

const DIGEST_PATH: &str = "/api/digest";

#[derive(Serialize)]
struct WriteBody<'a> {
    data: &'a DigestRoot,
    #[serde(skip_serializing_if = "Option::is_none")]
    run_id: Option<&'a str>,
}

/// Digest client backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpDigestClient {
    server_url: String,
    http: reqwest::Client,
}

impl HttpDigestClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            http: reqwest::Client::new(),
        }
    }

    fn digest_url(&self) -> String {
        format!("{}{}", self.server_url.trim_end_matches('/'), DIGEST_PATH)
    }
}

/// Maps a failed response to an error, using the service's `error` text when
/// the body carries one.
fn error_for(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

    if status == StatusCode::BAD_REQUEST {
        ApiError::Rejected { message }
    } else {
        ApiError::Server {
            status: status.as_u16(),
            message,
        }
    }
}

async fn read_record(response: Response) -> Result<DigestRecord, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(error_for(status, &body));
    }
    response
        .json::<DigestRecord>()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

impl DigestApi for HttpDigestClient {
    async fn fetch_latest(&self) -> Result<DigestRecord, ApiError> {
        tracing::debug!("Fetching latest digest from {}", self.digest_url());
        let response = self.http.get(self.digest_url()).send().await?;
        read_record(response).await
    }

    async fn save(&self, data: &DigestRoot, run_id: Option<&str>) -> Result<DigestRecord, ApiError> {
        tracing::debug!(
            "Saving digest with {} companies to {}",
            data.company_funding_digests.len(),
            self.digest_url()
        );
        let response = self
            .http
            .post(self.digest_url())
            .json(&WriteBody { data, run_id })
            .send()
            .await?;
        read_record(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_url() {
        assert_eq!(
            HttpDigestClient::new("http://localhost:8080/").digest_url(),
            "http://localhost:8080/api/digest"
        );
        assert_eq!(
            HttpDigestClient::new("http://localhost:8080").digest_url(),
            "http://localhost:8080/api/digest"
        );
    }

    #[test]
    fn test_bad_request_is_rejected() {
        let err = error_for(StatusCode::BAD_REQUEST, r#"{"error":"Invalid digest payload"}"#);
        assert!(matches!(err, ApiError::Rejected { ref message } if message == "Invalid digest payload"));
        assert_eq!(err.to_string(), "Invalid digest payload");
    }

    #[test]
    fn test_server_error_keeps_status() {
        let err = error_for(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":"Failed to write digest"}"#,
        );
        assert_eq!(
            err.to_string(),
            "Server returned status 500: Failed to write digest"
        );
    }

    #[test]
    fn test_error_without_json_body() {
        let err = error_for(StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert!(matches!(err, ApiError::Server { status: 502, ref message } if message == "Bad Gateway"));
    }

    #[test]
    fn test_write_body_omits_missing_run_id() {
        let root = DigestRoot::placeholder();
        let body = serde_json::to_value(WriteBody {
            data: &root,
            run_id: None,
        })
        .unwrap();
        assert!(body.get("run_id").is_none());
        assert!(body.get("data").is_some());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let client = HttpDigestClient::new("http://127.0.0.1:9");
        let err = client.fetch_latest().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
