//! Offer/answer exchange with the backend signaling endpoint.
//!
//! The backend accepts the raw SDP offer as the request body and replies with
//! the raw SDP answer:
//!
//! ```text
//! POST {base}/api/rtc-connect
//! Content-Type: application/sdp
//! ```

use http::header::CONTENT_TYPE;
use url::Url;

use crate::core::realtime::{RealtimeError, RealtimeResult};

/// Media type of the offer body.
pub const SDP_CONTENT_TYPE: &str = "application/sdp";

/// Client for the signaling endpoint.
#[derive(Debug, Clone)]
pub struct SignalingClient {
    http: reqwest::Client,
    url: Url,
}

impl SignalingClient {
    pub fn new(http: reqwest::Client, url: Url) -> Self {
        Self { http, url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Send the offer SDP and return the answer SDP.
    pub async fn exchange(&self, offer: String) -> RealtimeResult<String> {
        tracing::debug!("Posting SDP offer ({} bytes) to {}", offer.len(), self.url);

        let response = self
            .http
            .post(self.url.clone())
            .header(CONTENT_TYPE, SDP_CONTENT_TYPE)
            .body(offer)
            .send()
            .await
            .map_err(|e| RealtimeError::SignalingFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RealtimeError::SignalingFailed(format!(
                "Signaling endpoint returned {}: {}",
                status, body
            )));
        }

        let answer = response
            .text()
            .await
            .map_err(|e| RealtimeError::SignalingFailed(e.to_string()))?;

        tracing::debug!("Received SDP answer ({} bytes)", answer.len());
        Ok(answer)
    }
}
