//! Client for the external text-classification service that suggests a
//! category for freeform descriptions. Strictly best-effort: any failure
//! (network, non-OK status, malformed body, timeout) falls back to the
//! default category supplied by the call site and is never surfaced as an
//! error.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Deserialize)]
struct ClassifyResponse {
    category: Option<String>,
}

#[derive(Clone)]
pub struct Classifier {
    http: Client,
    endpoint: Option<String>,
}

impl Classifier {
    pub fn new(endpoint: Option<String>, timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { http, endpoint }
    }

    /// A classifier with no endpoint; every call returns the fallback.
    pub fn disabled() -> Self {
        Self::new(None, Duration::from_millis(1))
    }

    pub async fn classify(
        &self,
        text: &str,
        user_id: &str,
        wallet_kind: &str,
        fallback: &str,
    ) -> String {
        let Some(endpoint) = &self.endpoint else {
            return fallback.to_string();
        };

        let body = json!({
            "text": text,
            "userId": user_id,
            "walletType": wallet_kind,
        });

        let response = match self.http.post(endpoint).json(&body).send().await {
            Ok(response) => response,
            Err(_) => {
                tracing::debug!(%endpoint, "classifier unreachable, using fallback");
                return fallback.to_string();
            }
        };

        if !response.status().is_success() {
            tracing::debug!(
                status = %response.status(),
                "classifier returned non-OK status, using fallback"
            );
            return fallback.to_string();
        }

        match response.json::<ClassifyResponse>().await {
            Ok(ClassifyResponse {
                category: Some(category),
            }) if !category.trim().is_empty() && category != UNCATEGORIZED => category,
            _ => fallback.to_string(),
        }
    }
}
