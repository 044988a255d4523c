//! Headline suggestion client.
//!
//! The client posts `{ "topic": ... }` to the suggestion endpoint and reads
//! `{ "headlines": [...] }` back. [`SuggestionClient::suggest`] never fails:
//! transport or service errors are logged and collapse into a one-element
//! list carrying [`FALLBACK_MESSAGE`].

use serde::{Deserialize, Serialize};

/// Shown in place of suggestions when the service cannot be reached
pub const FALLBACK_MESSAGE: &str = "حدث خطأ في الاتصال بالذكاء الاصطناعي";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuggestRequest {
    pub topic: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SuggestResponse {
    #[serde(default)]
    pub headlines: Option<Vec<String>>,
}

/// Error payload of the suggestion endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// The list shown when a request failed.
pub fn fallback() -> Vec<String> {
    vec![FALLBACK_MESSAGE.to_string()]
}

#[cfg(feature = "net")]
pub use client::SuggestionClient;

#[cfg(feature = "net")]
mod client {
    use super::{fallback, ErrorBody, SuggestRequest, SuggestResponse};
    use crate::{CanvasConfig, Error, Result};

    /// HTTP client for the suggestion endpoint.
    #[derive(Debug, Clone)]
    pub struct SuggestionClient {
        http: reqwest::Client,
        endpoint: String,
    }

    impl SuggestionClient {
        pub fn new(endpoint: impl Into<String>, timeout: std::time::Duration) -> Result<Self> {
            let endpoint = endpoint.into();
            url::Url::parse(&endpoint)
                .map_err(|e| Error::ConfigError(format!("invalid suggestion endpoint '{}': {}", endpoint, e)))?;
            let http = reqwest::Client::builder().timeout(timeout).build()?;
            Ok(Self { http, endpoint })
        }

        pub fn from_config(config: &CanvasConfig) -> Result<Self> {
            Self::new(config.suggest_endpoint.clone(), config.timeout())
        }

        pub fn endpoint(&self) -> &str {
            &self.endpoint
        }

        /// One round-trip to the endpoint. A response without `headlines`
        /// yields an empty list.
        pub async fn try_suggest(&self, topic: &str) -> Result<Vec<String>> {
            log::debug!("requesting headline suggestions from {}", self.endpoint);
            let resp = self
                .http
                .post(&self.endpoint)
                .json(&SuggestRequest { topic: topic.to_string() })
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                let message = match resp.json::<ErrorBody>().await {
                    Ok(body) => body.error,
                    Err(_) => "Failed to fetch suggestions".to_string(),
                };
                return Err(Error::ServiceError { status: status.as_u16(), message });
            }

            let body: SuggestResponse = resp.json().await?;
            Ok(body.headlines.unwrap_or_default())
        }

        /// Suggestions for `topic`, or the fallback list on any failure.
        pub async fn suggest(&self, topic: &str) -> Vec<String> {
            match self.try_suggest(topic).await {
                Ok(headlines) => {
                    log::info!("received {} headline suggestions", headlines.len());
                    headlines
                }
                Err(e) => {
                    log::error!("Error fetching AI suggestions: {}", e);
                    fallback()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_headlines_field_is_none() {
        let r: SuggestResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(r.headlines, None);
        let r: SuggestResponse = serde_json::from_str(r#"{"headlines":["a"]}"#).unwrap();
        assert_eq!(r.headlines, Some(vec!["a".to_string()]));
    }

    #[test]
    fn error_body_omits_absent_details() {
        let body = ErrorBody { error: "Topic is required".into(), details: None };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"error":"Topic is required"}"#);
    }

    #[test]
    fn fallback_is_single_message() {
        assert_eq!(fallback(), vec![FALLBACK_MESSAGE.to_string()]);
    }

    #[cfg(feature = "net")]
    #[test]
    fn rejects_malformed_endpoint() {
        let err = SuggestionClient::new("not a url", std::time::Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, crate::Error::ConfigError(_)));
    }
}
