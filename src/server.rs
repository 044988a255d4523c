//! The headline suggestion endpoint: `POST /api/generate-headlines`.
//!
//! Request handling is split from transport: [`handle_generate`] maps a
//! method, a body and the configured credential to a status code and a JSON
//! body, and [`SuggestServer`] feeds it requests from a `tiny_http` listener.
//! The upstream model is reached through [`HeadlineGenerator`] so tests can
//! swap it out.

use std::io::Read;
use std::sync::Arc;
use std::thread::JoinHandle;

use serde_json::{json, Value};
use tiny_http::{Header, Response, Server};

use crate::suggest::ErrorBody;
use crate::{Error, Result};

pub const ROUTE: &str = "/api/generate-headlines";
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Prompt asking for five short professional-clickbait headlines.
pub fn headline_prompt(topic: &str) -> String {
    format!(
        "بناءً على هذا الموضوع: \"{}\"، اقترح 5 عناوين اقتصادية قصيرة ومثيرة (Clickbait مهني) باللغة العربية الفصحى لمنصة أخبار اقتصادية. يجب أن تكون العناوين قوية وعصرية ومناسبة لوسائل التواصل الاجتماعي.",
        topic
    )
}

/// Produces the response document for a topic.
pub trait HeadlineGenerator: Send + Sync {
    fn generate(&self, api_key: &str, topic: &str) -> Result<Value>;
}

/// `generateContent` over the Gemini REST API with a JSON response schema.
#[derive(Debug, Clone)]
pub struct GeminiGenerator {
    http: reqwest::blocking::Client,
    base_url: String,
    model: String,
}

impl GeminiGenerator {
    pub fn new(base_url: impl Into<String>, timeout: std::time::Duration) -> Result<Self> {
        let http = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: GEMINI_MODEL.to_string(),
        })
    }

    fn request_body(topic: &str) -> Value {
        json!({
            "contents": [{ "parts": [{ "text": headline_prompt(topic) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "headlines": { "type": "ARRAY", "items": { "type": "STRING" } }
                    },
                    "required": ["headlines"]
                }
            }
        })
    }
}

/// Concatenated text parts of the first candidate, if any.
pub fn candidate_text(response: &Value) -> String {
    response["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
        .unwrap_or_default()
}

impl HeadlineGenerator for GeminiGenerator {
    fn generate(&self, api_key: &str, topic: &str) -> Result<Value> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let resp = self
            .http
            .post(&url)
            .query(&[("key", api_key)])
            .json(&Self::request_body(topic))
            .send()?;

        let status = resp.status();
        let body: Value = resp.json()?;
        if !status.is_success() {
            let message = body["error"]["message"].as_str().unwrap_or("upstream request failed").to_string();
            return Err(Error::ServiceError { status: status.as_u16(), message });
        }

        let text = candidate_text(&body);
        let text = if text.is_empty() { r#"{"headlines":[]}"#.to_string() } else { text };
        Ok(serde_json::from_str(&text)?)
    }
}

fn error_json(error: &str, details: Option<String>) -> String {
    serde_json::to_string(&ErrorBody { error: error.to_string(), details })
        .unwrap_or_else(|_| format!("{{\"error\":\"{}\"}}", error))
}

/// Topic from a request body. Empty, `null` and `false` count as missing.
fn extract_topic(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("topic")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        Value::Array(_) | Value::Object(_) => Some(value["topic"].to_string()),
        _ => None,
    }
}

/// Map one request to `(status, json body)`.
pub fn handle_generate(
    method: &str,
    body: &str,
    api_key: Option<&str>,
    generator: &dyn HeadlineGenerator,
) -> (u16, String) {
    if !method.eq_ignore_ascii_case("POST") {
        return (405, error_json("Method not allowed", None));
    }
    let Some(topic) = extract_topic(body) else {
        return (400, error_json("Topic is required", None));
    };
    let Some(api_key) = api_key.filter(|k| !k.is_empty()) else {
        log::error!("{} is not set", API_KEY_VAR);
        return (500, error_json("Gemini API Key is not configured on the server", None));
    };

    match generator.generate(api_key, &topic) {
        Ok(data) => (200, data.to_string()),
        Err(e) => {
            log::error!("Gemini API error: {}", e);
            (500, error_json("Failed to generate headlines", Some(e.to_string())))
        }
    }
}

type KeySource = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// Blocking HTTP listener serving [`ROUTE`].
pub struct SuggestServer {
    server: Server,
    generator: Arc<dyn HeadlineGenerator>,
    api_key: KeySource,
}

impl SuggestServer {
    /// Bind to `addr` (use port 0 for an ephemeral port). The credential is
    /// read from `GEMINI_API_KEY` on every request.
    pub fn bind(addr: &str, generator: Arc<dyn HeadlineGenerator>) -> Result<Self> {
        let server = Server::http(addr).map_err(|e| Error::NetworkError(format!("bind {}: {}", addr, e)))?;
        Ok(Self {
            server,
            generator,
            api_key: Arc::new(|| std::env::var(API_KEY_VAR).ok()),
        })
    }

    /// Replace the credential source.
    pub fn with_key_source<F>(mut self, source: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        self.api_key = Arc::new(source);
        self
    }

    pub fn local_addr(&self) -> Option<std::net::SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Serve until the listener is closed.
    pub fn run(self) {
        if let Some(addr) = self.local_addr() {
            log::info!("suggestion endpoint listening on http://{}{}", addr, ROUTE);
        }
        for mut request in self.server.incoming_requests() {
            let method = request.method().as_str().to_string();
            let path = request.url().split('?').next().unwrap_or("").to_string();

            let (status, body) = if path != ROUTE {
                (404, error_json("Not found", None))
            } else {
                let mut raw = String::new();
                if let Err(e) = request.as_reader().read_to_string(&mut raw) {
                    log::warn!("failed to read request body: {}", e);
                }
                let key = (self.api_key)();
                handle_generate(&method, &raw, key.as_deref(), self.generator.as_ref())
            };
            log::debug!("{} {} -> {}", method, path, status);

            let mut response = Response::from_string(body).with_status_code(status);
            if let Ok(header) = "Content-Type: application/json".parse::<Header>() {
                response = response.with_header(header);
            }
            if let Err(e) = request.respond(response) {
                log::warn!("failed to send response: {}", e);
            }
        }
    }

    /// Run on a background thread, returning the bound address.
    pub fn spawn(self) -> Result<(std::net::SocketAddr, JoinHandle<()>)> {
        let addr = self
            .local_addr()
            .ok_or_else(|| Error::NetworkError("listener has no IP address".into()))?;
        let handle = std::thread::spawn(move || self.run());
        Ok((addr, handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<Value>);

    impl HeadlineGenerator for Fixed {
        fn generate(&self, _api_key: &str, _topic: &str) -> Result<Value> {
            match &self.0 {
                Ok(v) => Ok(v.clone()),
                Err(e) => Err(Error::Other(e.to_string())),
            }
        }
    }

    fn ok() -> Fixed {
        Fixed(Ok(json!({ "headlines": ["a", "b"] })))
    }

    #[test]
    fn rejects_non_post() {
        let (status, body) = handle_generate("GET", "", Some("k"), &ok());
        assert_eq!(status, 405);
        assert_eq!(body, r#"{"error":"Method not allowed"}"#);
    }

    #[test]
    fn missing_or_empty_topic_is_400() {
        for body in ["{}", r#"{"topic":""}"#, r#"{"topic":null}"#, "not json"] {
            let (status, body) = handle_generate("POST", body, Some("k"), &ok());
            assert_eq!(status, 400);
            assert_eq!(body, r#"{"error":"Topic is required"}"#);
        }
    }

    #[test]
    fn missing_key_is_500() {
        let (status, body) = handle_generate("POST", r#"{"topic":"التضخم"}"#, None, &ok());
        assert_eq!(status, 500);
        assert!(body.contains("not configured"));
    }

    #[test]
    fn upstream_failure_carries_details() {
        let failing = Fixed(Err(Error::Other("quota exceeded".into())));
        let (status, body) = handle_generate("POST", r#"{"topic":"x"}"#, Some("k"), &failing);
        assert_eq!(status, 500);
        let v: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(v["error"], "Failed to generate headlines");
        assert_eq!(v["details"], "quota exceeded");
    }

    #[test]
    fn success_passes_document_through() {
        let (status, body) = handle_generate("post", r#"{"topic":"الذهب"}"#, Some("k"), &ok());
        assert_eq!(status, 200);
        assert_eq!(body, r#"{"headlines":["a","b"]}"#);
    }

    #[test]
    fn prompt_quotes_topic() {
        assert!(headline_prompt("النفط").contains("\"النفط\""));
        assert!(headline_prompt("x").contains("5 عناوين"));
    }

    #[test]
    fn candidate_text_joins_parts() {
        let v = json!({ "candidates": [{ "content": { "parts": [{ "text": "{\"head" }, { "text": "lines\":[]}" }] } }] });
        assert_eq!(candidate_text(&v), r#"{"headlines":[]}"#);
        assert_eq!(candidate_text(&json!({})), "");
    }
}
