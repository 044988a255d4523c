#![cfg(feature = "net")]

use std::io::Read;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use iqtisad_canvas::server::{GeminiGenerator, HeadlineGenerator, SuggestServer, ROUTE};
use iqtisad_canvas::suggest::SuggestionClient;
use iqtisad_canvas::{Error, Result};
use serde_json::{json, Value};
use tiny_http::{Header, Response, Server};

struct Echo;

impl HeadlineGenerator for Echo {
    fn generate(&self, api_key: &str, topic: &str) -> Result<Value> {
        if topic == "fail" {
            return Err(Error::Other("upstream exploded".into()));
        }
        Ok(json!({ "headlines": [format!("{}:{}", api_key, topic)] }))
    }
}

fn start(key: Option<&'static str>) -> String {
    let server = SuggestServer::bind("127.0.0.1:0", Arc::new(Echo))
        .unwrap()
        .with_key_source(move || key.map(str::to_string));
    let (addr, _handle) = server.spawn().unwrap();
    format!("http://{}", addr)
}

fn post(url: &str, body: &str) -> (u16, Value) {
    let resp = reqwest::blocking::Client::new()
        .post(url)
        .header("Content-Type", "application/json")
        .body(body.to_string())
        .send()
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().unwrap())
}

#[test]
fn endpoint_status_codes() {
    let base = start(Some("secret"));
    let url = format!("{}{}", base, ROUTE);

    let (status, body) = post(&url, r#"{"topic":"النفط"}"#);
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "headlines": ["secret:النفط"] }));

    let (status, body) = post(&url, r#"{"topic":""}"#);
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Topic is required");

    let (status, body) = post(&url, r#"{"topic":"fail"}"#);
    assert_eq!(status, 500);
    assert_eq!(body["details"], "upstream exploded");

    let resp = reqwest::blocking::get(&url).unwrap();
    assert_eq!(resp.status().as_u16(), 405);

    let resp = reqwest::blocking::get(format!("{}/other", base)).unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[test]
fn endpoint_without_key_is_500() {
    let url = format!("{}{}", start(None), ROUTE);
    let (status, body) = post(&url, r#"{"topic":"الذهب"}"#);
    assert_eq!(status, 500);
    assert_eq!(body["error"], "Gemini API Key is not configured on the server");
}

#[tokio::test]
async fn client_and_endpoint_agree() {
    let url = format!("{}{}", start(Some("k")), ROUTE);
    let client = SuggestionClient::new(url, Duration::from_secs(5)).unwrap();
    assert_eq!(client.suggest("x").await, vec!["k:x".to_string()]);
    assert_eq!(client.suggest("").await.len(), 1);
}

/// A fake model host answering `generateContent`.
fn start_model_stub(status: u16, body: String) -> (String, mpsc::Receiver<(String, String)>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for mut request in server.incoming_requests() {
            let mut raw = String::new();
            let _ = request.as_reader().read_to_string(&mut raw);
            let _ = tx.send((request.url().to_string(), raw));
            let resp = Response::from_string(body.clone())
                .with_status_code(status)
                .with_header("Content-Type: application/json".parse::<Header>().unwrap());
            let _ = request.respond(resp);
        }
    });
    (format!("http://{}/v1beta", addr), rx)
}

#[test]
fn gemini_generator_sends_schema_and_parses_text() {
    let answer = json!({
        "candidates": [{ "content": { "parts": [{ "text": "{\"headlines\":[\"أ\",\"ب\"]}" }] } }]
    });
    let (base, seen) = start_model_stub(200, answer.to_string());
    let gen = GeminiGenerator::new(base, Duration::from_secs(5)).unwrap();

    let out = gen.generate("KEY", "البورصة").unwrap();
    assert_eq!(out, json!({ "headlines": ["أ", "ب"] }));

    let (path, body) = seen.recv().unwrap();
    assert!(path.starts_with("/v1beta/models/gemini-1.5-flash:generateContent?"));
    assert!(path.contains("key=KEY"));
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    assert_eq!(body["generationConfig"]["responseSchema"]["required"][0], "headlines");
    assert!(body["contents"][0]["parts"][0]["text"].as_str().unwrap().contains("البورصة"));
}

#[test]
fn gemini_empty_text_means_no_headlines() {
    let (base, _seen) = start_model_stub(200, json!({ "candidates": [] }).to_string());
    let gen = GeminiGenerator::new(base, Duration::from_secs(5)).unwrap();
    assert_eq!(gen.generate("k", "x").unwrap(), json!({ "headlines": [] }));
}

#[test]
fn gemini_error_status_is_reported() {
    let (base, _seen) = start_model_stub(403, json!({ "error": { "message": "API key not valid" } }).to_string());
    let gen = GeminiGenerator::new(base, Duration::from_secs(5)).unwrap();
    match gen.generate("k", "x") {
        Err(Error::ServiceError { status, message }) => {
            assert_eq!(status, 403);
            assert_eq!(message, "API key not valid");
        }
        other => panic!("unexpected: {:?}", other),
    }
}
