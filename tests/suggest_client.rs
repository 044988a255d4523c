#![cfg(feature = "net")]

use std::io::Read;
use std::sync::mpsc;
use std::time::Duration;

use iqtisad_canvas::suggest::{SuggestionClient, FALLBACK_MESSAGE};
use iqtisad_canvas::Error;
use tiny_http::{Header, Response, Server};

/// Serve `status`/`body` for every request; forwards each request body.
fn start_stub(status: u16, body: &'static str) -> (String, mpsc::Receiver<String>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for mut request in server.incoming_requests() {
            let mut raw = String::new();
            let _ = request.as_reader().read_to_string(&mut raw);
            let _ = tx.send(raw);
            let resp = Response::from_string(body)
                .with_status_code(status)
                .with_header("Content-Type: application/json".parse::<Header>().unwrap());
            let _ = request.respond(resp);
        }
    });
    (format!("http://{}/api/generate-headlines", addr), rx)
}

fn client(endpoint: &str) -> SuggestionClient {
    SuggestionClient::new(endpoint, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn returns_headlines_in_order() {
    let (url, bodies) = start_stub(200, r#"{"headlines":["a","b","c","d","e"]}"#);
    let list = client(&url).suggest("التضخم").await;
    assert_eq!(list, vec!["a", "b", "c", "d", "e"]);

    let sent: serde_json::Value = serde_json::from_str(&bodies.recv().unwrap()).unwrap();
    assert_eq!(sent, serde_json::json!({ "topic": "التضخم" }));
}

#[tokio::test]
async fn missing_headlines_means_no_suggestions() {
    let (url, _bodies) = start_stub(200, "{}");
    assert!(client(&url).suggest("x").await.is_empty());

    let (url, _bodies) = start_stub(200, r#"{"headlines":[]}"#);
    assert!(client(&url).suggest("x").await.is_empty());
}

#[tokio::test]
async fn service_error_falls_back() {
    let (url, _bodies) = start_stub(500, r#"{"error":"Failed to generate headlines","details":"boom"}"#);
    let c = client(&url);
    match c.try_suggest("x").await {
        Err(Error::ServiceError { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "Failed to generate headlines");
        }
        other => panic!("unexpected: {:?}", other),
    }
    assert_eq!(c.suggest("x").await, vec![FALLBACK_MESSAGE.to_string()]);
}

#[tokio::test]
async fn malformed_body_falls_back() {
    let (url, _bodies) = start_stub(200, "not json");
    assert_eq!(client(&url).suggest("x").await.len(), 1);
}

#[tokio::test]
async fn unreachable_endpoint_falls_back() {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    drop(server);
    let c = SuggestionClient::new(format!("http://{}/api/generate-headlines", addr), Duration::from_millis(500)).unwrap();
    assert_eq!(c.suggest("x").await, vec![FALLBACK_MESSAGE.to_string()]);
}
