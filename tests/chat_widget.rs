//! End-to-end tests for the chatbot request/response/display cycle. A real
//! in-process HTTP server stands in for the hosted endpoint; no mocks.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use bookbot::app::{App, ChatRole, FALLBACK_REPLY};
use bookbot::chat::ChatClient;

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Read one HTTP request fully: headers plus a Content-Length body.
async fn read_request(stream: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let Ok(n) = stream.read(&mut chunk).await else {
            return;
        };
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(header_end) = find_subsequence(&buf, b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&buf[..header_end]);
            let content_length = headers
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);

            if buf.len() - (header_end + 4) >= content_length {
                return;
            }
        }
    }
}

/// Serve `body` with `status` for every request on a free port; returns the
/// endpoint URL.
async fn spawn_server(status: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                read_request(&mut stream).await;
                let reply = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(reply.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    format!("http://{}/chat", addr)
}

/// An endpoint guaranteed to refuse connections: bind a port, then drop it.
fn refused_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/chat", addr)
}

fn widget(endpoint: &str) -> (App, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (App::new(ChatClient::new(endpoint), tx), rx)
}

async fn next_reply(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
    tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("timed out waiting for a reply")
        .expect("reply channel closed")
}

// --- ChatClient -----------------------------------------------------------

#[tokio::test]
async fn ask_returns_the_answer_field() {
    let endpoint = spawn_server("200 OK", r#"{"answer": "ROS 2 is a middleware."}"#).await;
    let client = ChatClient::new(&endpoint);

    let answer = client.ask("What is ROS 2?").await.unwrap();
    assert_eq!(answer, "ROS 2 is a middleware.");
}

#[tokio::test]
async fn ask_fails_on_non_json_body() {
    let endpoint = spawn_server("200 OK", "<html>oops</html>").await;
    let client = ChatClient::new(&endpoint);

    assert!(client.ask("hi").await.is_err());
}

#[tokio::test]
async fn ask_fails_on_missing_answer_field() {
    let endpoint = spawn_server("200 OK", r#"{"detail": "no answer here"}"#).await;
    let client = ChatClient::new(&endpoint);

    assert!(client.ask("hi").await.is_err());
}

#[tokio::test]
async fn ask_fails_on_error_status() {
    let endpoint = spawn_server("500 Internal Server Error", r#"{"answer": "x"}"#).await;
    let client = ChatClient::new(&endpoint);

    assert!(client.ask("hi").await.is_err());
}

// --- Widget send cycle ----------------------------------------------------

#[tokio::test]
async fn completed_send_appends_user_then_bot() {
    let endpoint = spawn_server("200 OK", r#"{"answer": "ROS 2 is a middleware."}"#).await;
    let (mut app, mut rx) = widget(&endpoint);

    app.draft = "What is ROS 2?".to_string();
    app.send();

    // User line lands immediately, before the reply settles
    assert_eq!(app.transcript.len(), 1);
    assert_eq!(app.transcript[0].text, "You: What is ROS 2?");
    assert_eq!(app.pending, 1);

    let line = next_reply(&mut rx).await;
    app.resolve_reply(line);

    assert_eq!(app.transcript.len(), 2);
    assert_eq!(app.transcript[1].role, ChatRole::Bot);
    assert_eq!(app.transcript[1].text, "Bot: ROS 2 is a middleware.");
    assert_eq!(app.pending, 0);
}

#[tokio::test]
async fn failed_send_appends_fallback_verbatim() {
    let (mut app, mut rx) = widget(&refused_endpoint());

    app.draft = "anything at all".to_string();
    app.send();

    let line = next_reply(&mut rx).await;
    app.resolve_reply(line);

    assert_eq!(app.transcript.len(), 2);
    assert_eq!(app.transcript[1].text, FALLBACK_REPLY);
    assert_eq!(
        app.transcript[1].text,
        "Bot: Backend not reachable. Make sure backend is running on port 8000!"
    );
}

#[tokio::test]
async fn malformed_response_also_degrades_to_fallback() {
    let endpoint = spawn_server("200 OK", "not json").await;
    let (mut app, mut rx) = widget(&endpoint);

    app.draft = "hello".to_string();
    app.send();

    let line = next_reply(&mut rx).await;
    app.resolve_reply(line);

    assert_eq!(app.transcript[1].text, FALLBACK_REPLY);
}

#[tokio::test]
async fn overlapping_sends_each_resolve_independently() {
    let endpoint = spawn_server("200 OK", r#"{"answer": "yes"}"#).await;
    let (mut app, mut rx) = widget(&endpoint);

    app.draft = "first question".to_string();
    app.send();
    app.draft = "second question".to_string();
    app.send();

    assert_eq!(app.transcript.len(), 2);
    assert_eq!(app.pending, 2);

    app.resolve_reply(next_reply(&mut rx).await);
    app.resolve_reply(next_reply(&mut rx).await);

    // Two completed sends grow the transcript by exactly four entries
    assert_eq!(app.transcript.len(), 4);
    assert_eq!(app.pending, 0);
    assert!(app
        .transcript
        .iter()
        .filter(|m| m.role == ChatRole::Bot)
        .all(|m| m.text == "Bot: yes"));
}

#[tokio::test]
async fn send_keeps_working_after_a_failure() {
    let (mut app, mut rx) = widget(&refused_endpoint());
    app.draft = "first".to_string();
    app.send();
    app.resolve_reply(next_reply(&mut rx).await);

    // The widget never enters a blocking error state
    app.draft = "second".to_string();
    app.send();
    app.resolve_reply(next_reply(&mut rx).await);

    assert_eq!(app.transcript.len(), 4);
    assert_eq!(app.transcript[3].text, FALLBACK_REPLY);
}

#[tokio::test]
async fn closing_the_chat_does_not_cancel_a_pending_send() {
    let endpoint = spawn_server("200 OK", r#"{"answer": "still here"}"#).await;
    let (mut app, mut rx) = widget(&endpoint);

    app.open_chat();
    app.draft = "are you there?".to_string();
    app.send();
    app.close_chat();

    let line = next_reply(&mut rx).await;
    app.resolve_reply(line);

    assert!(!app.chat_open);
    assert_eq!(app.transcript[1].text, "Bot: still here");
}
