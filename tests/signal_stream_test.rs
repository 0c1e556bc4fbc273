// Integration tests for the persistent signal stream

use serde_json::{json, Value};
use signalscope::mcp::{ClientConfig, ClientError, ErrorCallback, SignalQueryClient};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

fn client_for(server: &mockito::ServerGuard) -> SignalQueryClient {
    SignalQueryClient::new(ClientConfig::new(format!("{}/mcp", server.url()))).unwrap()
}

#[tokio::test]
async fn test_stream_delivers_json_and_drops_garbage() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/mcp/sse")
        .match_header("accept", "text/event-stream")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(
            ": keep-alive\n\n\
             data: {\"type\":\"signal_update\",\"id\":1}\n\n\
             data: not json at all\n\n\
             event: message\n\
             data: {\"type\":\"signal_update\",\n\
             data: \"id\":2}\n\n",
        )
        .expect(1)
        .create_async()
        .await;

    let (tx, mut rx) = mpsc::unbounded_channel::<Value>();
    let mut stream = client_for(&server).connect_signal_stream(
        move |message| {
            let _ = tx.send(message);
        },
        None,
    );

    let first = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
    let second = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
    assert_eq!(first, json!({"type": "signal_update", "id": 1}));
    assert_eq!(second, json!({"type": "signal_update", "id": 2}));

    // Server closed the body; the callback (and its sender) is dropped
    let end = timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
    assert!(end.is_none());

    mock.assert_async().await;
    stream.close();
    assert!(stream.is_closed());
}

#[tokio::test]
async fn test_stream_reports_http_failure() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/mcp/sse")
        .with_status(406)
        .with_body("Not Acceptable")
        .create_async()
        .await;

    let (tx, mut rx) = mpsc::unbounded_channel::<ClientError>();
    let on_error: ErrorCallback = Box::new(move |e: ClientError| {
        let _ = tx.send(e);
    });

    let _stream = client_for(&server).connect_signal_stream(|_| {}, Some(on_error));

    let err = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
    assert!(err.is_transport());
    assert_eq!(err.status(), Some(406));
}

#[tokio::test]
async fn test_stream_without_error_handler_ignores_faults() {
    let client = SignalQueryClient::new(ClientConfig::new("http://127.0.0.1:9/mcp")).unwrap();

    let mut stream = client.connect_signal_stream(|_| {}, None);

    // Connection refused ends the task without panicking
    timeout(Duration::from_secs(5), async {
        while !stream.is_finished() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    stream.close();
    assert!(stream.is_closed());
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/mcp/sse")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body("data: {\"n\":1}\n\n")
        .create_async()
        .await;

    let mut stream = client_for(&server).connect_signal_stream(|_| {}, None);
    assert!(!stream.is_closed());

    stream.close();
    stream.close();

    assert!(stream.is_closed());
    assert!(stream.is_finished());
}

#[tokio::test]
async fn test_stream_sends_session_id() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/mcp/sse")
        .match_header("mcp-session-id", "sess-3")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body("data: {\"ok\":true}\n\n")
        .expect(1)
        .create_async()
        .await;

    let config = ClientConfig::new(format!("{}/mcp", server.url())).with_session_token("sess-3");
    let client = SignalQueryClient::new(config).unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel::<Value>();
    let mut stream = client.connect_signal_stream(
        move |message| {
            let _ = tx.send(message);
        },
        None,
    );

    let message = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
    assert_eq!(message, json!({"ok": true}));

    stream.close();
    mock.assert_async().await;
}
