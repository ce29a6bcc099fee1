//! End-to-end relay tests over real WebSocket connections

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use lan_relay::{RelayServer, ServerConfig};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);
const SILENCE: Duration = Duration::from_millis(200);

async fn start(config: ServerConfig) -> (SocketAddr, Arc<RelayServer>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = Arc::new(RelayServer::new(config));
    let serving = Arc::clone(&server);
    tokio::spawn(async move {
        serving.serve(listener, std::future::pending()).await.unwrap();
    });

    (addr, server)
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = connect_async(format!("ws://{}/", addr)).await.unwrap();
    client
}

async fn recv(client: &mut Client) -> Message {
    loop {
        let message = timeout(RECV_TIMEOUT, client.next())
            .await
            .expect("timed out waiting for message")
            .expect("stream ended")
            .expect("websocket error");

        match message {
            Message::Text(_) | Message::Binary(_) => return message,
            _ => continue,
        }
    }
}

async fn recv_json(client: &mut Client) -> Value {
    match recv(client).await {
        Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
        Message::Binary(data) => serde_json::from_slice(&data).unwrap(),
        other => panic!("unexpected message: {:?}", other),
    }
}

async fn assert_silent(client: &mut Client) {
    let result = timeout(SILENCE, client.next()).await;
    assert!(result.is_err(), "expected no message, got {:?}", result);
}

async fn send_json(client: &mut Client, value: Value) {
    client.send(Message::text(value.to_string())).await.unwrap();
}

fn chat(id: &str, text: &str, sender: &str, timestamp: i64) -> Value {
    json!({
        "type": "chat",
        "message": {"id": id, "text": text, "sender": sender, "timestamp": timestamp}
    })
}

async fn get_health(addr: SocketAddr) -> Value {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    let response = String::from_utf8(buf).unwrap();
    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);

    let body = response.split("\r\n\r\n").nth(1).unwrap();
    serde_json::from_str(body).unwrap()
}

#[tokio::test]
async fn test_two_peer_scenario() {
    let (addr, _server) = start(ServerConfig::default()).await;

    // A joins an empty relay
    let mut a = connect(addr).await;
    assert_eq!(recv_json(&mut a).await, json!({"type": "clientCount", "count": 1}));

    // B joins, history still empty
    let mut b = connect(addr).await;
    assert_eq!(recv_json(&mut b).await, json!({"type": "clientCount", "count": 2}));
    assert_eq!(recv_json(&mut a).await, json!({"type": "clientCount", "count": 2}));

    // A chats; both see it, sender included
    send_json(&mut a, chat("1", "hi", "a1", 1000)).await;
    let expected = chat("1", "hi", "a1", 1000);
    assert_eq!(recv_json(&mut a).await, expected);
    assert_eq!(recv_json(&mut b).await, expected);

    // C joins: replay first, then the count
    let mut c = connect(addr).await;
    assert_eq!(
        recv_json(&mut c).await,
        json!({
            "type": "chatHistory",
            "messages": [{"id": "1", "text": "hi", "sender": "a1", "timestamp": 1000}]
        })
    );
    for client in [&mut a, &mut b, &mut c] {
        assert_eq!(recv_json(client).await, json!({"type": "clientCount", "count": 3}));
    }

    // A offers; B and C get it, A does not
    let offer = json!({"offer": {"type": "offer", "sdp": "v=0\r\no=- 1 1 IN IP4 0.0.0.0\r\n"}});
    send_json(&mut a, offer.clone()).await;
    assert_eq!(recv_json(&mut b).await, offer);
    assert_eq!(recv_json(&mut c).await, offer);
    assert_silent(&mut a).await;
}

#[tokio::test]
async fn test_signaling_relayed_byte_for_byte() {
    let (addr, _server) = start(ServerConfig::default()).await;

    let mut a = connect(addr).await;
    recv_json(&mut a).await;
    let mut b = connect(addr).await;
    recv_json(&mut b).await;
    recv_json(&mut a).await;

    // Text stays text, exact bytes
    let raw = "{ \"candidate\" : {\"candidate\":\"candidate:1 1 udp 2122260223 192.168.1.2 54321 typ host\",\"sdpMid\":\"0\"} }";
    a.send(Message::text(raw)).await.unwrap();
    match recv(&mut b).await {
        Message::Text(text) => assert_eq!(text.as_str(), raw),
        other => panic!("expected text frame, got {:?}", other),
    }

    // Binary stays binary
    let answer = br#"{"answer":{"type":"answer","sdp":"v=0"}}"#.to_vec();
    b.send(Message::binary(answer.clone())).await.unwrap();
    match recv(&mut a).await {
        Message::Binary(data) => assert_eq!(data.as_ref(), answer.as_slice()),
        other => panic!("expected binary frame, got {:?}", other),
    }

    assert_silent(&mut a).await;
    assert_silent(&mut b).await;
}

#[tokio::test]
async fn test_malformed_and_unroutable_keep_connection_open() {
    let (addr, server) = start(ServerConfig::default()).await;

    let mut a = connect(addr).await;
    recv_json(&mut a).await;
    let mut b = connect(addr).await;
    recv_json(&mut b).await;
    recv_json(&mut a).await;

    a.send(Message::text("{definitely not json")).await.unwrap();
    send_json(&mut a, json!({"type": "clientCount", "count": 99})).await;
    send_json(&mut a, json!({"hello": "world"})).await;
    assert_silent(&mut b).await;

    // Still usable
    send_json(&mut a, chat("2", "still here", "a1", 2000)).await;
    assert_eq!(recv_json(&mut b).await["message"]["id"], "2");
    assert_eq!(recv_json(&mut a).await["message"]["id"], "2");

    let stats = server.relay().stats().snapshot();
    assert_eq!(stats.decode_errors, 1);
    assert_eq!(stats.unroutable_messages, 2);
    assert_eq!(stats.chat_messages, 1);
}

#[tokio::test]
async fn test_leave_rebroadcasts_count() {
    let (addr, server) = start(ServerConfig::default()).await;

    let mut a = connect(addr).await;
    recv_json(&mut a).await;
    let mut b = connect(addr).await;
    recv_json(&mut b).await;
    recv_json(&mut a).await;

    b.close(None).await.unwrap();
    assert_eq!(recv_json(&mut a).await, json!({"type": "clientCount", "count": 1}));
    assert_eq!(server.relay().registry().size().await, 1);

    // Abrupt disconnect collapses to the same transition
    let mut c = connect(addr).await;
    recv_json(&mut c).await;
    assert_eq!(recv_json(&mut a).await, json!({"type": "clientCount", "count": 2}));
    drop(c);
    assert_eq!(recv_json(&mut a).await, json!({"type": "clientCount", "count": 1}));
}

#[tokio::test]
async fn test_health_endpoint() {
    let (addr, _server) = start(ServerConfig::default()).await;

    assert_eq!(
        get_health(addr).await,
        json!({"status": "ok", "clientCount": 0, "messageCount": 0})
    );

    let mut a = connect(addr).await;
    recv_json(&mut a).await;
    send_json(&mut a, chat("1", "hi", "a1", 1000)).await;
    recv_json(&mut a).await;

    assert_eq!(
        get_health(addr).await,
        json!({"status": "ok", "clientCount": 1, "messageCount": 1})
    );
}

#[tokio::test]
async fn test_replay_keeps_latest_messages() {
    let (addr, _server) = start(ServerConfig::default().history_capacity(2)).await;

    let mut a = connect(addr).await;
    recv_json(&mut a).await;
    for i in 0..4 {
        send_json(&mut a, chat(&i.to_string(), "t", "a1", i)).await;
        recv_json(&mut a).await;
    }

    let mut b = connect(addr).await;
    let replay = recv_json(&mut b).await;
    assert_eq!(replay["type"], "chatHistory");
    let ids: Vec<&str> = replay["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["2", "3"]);
    assert_eq!(recv_json(&mut b).await, json!({"type": "clientCount", "count": 2}));
}

#[tokio::test]
async fn test_connection_limit() {
    let (addr, server) = start(ServerConfig::default().max_connections(1)).await;

    let mut a = connect(addr).await;
    recv_json(&mut a).await;

    let rejected = connect_async(format!("ws://{}/", addr)).await;
    assert!(rejected.is_err());
    assert_eq!(server.relay().stats().snapshot().rejected_connections, 1);

    // The admitted client is unaffected
    send_json(&mut a, chat("1", "hi", "a1", 1)).await;
    assert_eq!(recv_json(&mut a).await["type"], "chat");
}
