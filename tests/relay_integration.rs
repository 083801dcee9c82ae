//! End-to-end tests for the telemetry relay.
//!
//! Each test starts the real router on an ephemeral port and talks to it
//! with WebSocket clients, covering:
//! 1. Fan-out to every connection, with and without self-echo
//! 2. Malformed input dropped without disconnecting the publisher
//! 3. Disconnect cleanup (graceful and abrupt)
//! 4. Handshake rejection and hub shutdown, including peers that stopped reading
//! 5. A viewer building its rolling history from live broadcasts

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use telemetry_relay::adapters::http::app_router;
use telemetry_relay::adapters::{TelemetryHub, TelemetryViewer, WebSocketState};
use telemetry_relay::config::{AppConfig, HubConfig, ViewerConfig};

// =============================================================================
// Test Infrastructure
// =============================================================================

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const READING: &str = r#"{"temperature":21.5,"humidity":40.2}"#;
const WAIT: Duration = Duration::from_secs(3);
const QUIET: Duration = Duration::from_millis(200);

struct Relay {
    addr: SocketAddr,
    hub: Arc<TelemetryHub>,
}

impl Relay {
    async fn start(hub_config: HubConfig) -> Self {
        let config = AppConfig {
            hub: hub_config,
            ..Default::default()
        };
        let hub = Arc::new(TelemetryHub::in_memory(&config.hub));
        let app = app_router(WebSocketState::new(hub.clone()), &config);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, hub }
    }

    fn url(&self) -> String {
        format!("ws://{}/api/ws", self.addr)
    }

    /// Connect and wait until the hub has registered the new connection.
    async fn connect(&self) -> Client {
        let before = self.hub.connection_count().await;
        let (client, response) = connect_async(self.url()).await.unwrap();
        assert_eq!(response.status().as_u16(), 101);
        self.wait_for_connections(before + 1).await;
        client
    }

    async fn wait_for_connections(&self, expected: usize) {
        let hub = self.hub.clone();
        tokio::time::timeout(WAIT, async move {
            while hub.connection_count().await != expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("hub never reached {} connections", expected));
    }
}

async fn next_text(client: &mut Client) -> String {
    tokio::time::timeout(WAIT, async {
        loop {
            match client.next().await {
                Some(Ok(Message::Text(text))) => return text,
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                other => panic!("expected text frame, got {:?}", other),
            }
        }
    })
    .await
    .expect("timed out waiting for a text frame")
}

async fn assert_silent(client: &mut Client) {
    let frame = tokio::time::timeout(QUIET, client.next()).await;
    assert!(frame.is_err(), "expected no frame, got {:?}", frame);
}

async fn send_text(client: &mut Client, text: &str) {
    client.send(Message::Text(text.to_string())).await.unwrap();
}

/// Complete the WebSocket handshake over raw TCP and never read again.
async fn stalled_subscriber(relay: &Relay) -> TcpStream {
    let mut stream = TcpStream::connect(relay.addr).await.unwrap();
    stream
        .write_all(
            b"GET /api/ws HTTP/1.1\r\n\
              Host: localhost\r\n\
              Connection: Upgrade\r\n\
              Upgrade: websocket\r\n\
              Sec-WebSocket-Version: 13\r\n\
              Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\r\n",
        )
        .await
        .unwrap();

    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        stream.read_exact(&mut byte).await.unwrap();
        head.push(byte[0]);
    }
    assert!(head.starts_with(b"HTTP/1.1 101"), "got: {}", String::from_utf8_lossy(&head));
    stream
}

// =============================================================================
// Fan-out
// =============================================================================

#[tokio::test]
async fn reading_reaches_both_clients_and_survives_disconnect() {
    let relay = Relay::start(HubConfig::default()).await;
    let mut a = relay.connect().await;
    let mut b = relay.connect().await;

    send_text(&mut a, READING).await;

    assert_eq!(next_text(&mut a).await, READING);
    assert_eq!(next_text(&mut b).await, READING);

    a.close(None).await.unwrap();
    relay.wait_for_connections(1).await;

    let next = r#"{"temperature":22.0,"humidity":41.0}"#;
    send_text(&mut b, next).await;
    assert_eq!(next_text(&mut b).await, next);
    assert_silent(&mut b).await;
}

#[tokio::test]
async fn sender_does_not_hear_itself_when_echo_disabled() {
    let relay = Relay::start(HubConfig {
        include_sender: false,
        ..Default::default()
    })
    .await;
    let mut a = relay.connect().await;
    let mut b = relay.connect().await;

    send_text(&mut a, READING).await;

    assert_eq!(next_text(&mut b).await, READING);
    assert_silent(&mut a).await;
}

#[tokio::test]
async fn extra_fields_pass_through_unchanged() {
    let relay = Relay::start(HubConfig::default()).await;
    let mut publisher = relay.connect().await;
    let mut viewer = relay.connect().await;

    let raw = r#"{"device":"attic","temperature":30.1,"humidity":22,"battery":{"volts":3.6}}"#;
    send_text(&mut publisher, raw).await;

    assert_eq!(next_text(&mut viewer).await, raw);
}

#[tokio::test]
async fn binary_frames_are_relayed_as_text() {
    let relay = Relay::start(HubConfig::default()).await;
    let mut publisher = relay.connect().await;
    let mut viewer = relay.connect().await;

    publisher
        .send(Message::Binary(READING.as_bytes().to_vec()))
        .await
        .unwrap();

    assert_eq!(next_text(&mut viewer).await, READING);
}

#[tokio::test]
async fn one_publisher_is_seen_in_order() {
    let relay = Relay::start(HubConfig::default()).await;
    let mut publisher = relay.connect().await;
    let mut viewer = relay.connect().await;

    for seq in 0..30 {
        send_text(&mut publisher, &format!(r#"{{"seq":{}}}"#, seq)).await;
    }

    for seq in 0..30 {
        assert_eq!(next_text(&mut viewer).await, format!(r#"{{"seq":{}}}"#, seq));
    }
}

// =============================================================================
// Malformed input
// =============================================================================

#[tokio::test]
async fn malformed_json_is_dropped_and_publisher_stays_connected() {
    let relay = Relay::start(HubConfig::default()).await;
    let mut a = relay.connect().await;

    let not_a_number = r#"{"temperature":"not-a-number"}"#;
    send_text(&mut a, not_a_number).await;
    assert_eq!(next_text(&mut a).await, not_a_number);

    send_text(&mut a, "not json at all").await;
    assert_silent(&mut a).await;
    assert_eq!(relay.hub.connection_count().await, 1);

    send_text(&mut a, READING).await;
    assert_eq!(next_text(&mut a).await, READING);
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn abrupt_drop_is_cleaned_up() {
    let relay = Relay::start(HubConfig::default()).await;
    let a = relay.connect().await;
    let mut b = relay.connect().await;

    drop(a);
    relay.wait_for_connections(1).await;

    send_text(&mut b, READING).await;
    assert_eq!(next_text(&mut b).await, READING);
}

#[tokio::test]
async fn plain_http_request_gets_bad_request() {
    let relay = Relay::start(HubConfig::default()).await;

    let mut stream = TcpStream::connect(relay.addr).await.unwrap();
    stream
        .write_all(b"GET /api/ws HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    let response = String::from_utf8_lossy(&response);

    assert!(response.starts_with("HTTP/1.1 400"), "got: {}", response);
    assert!(response.contains("INVALID_UPGRADE_REQUEST"));
    assert_eq!(relay.hub.connection_count().await, 0);
}

#[tokio::test]
async fn shutdown_closes_clients_and_refuses_new_ones() {
    let relay = Relay::start(HubConfig::default()).await;
    let mut a = relay.connect().await;

    relay.hub.shutdown().await;

    let closed = tokio::time::timeout(WAIT, async {
        loop {
            match a.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "client was not closed by shutdown");
    assert!(relay.hub.wait_for_drain(WAIT).await);

    assert!(connect_async(relay.url()).await.is_err());
}

#[tokio::test]
async fn shutdown_drains_subscriber_that_stopped_reading() {
    let relay = Relay::start(HubConfig {
        include_sender: false,
        ..Default::default()
    })
    .await;
    let stalled = stalled_subscriber(&relay).await;
    relay.wait_for_connections(1).await;
    let mut publisher = relay.connect().await;

    // Far more than the socket buffers hold, so the relay's writer blocks.
    let pad = "x".repeat(64 * 1024);
    for i in 0..400 {
        let raw = format!(r#"{{"temperature":{},"humidity":50,"pad":"{}"}}"#, i, pad);
        send_text(&mut publisher, &raw).await;
    }
    tokio::time::sleep(QUIET).await;

    relay.hub.shutdown().await;

    assert!(
        relay.hub.wait_for_drain(WAIT).await,
        "{} connection(s) never finished closing",
        relay.hub.live_connections()
    );
    assert_eq!(relay.hub.connection_count().await, 0);
    drop(stalled);
}

// =============================================================================
// Viewer
// =============================================================================

#[tokio::test]
async fn viewer_keeps_last_twenty_readings() {
    let relay = Relay::start(HubConfig::default()).await;

    let viewer = Arc::new(TelemetryViewer::new(&ViewerConfig {
        url: relay.url(),
        ..Default::default()
    }));
    let state = viewer.state();
    let (stop_tx, stop_rx) = watch::channel(false);
    let session = {
        let viewer = viewer.clone();
        tokio::spawn(async move { viewer.run(stop_rx).await })
    };
    relay.wait_for_connections(1).await;

    let mut publisher = relay.connect().await;
    for i in 0..25 {
        let raw = format!(r#"{{"temperature":{}.5,"humidity":{}}}"#, i, 40 + i);
        send_text(&mut publisher, &raw).await;
    }

    tokio::time::timeout(WAIT, async {
        loop {
            {
                let state = state.read().await;
                if state.current_temperature() == 24.5 {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("viewer never saw the last reading");

    {
        let state = state.read().await;
        assert!(state.is_connected());
        assert_eq!(state.current_humidity(), 64.0);
        assert_eq!(state.history().len(), 20);
        assert_eq!(state.history().iter().next().unwrap().temperature, 5.5);
    }

    stop_tx.send(true).unwrap();
    session.await.unwrap().unwrap();

    assert!(!state.read().await.is_connected());
    relay.wait_for_connections(1).await;
}
