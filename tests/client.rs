//! End-to-end tests against a local WebSocket server
//!
//! The server side is a bare tokio-tungstenite listener driven by the test;
//! the login handshake is replaced with a fake authenticator.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use showdown_client::{
    AuthError, AuthState, Authenticator, Client, ClientConfig, Credentials,
};

const WAIT: Duration = Duration::from_secs(5);

struct FakeAuth {
    challstrs: Mutex<Vec<String>>,
}

#[async_trait]
impl Authenticator for FakeAuth {
    async fn login(&self, credentials: &Credentials, challstr: &str) -> Result<String, AuthError> {
        self.challstrs.lock().unwrap().push(challstr.to_string());
        Ok(format!("{},assertion", credentials.username))
    }
}

async fn listen() -> (TcpListener, ClientConfig) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = ClientConfig::new(addr.ip().to_string(), addr.port());
    (listener, config)
}

async fn accept(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = listener.accept().await.unwrap();
    tokio_tungstenite::accept_async(stream).await.unwrap()
}

async fn next_text(ws: &mut WebSocketStream<TcpStream>) -> String {
    loop {
        let msg = timeout(WAIT, ws.next()).await.unwrap().unwrap().unwrap();
        if let Message::Text(text) = msg {
            return text.to_string();
        }
    }
}

async fn send_text(ws: &mut WebSocketStream<TcpStream>, text: &str) {
    ws.send(Message::Text(text.to_string().into())).await.unwrap();
}

#[tokio::test]
async fn test_login_join_chat_and_ready() {
    let (listener, config) = listen().await;
    let auth = Arc::new(FakeAuth {
        challstrs: Mutex::new(Vec::new()),
    });
    let client = Client::with_authenticator(config, Credentials::new("ash", "pw"), auth.clone());
    let handle = client.handle();

    let lobby = handle.join_room("lobby").unwrap();
    let mut messages = lobby.messages().await;

    let run = tokio::spawn(client.run());
    let mut ws = accept(&listener).await;

    // Joins queued before run go out first
    assert_eq!(next_text(&mut ws).await, "|/join lobby");

    send_text(&mut ws, "|challstr|4|abcdef").await;
    assert_eq!(next_text(&mut ws).await, "|/trn ash,0,ash,assertion");
    assert_eq!(*auth.challstrs.lock().unwrap(), vec!["4|abcdef".to_string()]);

    send_text(&mut ws, ">lobby\n|init|chat\n|c:|1|Old|backlog").await;
    send_text(&mut ws, ">lobby\n|c:|1700000000|Alice|Hello|World").await;
    let msg = timeout(WAIT, messages.recv()).await.unwrap().unwrap();
    assert_eq!(msg.sender, "Alice");
    assert_eq!(msg.text, "Hello|World");
    assert_eq!(msg.timestamp, 1700000000);

    send_text(&mut ws, "|updatesearch|{}").await;
    timeout(WAIT, handle.ready()).await.unwrap().unwrap();
    assert_eq!(handle.auth_state(), AuthState::Ready);

    lobby.send("hi").unwrap();
    lobby.send("again").unwrap();
    assert_eq!(next_text(&mut ws).await, "lobby|hi");
    assert_eq!(next_text(&mut ws).await, "lobby|again");

    handle.shutdown();
    timeout(WAIT, run).await.unwrap().unwrap().unwrap();
    assert!(handle.send("late").is_err());
}

#[tokio::test]
async fn test_server_close_stops_client() {
    let (listener, config) = listen().await;
    let auth = Arc::new(FakeAuth {
        challstrs: Mutex::new(Vec::new()),
    });
    let client = Client::with_authenticator(config, Credentials::new("ash", "pw"), auth);
    let handle = client.handle();

    let run = tokio::spawn(client.run());
    let mut ws = accept(&listener).await;
    ws.close(None).await.unwrap();

    timeout(WAIT, run).await.unwrap().unwrap().unwrap();
    assert!(handle.is_shutdown());
    assert!(handle.ready().await.is_err());
}

#[tokio::test]
async fn test_shutdown_with_stalled_peer() {
    let (listener, config) = listen().await;
    let auth = Arc::new(FakeAuth {
        challstrs: Mutex::new(Vec::new()),
    });
    let client = Client::with_authenticator(config, Credentials::new("ash", "pw"), auth);
    let handle = client.handle();

    let payload = "x".repeat(1024 * 1024);
    for _ in 0..64 {
        handle.send(payload.clone()).unwrap();
    }

    let run = tokio::spawn(client.run());
    // Accept, then never read
    let _ws = accept(&listener).await;
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(!run.is_finished());

    handle.shutdown();
    timeout(WAIT, run).await.unwrap().unwrap().unwrap();
}
