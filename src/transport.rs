//! WebSocket transport
//!
//! Owns the socket. The sink and stream halves sit behind separate locks so
//! the sender and receiver loops never contend with each other.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use crate::error::ClientError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long `close` waits for the sink before giving up on the handshake
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// A connected text-frame socket
pub struct Transport {
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
    open: AtomicBool,
}

impl Transport {
    /// Open a websocket to `url`
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let (ws_stream, _response) = tokio_tungstenite::connect_async(url).await?;
        info!("Connected to {}", url);

        let (sink, stream) = ws_stream.split();
        Ok(Self {
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
            open: AtomicBool::new(true),
        })
    }

    /// Whether the connection is still usable
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Send one text frame
    pub async fn send(&self, text: &str) -> Result<(), ClientError> {
        if !self.is_open() {
            return Err(ClientError::ConnectionClosed);
        }

        let result = self
            .sink
            .lock()
            .await
            .send(Message::Text(text.to_owned().into()))
            .await;

        if let Err(e) = result {
            self.open.store(false, Ordering::Release);
            return Err(e.into());
        }
        Ok(())
    }

    /// Wait for the next text frame
    ///
    /// Control frames are skipped. Returns `ConnectionClosed` once the server
    /// closes the socket.
    pub async fn receive(&self) -> Result<String, ClientError> {
        loop {
            if !self.is_open() {
                return Err(ClientError::ConnectionClosed);
            }

            let msg = self.stream.lock().await.next().await;
            match msg {
                Some(Ok(Message::Text(text))) => return Ok(text.to_string()),
                Some(Ok(Message::Binary(data))) => {
                    return Ok(String::from_utf8_lossy(&data).into_owned());
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!("Server sent close frame: {:?}", frame);
                    self.open.store(false, Ordering::Release);
                    return Err(ClientError::ConnectionClosed);
                }
                None => {
                    self.open.store(false, Ordering::Release);
                    return Err(ClientError::ConnectionClosed);
                }
                // Ping/Pong are answered by tungstenite
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    self.open.store(false, Ordering::Release);
                    return Err(e.into());
                }
            }
        }
    }

    /// Close the socket; later calls are no-ops
    ///
    /// The close handshake is bounded by `CLOSE_TIMEOUT`; the socket itself
    /// is released when the transport is dropped.
    pub async fn close(&self) {
        if !self.open.swap(false, Ordering::AcqRel) {
            return;
        }

        let closing = async { self.sink.lock().await.close().await };
        match tokio::time::timeout(CLOSE_TIMEOUT, closing).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("Error while closing socket: {}", e),
            Err(_) => debug!("Peer did not take the close frame in time"),
        }
        info!("Connection closed");
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("open", &self.is_open())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// Spawn a one-shot echo server and return its websocket URL
    async fn echo_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            while let Some(Ok(msg)) = ws.next().await {
                if msg.is_text() && ws.send(msg).await.is_err() {
                    break;
                }
            }
        });
        format!("ws://{}", addr)
    }

    #[tokio::test]
    async fn test_send_receive_roundtrip() {
        let url = echo_server().await;
        let transport = Transport::connect(&url).await.unwrap();
        assert!(transport.is_open());

        transport.send("|/join lobby").await.unwrap();
        assert_eq!(transport.receive().await.unwrap(), "|/join lobby");
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let url = echo_server().await;
        let transport = Transport::connect(&url).await.unwrap();

        transport.close().await;
        transport.close().await;

        assert!(!transport.is_open());
        assert!(matches!(
            transport.send("late").await,
            Err(ClientError::ConnectionClosed)
        ));
        assert!(matches!(
            transport.receive().await,
            Err(ClientError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_close_does_not_wait_on_stalled_peer() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let _ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            // Never read
            std::future::pending::<()>().await;
        });

        let transport = Transport::connect(&format!("ws://{}", addr)).await.unwrap();
        let payload = "x".repeat(1024 * 1024);
        // Fill the socket buffers until a send stalls
        while tokio::time::timeout(Duration::from_millis(200), transport.send(&payload))
            .await
            .is_ok()
        {}

        tokio::time::timeout(Duration::from_secs(5), transport.close())
            .await
            .unwrap();
        assert!(!transport.is_open());
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = Transport::connect(&format!("ws://{}", addr)).await;
        assert!(result.is_err());
    }
}
