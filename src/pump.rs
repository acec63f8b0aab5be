//! Message pump
//!
//! The sender loop drains the Outbound Queue onto the socket; the receiver
//! loop moves frames from the socket onto the Inbound Queue. Both stop at
//! cancellation, including while suspended on their queue or socket.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::ClientError;
use crate::queue::{InboundSender, OutboundReceiver};
use crate::transport::Transport;

/// Forward queued commands to the transport in FIFO order
pub async fn send_loop(
    transport: Arc<Transport>,
    mut outbound: OutboundReceiver,
    cancel: CancellationToken,
) -> Result<(), ClientError> {
    while transport.is_open() {
        let command = tokio::select! {
            _ = cancel.cancelled() => break,
            command = outbound.recv() => command,
        };

        let Some(command) = command else {
            debug!("Outbound queue closed");
            break;
        };

        debug!("> {}", command);
        // A peer that stops reading stalls the send; dropping it frees the sink
        tokio::select! {
            _ = cancel.cancelled() => break,
            result = transport.send(&command) => result?,
        }
    }

    debug!("Send loop ended");
    Ok(())
}

/// Push received frames onto the Inbound Queue in arrival order
///
/// A server-initiated close ends the loop normally.
pub async fn receive_loop(
    transport: Arc<Transport>,
    inbound: InboundSender,
    cancel: CancellationToken,
) -> Result<(), ClientError> {
    while transport.is_open() {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break,
            frame = transport.receive() => frame,
        };

        let frame = match frame {
            Ok(frame) => frame,
            Err(ClientError::ConnectionClosed) => {
                debug!("Server closed the connection");
                break;
            }
            Err(e) => return Err(e),
        };

        debug!("< {}", frame);
        if inbound.send(frame).is_err() {
            debug!("Parser gone, ending receive loop");
            break;
        }
    }

    debug!("Receive loop ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{inbound_queue, outbound_queue};
    use futures_util::{SinkExt, StreamExt};
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;
    use tokio_tungstenite::tungstenite::Message;

    /// Server that reports every text frame it receives and sends `greeting`
    async fn server(greeting: Vec<&'static str>) -> (String, mpsc::UnboundedReceiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (seen_tx, seen_rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            for frame in greeting {
                ws.send(Message::Text(frame.to_string().into())).await.unwrap();
            }
            while let Some(Ok(msg)) = ws.next().await {
                if let Message::Text(text) = msg {
                    let _ = seen_tx.send(text.to_string());
                }
            }
        });
        (format!("ws://{}", addr), seen_rx)
    }

    #[tokio::test]
    async fn test_send_loop_preserves_order() {
        let (url, mut seen) = server(vec![]).await;
        let transport = Arc::new(Transport::connect(&url).await.unwrap());
        let (outbox, outbound) = outbound_queue();
        let cancel = CancellationToken::new();

        let task = tokio::spawn(send_loop(transport.clone(), outbound, cancel.clone()));
        for text in ["lobby|one", "lobby|two", "|/join help"] {
            outbox.send(text).unwrap();
        }

        for expected in ["lobby|one", "lobby|two", "|/join help"] {
            assert_eq!(seen.recv().await.unwrap(), expected);
        }

        // Blocked on an empty queue, but cancellation still wakes it
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_send_loop_cancelled_while_peer_stalls() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let _ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            std::future::pending::<()>().await;
        });

        let transport = Arc::new(Transport::connect(&format!("ws://{}", addr)).await.unwrap());
        let (outbox, outbound) = outbound_queue();
        let payload = "x".repeat(1024 * 1024);
        for _ in 0..64 {
            outbox.send(payload.clone()).unwrap();
        }

        let cancel = CancellationToken::new();
        let task = tokio::spawn(send_loop(transport.clone(), outbound, cancel.clone()));
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!task.is_finished());

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        // The sink lock was released with the dropped send
        tokio::time::timeout(Duration::from_secs(5), transport.close())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_receive_loop_forwards_frames() {
        let (url, _seen) = server(vec!["|challstr|4|abc", ">lobby\n|c:|1|A|hi"]).await;
        let transport = Arc::new(Transport::connect(&url).await.unwrap());
        let (inbound_tx, mut inbound_rx) = inbound_queue();
        let cancel = CancellationToken::new();

        let task = tokio::spawn(receive_loop(transport, inbound_tx, cancel.clone()));

        assert_eq!(inbound_rx.recv().await.unwrap(), "|challstr|4|abc");
        assert_eq!(inbound_rx.recv().await.unwrap(), ">lobby\n|c:|1|A|hi");

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_receive_loop_ends_on_server_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            ws.close(None).await.unwrap();
        });

        let transport = Arc::new(Transport::connect(&format!("ws://{}", addr)).await.unwrap());
        let (inbound_tx, _inbound_rx) = inbound_queue();

        let result = tokio::time::timeout(
            Duration::from_secs(1),
            receive_loop(transport.clone(), inbound_tx, CancellationToken::new()),
        )
        .await
        .unwrap();

        assert!(result.is_ok());
        assert!(!transport.is_open());
    }
}
