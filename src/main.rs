//! Showdown Client - Entry Point
//!
//! Connects to a server, logs in, joins the lobby and feeds stdin lines to
//! the server as raw commands. Type `exit` to quit.

use std::env;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use showdown_client::{
    ChatMessage, Client, ClientConfig, ClientError, ClientHandle, Credentials, Room,
};

/// Environment variable holding the account name
const USERNAME_VAR: &str = "SHOWDOWN_USERNAME";

/// Environment variable holding the account password
const PASSWORD_VAR: &str = "SHOWDOWN_PASSWORD";

/// Set to `1` to connect over `wss://`
const SECURE_VAR: &str = "SHOWDOWN_SECURE";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=showdown_client=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("showdown_client=info")),
        )
        .init();

    let config = config_from_args()?;
    let credentials = Credentials::new(required_var(USERNAME_VAR)?, required_var(PASSWORD_VAR)?);

    let client = Client::new(config, credentials)?;
    let handle = client.handle();

    let lobby = handle.join_room("lobby")?;
    lobby
        .subscribe(|room: &Room, msg: &ChatMessage| {
            info!("[{}] {}: {}", room.id(), msg.sender, msg.text);
        })
        .await;

    tokio::spawn(feed_stdin(handle.clone()));

    let ready_handle = handle.clone();
    tokio::spawn(async move {
        if ready_handle.ready().await.is_ok() {
            info!("Logged in and ready");
        }
    });

    if let Err(e) = client.run().await {
        error!("Client error: {}", e);
        return Err(e.into());
    }
    Ok(())
}

/// Build the config from `[host] [port]` arguments
fn config_from_args() -> Result<ClientConfig, ClientError> {
    let mut config = ClientConfig::default();
    let mut args = env::args().skip(1);

    if let Some(host) = args.next() {
        config.host = host;
    }
    if let Some(port) = args.next() {
        config.port = port
            .parse()
            .map_err(|_| ClientError::Config(format!("invalid port '{}'", port)))?;
    }
    config.secure = env::var(SECURE_VAR).is_ok_and(|v| v == "1");

    Ok(config)
}

fn required_var(name: &str) -> Result<String, ClientError> {
    env::var(name).map_err(|_| ClientError::Config(format!("{} is not set", name)))
}

/// Read stdin and shut the client down when input ends
async fn feed_stdin(handle: ClientHandle) {
    if let Err(e) = feed_input(&handle, BufReader::new(tokio::io::stdin())).await {
        warn!("Failed to read input: {}", e);
    }

    info!("Input closed, shutting down");
    handle.shutdown();
}

/// Enqueue each input line as a raw command until `exit`, EOF or shutdown
async fn feed_input<R>(handle: &ClientHandle, reader: R) -> Result<(), ClientError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    loop {
        let line = tokio::select! {
            _ = handle.stopped() => break,
            line = lines.next_line() => line?,
        };

        let Some(line) = line else {
            break;
        };
        if line.trim() == "exit" {
            break;
        }
        handle.send(line)?;
    }

    Ok(())
}
