use crate::codec::JsonCodec;
use crate::error::{MixerError, Result};
use crate::protocol::Command;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;

/// A single request/reply exchange with the server
///
/// Each command gets its own connection: it is opened, used for exactly one
/// request and one reply, then dropped.
pub struct Connection {
    addr: String,
    framed: Framed<TcpStream, JsonCodec>,
}

impl Connection {
    /// Dial `addr`, giving up after `connect_timeout`
    pub async fn open(addr: &str, connect_timeout: Duration, codec: JsonCodec) -> Result<Self> {
        tracing::debug!("Connecting to {}", addr);

        let stream = match timeout(connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(MixerError::Connect {
                    addr: addr.to_string(),
                    source,
                })
            }
            Err(_) => return Err(MixerError::ConnectTimeout(addr.to_string())),
        };
        stream.set_nodelay(true)?;

        Ok(Self {
            addr: addr.to_string(),
            framed: Framed::new(stream, codec),
        })
    }

    /// Send `command` and wait for its reply
    ///
    /// There is no reply timeout: a long-poll command waits as long as the
    /// server holds it.
    pub async fn exchange(mut self, command: &Command) -> Result<Value> {
        if tracing::enabled!(tracing::Level::DEBUG) {
            tracing::debug!("Sending to {}: {}", self.addr, serde_json::to_string(command)?);
        }

        self.framed.send(command).await?;
        if command.is_long_poll() {
            tracing::debug!("Waiting on {} until the server reports a change", self.addr);
        }

        match self.framed.next().await {
            Some(Ok(reply)) => {
                tracing::debug!("Received from {}: {}", self.addr, reply);
                Ok(reply)
            }
            Some(Err(e)) => Err(e),
            None => Err(MixerError::ConnectionClosed),
        }
    }

    /// Like [`exchange`](Self::exchange), but gives up when `cancel` fires
    ///
    /// Cancelling drops the socket, so the server sees the connection close.
    pub async fn exchange_until_cancelled(
        self,
        command: &Command,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        let addr = self.addr.clone();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Exchange with {} cancelled", addr);
                Err(MixerError::Cancelled)
            }
            result = self.exchange(command) => result,
        }
    }
}
