use crate::error::{Result, SyncError};
use crate::types::{is_query, ReceiverCommand, ReceiverPower, ReceiverVolume};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Client for a Denon receiver's telnet-style control port
///
/// Every command opens its own TCP connection, writes one CR LF terminated
/// line, reads a single CR terminated reply for queries, and closes.
#[derive(Debug, Clone)]
pub struct DenonClient {
    address: String,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl DenonClient {
    /// Create a client for `host:port`
    pub fn new(address: impl Into<String>, connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            address: address.into(),
            connect_timeout,
            read_timeout,
        }
    }

    /// Get the receiver's address
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Send a raw command and return the trimmed reply
    ///
    /// Commands without a `?` get no reply and return an empty string.
    pub async fn send_command(&self, command: &str) -> Result<String> {
        let mut stream = match timeout(self.connect_timeout, TcpStream::connect(self.address.as_str())).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(SyncError::Network(format!("connection error: {}", e)));
            }
            Err(_) => {
                return Err(SyncError::Network(format!(
                    "connection to {} timed out after {:?}",
                    self.address, self.connect_timeout
                )));
            }
        };

        tracing::debug!("Sending to {}: {}", self.address, command);
        stream
            .write_all(format!("{}\r\n", command).as_bytes())
            .await
            .map_err(|e| SyncError::Network(format!("write error: {}", e)))?;

        if !is_query(command) {
            return Ok(String::new());
        }

        let mut reader = BufReader::new(stream);
        let mut line = Vec::new();
        let read = match timeout(self.read_timeout, reader.read_until(b'\r', &mut line)).await {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(SyncError::Network(format!("read error: {}", e))),
            Err(_) => {
                return Err(SyncError::Network(format!(
                    "no reply to {} within {:?}",
                    command, self.read_timeout
                )));
            }
        };

        if read == 0 || line.last() != Some(&b'\r') {
            return Err(SyncError::Network(format!(
                "read error: connection closed before reply to {}",
                command
            )));
        }

        let reply = String::from_utf8_lossy(&line).trim().to_string();
        tracing::debug!("Received from {}: {}", self.address, reply);
        Ok(reply)
    }

    /// Send a typed command
    pub async fn send(&self, command: ReceiverCommand) -> Result<String> {
        self.send_command(&command.encode()).await
    }

    /// Query the receiver's power state
    pub async fn power(&self) -> Result<ReceiverPower> {
        let reply = self.send(ReceiverCommand::PowerQuery).await?;
        Ok(ReceiverPower::parse(&reply))
    }

    /// Query the receiver's master volume
    pub async fn volume(&self) -> Result<ReceiverVolume> {
        let reply = self.send(ReceiverCommand::VolumeQuery).await?;
        Ok(ReceiverVolume::parse(&reply))
    }

    /// Set the receiver's master volume
    pub async fn set_volume(&self, volume: u8) -> Result<()> {
        self.send(ReceiverCommand::SetVolume(volume)).await?;
        Ok(())
    }
}
