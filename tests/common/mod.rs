//! Fake devices shared by the integration tests

#![allow(dead_code)]

use bravia_denon_sync::{BraviaClient, DenonClient, SyncConfig, Synchronizer, UnreachablePolicy};
use mockito::{Mock, ServerGuard};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

pub const PSK: &str = "1234";

/// How the fake receiver treats a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryBehavior {
    Answer,
    /// Keep the connection open without replying
    Silent,
    /// Close the connection without replying
    Hangup,
}

#[derive(Debug, Clone)]
pub struct ReceiverState {
    pub power: String,
    pub volume: String,
    pub power_query: QueryBehavior,
    pub volume_query: QueryBehavior,
}

impl Default for ReceiverState {
    fn default() -> Self {
        Self {
            power: "PWON".to_string(),
            volume: "MV30".to_string(),
            power_query: QueryBehavior::Answer,
            volume_query: QueryBehavior::Answer,
        }
    }
}

/// In-process stand-in for a Denon control port
pub struct FakeReceiver {
    pub address: String,
    pub state: Arc<Mutex<ReceiverState>>,
    commands: Arc<Mutex<Vec<String>>>,
}

impl FakeReceiver {
    pub async fn start(state: ReceiverState) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let state = Arc::new(Mutex::new(state));
        let commands = Arc::new(Mutex::new(Vec::new()));

        let state_clone = state.clone();
        let commands_clone = commands.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let state = state_clone.clone();
                let commands = commands_clone.clone();
                tokio::spawn(async move {
                    let (read, mut write) = stream.into_split();
                    let mut reader = BufReader::new(read);
                    let mut line = String::new();
                    if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                        return;
                    }
                    let command = line.trim_end().to_string();
                    commands.lock().unwrap().push(command.clone());

                    let (reply, behavior) = {
                        let mut state = state.lock().unwrap();
                        match command.as_str() {
                            "PW?" => (state.power.clone(), state.power_query),
                            "MV?" => (state.volume.clone(), state.volume_query),
                            set if set.starts_with("MV") => {
                                state.volume = set.to_string();
                                return;
                            }
                            _ => return,
                        }
                    };

                    match behavior {
                        QueryBehavior::Answer => {
                            let _ = write.write_all(format!("{}\r", reply).as_bytes()).await;
                        }
                        QueryBehavior::Silent => {
                            tokio::time::sleep(Duration::from_secs(5)).await;
                        }
                        QueryBehavior::Hangup => {}
                    }
                });
            }
        });

        Self {
            address,
            state,
            commands,
        }
    }

    /// Commands received so far, without line terminators
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn volume(&self) -> String {
        self.state.lock().unwrap().volume.clone()
    }

    pub fn client(&self) -> DenonClient {
        DenonClient::new(&self.address, Duration::from_millis(500), Duration::from_millis(200))
    }
}

/// Address where nothing is listening
pub fn closed_address() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap().to_string();
    drop(listener);
    address
}

pub fn power_body(status: &str) -> String {
    format!(r#"{{"result":[{{"status":"{}"}}],"id":50}}"#, status)
}

pub fn volume_body(volume: u32, mute: bool) -> String {
    format!(
        r#"{{"result":[[{{"target":"speaker","volume":{},"mute":{},"maxVolume":100,"minVolume":0}}]],"id":33}}"#,
        volume, mute
    )
}

pub async fn mock_power(server: &mut ServerGuard, body: &str) -> Mock {
    server
        .mock("POST", "/sony/system")
        .match_header("x-auth-psk", PSK)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

pub async fn mock_volume(server: &mut ServerGuard, body: &str) -> Mock {
    server
        .mock("POST", "/sony/audio")
        .match_header("x-auth-psk", PSK)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

pub fn bravia(server: &ServerGuard) -> BraviaClient {
    BraviaClient::new(format!("{}/sony/", server.url()), PSK, Duration::from_secs(2)).unwrap()
}

pub fn fast_config(policy: UnreachablePolicy) -> SyncConfig {
    SyncConfig {
        poll_interval_ms: 10,
        display_retry_ms: 50,
        receiver_retry_ms: 20,
        max_volume: 40,
        on_receiver_unreachable: policy,
    }
}

pub fn synchronizer(server: &ServerGuard, receiver: DenonClient, policy: UnreachablePolicy) -> Synchronizer {
    Synchronizer::new(bravia(server), receiver, fast_config(policy))
}
