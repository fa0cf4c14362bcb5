//! Keeps a Denon AV receiver's volume in step with a Sony Bravia TV
//!
//! The TV is the authoritative source. Its power state and speaker volume
//! are polled over the Bravia JSON-RPC API (HTTP with a pre-shared key),
//! and the receiver is driven over its line-based TCP control protocol:
//!
//! - `PW?` power query, answered with `PWON` or `PWSTANDBY`
//! - `MV?` master volume query, answered with `MV<NN>`
//! - `MV<NN>` master volume set
//!
//! # Quick Start
//!
//! ```no_run
//! use bravia_denon_sync::{BraviaClient, DenonClient, SyncConfig, Synchronizer, IterationOutcome};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tv = BraviaClient::new("http://192.168.1.20/sony/", "1234", Duration::from_secs(5))?;
//!     let receiver = DenonClient::new("192.168.1.18:23", Duration::from_secs(1), Duration::from_secs(1));
//!     let sync = Synchronizer::new(tv, receiver, SyncConfig::default());
//!
//!     match sync.run_once().await? {
//!         IterationOutcome::Adjusted { from, to } => println!("Receiver moved from {} to {}", from, to),
//!         other => println!("{:?}", other),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **Sync**: the polling loop and reconciliation policy
//! - **Client**: Bravia power and volume queries
//! - **Receiver**: one TCP connection per Denon command
//! - **Connection**: JSON-RPC over HTTP
//! - **Protocol**: JSON-RPC envelopes and response shapes
//! - **Types**: device states and the receiver command vocabulary

mod client;
mod config;
mod connection;
mod error;
mod protocol;
mod receiver;
mod sync;
mod types;

// Public exports
pub use client::{parse_power_status, parse_volume, BraviaClient};
pub use config::{Config, DisplayConfig, ReceiverConfig, SyncConfig, UnreachablePolicy};
pub use connection::RpcConnection;
pub use error::{Result, SyncError};
pub use protocol::Request;
pub use receiver::DenonClient;
pub use sync::{plan_reconcile, IterationOutcome, Step, SyncHandle, Synchronizer};
pub use types::{
    PowerStatus, ReceiverCommand, ReceiverPower, ReceiverVolume, TargetVolume, VolumeReading,
    RECEIVER_MAX_VOLUME,
};
