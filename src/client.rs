use crate::connection::RpcConnection;
use crate::error::{Result, SyncError};
use crate::protocol::{self, PowerStatusResponse, Request, VolumeInformation, VolumeInformationResponse};
use crate::types::{PowerStatus, VolumeReading};
use std::time::Duration;

const SYSTEM_SERVICE: &str = "system";
const AUDIO_SERVICE: &str = "audio";

const POWER_STATUS_METHOD: &str = "getPowerStatus";
const POWER_STATUS_ID: u32 = 50;

const VOLUME_INFORMATION_METHOD: &str = "getVolumeInformation";
const VOLUME_INFORMATION_ID: u32 = 33;

/// Volume target the TV reports for its built-in speakers
const SPEAKER_TARGET: &str = "speaker";

/// Client for a Sony Bravia TV's JSON-RPC control API
///
/// The TV has to have "IP control" enabled with pre-shared key
/// authentication. Each call issues a single POST; nothing is cached.
///
/// # Example
///
/// ```no_run
/// use bravia_denon_sync::BraviaClient;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let tv = BraviaClient::new("http://192.168.1.20/sony/", "1234", Duration::from_secs(5))?;
///     if tv.get_power_status().await?.is_on() {
///         println!("TV volume is {}", tv.get_volume().await?);
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct BraviaClient {
    connection: RpcConnection,
}

impl BraviaClient {
    pub fn new(base_url: impl Into<String>, psk: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            connection: RpcConnection::new(base_url, psk, timeout)?,
        })
    }

    /// Get the underlying connection
    pub fn connection(&self) -> &RpcConnection {
        &self.connection
    }

    /// Query whether the TV is on
    pub async fn get_power_status(&self) -> Result<PowerStatus> {
        let request = Request::new(POWER_STATUS_METHOD, POWER_STATUS_ID);
        let body = self.connection.post(SYSTEM_SERVICE, &request).await?;
        parse_power_status(&body)
    }

    /// Query the speaker volume, reading 0 when muted
    pub async fn get_volume(&self) -> Result<VolumeReading> {
        let request = Request::new(VOLUME_INFORMATION_METHOD, VOLUME_INFORMATION_ID);
        let body = self.connection.post(AUDIO_SERVICE, &request).await?;
        parse_volume(&body)
    }
}

/// Decode a `getPowerStatus` reply
pub fn parse_power_status(body: &[u8]) -> Result<PowerStatus> {
    let response: PowerStatusResponse = protocol::decode(body)?;

    let status = response
        .result
        .first()
        .map(|r| r.status.as_str())
        .ok_or_else(|| SyncError::Protocol("empty power status result".to_string()))?;

    match status {
        "active" => Ok(PowerStatus::On),
        "standby" => Ok(PowerStatus::Off),
        other => Err(SyncError::Protocol(format!("unrecognized power status {:?}", other))),
    }
}

/// Decode a `getVolumeInformation` reply
pub fn parse_volume(body: &[u8]) -> Result<VolumeReading> {
    let response: VolumeInformationResponse = protocol::decode(body)?;

    let targets = response
        .result
        .first()
        .filter(|targets| !targets.is_empty())
        .ok_or_else(|| SyncError::Protocol("empty volume information result".to_string()))?;

    let info = speaker_target(targets);

    let min = info.min_volume.unwrap_or(0.0);
    let max = info.max_volume.unwrap_or(VolumeReading::MAX as f64);
    if info.volume < min || info.volume > max {
        return Err(SyncError::Protocol(format!(
            "volume {} outside reported range {}..={}",
            info.volume, min, max
        )));
    }

    VolumeReading::from_raw(info.volume, info.mute).ok_or_else(|| {
        SyncError::Protocol(format!("volume {} out of range", info.volume))
    })
}

// The TV lists one entry per output (speaker, headphone). Prefer the
// speaker entry and fall back to the first one.
fn speaker_target(targets: &[VolumeInformation]) -> &VolumeInformation {
    targets
        .iter()
        .find(|t| t.target.as_deref() == Some(SPEAKER_TARGET))
        .unwrap_or(&targets[0])
}
