use crate::error::{Result, SyncError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC protocol version spoken by the TV
pub const PROTOCOL_VERSION: &str = "1.0";

/// JSON-RPC request envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Request {
    pub method: String,
    pub id: u32,
    pub params: Vec<Value>,
    pub version: String,
}

impl Request {
    /// Create a request with empty params
    pub fn new(method: impl Into<String>, id: u32) -> Self {
        Self {
            method: method.into(),
            id,
            params: Vec::new(),
            version: PROTOCOL_VERSION.to_string(),
        }
    }

    /// Append a params entry
    pub fn with_param(mut self, param: Value) -> Self {
        self.params.push(param);
        self
    }
}

/// Successful response envelope, generic over the `result` shape
///
/// The echoed `id` is ignored; the TV does not always return the request's id.
#[derive(Debug, Clone, Deserialize)]
pub struct Response<T> {
    pub result: T,
}

/// Error envelope: `{"error": [code, "message"], "id": N}`
#[derive(Debug, Clone, Deserialize)]
struct ErrorResponse {
    error: (i64, String),
}

/// One entry of the `getPowerStatus` result
#[derive(Debug, Clone, Deserialize)]
pub struct PowerStatusResult {
    pub status: String,
}

/// One entry of the `getVolumeInformation` result
#[derive(Debug, Clone, Deserialize)]
pub struct VolumeInformation {
    #[serde(default)]
    pub target: Option<String>,
    pub volume: f64,
    pub mute: bool,
    #[serde(default, rename = "maxVolume")]
    pub max_volume: Option<f64>,
    #[serde(default, rename = "minVolume")]
    pub min_volume: Option<f64>,
}

/// `getPowerStatus` replies `{"result": [{"status": ..}]}`
pub type PowerStatusResponse = Response<Vec<PowerStatusResult>>;

/// `getVolumeInformation` replies `{"result": [[{"volume": .., "mute": ..}]]}`
pub type VolumeInformationResponse = Response<Vec<Vec<VolumeInformation>>>;

/// Decode a response body into the expected shape
///
/// Bodies carrying the TV's error envelope become [`SyncError::Device`];
/// anything else that does not match `T` is a protocol error.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    match serde_json::from_slice::<T>(body) {
        Ok(decoded) => Ok(decoded),
        Err(shape_err) => {
            if let Ok(ErrorResponse { error: (code, message) }) = serde_json::from_slice(body) {
                return Err(SyncError::Device { code, message });
            }
            Err(SyncError::Protocol(format!(
                "unexpected response {}: {}",
                String::from_utf8_lossy(body),
                shape_err
            )))
        }
    }
}
