use std::fmt;

/// Highest volume the receiver accepts as a two-digit `MV` command
pub const RECEIVER_MAX_VOLUME: u8 = 98;

/// Power state reported by the TV
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerStatus {
    On,
    Off,
}

impl PowerStatus {
    pub fn is_on(self) -> bool {
        self == PowerStatus::On
    }
}

/// TV speaker volume on the device's native 0..=100 scale
///
/// A muted TV always reads as 0, whatever its numeric volume is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct VolumeReading(u8);

impl VolumeReading {
    pub const MAX: u8 = 100;

    /// Derive a reading from the raw volume and mute flag
    ///
    /// Returns `None` when the floored volume falls outside 0..=100.
    pub fn from_raw(volume: f64, mute: bool) -> Option<Self> {
        if mute {
            return Some(Self(0));
        }
        let floored = volume.floor();
        if !(0.0..=Self::MAX as f64).contains(&floored) {
            return None;
        }
        Some(Self(floored as u8))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Clamp this reading to the configured ceiling
    pub fn target(self, max_volume: u8) -> TargetVolume {
        TargetVolume(self.0.min(max_volume))
    }
}

impl fmt::Display for VolumeReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Volume the receiver should be driven to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TargetVolume(u8);

impl TargetVolume {
    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for TargetVolume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Power state reported by the receiver's `PW?` reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiverPower {
    On,
    Off,
    /// Reply that is neither on nor standby, kept verbatim for logging
    Unknown(String),
}

impl ReceiverPower {
    pub fn parse(reply: &str) -> Self {
        match reply.trim() {
            "PWON" => ReceiverPower::On,
            "PWSTANDBY" | "PWOFF" => ReceiverPower::Off,
            other => ReceiverPower::Unknown(other.to_string()),
        }
    }

    pub fn is_on(&self) -> bool {
        *self == ReceiverPower::On
    }
}

/// Master volume reported by the receiver's `MV?` reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReceiverVolume {
    whole: u8,
    half: bool,
}

impl ReceiverVolume {
    /// Decode an `MV` reply
    ///
    /// Two digits are whole steps. A non-zero third digit is a half step
    /// (`MV505` is 50.5). Anything that does not start with `MV` followed
    /// by digits decodes to 0.
    pub fn parse(reply: &str) -> Self {
        let digits: String = reply
            .trim()
            .strip_prefix("MV")
            .unwrap_or_default()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();

        let (whole, half) = match digits.len() {
            1 | 2 => (digits.as_str(), false),
            3 => (&digits[..2], &digits[2..] != "0"),
            _ => {
                tracing::warn!("Unexpected receiver volume reply {:?}, assuming 0", reply);
                return Self::from(0);
            }
        };

        match whole.parse() {
            Ok(whole) => Self { whole, half },
            Err(_) => {
                tracing::warn!("Unexpected receiver volume reply {:?}, assuming 0", reply);
                Self::from(0)
            }
        }
    }

    /// Whole steps, without any half step
    pub fn value(self) -> u8 {
        self.whole
    }

    /// Whether the receiver sits half a step above [`value`](Self::value)
    pub fn is_half_step(self) -> bool {
        self.half
    }

    /// Whether this is exactly the target volume
    pub fn matches(self, target: TargetVolume) -> bool {
        !self.half && self.whole == target.value()
    }
}

impl From<u8> for ReceiverVolume {
    fn from(whole: u8) -> Self {
        Self { whole, half: false }
    }
}

impl fmt::Display for ReceiverVolume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.half {
            write!(f, "{}.5", self.whole)
        } else {
            write!(f, "{}", self.whole)
        }
    }
}

/// Commands understood by the receiver's control port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverCommand {
    /// `PW?`
    PowerQuery,
    /// `MV?`
    VolumeQuery,
    /// `MV<NN>`, zero-padded to two digits
    SetVolume(u8),
}

impl ReceiverCommand {
    /// Wire text without the line terminator
    pub fn encode(&self) -> String {
        match self {
            ReceiverCommand::PowerQuery => "PW?".to_string(),
            ReceiverCommand::VolumeQuery => "MV?".to_string(),
            ReceiverCommand::SetVolume(volume) => format!("MV{:02}", volume),
        }
    }
}

impl fmt::Display for ReceiverCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Whether a raw command expects a reply line
pub fn is_query(command: &str) -> bool {
    command.contains('?')
}
