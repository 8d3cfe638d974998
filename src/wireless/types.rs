use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

use ipnet::Ipv4Net;

/// Default window for a connect attempt when the caller does not supply one.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(90);

/// Default retry budget for automatic reconnection.
pub const DEFAULT_MAX_RETRIES: u32 = 7;

/// Lifecycle phase of the wireless adapter.
///
/// Exactly one phase is active at a time; the manager is the only mutator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    Stopped,
    Starting,
    Started,
    Connecting,
    Connected,
    Disconnecting,
}

impl fmt::Display for AdapterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Starting => write!(f, "starting"),
            Self::Started => write!(f, "started"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Disconnecting => write!(f, "disconnecting"),
        }
    }
}

impl AdapterState {
    /// The interface is powered and able to service scan/connect requests.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Started | Self::Connecting | Self::Connected)
    }

    /// A connect or disconnect is mid-flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Connecting | Self::Disconnecting)
    }
}

/// Security negotiated or advertised by an access point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum AuthenticationType {
    Open,
    Wep,
    WpaPsk,
    Wpa2Psk,
    Wpa3Sae,
    Wpa2Enterprise,
    Unknown,
}

impl fmt::Display for AuthenticationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::Wep => write!(f, "WEP"),
            Self::WpaPsk => write!(f, "WPA"),
            Self::Wpa2Psk => write!(f, "WPA2"),
            Self::Wpa3Sae => write!(f, "WPA3"),
            Self::Wpa2Enterprise => write!(f, "WPA2-EAP"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

impl AuthenticationType {
    pub fn needs_credential(&self) -> bool {
        !matches!(self, Self::Open)
    }

    /// Decode the capability bitfields carried in a beacon report.
    ///
    /// `privacy` is the basic capability flag; `wpa` and `rsn` are the
    /// vendor/RSN information-element masks reported by the coprocessor.
    pub fn from_beacon_flags(privacy: u32, wpa: u32, rsn: u32) -> Self {
        if rsn != 0 {
            if rsn & 0x200 != 0 {
                return Self::Wpa2Enterprise;
            }
            if rsn & 0x400 != 0 {
                return Self::Wpa3Sae;
            }
            return Self::Wpa2Psk;
        }
        if wpa != 0 {
            if wpa & 0x200 != 0 {
                return Self::Wpa2Enterprise;
            }
            return Self::WpaPsk;
        }
        if privacy & 0x1 != 0 {
            return Self::Wep;
        }
        Self::Open
    }
}

/// Antenna routing for the adapter's RF front end
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AntennaType {
    /// Chip antenna on the module itself
    OnBoard,
    /// U.FL connector for an external antenna
    External,
}

impl fmt::Display for AntennaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnBoard => write!(f, "on-board"),
            Self::External => write!(f, "external"),
        }
    }
}

/// Whether and how the manager retries after a dropped connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectionPolicy {
    /// Stay disconnected until the caller connects again
    None,
    /// Re-join autonomously, at most `max_retries` consecutive attempts
    Automatic { max_retries: u32 },
}

impl Default for ReconnectionPolicy {
    fn default() -> Self {
        Self::Automatic {
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// Parameters for a single connect attempt.
///
/// This is the one canonical connect input: every convenience path (stored
/// defaults, omitted timeout, omitted policy) normalizes into this struct.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub ssid: String,
    pub credential: String,
    /// `None` waits on the radio indefinitely
    pub timeout: Option<Duration>,
    pub policy: ReconnectionPolicy,
}

impl ConnectionConfig {
    /// Config with the default timeout and automatic reconnection
    pub fn new(ssid: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            credential: credential.into(),
            timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            policy: ReconnectionPolicy::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Wait on the radio with no deadline
    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    pub fn with_policy(mut self, policy: ReconnectionPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Network parameters negotiated during association and DHCP
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkParameters {
    /// Leased address with its prefix length
    pub address: Ipv4Net,
    pub gateway: Ipv4Addr,
    pub bssid: String,
    pub channel: u32,
    pub authentication: AuthenticationType,
}

/// A network discovered by a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkDescriptor {
    pub ssid: String,
    pub bssid: String,
    pub channel: u32,
    /// Signal strength as a percentage, 0–100
    pub signal_strength: u8,
    pub authentication: AuthenticationType,
}

/// Outcome of a disconnect request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disconnection {
    /// An active association was torn down
    Disconnected,
    /// An in-flight connect attempt was aborted instead
    AttemptAborted,
    /// There was nothing to disconnect; benign no-op
    NotConnected,
}
