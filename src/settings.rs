use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use crate::error::{WirelessError, WirelessResult};
use crate::wireless::types::AntennaType;

// ─── Embedded Default ────────────────────────────────────────────────────
/// Baked into the binary at compile time. The adapter can never fail to
/// initialize because a settings file is missing; this is always available
/// as the base layer.
const DEFAULT_SETTINGS_TOML: &str = include_str!("../default_settings.toml");

// ─── Keys and Values ─────────────────────────────────────────────────────

/// The fixed enumeration of platform configuration keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    DeviceName,
    MacAddress,
    SoftApMacAddress,
    DefaultAccessPoint,
    DefaultCredential,
    AutomaticallyStartNetwork,
    AutomaticallyReconnect,
    MaximumNetworkRetryCount,
    InitializationTimeout,
    GetTimeAtStartup,
    Antenna,
}

impl SettingKey {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DeviceName => "device_name",
            Self::MacAddress => "mac_address",
            Self::SoftApMacAddress => "soft_ap_mac_address",
            Self::DefaultAccessPoint => "default_access_point",
            Self::DefaultCredential => "default_credential",
            Self::AutomaticallyStartNetwork => "automatically_start_network",
            Self::AutomaticallyReconnect => "automatically_reconnect",
            Self::MaximumNetworkRetryCount => "maximum_network_retry_count",
            Self::InitializationTimeout => "initialization_timeout_secs",
            Self::GetTimeAtStartup => "get_time_at_startup",
            Self::Antenna => "antenna",
        }
    }

    fn expected_kind(&self) -> &'static str {
        match self {
            Self::DeviceName
            | Self::MacAddress
            | Self::SoftApMacAddress
            | Self::DefaultAccessPoint
            | Self::DefaultCredential => "text",
            Self::AutomaticallyStartNetwork
            | Self::AutomaticallyReconnect
            | Self::GetTimeAtStartup => "flag",
            Self::MaximumNetworkRetryCount => "count",
            Self::InitializationTimeout => "seconds",
            Self::Antenna => "antenna",
        }
    }
}

/// Tagged value payload for the generic accessors. Each key accepts exactly
/// one variant kind.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Text(String),
    Flag(bool),
    Count(u32),
    Seconds(u64),
    Antenna(AntennaType),
}

impl SettingValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Flag(_) => "flag",
            Self::Count(_) => "count",
            Self::Seconds(_) => "seconds",
            Self::Antenna(_) => "antenna",
        }
    }
}

// ─── TOML Layer ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
struct SettingsFile {
    device_name: String,
    mac_address: String,
    soft_ap_mac_address: String,
    default_access_point: String,
    default_credential: String,
    automatically_start_network: bool,
    automatically_reconnect: bool,
    maximum_network_retry_count: u32,
    initialization_timeout_secs: u64,
    get_time_at_startup: bool,
    antenna: AntennaType,
}

impl Default for SettingsFile {
    fn default() -> Self {
        // Values mirror the embedded `default_settings.toml`. These are
        // written out as literals rather than parsed from the embedded TOML
        // because this type carries `#[serde(default)]`: deserializing via
        // `toml::from_str` would call back into this `Default` impl to build
        // its fallback values, recursing without bound.
        Self {
            device_name: "kestrel".to_string(),
            mac_address: String::new(),
            soft_ap_mac_address: String::new(),
            default_access_point: String::new(),
            default_credential: String::new(),
            automatically_start_network: false,
            automatically_reconnect: true,
            maximum_network_retry_count: 7,
            initialization_timeout_secs: 90,
            get_time_at_startup: true,
            antenna: AntennaType::OnBoard,
        }
    }
}

// ─── Store ───────────────────────────────────────────────────────────────

/// The platform configuration store.
///
/// A typed key/value store over a TOML file, read by the connection manager
/// at initialization and written through when a caller persists a change.
/// An in-memory store (no backing file) behaves identically except that
/// `save` is a no-op.
#[derive(Debug, Clone)]
pub struct PlatformSettings {
    file: SettingsFile,
    path: Option<PathBuf>,
}

impl PlatformSettings {
    /// Store with embedded defaults and no backing file
    pub fn in_memory() -> Self {
        Self {
            file: SettingsFile::default(),
            path: None,
        }
    }

    /// Standard settings file path: `<config dir>/kestrel/wireless.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kestrel")
            .join("wireless.toml")
    }

    /// Load from `path`, bootstrapping the file from embedded defaults when
    /// it does not exist yet.
    pub async fn load(path: impl Into<PathBuf>) -> WirelessResult<Self> {
        let path = path.into();

        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&path, DEFAULT_SETTINGS_TOML).await?;
            info!("created default settings at {}", path.display());
        }

        let toml_str = fs::read_to_string(&path).await?;
        let file: SettingsFile = toml::from_str(&toml_str).map_err(|e| {
            WirelessError::Settings(format!("failed to parse {}: {e}", path.display()))
        })?;

        Ok(Self {
            file,
            path: Some(path),
        })
    }

    /// Write the current values back to the backing file, if there is one
    pub async fn save(&self) -> WirelessResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let toml_str = toml::to_string_pretty(&self.file)
            .map_err(|e| WirelessError::Settings(format!("failed to serialize settings: {e}")))?;
        fs::write(path, toml_str).await?;
        Ok(())
    }

    // ── Typed Accessors ───────────────────────────────────────────────

    pub fn device_name(&self) -> &str {
        &self.file.device_name
    }

    /// Stored default network, empty = none configured
    pub fn default_access_point(&self) -> Option<&str> {
        let ssid = self.file.default_access_point.trim();
        if ssid.is_empty() {
            None
        } else {
            Some(ssid)
        }
    }

    pub fn default_credential(&self) -> &str {
        &self.file.default_credential
    }

    pub fn automatically_start_network(&self) -> bool {
        self.file.automatically_start_network
    }

    pub fn automatically_reconnect(&self) -> bool {
        self.file.automatically_reconnect
    }

    pub fn maximum_network_retry_count(&self) -> u32 {
        self.file.maximum_network_retry_count
    }

    pub fn initialization_timeout(&self) -> Duration {
        Duration::from_secs(self.file.initialization_timeout_secs)
    }

    pub fn get_time_at_startup(&self) -> bool {
        self.file.get_time_at_startup
    }

    pub fn antenna(&self) -> AntennaType {
        self.file.antenna
    }

    pub fn set_antenna(&mut self, antenna: AntennaType) {
        self.file.antenna = antenna;
    }

    pub fn set_default_access_point(&mut self, ssid: &str, credential: &str) {
        self.file.default_access_point = ssid.to_string();
        self.file.default_credential = credential.to_string();
    }

    // ── Generic Accessors ─────────────────────────────────────────────

    /// Read any key as its tagged value
    pub fn get(&self, key: SettingKey) -> SettingValue {
        match key {
            SettingKey::DeviceName => SettingValue::Text(self.file.device_name.clone()),
            SettingKey::MacAddress => SettingValue::Text(self.file.mac_address.clone()),
            SettingKey::SoftApMacAddress => {
                SettingValue::Text(self.file.soft_ap_mac_address.clone())
            }
            SettingKey::DefaultAccessPoint => {
                SettingValue::Text(self.file.default_access_point.clone())
            }
            SettingKey::DefaultCredential => {
                SettingValue::Text(self.file.default_credential.clone())
            }
            SettingKey::AutomaticallyStartNetwork => {
                SettingValue::Flag(self.file.automatically_start_network)
            }
            SettingKey::AutomaticallyReconnect => {
                SettingValue::Flag(self.file.automatically_reconnect)
            }
            SettingKey::MaximumNetworkRetryCount => {
                SettingValue::Count(self.file.maximum_network_retry_count)
            }
            SettingKey::InitializationTimeout => {
                SettingValue::Seconds(self.file.initialization_timeout_secs)
            }
            SettingKey::GetTimeAtStartup => SettingValue::Flag(self.file.get_time_at_startup),
            SettingKey::Antenna => SettingValue::Antenna(self.file.antenna),
        }
    }

    /// Write any key, rejecting a value of the wrong kind for that key
    pub fn set(&mut self, key: SettingKey, value: SettingValue) -> WirelessResult<()> {
        if value.kind() != key.expected_kind() {
            return Err(WirelessError::Settings(format!(
                "{} expects a {} value, got {}",
                key.name(),
                key.expected_kind(),
                value.kind()
            )));
        }
        match (key, value) {
            (SettingKey::DeviceName, SettingValue::Text(v)) => self.file.device_name = v,
            (SettingKey::MacAddress, SettingValue::Text(v)) => self.file.mac_address = v,
            (SettingKey::SoftApMacAddress, SettingValue::Text(v)) => {
                self.file.soft_ap_mac_address = v
            }
            (SettingKey::DefaultAccessPoint, SettingValue::Text(v)) => {
                self.file.default_access_point = v
            }
            (SettingKey::DefaultCredential, SettingValue::Text(v)) => {
                self.file.default_credential = v
            }
            (SettingKey::AutomaticallyStartNetwork, SettingValue::Flag(v)) => {
                self.file.automatically_start_network = v
            }
            (SettingKey::AutomaticallyReconnect, SettingValue::Flag(v)) => {
                self.file.automatically_reconnect = v
            }
            (SettingKey::MaximumNetworkRetryCount, SettingValue::Count(v)) => {
                self.file.maximum_network_retry_count = v
            }
            (SettingKey::InitializationTimeout, SettingValue::Seconds(v)) => {
                self.file.initialization_timeout_secs = v
            }
            (SettingKey::GetTimeAtStartup, SettingValue::Flag(v)) => {
                self.file.get_time_at_startup = v
            }
            (SettingKey::Antenna, SettingValue::Antenna(v)) => self.file.antenna = v,
            // Kind check above makes this unreachable
            _ => unreachable!("setting kind validated before dispatch"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults_parse() {
        let settings = PlatformSettings::in_memory();
        assert_eq!(settings.device_name(), "kestrel");
        assert_eq!(settings.default_access_point(), None);
        assert!(!settings.automatically_start_network());
        assert!(settings.automatically_reconnect());
        assert_eq!(settings.maximum_network_retry_count(), 7);
        assert_eq!(settings.initialization_timeout(), Duration::from_secs(90));
        assert_eq!(settings.antenna(), AntennaType::OnBoard);
    }

    #[test]
    fn generic_get_set_round_trip() {
        let mut settings = PlatformSettings::in_memory();
        settings
            .set(
                SettingKey::MaximumNetworkRetryCount,
                SettingValue::Count(3),
            )
            .unwrap();
        assert_eq!(
            settings.get(SettingKey::MaximumNetworkRetryCount),
            SettingValue::Count(3)
        );
        assert_eq!(settings.maximum_network_retry_count(), 3);
    }

    #[test]
    fn set_rejects_wrong_kind() {
        let mut settings = PlatformSettings::in_memory();
        let err = settings
            .set(SettingKey::DeviceName, SettingValue::Flag(true))
            .unwrap_err();
        assert!(matches!(err, WirelessError::Settings(_)));
        // Nothing changed
        assert_eq!(settings.device_name(), "kestrel");
    }

    #[tokio::test]
    async fn bootstrap_and_reload() {
        let path = std::env::temp_dir().join(format!(
            "kestrel-settings-bootstrap-{}.toml",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let mut settings = PlatformSettings::load(&path).await.unwrap();
        assert_eq!(settings.antenna(), AntennaType::OnBoard);

        settings.set_antenna(AntennaType::External);
        settings.set_default_access_point("HomeNet", "secret123");
        settings.save().await.unwrap();

        let reloaded = PlatformSettings::load(&path).await.unwrap();
        assert_eq!(reloaded.antenna(), AntennaType::External);
        assert_eq!(reloaded.default_access_point(), Some("HomeNet"));
        assert_eq!(reloaded.default_credential(), "secret123");

        let _ = std::fs::remove_file(&path);
    }
}
