// Each integration test crate compiles its own copy and uses a subset.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use kestrel_wireless::settings::PlatformSettings;
use kestrel_wireless::wireless::{
    AuthenticationType, SimulatedRadio, WirelessConnectionManager,
};

/// A radio with one WPA2 home network, fast enough for paused-clock tests
pub fn home_radio() -> SimulatedRadio {
    let radio = SimulatedRadio::new();
    radio.add_network("HomeNet", "secret123", 6, 80, AuthenticationType::Wpa2Psk);
    radio.set_join_delay(Duration::from_millis(100));
    radio.set_scan_delay(Duration::from_millis(100));
    radio
}

pub fn manager_over(radio: &SimulatedRadio) -> WirelessConnectionManager {
    WirelessConnectionManager::new(Arc::new(radio.clone()), PlatformSettings::in_memory())
}

/// Manager over `radio` with the interface already started
pub async fn started_manager(radio: &SimulatedRadio) -> WirelessConnectionManager {
    let manager = manager_over(radio);
    manager.start_interface().await.expect("start interface");
    manager
}
