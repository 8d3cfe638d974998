mod common;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use kestrel_wireless::settings::PlatformSettings;
use kestrel_wireless::wireless::{
    AdapterState, AntennaType, AuthenticationType, CancelSource, CancelToken, SimulatedRadio,
    WirelessConnectionManager, WirelessEvent,
};
use kestrel_wireless::WirelessError;

use common::{home_radio, manager_over, started_manager};

fn survey_radio() -> SimulatedRadio {
    let radio = SimulatedRadio::new();
    radio.add_network("Warehouse", "", 1, 30, AuthenticationType::Open);
    radio.add_network("HomeNet", "secret123", 6, 90, AuthenticationType::Wpa2Psk);
    radio.add_network("Lab-5G", "labpass", 36, 60, AuthenticationType::Wpa3Sae);
    radio.set_scan_delay(Duration::from_millis(100));
    radio
}

#[tokio::test(start_paused = true)]
async fn scan_reports_networks_in_discovery_order() {
    let radio = survey_radio();
    let manager = started_manager(&radio).await;

    let found = manager
        .scan(Some(Duration::from_millis(500)), CancelToken::never())
        .await
        .unwrap();

    assert_eq!(found.len(), 3);
    let ssids: Vec<_> = found.iter().map(|n| n.ssid.as_str()).collect();
    // Discovery order, not sorted by signal strength
    assert_eq!(ssids, ["Warehouse", "HomeNet", "Lab-5G"]);
}

#[tokio::test(start_paused = true)]
async fn scan_while_stopped_is_invalid_state() {
    let radio = survey_radio();
    let manager = manager_over(&radio);

    let err = manager.scan(None, CancelToken::never()).await.unwrap_err();
    assert!(matches!(
        err,
        WirelessError::InvalidState {
            state: AdapterState::Stopped,
            ..
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn scan_respects_timeout() {
    let radio = survey_radio();
    radio.set_scan_delay(Duration::from_secs(30));
    let manager = started_manager(&radio).await;

    let err = manager
        .scan(Some(Duration::from_millis(500)), CancelToken::never())
        .await
        .unwrap_err();
    assert!(matches!(err, WirelessError::Timeout(_)));
    // Scan never touches the state machine
    assert_eq!(manager.state(), AdapterState::Started);
}

#[tokio::test(start_paused = true)]
async fn scan_without_timeout_waits_for_the_sweep() {
    let radio = survey_radio();
    radio.set_scan_delay(Duration::from_secs(120));
    let manager = started_manager(&radio).await;

    let found = manager.scan(None, CancelToken::never()).await.unwrap();
    assert_eq!(found.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn scan_can_be_cancelled() {
    let radio = survey_radio();
    radio.set_scan_delay(Duration::from_secs(120));
    let manager = started_manager(&radio).await;

    let (source, token) = CancelSource::new();
    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        source.cancel();
    });

    let err = manager.scan(None, token).await.unwrap_err();
    canceller.await.unwrap();
    assert!(matches!(err, WirelessError::Cancelled));
}

#[tokio::test(start_paused = true)]
async fn empty_scan_result_is_valid() {
    let radio = SimulatedRadio::new();
    radio.set_scan_delay(Duration::from_millis(10));
    let manager = started_manager(&radio).await;

    let found = manager.scan(None, CancelToken::never()).await.unwrap();
    assert!(found.is_empty());
}

fn temp_settings_path(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "kestrel-wireless-{tag}-{}.toml",
        std::process::id()
    ))
}

#[tokio::test]
async fn persisted_antenna_survives_restart() {
    let path = temp_settings_path("antenna-persist");
    let _ = std::fs::remove_file(&path);

    let radio = home_radio();
    let settings = PlatformSettings::load(&path).await.unwrap();
    let manager = WirelessConnectionManager::new(Arc::new(radio.clone()), settings);
    assert_eq!(manager.antenna(), AntennaType::OnBoard);

    manager
        .set_antenna(AntennaType::External, true)
        .await
        .unwrap();

    // Simulated restart: a fresh manager over the same settings file
    drop(manager);
    let settings = PlatformSettings::load(&path).await.unwrap();
    let manager = WirelessConnectionManager::new(Arc::new(radio), settings);
    assert_eq!(manager.antenna(), AntennaType::External);

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn unpersisted_antenna_does_not_survive_restart() {
    let path = temp_settings_path("antenna-volatile");
    let _ = std::fs::remove_file(&path);

    let radio = home_radio();
    let settings = PlatformSettings::load(&path).await.unwrap();
    let manager = WirelessConnectionManager::new(Arc::new(radio.clone()), settings);

    manager
        .set_antenna(AntennaType::External, false)
        .await
        .unwrap();
    assert_eq!(manager.antenna(), AntennaType::External);

    drop(manager);
    let settings = PlatformSettings::load(&path).await.unwrap();
    let manager = WirelessConnectionManager::new(Arc::new(radio), settings);
    assert_eq!(manager.antenna(), AntennaType::OnBoard);

    let _ = std::fs::remove_file(&path);
}

#[tokio::test(start_paused = true)]
async fn clock_sync_notifications_are_forwarded() {
    let radio = home_radio();
    let manager = started_manager(&radio).await;
    let mut events = manager.subscribe();

    let at = chrono::DateTime::parse_from_rfc3339("2024-05-04T10:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    radio.announce_time(at);

    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap()
        .unwrap();
    match event {
        WirelessEvent::TimeSynchronized(when) => assert_eq!(when, at),
        other => panic!("expected TimeSynchronized, got {other:?}"),
    }
}
