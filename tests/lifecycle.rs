mod common;

use std::sync::Arc;
use std::time::Duration;

use kestrel_wireless::coprocessor::{CoprocessorStatus, FixedCoprocessor};
use kestrel_wireless::settings::{PlatformSettings, SettingKey, SettingValue};
use kestrel_wireless::wireless::{
    AdapterState, CancelToken, DisconnectReason, Disconnection, WirelessConnectionManager,
    WirelessEvent,
};
use kestrel_wireless::WirelessError;

use common::{home_radio, manager_over, started_manager};

#[tokio::test(start_paused = true)]
async fn start_and_stop_cycle() {
    let radio = home_radio();
    let manager = manager_over(&radio);
    assert_eq!(manager.state(), AdapterState::Stopped);

    manager.start_interface().await.unwrap();
    assert_eq!(manager.state(), AdapterState::Started);
    assert!(radio.is_powered());

    manager.stop_interface().await.unwrap();
    assert_eq!(manager.state(), AdapterState::Stopped);
    assert!(!radio.is_powered());
}

#[tokio::test(start_paused = true)]
async fn start_twice_is_invalid_state() {
    let radio = home_radio();
    let manager = started_manager(&radio).await;

    let err = manager.start_interface().await.unwrap_err();
    assert!(matches!(err, WirelessError::InvalidState { .. }));
    assert_eq!(manager.state(), AdapterState::Started);
}

#[tokio::test(start_paused = true)]
async fn stop_while_stopped_is_reported() {
    let radio = home_radio();
    let manager = manager_over(&radio);

    let err = manager.stop_interface().await.unwrap_err();
    assert!(matches!(
        err,
        WirelessError::InvalidState {
            state: AdapterState::Stopped,
            ..
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn start_requires_ready_coprocessor() {
    let radio = home_radio();
    let manager = WirelessConnectionManager::with_coprocessor(
        Arc::new(radio.clone()),
        PlatformSettings::in_memory(),
        Arc::new(FixedCoprocessor::new(CoprocessorStatus::NotReady)),
    );

    let err = manager.start_interface().await.unwrap_err();
    assert!(matches!(err, WirelessError::Hardware(_)));
    // Rolled back, not stuck in Starting
    assert_eq!(manager.state(), AdapterState::Stopped);
    assert!(!radio.is_powered());
}

#[tokio::test(start_paused = true)]
async fn auto_start_joins_stored_network() {
    let radio = home_radio();
    let mut settings = PlatformSettings::in_memory();
    settings.set_default_access_point("HomeNet", "secret123");
    settings
        .set(
            SettingKey::AutomaticallyStartNetwork,
            SettingValue::Flag(true),
        )
        .unwrap();

    let manager = WirelessConnectionManager::new(Arc::new(radio.clone()), settings);
    manager.start_interface().await.unwrap();

    assert_eq!(manager.state(), AdapterState::Connected);
    assert_eq!(radio.joined_ssid(), Some("HomeNet".into()));
}

#[tokio::test(start_paused = true)]
async fn auto_start_join_failure_leaves_interface_started() {
    let radio = home_radio();
    radio.refuse_joins(true);
    let mut settings = PlatformSettings::in_memory();
    settings.set_default_access_point("HomeNet", "secret123");
    settings
        .set(
            SettingKey::AutomaticallyStartNetwork,
            SettingValue::Flag(true),
        )
        .unwrap();

    let manager = WirelessConnectionManager::new(Arc::new(radio), settings);
    // The start itself succeeds; only the chained join failed
    manager.start_interface().await.unwrap();
    assert_eq!(manager.state(), AdapterState::Started);
}

#[tokio::test(start_paused = true)]
async fn disconnect_when_not_connected_is_benign() {
    let radio = home_radio();
    let manager = started_manager(&radio).await;

    let outcome = manager.disconnect(false).await.unwrap();
    assert_eq!(outcome, Disconnection::NotConnected);
    assert_eq!(manager.state(), AdapterState::Started);
}

#[tokio::test(start_paused = true)]
async fn disconnect_can_chain_into_stop() {
    let radio = home_radio();
    let manager = started_manager(&radio).await;
    manager
        .connect(
            kestrel_wireless::wireless::ConnectionConfig::new("HomeNet", "secret123"),
            CancelToken::never(),
        )
        .await
        .unwrap();

    let outcome = manager.disconnect(true).await.unwrap();
    assert_eq!(outcome, Disconnection::Disconnected);
    assert_eq!(manager.state(), AdapterState::Stopped);
    assert!(!radio.is_powered());
}

#[tokio::test(start_paused = true)]
async fn events_arrive_in_transition_order() {
    let radio = home_radio();
    let manager = manager_over(&radio);
    let mut events = manager.subscribe();

    manager.start_interface().await.unwrap();
    manager
        .connect(
            kestrel_wireless::wireless::ConnectionConfig::new("HomeNet", "secret123"),
            CancelToken::never(),
        )
        .await
        .unwrap();
    manager.disconnect(false).await.unwrap();
    manager.stop_interface().await.unwrap();

    assert!(matches!(
        events.try_recv().unwrap(),
        WirelessEvent::InterfaceStarted
    ));
    match events.try_recv().unwrap() {
        WirelessEvent::Connected(detail) => {
            assert_eq!(detail.ssid, "HomeNet");
            assert_eq!(detail.channel, 6);
        }
        other => panic!("expected Connected, got {other:?}"),
    }
    assert!(matches!(
        events.try_recv().unwrap(),
        WirelessEvent::Disconnected {
            reason: DisconnectReason::Requested
        }
    ));
    assert!(matches!(
        events.try_recv().unwrap(),
        WirelessEvent::InterfaceStopped
    ));
    assert!(events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn stop_is_rejected_while_connect_in_flight() {
    let radio = home_radio();
    radio.set_join_delay(Duration::from_secs(5));
    let manager = started_manager(&radio).await;

    let connecting = manager.clone();
    let pending = tokio::spawn(async move {
        connecting
            .connect(
                kestrel_wireless::wireless::ConnectionConfig::new("HomeNet", "secret123"),
                CancelToken::never(),
            )
            .await
    });
    // Let the attempt reach the radio
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(manager.state(), AdapterState::Connecting);

    let err = manager.stop_interface().await.unwrap_err();
    assert!(matches!(err, WirelessError::Busy { .. }));

    // The in-flight attempt is unaffected by the rejected stop
    let params = pending.await.unwrap().unwrap();
    assert_eq!(manager.state(), AdapterState::Connected);
    assert_eq!(params.channel, 6);
}
