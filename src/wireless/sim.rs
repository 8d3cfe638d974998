//! Deterministic in-process radio for development hosts and tests.
//!
//! `SimulatedRadio` implements [`RadioLink`] against a programmable network
//! table instead of coprocessor firmware: join/scan latency, credential
//! checking, join refusal, and spontaneous link drops are all injectable, so
//! the full connection lifecycle can be exercised without hardware.

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ipnet::Ipv4Net;
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::{WirelessError, WirelessResult};

use super::radio::{LinkNotification, RadioLink};
use super::types::{AntennaType, AuthenticationType, LinkParameters, NetworkDescriptor};

/// One access point in the simulated environment
#[derive(Debug, Clone)]
struct SimNetwork {
    descriptor: NetworkDescriptor,
    credential: String,
    params: LinkParameters,
}

#[derive(Debug)]
struct SimInner {
    networks: Mutex<Vec<SimNetwork>>,
    join_delay: Mutex<Duration>,
    scan_delay: Mutex<Duration>,
    refuse_joins: AtomicBool,
    join_calls: AtomicU32,
    powered: AtomicBool,
    joined: Mutex<Option<String>>,
    antenna: Mutex<AntennaType>,
    notify_tx: broadcast::Sender<LinkNotification>,
}

/// A software access-point environment behind the [`RadioLink`] boundary
#[derive(Debug, Clone)]
pub struct SimulatedRadio {
    inner: Arc<SimInner>,
}

impl Default for SimulatedRadio {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedRadio {
    pub fn new() -> Self {
        let (notify_tx, _) = broadcast::channel(16);
        Self {
            inner: Arc::new(SimInner {
                networks: Mutex::new(Vec::new()),
                join_delay: Mutex::new(Duration::from_millis(50)),
                scan_delay: Mutex::new(Duration::from_millis(50)),
                refuse_joins: AtomicBool::new(false),
                join_calls: AtomicU32::new(0),
                powered: AtomicBool::new(false),
                joined: Mutex::new(None),
                antenna: Mutex::new(AntennaType::OnBoard),
                notify_tx,
            }),
        }
    }

    /// Add an access point to the environment. Networks scan back in the
    /// order they were added.
    pub fn add_network(
        &self,
        ssid: &str,
        credential: &str,
        channel: u32,
        signal_strength: u8,
        authentication: AuthenticationType,
    ) {
        let mut networks = self.inner.networks.lock().unwrap();
        let index = networks.len() as u8;
        let bssid = format!("4E:57:0A:00:00:{index:02X}");
        // One /24 per AP keeps leases distinguishable in assertions
        let address = Ipv4Net::new(Ipv4Addr::new(10, 0, index, 42), 24).unwrap();
        networks.push(SimNetwork {
            descriptor: NetworkDescriptor {
                ssid: ssid.to_string(),
                bssid: bssid.clone(),
                channel,
                signal_strength,
                authentication,
            },
            credential: credential.to_string(),
            params: LinkParameters {
                address,
                gateway: Ipv4Addr::new(10, 0, index, 1),
                bssid,
                channel,
                authentication,
            },
        });
    }

    /// How long a join round-trip takes before it resolves
    pub fn set_join_delay(&self, delay: Duration) {
        *self.inner.join_delay.lock().unwrap() = delay;
    }

    /// How long a scan sweep takes before it resolves
    pub fn set_scan_delay(&self, delay: Duration) {
        *self.inner.scan_delay.lock().unwrap() = delay;
    }

    /// Make every subsequent join fail after its delay, as an unreachable AP
    /// would
    pub fn refuse_joins(&self, refuse: bool) {
        self.inner.refuse_joins.store(refuse, Ordering::Relaxed);
    }

    /// Total join round-trips attempted against this radio
    pub fn join_count(&self) -> u32 {
        self.inner.join_calls.load(Ordering::Relaxed)
    }

    /// SSID of the current association, if any
    pub fn joined_ssid(&self) -> Option<String> {
        self.inner.joined.lock().unwrap().clone()
    }

    pub fn is_powered(&self) -> bool {
        self.inner.powered.load(Ordering::Relaxed)
    }

    /// Drop the current association and notify subscribers, as a spontaneous
    /// link loss would
    pub fn drop_link(&self, reason: &str) {
        let had_link = self.inner.joined.lock().unwrap().take().is_some();
        if had_link {
            let _ = self.inner.notify_tx.send(LinkNotification::Dropped {
                reason: reason.to_string(),
            });
        }
    }

    /// Publish a firmware clock-sync notification
    pub fn announce_time(&self, at: DateTime<Utc>) {
        let _ = self
            .inner
            .notify_tx
            .send(LinkNotification::TimeSynchronized(at));
    }

    fn require_power(&self, operation: &'static str) -> WirelessResult<()> {
        if self.inner.powered.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(WirelessError::Hardware(format!(
                "radio is powered off, cannot {operation}"
            )))
        }
    }
}

#[async_trait]
impl RadioLink for SimulatedRadio {
    async fn power_on(&self) -> WirelessResult<()> {
        self.inner.powered.store(true, Ordering::Relaxed);
        debug!("simulated radio powered on");
        Ok(())
    }

    async fn power_off(&self) -> WirelessResult<()> {
        self.inner.powered.store(false, Ordering::Relaxed);
        self.inner.joined.lock().unwrap().take();
        debug!("simulated radio powered off");
        Ok(())
    }

    async fn join(&self, ssid: &str, credential: &str) -> WirelessResult<LinkParameters> {
        self.require_power("join")?;
        self.inner.join_calls.fetch_add(1, Ordering::Relaxed);
        let delay = *self.inner.join_delay.lock().unwrap();
        tokio::time::sleep(delay).await;

        if self.inner.refuse_joins.load(Ordering::Relaxed) {
            return Err(WirelessError::Link(format!(
                "association with '{ssid}' refused"
            )));
        }

        let network = {
            let networks = self.inner.networks.lock().unwrap();
            networks.iter().find(|n| n.descriptor.ssid == ssid).cloned()
        };
        let Some(network) = network else {
            return Err(WirelessError::Link(format!("no access point for '{ssid}'")));
        };

        let needs_credential = network.descriptor.authentication.needs_credential();
        if needs_credential && network.credential != credential {
            return Err(WirelessError::Link(format!(
                "authentication with '{ssid}' failed"
            )));
        }

        *self.inner.joined.lock().unwrap() = Some(ssid.to_string());
        debug!(ssid, "simulated join complete");
        Ok(network.params)
    }

    async fn leave(&self) -> WirelessResult<()> {
        self.inner.joined.lock().unwrap().take();
        Ok(())
    }

    async fn scan(&self) -> WirelessResult<Vec<NetworkDescriptor>> {
        self.require_power("scan")?;
        let delay = *self.inner.scan_delay.lock().unwrap();
        tokio::time::sleep(delay).await;

        let networks = self.inner.networks.lock().unwrap();
        Ok(networks.iter().map(|n| n.descriptor.clone()).collect())
    }

    async fn set_antenna(&self, antenna: AntennaType) -> WirelessResult<()> {
        *self.inner.antenna.lock().unwrap() = antenna;
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<LinkNotification> {
        self.inner.notify_tx.subscribe()
    }
}
