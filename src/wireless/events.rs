use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use ipnet::Ipv4Net;

use super::types::{AuthenticationType, LinkParameters};

/// Capacity of the lifecycle broadcast channel. Subscribers that fall this
/// far behind observe a `Lagged` gap rather than blocking the manager.
pub(crate) const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Negotiated parameters published with a connected notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDetail {
    pub ssid: String,
    pub bssid: String,
    pub address: Ipv4Net,
    pub gateway: Ipv4Addr,
    pub channel: u32,
    pub authentication: AuthenticationType,
    /// When the association completed
    pub at: DateTime<Utc>,
}

impl ConnectionDetail {
    pub(crate) fn from_link(ssid: &str, params: &LinkParameters) -> Self {
        Self {
            ssid: ssid.to_string(),
            bssid: params.bssid.clone(),
            address: params.address,
            gateway: params.gateway,
            channel: params.channel,
            authentication: params.authentication,
            at: Utc::now(),
        }
    }
}

/// Why an association ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The caller asked for it
    Requested,
    /// The link dropped underneath us
    LinkLost,
    /// The link dropped and the automatic retry budget ran out
    RetriesExhausted,
}

/// Lifecycle notifications from the connection manager.
///
/// Delivered to every subscriber in the order the underlying transitions
/// occur.
#[derive(Debug, Clone)]
pub enum WirelessEvent {
    /// The interface finished powering up
    InterfaceStarted,
    /// The interface powered down
    InterfaceStopped,
    /// An association completed, with its negotiated parameters
    Connected(ConnectionDetail),
    /// An association ended
    Disconnected { reason: DisconnectReason },
    /// The coprocessor synchronized the wall clock over the network
    TimeSynchronized(DateTime<Utc>),
}
