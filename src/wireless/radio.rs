use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use crate::error::WirelessResult;

use super::types::{AntennaType, LinkParameters, NetworkDescriptor};

/// Unsolicited notifications from the radio firmware
#[derive(Debug, Clone)]
pub enum LinkNotification {
    /// The association dropped without a local request
    Dropped { reason: String },
    /// The firmware synchronized the wall clock over the network
    TimeSynchronized(DateTime<Utc>),
}

/// Boundary to the coprocessor radio.
///
/// Every method is one firmware round-trip; implementations must not block.
/// The manager owns all sequencing; an implementation only has to execute
/// the request it is handed and report what the firmware said.
#[async_trait]
pub trait RadioLink: Send + Sync {
    /// Power the radio interface up
    async fn power_on(&self) -> WirelessResult<()>;

    /// Power the radio interface down
    async fn power_off(&self) -> WirelessResult<()>;

    /// Associate with an access point and negotiate network parameters.
    /// Resolves when DHCP completes or the firmware refuses the join.
    async fn join(&self, ssid: &str, credential: &str) -> WirelessResult<LinkParameters>;

    /// Tear down the current association
    async fn leave(&self) -> WirelessResult<()>;

    /// Survey visible networks. Resolves when the sweep completes; order is
    /// discovery order.
    async fn scan(&self) -> WirelessResult<Vec<NetworkDescriptor>>;

    /// Route the RF front end to the given antenna
    async fn set_antenna(&self, antenna: AntennaType) -> WirelessResult<()>;

    /// Subscribe to unsolicited firmware notifications
    fn subscribe(&self) -> broadcast::Receiver<LinkNotification>;
}
