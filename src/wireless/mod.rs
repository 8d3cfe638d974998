pub mod cancel;
pub mod events;
pub mod manager;
pub mod radio;
pub mod sim;
pub mod types;

pub use cancel::{CancelSource, CancelToken};
pub use events::{ConnectionDetail, DisconnectReason, WirelessEvent};
pub use manager::WirelessConnectionManager;
pub use radio::{LinkNotification, RadioLink};
pub use sim::SimulatedRadio;
pub use types::*;
