//! Wireless connectivity layer for the Kestrel board SDK.
//!
//! The radio itself lives on a network coprocessor; this crate owns
//! everything above it:
//!
//! - The adapter connection lifecycle: start/stop, connect with timeout and
//!   cancellation, disconnect, scan, and bounded automatic reconnection
//! - Lifecycle event broadcasting to any number of subscribers
//! - The platform configuration store (device name, default access point,
//!   reconnection policy, antenna selection)
//! - Sibling SDK contracts: pin descriptors, coprocessor telemetry, tone and
//!   LED peripherals
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use kestrel_wireless::settings::PlatformSettings;
//! use kestrel_wireless::wireless::{
//!     CancelToken, ConnectionConfig, SimulatedRadio, WirelessConnectionManager,
//! };
//!
//! # async fn example() -> kestrel_wireless::WirelessResult<()> {
//! let radio = SimulatedRadio::new();
//! let manager = WirelessConnectionManager::new(
//!     Arc::new(radio),
//!     PlatformSettings::in_memory(),
//! );
//!
//! manager.start_interface().await?;
//!
//! let params = manager
//!     .connect(ConnectionConfig::new("HomeNet", "secret123"), CancelToken::never())
//!     .await?;
//! println!("leased {}", params.address);
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Every operation returns [`WirelessResult`]. Failures of a caller-invoked
//! operation always resolve that call's `Result`; failures of autonomous
//! reconnection are surfaced through the event stream instead, since the
//! original call has already resolved.
//!
//! # Logging
//!
//! This crate logs through the [`tracing`](https://docs.rs/tracing) facade
//! and leaves the subscriber to the application. Run with
//! `RUST_LOG=kestrel_wireless=debug` under a `tracing-subscriber` `EnvFilter`
//! to see transition-level detail.

pub mod coprocessor;
pub mod error;
pub mod peripherals;
pub mod pins;
pub mod settings;
pub mod wireless;

pub use error::{WirelessError, WirelessResult};
pub use wireless::WirelessConnectionManager;
