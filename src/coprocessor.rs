use async_trait::async_trait;

/// Readiness of the network coprocessor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoprocessorStatus {
    /// Still booting or faulted; radio requests will not be serviced
    NotReady,
    /// Accepting radio requests
    Ready,
    /// In low-power sleep; must be woken before radio requests
    Sleeping,
}

impl CoprocessorStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotReady => "Not Ready",
            Self::Ready => "Ready",
            Self::Sleeping => "Sleeping",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Status and power telemetry from the coprocessor.
///
/// The connection manager consults this before powering the interface up;
/// everything else about the coprocessor lives behind [`RadioLink`].
///
/// [`RadioLink`]: crate::wireless::RadioLink
#[async_trait]
pub trait CoprocessorMonitor: Send + Sync {
    async fn status(&self) -> CoprocessorStatus;

    /// Battery rail reading in volts
    async fn battery_voltage(&self) -> f32;
}

/// A monitor that always reports the same status. Development hosts have no
/// battery rail, so the voltage defaults to a nominal full cell.
#[derive(Debug, Clone, Copy)]
pub struct FixedCoprocessor {
    status: CoprocessorStatus,
    voltage: f32,
}

impl FixedCoprocessor {
    pub fn new(status: CoprocessorStatus) -> Self {
        Self {
            status,
            voltage: 4.2,
        }
    }

    pub fn with_voltage(mut self, voltage: f32) -> Self {
        self.voltage = voltage;
        self
    }
}

#[async_trait]
impl CoprocessorMonitor for FixedCoprocessor {
    async fn status(&self) -> CoprocessorStatus {
        self.status
    }

    async fn battery_voltage(&self) -> f32 {
        self.voltage
    }
}
