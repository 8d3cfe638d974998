use std::fmt;

/// Set of channel kinds a pin can be multiplexed to.
///
/// A pin is polymorphic over its capability set, so the set is a bitmask
/// rather than a type hierarchy: board definitions build descriptors with
/// `DIGITAL | PWM`, and ownership arbitration queries them with
/// [`supports`](ChannelCapabilities::supports).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChannelCapabilities(u16);

impl ChannelCapabilities {
    pub const NONE: Self = Self(0);
    pub const DIGITAL: Self = Self(1 << 0);
    pub const ANALOG: Self = Self(1 << 1);
    pub const PWM: Self = Self(1 << 2);
    pub const I2C: Self = Self(1 << 3);
    pub const SPI: Self = Self(1 << 4);
    pub const UART: Self = Self(1 << 5);
    pub const CAN: Self = Self(1 << 6);

    const LABELS: [(Self, &'static str); 7] = [
        (Self::DIGITAL, "digital"),
        (Self::ANALOG, "analog"),
        (Self::PWM, "pwm"),
        (Self::I2C, "i2c"),
        (Self::SPI, "spi"),
        (Self::UART, "uart"),
        (Self::CAN, "can"),
    ];

    /// True when every capability in `other` is present in `self`
    pub fn supports(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Capability names present in this set, in declaration order
    pub fn names(&self) -> Vec<&'static str> {
        Self::LABELS
            .iter()
            .filter(|(cap, _)| self.supports(*cap))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl std::ops::BitOr for ChannelCapabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for ChannelCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names().join("|"))
    }
}

/// A pin on the board definition.
///
/// `key` is the stable identity used for equality; `name` is the silkscreen
/// label used for lookup by humans.
#[derive(Debug, Clone)]
pub struct PinDescriptor {
    pub name: &'static str,
    pub key: &'static str,
    pub capabilities: ChannelCapabilities,
}

impl PartialEq for PinDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for PinDescriptor {}

impl PinDescriptor {
    pub const fn new(
        name: &'static str,
        key: &'static str,
        capabilities: ChannelCapabilities,
    ) -> Self {
        Self {
            name,
            key,
            capabilities,
        }
    }
}

/// Look a pin up by its silkscreen name
pub fn find_pin<'a>(pins: &'a [PinDescriptor], name: &str) -> Option<&'a PinDescriptor> {
    pins.iter().find(|p| p.name == name)
}
