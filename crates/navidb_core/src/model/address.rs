//! Unsigned 64-bit memory address value.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Address inside a module's memory image.
///
/// Covers the full unsigned 64-bit domain.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Address(u64);

impl Address {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn to_u64(self) -> u64 {
        self.0
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Address;

    #[test]
    fn hex_rendering_pads_small_values() {
        assert_eq!(Address::new(0x1000).to_string(), "00001000");
        assert_eq!(Address::new(u64::MAX).to_string(), "FFFFFFFFFFFFFFFF");
    }
}
