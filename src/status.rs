//! Decoding of the byte-per-joint fields: error flags, actuator status and temperature.

use modular_bitfield::prelude::*;
use strum_macros::{Display, EnumIter};

use crate::joint::{JOINT_COUNT, Joints};

/// The three words behind a byte-per-joint register, as read from the hand.
///
/// Each word carries two joints, the lower-numbered joint in the low byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PackedTriple(pub [u16; 3]);

impl PackedTriple {
    /// Split into one byte per joint.
    pub fn unpack(self) -> Joints<u8> {
        let mut out = [0u8; JOINT_COUNT];
        for (i, word) in self.0.iter().enumerate() {
            let [low, high] = word.to_le_bytes();
            out[2 * i] = low;
            out[2 * i + 1] = high;
        }
        Joints(out)
    }

    /// Inverse of [`Self::unpack`].
    pub fn pack(bytes: Joints<u8>) -> Self {
        let b = bytes.0;
        Self([
            u16::from_le_bytes([b[0], b[1]]),
            u16::from_le_bytes([b[2], b[3]]),
            u16::from_le_bytes([b[4], b[5]]),
        ])
    }
}

/// Error flags latched by one actuator. Cleared with `reset_error`.
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorFlags {
    /// Locked rotor.
    pub stalled: bool,
    pub over_temperature: bool,
    pub over_current: bool,
    /// Motor driver fault.
    pub motor_fault: bool,
    pub communication_fault: bool,
    #[skip]
    __: B3,
}

impl ErrorFlags {
    pub fn from_byte(value: u8) -> Self {
        Self::from_bytes([value])
    }

    pub fn is_clear(&self) -> bool {
        self.into_bytes()[0] & 0x1F == 0
    }
}

/// What one actuator is doing, as reported by the status register.
#[derive(Debug, Display, EnumIter, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ActuatorStatus {
    /// 0: Opening.
    Releasing,
    /// 1: Closing.
    Grasping,
    /// 2: Stopped at the commanded position.
    PositionReached,
    /// 3: Stopped at the commanded force.
    ForceReached,
    /// 5: Stopped by current protection.
    CurrentProtection,
    /// 6: Stopped on a locked rotor.
    Stalled,
    /// 7: Stopped on an actuator fault.
    Fault,
    /// Any other code.
    Unknown(u8),
}

impl From<u8> for ActuatorStatus {
    fn from(value: u8) -> Self {
        use ActuatorStatus as AS;
        match value {
            0 => AS::Releasing,
            1 => AS::Grasping,
            2 => AS::PositionReached,
            3 => AS::ForceReached,
            5 => AS::CurrentProtection,
            6 => AS::Stalled,
            7 => AS::Fault,
            other => AS::Unknown(other),
        }
    }
}

impl From<ActuatorStatus> for u8 {
    fn from(value: ActuatorStatus) -> Self {
        use ActuatorStatus as AS;
        match value {
            AS::Releasing => 0,
            AS::Grasping => 1,
            AS::PositionReached => 2,
            AS::ForceReached => 3,
            AS::CurrentProtection => 5,
            AS::Stalled => 6,
            AS::Fault => 7,
            AS::Unknown(other) => other,
        }
    }
}

impl ActuatorStatus {
    /// Whether the actuator has stopped for a reason other than reaching its target.
    pub fn is_fault(self) -> bool {
        matches!(
            self,
            ActuatorStatus::CurrentProtection | ActuatorStatus::Stalled | ActuatorStatus::Fault
        )
    }
}
