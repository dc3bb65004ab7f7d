//! This module is used to define the registers on the Inspire hands and where each
//! hardware generation places them.
//!
//! Addresses are byte addresses in the device's register space. A joint vector of
//! 16-bit words therefore occupies 12 addresses, and the word for joint `i` sits at
//! `base + 2 * i`.

use core::fmt;

use strum_macros::{Display, EnumIter, IntoStaticStr};

use crate::{error::RequestError, joint::JOINT_COUNT};

/// Hardware revision. Each generation has its own register map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
#[repr(u8)]
pub enum Generation {
    #[default]
    Gen3 = 3,
    Gen4 = 4,
}

impl TryFrom<u8> for Generation {
    type Error = RequestError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            3 => Ok(Generation::Gen3),
            4 => Ok(Generation::Gen4),
            other => Err(RequestError::UnsupportedGeneration(other)),
        }
    }
}

impl From<Generation> for u8 {
    fn from(value: Generation) -> Self {
        value as u8
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// How a register's contents are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// A single byte-wide control or configuration cell.
    Byte,
    /// A single 16-bit word.
    Word,
    /// One 16-bit word per joint.
    Joints,
    /// Bytes packed two per 16-bit word, low byte first.
    Packed { words: u16 },
    /// A contiguous block of 16-bit words.
    Block { words: u16 },
}

impl Layout {
    /// Number of 16-bit words a read of this register covers.
    pub const fn words(self) -> u16 {
        match self {
            Layout::Byte | Layout::Word => 1,
            Layout::Joints => JOINT_COUNT as u16,
            Layout::Packed { words } | Layout::Block { words } => words,
        }
    }

    /// Number of byte addresses this register occupies.
    pub const fn span(self) -> u16 {
        match self {
            Layout::Byte => 1,
            other => other.words() * 2,
        }
    }
}

/// Functional grouping used for introspection.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    SystemControl,
    ActuatorCommands,
    SensorReadings,
    ActionSequences,
    NetworkConfig,
    TouchSensors,
}

/// Every register the library knows how to use.
///
/// __R__ / __W__ marks read and write access.
#[derive(Debug, Display, EnumIter, IntoStaticStr, Clone, Copy, PartialEq, Eq, Hash)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Register {
    /// __R/W__ - Hand id used on the serial bus.
    HandId,
    /// __R/W__ - Gear reduction ratio.
    ReductionRatio,
    /// __W__ - Write `1` to clear latched actuator errors.
    ClearError,
    /// __W__ - Write `1` to persist parameters to flash.
    Save,
    /// __W__ - Write `1` to restore factory parameters.
    ResetParameters,
    /// __W__ - Write `1` to start force sensor calibration.
    ForceCalibration,
    /// __R/W__ - Per-joint current limit. Generation 3 only.
    CurrentLimit,
    /// __R/W__ - Power-on speed per joint.
    DefaultSpeed,
    /// __R/W__ - Power-on force limit per joint.
    DefaultForce,
    /// __R__ - Supply voltage. Generation 3 only.
    Voltage,
    /// __R/W__ - Commanded actuator position, 0-2000.
    PositionSet,
    /// __R/W__ - Commanded angle, 0-1000.
    AngleSet,
    /// __R/W__ - Commanded force limit, 0-1000.
    ForceSet,
    /// __R/W__ - Commanded speed, 0-1000.
    SpeedSet,
    /// __R__ - Measured actuator position.
    PositionActual,
    /// __R__ - Measured angle.
    AngleActual,
    /// __R__ - Measured force.
    ForceActual,
    /// __R__ - Measured actuator current.
    Current,
    /// __R__ - Error flags, one byte per joint.
    ErrorCode,
    /// __R__ - Actuator status, one byte per joint.
    Status,
    /// __R__ - Actuator temperature in °C, one byte per joint.
    Temperature,
    /// __R/W__ - Selected action sequence. Generation 3 only.
    ActionSequenceIndex,
    /// __W__ - Write `1` to run the selected action sequence. Generation 3 only.
    ActionSequenceRun,
    /// __R__ - IPv4 address, four bytes. Generation 4 only.
    IpAddress,
    /// __R__ - Pinky tactile block. Generation 4 only.
    PinkyTouch,
    /// __R__ - Ring finger tactile block. Generation 4 only.
    RingTouch,
    /// __R__ - Middle finger tactile block. Generation 4 only.
    MiddleTouch,
    /// __R__ - Index finger tactile block. Generation 4 only.
    IndexTouch,
    /// __R__ - Thumb tactile block. Generation 4 only.
    ThumbTouch,
    /// __R__ - Palm tactile block. Generation 4 only.
    PalmTouch,
}

/// Words in a finger tactile block: 3x3 top, 12x8 tip, 10x8 base.
pub const FINGER_TOUCH_WORDS: u16 = 9 + 96 + 80;
/// Words in the thumb tactile block: 3x3 top, 12x8 tip, 3x3 mid, 12x8 base.
pub const THUMB_TOUCH_WORDS: u16 = 9 + 96 + 9 + 96;
/// Words in the palm tactile block: 14x8.
pub const PALM_TOUCH_WORDS: u16 = 14 * 8;

impl Register {
    pub const fn layout(self) -> Layout {
        use Register as R;
        match self {
            R::HandId
            | R::ReductionRatio
            | R::ClearError
            | R::Save
            | R::ResetParameters
            | R::ForceCalibration
            | R::ActionSequenceIndex
            | R::ActionSequenceRun => Layout::Byte,
            R::Voltage => Layout::Word,
            R::CurrentLimit
            | R::DefaultSpeed
            | R::DefaultForce
            | R::PositionSet
            | R::AngleSet
            | R::ForceSet
            | R::SpeedSet
            | R::PositionActual
            | R::AngleActual
            | R::ForceActual
            | R::Current => Layout::Joints,
            R::ErrorCode | R::Status | R::Temperature => Layout::Packed { words: 3 },
            R::IpAddress => Layout::Packed { words: 2 },
            R::PinkyTouch | R::RingTouch | R::MiddleTouch | R::IndexTouch => Layout::Block {
                words: FINGER_TOUCH_WORDS,
            },
            R::ThumbTouch => Layout::Block {
                words: THUMB_TOUCH_WORDS,
            },
            R::PalmTouch => Layout::Block {
                words: PALM_TOUCH_WORDS,
            },
        }
    }

    pub const fn category(self) -> Category {
        use Register as R;
        match self {
            R::HandId
            | R::ReductionRatio
            | R::ClearError
            | R::Save
            | R::ResetParameters
            | R::ForceCalibration
            | R::CurrentLimit
            | R::DefaultSpeed
            | R::DefaultForce => Category::SystemControl,
            R::PositionSet | R::AngleSet | R::ForceSet | R::SpeedSet => {
                Category::ActuatorCommands
            }
            R::Voltage
            | R::PositionActual
            | R::AngleActual
            | R::ForceActual
            | R::Current
            | R::ErrorCode
            | R::Status
            | R::Temperature => Category::SensorReadings,
            R::ActionSequenceIndex | R::ActionSequenceRun => Category::ActionSequences,
            R::IpAddress => Category::NetworkConfig,
            R::PinkyTouch
            | R::RingTouch
            | R::MiddleTouch
            | R::IndexTouch
            | R::ThumbTouch
            | R::PalmTouch => Category::TouchSensors,
        }
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// The register layout of one hardware generation.
#[derive(Debug)]
pub struct RegisterMap {
    generation: Generation,
    entries: &'static [(Register, u16)],
}

static GEN3: RegisterMap = RegisterMap {
    generation: Generation::Gen3,
    entries: &[
        (Register::HandId, 1000),
        (Register::ReductionRatio, 1001),
        (Register::ClearError, 1004),
        (Register::Save, 1005),
        (Register::ResetParameters, 1006),
        (Register::ForceCalibration, 1009),
        (Register::CurrentLimit, 1020),
        (Register::DefaultSpeed, 1032),
        (Register::DefaultForce, 1044),
        (Register::Voltage, 1472),
        (Register::PositionSet, 1474),
        (Register::AngleSet, 1486),
        (Register::ForceSet, 1498),
        (Register::SpeedSet, 1522),
        (Register::PositionActual, 1534),
        (Register::AngleActual, 1546),
        (Register::ForceActual, 1582),
        (Register::Current, 1594),
        (Register::ErrorCode, 1606),
        (Register::Status, 1612),
        (Register::Temperature, 1618),
        (Register::ActionSequenceIndex, 2320),
        (Register::ActionSequenceRun, 2322),
    ],
};

static GEN4: RegisterMap = RegisterMap {
    generation: Generation::Gen4,
    entries: &[
        (Register::HandId, 1000),
        (Register::ReductionRatio, 1001),
        (Register::ClearError, 1004),
        (Register::Save, 1005),
        (Register::ResetParameters, 1006),
        (Register::ForceCalibration, 1009),
        (Register::DefaultSpeed, 1032),
        (Register::DefaultForce, 1044),
        (Register::PositionSet, 1474),
        (Register::AngleSet, 1486),
        (Register::ForceSet, 1498),
        (Register::SpeedSet, 1522),
        (Register::PositionActual, 1534),
        (Register::AngleActual, 1546),
        (Register::ForceActual, 1582),
        (Register::Current, 1594),
        (Register::ErrorCode, 1606),
        (Register::Status, 1612),
        (Register::Temperature, 1618),
        (Register::IpAddress, 1700),
        (Register::PinkyTouch, 3000),
        (Register::RingTouch, 3370),
        (Register::MiddleTouch, 3740),
        (Register::IndexTouch, 4110),
        (Register::ThumbTouch, 4480),
        (Register::PalmTouch, 4900),
    ],
};

impl RegisterMap {
    pub fn for_generation(generation: Generation) -> &'static RegisterMap {
        match generation {
            Generation::Gen3 => &GEN3,
            Generation::Gen4 => &GEN4,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Base address of `register`, if this generation has it.
    pub fn get(&self, register: Register) -> Option<u16> {
        self.entries
            .iter()
            .find(|(r, _)| *r == register)
            .map(|(_, address)| *address)
    }

    /// Base address of `register`, or an error naming the generation.
    pub fn address(&self, register: Register) -> Result<u16, RequestError> {
        self.get(register).ok_or(RequestError::Unmapped {
            register,
            generation: self.generation,
        })
    }

    /// Address of element `index` of `register`, scaled by the element width.
    pub fn element_address(&self, register: Register, index: usize) -> Result<u16, RequestError> {
        let base = self.address(register)?;
        let width = match register.layout() {
            Layout::Byte => 1,
            _ => 2,
        };
        Ok(base + (index as u16) * width)
    }

    pub fn entries(&self) -> impl Iterator<Item = (Register, u16)> + '_ {
        self.entries.iter().copied()
    }
}

/// Describes one register of a generation's map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterInfo {
    pub register: Register,
    pub address: u16,
    pub layout: Layout,
    pub category: Category,
}

impl RegisterMap {
    pub fn info(&self) -> impl Iterator<Item = RegisterInfo> + '_ {
        self.entries().map(|(register, address)| RegisterInfo {
            register,
            address,
            layout: register.layout(),
            category: register.category(),
        })
    }
}
