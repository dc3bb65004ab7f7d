//! Joint ordering, joint vectors and the per-quantity value domains.

use core::ops::{Index, IndexMut};

use strum_macros::{Display, EnumIter};

use crate::{error::RequestError, register::Register};

/// Number of actuated joints on the hand.
pub const JOINT_COUNT: usize = 6;

/// The six actuated degrees of freedom, in register order.
#[derive(Debug, Display, EnumIter, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum Joint {
    Pinky = 0,
    Ring = 1,
    Middle = 2,
    Index = 3,
    ThumbFlex = 4,
    ThumbExtend = 5,
}

impl Joint {
    /// All joints in register order.
    pub const ALL: [Joint; JOINT_COUNT] = [
        Joint::Pinky,
        Joint::Ring,
        Joint::Middle,
        Joint::Index,
        Joint::ThumbFlex,
        Joint::ThumbExtend,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// One value per joint, indexable by [`Joint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Joints<T>(pub [T; JOINT_COUNT]);

impl<T> Joints<T> {
    pub fn iter(&self) -> impl Iterator<Item = (Joint, &T)> {
        Joint::ALL.into_iter().zip(self.0.iter())
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Joints<U> {
        Joints(self.0.map(f))
    }

    pub fn into_array(self) -> [T; JOINT_COUNT] {
        self.0
    }
}

impl<T> From<[T; JOINT_COUNT]> for Joints<T> {
    fn from(value: [T; JOINT_COUNT]) -> Self {
        Self(value)
    }
}

impl<T> Index<Joint> for Joints<T> {
    type Output = T;

    fn index(&self, joint: Joint) -> &T {
        &self.0[joint.index()]
    }
}

impl<T> IndexMut<Joint> for Joints<T> {
    fn index_mut(&mut self, joint: Joint) -> &mut T {
        &mut self.0[joint.index()]
    }
}

/// A single commanded channel. [`JointValue::Keep`] leaves the channel untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JointValue {
    #[default]
    Keep,
    Set(i32),
}

impl JointValue {
    /// The legacy integer spelling of [`JointValue::Keep`].
    pub const SENTINEL: i32 = -1;

    pub fn is_keep(&self) -> bool {
        matches!(self, JointValue::Keep)
    }
}

impl From<i32> for JointValue {
    fn from(value: i32) -> Self {
        if value == Self::SENTINEL {
            JointValue::Keep
        } else {
            JointValue::Set(value)
        }
    }
}

impl From<u16> for JointValue {
    fn from(value: u16) -> Self {
        JointValue::Set(value as i32)
    }
}

impl From<Option<u16>> for JointValue {
    fn from(value: Option<u16>) -> Self {
        value.map_or(JointValue::Keep, JointValue::from)
    }
}

/// A commanded vector. Build one from `[i32; 6]` (where `-1` means keep), `[u16; 6]`,
/// `[Option<u16>; 6]` or a slice via `TryFrom`.
pub type JointVector = Joints<JointValue>;

impl JointVector {
    /// A vector that changes nothing.
    pub const KEEP_ALL: JointVector = Joints([JointValue::Keep; JOINT_COUNT]);

    /// Same value on every joint.
    pub fn splat(value: u16) -> Self {
        Joints([JointValue::from(value); JOINT_COUNT])
    }

    /// Number of channels that will actually be written.
    pub fn set_count(&self) -> usize {
        self.0.iter().filter(|v| !v.is_keep()).count()
    }
}

impl From<[i32; JOINT_COUNT]> for JointVector {
    fn from(value: [i32; JOINT_COUNT]) -> Self {
        Joints(value.map(JointValue::from))
    }
}

impl From<[u16; JOINT_COUNT]> for JointVector {
    fn from(value: [u16; JOINT_COUNT]) -> Self {
        Joints(value.map(JointValue::from))
    }
}

impl From<[Option<u16>; JOINT_COUNT]> for JointVector {
    fn from(value: [Option<u16>; JOINT_COUNT]) -> Self {
        Joints(value.map(JointValue::from))
    }
}

impl From<Joints<u16>> for JointVector {
    fn from(value: Joints<u16>) -> Self {
        value.0.into()
    }
}

impl TryFrom<&[i32]> for JointVector {
    type Error = RequestError;

    fn try_from(value: &[i32]) -> Result<Self, Self::Error> {
        let array: [i32; JOINT_COUNT] = value
            .try_into()
            .map_err(|_| RequestError::WrongLength(value.len()))?;
        Ok(array.into())
    }
}

/// The settable per-joint quantities.
#[derive(Debug, Display, EnumIter, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum JointKind {
    /// Normalised joint angle, 0 closed to 1000 open.
    Angle,
    /// Raw actuator position.
    Position,
    /// Grip force limit.
    Force,
    /// Motion speed.
    Speed,
}

impl JointKind {
    /// Inclusive value domain for this quantity.
    pub const fn domain(self) -> (u16, u16) {
        match self {
            JointKind::Position => (0, 2000),
            JointKind::Angle | JointKind::Force | JointKind::Speed => (0, 1000),
        }
    }

    /// Register holding the commanded value.
    pub const fn setpoint_register(self) -> Register {
        match self {
            JointKind::Angle => Register::AngleSet,
            JointKind::Position => Register::PositionSet,
            JointKind::Force => Register::ForceSet,
            JointKind::Speed => Register::SpeedSet,
        }
    }

    /// Validate every channel of `values`, returning the raw words to write.
    ///
    /// Either every set channel is in range or nothing is returned.
    pub fn validate(self, values: &JointVector) -> Result<[Option<u16>; JOINT_COUNT], RequestError> {
        let (min, max) = self.domain();
        let mut out = [None; JOINT_COUNT];
        for (joint, value) in values.iter() {
            if let JointValue::Set(raw) = *value {
                if raw < min as i32 || raw > max as i32 {
                    return Err(RequestError::OutOfRange {
                        kind: self,
                        joint,
                        value: raw,
                        min,
                        max,
                    });
                }
                out[joint.index()] = Some(raw as u16);
            }
        }
        Ok(out)
    }
}
