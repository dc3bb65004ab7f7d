//! Tactile sensor frames from generation 4 hands.
//!
//! Each finger reports a block of 16-bit pressure words. The block is split into
//! row-major grids here, with the orientation fixes the hand needs.

use crate::register::{FINGER_TOUCH_WORDS, PALM_TOUCH_WORDS, THUMB_TOUCH_WORDS};

/// Largest tactile block, in words.
pub const MAX_BLOCK_WORDS: usize = THUMB_TOUCH_WORDS as usize;

/// Words of one tactile block.
pub type Block = heapless::Vec<u16, MAX_BLOCK_WORDS>;

pub type Grid<const R: usize, const C: usize> = [[u16; C]; R];

fn grid<const R: usize, const C: usize>(data: &[u16]) -> Grid<R, C> {
    core::array::from_fn(|r| core::array::from_fn(|c| data[r * C + c]))
}

fn grid_peak<const R: usize, const C: usize>(grid: &Grid<R, C>) -> u16 {
    grid.iter().flatten().copied().max().unwrap_or(0)
}

/// Pinky, ring, middle or index finger.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FingerTactile {
    pub top: Grid<3, 3>,
    pub tip: Grid<12, 8>,
    pub base: Grid<10, 8>,
}

impl FingerTactile {
    /// Split a finger block. Returns `None` if `data` is shorter than a block.
    pub fn parse(data: &[u16]) -> Option<Self> {
        if data.len() < FINGER_TOUCH_WORDS as usize {
            return None;
        }
        Some(Self {
            top: grid(&data[0..9]),
            tip: grid(&data[9..105]),
            base: grid(&data[105..185]),
        })
    }

    pub fn peak(&self) -> u16 {
        grid_peak(&self.top)
            .max(grid_peak(&self.tip))
            .max(grid_peak(&self.base))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ThumbTactile {
    pub top: Grid<3, 3>,
    pub tip: Grid<12, 8>,
    pub mid: Grid<3, 3>,
    pub base: Grid<12, 8>,
}

impl ThumbTactile {
    /// Split the thumb block. The base pad is mounted upside down and is rotated by
    /// 180° to match the other pads.
    pub fn parse(data: &[u16]) -> Option<Self> {
        if data.len() < THUMB_TOUCH_WORDS as usize {
            return None;
        }
        let raw_base: Grid<12, 8> = grid(&data[114..210]);
        Some(Self {
            top: grid(&data[0..9]),
            tip: grid(&data[9..105]),
            mid: grid(&data[105..114]),
            base: core::array::from_fn(|r| core::array::from_fn(|c| raw_base[11 - r][7 - c])),
        })
    }

    pub fn peak(&self) -> u16 {
        grid_peak(&self.top)
            .max(grid_peak(&self.tip))
            .max(grid_peak(&self.mid))
            .max(grid_peak(&self.base))
    }
}

/// Palm pad, 8 rows of 14.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PalmTactile(pub Grid<8, 14>);

impl PalmTactile {
    /// The hand reports the palm column by column; transpose it into rows.
    pub fn parse(data: &[u16]) -> Option<Self> {
        if data.len() < PALM_TOUCH_WORDS as usize {
            return None;
        }
        Some(Self(core::array::from_fn(|r| {
            core::array::from_fn(|c| data[c * 8 + r])
        })))
    }

    pub fn peak(&self) -> u16 {
        grid_peak(&self.0)
    }
}

/// One reading of every tactile pad on the hand.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TactileFrame {
    pub pinky: FingerTactile,
    pub ring: FingerTactile,
    pub middle: FingerTactile,
    pub index: FingerTactile,
    pub thumb: ThumbTactile,
    pub palm: PalmTactile,
}

impl TactileFrame {
    /// Highest reading across all pads.
    pub fn peak(&self) -> u16 {
        [
            self.pinky.peak(),
            self.ring.peak(),
            self.middle.peak(),
            self.index.peak(),
            self.thumb.peak(),
            self.palm.peak(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}
