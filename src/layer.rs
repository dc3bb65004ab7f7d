//! Turns semantic requests into register transactions.
//!
//! Everything here is pure: requests are validated and resolved against the session's
//! [`RegisterMap`] before a single byte reaches the transport.

use crate::{
    error::RequestError,
    joint::{JOINT_COUNT, JointKind, JointVector},
    register::{Layout, Register, RegisterMap},
};

/// A validated joint vector write, ready to be issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JointWrite {
    register: Register,
    addresses: [u16; JOINT_COUNT],
    words: [u16; JOINT_COUNT],
    mask: [bool; JOINT_COUNT],
}

impl JointWrite {
    pub fn register(&self) -> Register {
        self.register
    }

    /// Contiguous runs of channels to write, as `(address, words)`.
    pub fn runs(&self) -> Runs<'_> {
        Runs {
            plan: self,
            next: 0,
        }
    }

    /// Number of registers the plan writes.
    pub fn word_count(&self) -> usize {
        self.mask.iter().filter(|set| **set).count()
    }
}

/// Iterator over the bulk writes of a [`JointWrite`].
pub struct Runs<'a> {
    plan: &'a JointWrite,
    next: usize,
}

impl<'a> Iterator for Runs<'a> {
    type Item = (u16, &'a [u16]);

    fn next(&mut self) -> Option<Self::Item> {
        let mask = &self.plan.mask;
        let start = (self.next..JOINT_COUNT).find(|i| mask[*i])?;
        let end = (start..JOINT_COUNT)
            .find(|i| !mask[*i])
            .unwrap_or(JOINT_COUNT);
        self.next = end;
        Some((self.plan.addresses[start], &self.plan.words[start..end]))
    }
}

/// Validate `values` against `kind`'s domain and resolve its setpoint register.
pub fn plan_joint_write(
    map: &RegisterMap,
    kind: JointKind,
    values: &JointVector,
) -> Result<JointWrite, RequestError> {
    let register = kind.setpoint_register();
    map.address(register)?;
    let raw = kind.validate(values)?;

    let mut addresses = [0u16; JOINT_COUNT];
    for (i, address) in addresses.iter_mut().enumerate() {
        *address = map.element_address(register, i)?;
    }
    let mut words = [0u16; JOINT_COUNT];
    let mut mask = [false; JOINT_COUNT];
    for (i, value) in raw.iter().enumerate() {
        if let Some(word) = value {
            words[i] = *word;
            mask[i] = true;
        }
    }
    Ok(JointWrite {
        register,
        addresses,
        words,
        mask,
    })
}

/// Address of a register read as six joint words.
pub fn joint_read(map: &RegisterMap, register: Register) -> Result<u16, RequestError> {
    match register.layout() {
        Layout::Joints => map.address(register),
        _ => Err(RequestError::LayoutMismatch(register)),
    }
}

/// Address and word count of a packed byte register holding `bytes` values.
pub fn packed_read(
    map: &RegisterMap,
    register: Register,
    bytes: usize,
) -> Result<(u16, u16), RequestError> {
    match register.layout() {
        Layout::Packed { words } if words as usize * 2 == bytes => {
            Ok((map.address(register)?, words))
        }
        _ => Err(RequestError::LayoutMismatch(register)),
    }
}

/// Address of a byte-wide command or configuration register.
pub fn byte_register(map: &RegisterMap, register: Register) -> Result<u16, RequestError> {
    match register.layout() {
        Layout::Byte => map.address(register),
        _ => Err(RequestError::LayoutMismatch(register)),
    }
}

/// Address and word count of a block register.
pub fn block_read(map: &RegisterMap, register: Register) -> Result<(u16, u16), RequestError> {
    match register.layout() {
        Layout::Block { words } => Ok((map.address(register)?, words)),
        _ => Err(RequestError::LayoutMismatch(register)),
    }
}
