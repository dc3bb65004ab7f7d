//! The register contract both bindings implement.

use crate::error::{Error, Result};

/// Largest number of words a single read may return, across all bindings.
pub const MAX_READ_REGISTERS: usize = 125;

/// Responses to earlier requests that a transaction will discard before giving up.
///
/// A request that timed out can still be answered later, ahead of the reply to the
/// next request.
pub(crate) const MAX_STALE_FRAMES: usize = 4;

/// Words returned by [`RegisterTransport::read_registers`].
pub type Registers = heapless::Vec<u16, MAX_READ_REGISTERS>;

/// A request/response channel to one hand that can read and write device registers.
///
/// Implementations provide no internal locking. One transaction is in flight at a time,
/// which `&mut self` already guarantees.
pub trait RegisterTransport {
    type IoError: embedded_io::Error;

    /// Largest `count` accepted by [`Self::read_registers`].
    const MAX_READ: u16;

    /// Write consecutive 16-bit words starting at `address`.
    fn write_registers(&mut self, address: u16, values: &[u16]) -> Result<(), Self::IoError>;

    /// Write a single byte-wide control register.
    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), Self::IoError>;

    /// Read `count` consecutive 16-bit words starting at `address`.
    fn read_registers(&mut self, address: u16, count: u16)
    -> Result<Registers, Self::IoError>;

    /// Release the underlying resource. Calling this twice is harmless.
    fn close(&mut self);

    fn is_open(&self) -> bool;
}

/// Read exactly `len` bytes into `buff`, one chunk at a time.
///
/// A timeout or would-block before the frame is complete is reported as
/// [`Error::Timeout`]; a zero-length read means the peer went away.
pub(crate) fn read_frame<S, const L: usize>(
    interface: &mut S,
    buff: &mut heapless::Vec<u8, L>,
    len: usize,
) -> Result<(), S::Error>
where
    S: embedded_io::Read,
{
    if len > L {
        return Err(Error::BufferError);
    }
    let mut temp_buf = [0u8; 32];
    while buff.len() < len {
        let want = core::cmp::min(temp_buf.len(), len - buff.len());
        match interface.read(&mut temp_buf[..want]) {
            Ok(0) => return Err(Error::Disconnected),
            Ok(bytes_read) => {
                buff.extend_from_slice(&temp_buf[..bytes_read])
                    .map_err(|_| Error::BufferError)?;
            }
            Err(e) => {
                use embedded_io::Error as _;
                if matches!(e.kind(), embedded_io::ErrorKind::Interrupted) {
                    continue;
                }
                return Err(Error::from_io(e));
            }
        }
    }
    Ok(())
}
