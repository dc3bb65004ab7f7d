//! The vendor's byte-framed serial protocol.
//!
//! Every request is `EB 90 | id | len | cmd | addr_lo addr_hi | payload | checksum` and
//! every response is the same shape with the header bytes swapped. The checksum is the
//! low byte of the sum of everything after the header.

use tracing::{trace, warn};

use crate::{
    error::{Error, RequestError, Result},
    transport::{MAX_READ_REGISTERS, MAX_STALE_FRAMES, RegisterTransport, Registers, read_frame},
};

const REQUEST_HEADER: [u8; 2] = [0xEB, 0x90];
const RESPONSE_HEADER: [u8; 2] = [0x90, 0xEB];
const CMD_READ: u8 = 0x11;
const CMD_WRITE: u8 = 0x12;
/// Status byte of a successful write acknowledgement.
const WRITE_ACCEPTED: u8 = 0x01;
/// Header, id, len, cmd and two address bytes.
const FRAME_OVERHEAD: usize = 7;
/// Bytes of payload the one-byte length field can describe.
const MAX_PAYLOAD: usize = 0xFF - 3;

/// Checksum over a frame without its header and checksum byte.
fn checksum(body: &[u8]) -> u8 {
    body.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Read the next response frame, dropping any bytes ahead of its header.
fn read_response<S: embedded_io::Read, const L: usize>(
    interface: &mut S,
) -> Result<heapless::Vec<u8, L>, S::Error> {
    let mut byte: heapless::Vec<u8, 1> = heapless::Vec::new();
    let mut window = [0u8; 2];
    let mut seen = 0usize;
    while window != RESPONSE_HEADER {
        if seen >= L {
            warn!(seen, "no serial response header found");
            return Err(Error::InvalidResponse);
        }
        byte.clear();
        read_frame(interface, &mut byte, 1)?;
        window = [window[1], byte[0]];
        seen += 1;
    }
    if seen > RESPONSE_HEADER.len() {
        warn!(skipped = seen - RESPONSE_HEADER.len(), "skipped bytes before serial response");
    }

    let mut response: heapless::Vec<u8, L> = heapless::Vec::new();
    response
        .extend_from_slice(&RESPONSE_HEADER)
        .map_err(|_| Error::BufferError)?;
    read_frame(interface, &mut response, 4)?;
    let len = response[3] as usize;
    if len < 3 {
        warn!(len, "serial response too short for its header");
        return Err(Error::InvalidResponse);
    }
    // Header, id and len, then `len` bytes and the checksum.
    read_frame(interface, &mut response, len + 5)?;
    Ok(response)
}

/// Serial binding over any [`embedded_io`] byte stream.
pub struct SerialTransport<S: embedded_io::Read + embedded_io::Write, const L: usize = 264> {
    interface: Option<S>,
    hand_id: u8,
}

impl<S: embedded_io::Read + embedded_io::Write, const L: usize> SerialTransport<S, L> {
    /// Create a binding talking to hand `hand_id` (1-254).
    pub fn new(interface: S, hand_id: u8) -> core::result::Result<Self, RequestError> {
        if hand_id == 0 || hand_id == 0xFF {
            return Err(RequestError::InvalidHandId(hand_id));
        }
        Ok(Self {
            interface: Some(interface),
            hand_id,
        })
    }

    pub fn hand_id(&self) -> u8 {
        self.hand_id
    }

    /// Give the stream back, if the transport has not been closed.
    pub fn into_inner(self) -> Option<S> {
        self.interface
    }

    fn encode(
        &self,
        cmd: u8,
        address: u16,
        payload: &[u8],
        buff: &mut heapless::Vec<u8, L>,
    ) -> Result<(), S::Error> {
        if payload.len() > MAX_PAYLOAD {
            return Err(Error::BufferError);
        }
        let [addr_lo, addr_hi] = address.to_le_bytes();
        let len = (payload.len() + 3) as u8;
        buff.extend_from_slice(&REQUEST_HEADER)
            .and_then(|_| buff.extend_from_slice(&[self.hand_id, len, cmd, addr_lo, addr_hi]))
            .and_then(|_| buff.extend_from_slice(payload))
            .map_err(|_| Error::BufferError)?;
        let sum = checksum(&buff[2..]);
        buff.push(sum).map_err(|_| Error::BufferError)?;
        Ok(())
    }

    /// Send `request` and read back a response of `data_len` data bytes, returning the
    /// validated frame. The transport is closed if the link is lost.
    fn transact(
        &mut self,
        request: &[u8],
        cmd: u8,
        address: u16,
        data_len: usize,
    ) -> Result<heapless::Vec<u8, L>, S::Error> {
        let result = self.exchange(request, cmd, address, data_len);
        if let Err(err) = &result {
            if err.is_fatal() && self.interface.is_some() {
                warn!(address, "serial link lost, closing transport");
                self.interface = None;
            }
        }
        result
    }

    fn exchange(
        &mut self,
        request: &[u8],
        cmd: u8,
        address: u16,
        data_len: usize,
    ) -> Result<heapless::Vec<u8, L>, S::Error> {
        let interface = self.interface.as_mut().ok_or(Error::NotConnected)?;
        trace!(frame = ?request, "serial tx");
        interface.write_all(request).map_err(Error::Io)?;
        interface.flush().map_err(Error::Io)?;

        let [addr_lo, addr_hi] = address.to_le_bytes();
        for _ in 0..MAX_STALE_FRAMES {
            let response = read_response::<S, L>(interface)?;
            trace!(frame = ?response.as_slice(), "serial rx");

            let (body, sum) = response.split_at(response.len() - 1);
            let ours = body[2] == self.hand_id
                && body[3] as usize == data_len + 3
                && body[4] == cmd
                && body[5] == addr_lo
                && body[6] == addr_hi;
            if !ours {
                let got = u16::from_le_bytes([body[5], body[6]]);
                warn!(address, got, cmd = body[4], "discarding stale serial response");
                continue;
            }
            let expected = checksum(&body[2..]);
            if expected != sum[0] {
                warn!(address, "serial response failed checksum");
                return Err(Error::Checksum {
                    expected,
                    actual: sum[0],
                });
            }
            return Ok(response);
        }
        warn!(address, "no serial response matched the request");
        Err(Error::InvalidResponse)
    }

    fn write_bytes(&mut self, address: u16, payload: &[u8]) -> Result<(), S::Error> {
        let mut request: heapless::Vec<u8, L> = heapless::Vec::new();
        self.encode(CMD_WRITE, address, payload, &mut request)?;
        let response = self.transact(&request, CMD_WRITE, address, 1)?;
        match response[FRAME_OVERHEAD] {
            WRITE_ACCEPTED => Ok(()),
            status => Err(Error::Rejected { address, status }),
        }
    }
}

impl<S: embedded_io::Read + embedded_io::Write, const L: usize> RegisterTransport
    for SerialTransport<S, L>
{
    type IoError = S::Error;

    /// The one-byte count field allows 127 words; the hand answers reliably up to 64.
    const MAX_READ: u16 = 64;

    fn write_registers(&mut self, address: u16, values: &[u16]) -> Result<(), S::Error> {
        let mut payload: heapless::Vec<u8, MAX_PAYLOAD> = heapless::Vec::new();
        for value in values {
            payload
                .extend_from_slice(&value.to_le_bytes())
                .map_err(|_| Error::BufferError)?;
        }
        self.write_bytes(address, &payload)
    }

    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), S::Error> {
        self.write_bytes(address, &[value])
    }

    fn read_registers(&mut self, address: u16, count: u16) -> Result<Registers, S::Error> {
        let count = count as usize;
        if count > Self::MAX_READ as usize || count > MAX_READ_REGISTERS {
            return Err(Error::BufferError);
        }
        let byte_count = count * 2;
        let mut request: heapless::Vec<u8, L> = heapless::Vec::new();
        self.encode(CMD_READ, address, &[byte_count as u8], &mut request)?;
        let response = self.transact(&request, CMD_READ, address, byte_count)?;

        let data = &response[FRAME_OVERHEAD..FRAME_OVERHEAD + byte_count];
        let mut words = Registers::new();
        for pair in data.chunks_exact(2) {
            words
                .push(u16::from_le_bytes([pair[0], pair[1]]))
                .map_err(|_| Error::BufferError)?;
        }
        Ok(words)
    }

    fn close(&mut self) {
        self.interface = None;
    }

    fn is_open(&self) -> bool {
        self.interface.is_some()
    }
}
