//! Modbus TCP binding, using `rmodbus` for the framing.

use tracing::{trace, warn};

use crate::{
    error::{Error, RequestError, Result},
    transport::{MAX_READ_REGISTERS, MAX_STALE_FRAMES, RegisterTransport, Registers, read_frame},
};

/// Transaction id, protocol id and length field of the MBAP header.
const MBAP_PREFIX: usize = 6;

/// Modbus TCP binding over any [`embedded_io`] byte stream.
pub struct ModbusTransport<S: embedded_io::Read + embedded_io::Write, const L: usize = 260> {
    interface: Option<S>,
    /// Matches the hand id; the hand's default is 0x01.
    unit_id: u8,
    /// Transaction id of the last request sent.
    tr_id: u16,
}

impl<S: embedded_io::Read + embedded_io::Write, const L: usize> ModbusTransport<S, L> {
    /// Create a binding addressing Modbus unit `unit_id` (1-254).
    pub fn new(interface: S, unit_id: u8) -> core::result::Result<Self, RequestError> {
        if unit_id == 0 || unit_id == 0xFF {
            return Err(RequestError::InvalidHandId(unit_id));
        }
        Ok(Self {
            interface: Some(interface),
            unit_id,
            tr_id: 0,
        })
    }

    pub fn unit_id(&self) -> u8 {
        self.unit_id
    }

    pub fn into_inner(self) -> Option<S> {
        self.interface
    }

    /// Start a request under a fresh transaction id.
    fn next_request(&mut self) -> rmodbus::client::ModbusRequest {
        self.tr_id = self.tr_id.wrapping_add(1);
        rmodbus::client::ModbusRequest::new_tcp_udp(self.unit_id, self.tr_id)
    }

    /// Send a request and read back the ADU carrying its transaction id. The transport
    /// is closed if the link is lost.
    fn transact(&mut self, request: &[u8]) -> Result<heapless::Vec<u8, L>, S::Error> {
        let result = self.exchange(request);
        if let Err(err) = &result {
            if err.is_fatal() && self.interface.is_some() {
                warn!(tr_id = self.tr_id, "modbus link lost, closing transport");
                self.interface = None;
            }
        }
        result
    }

    fn exchange(&mut self, request: &[u8]) -> Result<heapless::Vec<u8, L>, S::Error> {
        let interface = self.interface.as_mut().ok_or(Error::NotConnected)?;
        trace!(frame = ?request, "modbus tx");
        interface.write_all(request).map_err(Error::Io)?;
        interface.flush().map_err(Error::Io)?;

        for _ in 0..MAX_STALE_FRAMES {
            let mut response: heapless::Vec<u8, L> = heapless::Vec::new();
            read_frame(interface, &mut response, MBAP_PREFIX)?;
            let remaining = u16::from_be_bytes([response[4], response[5]]) as usize;
            if remaining == 0 {
                warn!("modbus response with empty length field");
                return Err(Error::InvalidResponse);
            }
            read_frame(interface, &mut response, MBAP_PREFIX + remaining)?;
            trace!(frame = ?response.as_slice(), "modbus rx");

            let tr_id = u16::from_be_bytes([response[0], response[1]]);
            if tr_id != self.tr_id {
                warn!(expected = self.tr_id, got = tr_id, "discarding stale modbus response");
                continue;
            }
            return Ok(response);
        }
        warn!(tr_id = self.tr_id, "no modbus response matched the request");
        Err(Error::InvalidResponse)
    }
}

impl<S: embedded_io::Read + embedded_io::Write, const L: usize> RegisterTransport
    for ModbusTransport<S, L>
{
    type IoError = S::Error;

    const MAX_READ: u16 = MAX_READ_REGISTERS as u16;

    fn write_registers(&mut self, address: u16, values: &[u16]) -> Result<(), S::Error> {
        let mut request: heapless::Vec<u8, L> = heapless::Vec::new();
        let mut req = self.next_request();
        req.generate_set_holdings_bulk(address, values, &mut request)?;

        let response = self.transact(&request)?;
        req.parse_ok(&response)?;
        Ok(())
    }

    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), S::Error> {
        self.write_registers(address, &[value as u16])
    }

    fn read_registers(&mut self, address: u16, count: u16) -> Result<Registers, S::Error> {
        if count as usize > MAX_READ_REGISTERS {
            return Err(Error::BufferError);
        }
        let mut request: heapless::Vec<u8, L> = heapless::Vec::new();
        let mut req = self.next_request();
        req.generate_get_holdings(address, count, &mut request)?;

        let response = self.transact(&request)?;
        let mut parsed_data = Registers::new();
        req.parse_u16(&response, &mut parsed_data)?;
        if parsed_data.len() < count as usize {
            warn!(address, count, got = parsed_data.len(), "short modbus read");
            return Err(Error::ShortRead {
                expected: count as usize,
                actual: parsed_data.len(),
            });
        }
        Ok(parsed_data)
    }

    fn close(&mut self) {
        self.interface = None;
    }

    fn is_open(&self) -> bool {
        self.interface.is_some()
    }
}
