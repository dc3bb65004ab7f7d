//! We use this mocking module in unit tests to emulate a serial port and a hand.

use std::{collections::BTreeMap, vec::Vec};

use crate::{
    error::{Error, Result},
    register::{Generation, Register, RegisterMap},
    transport::{RegisterTransport, Registers},
};

/// Our mock type used to emulate a byte stream (serial port or TCP socket).
pub struct MockSerial {
    /// Buffer to store data written to the mock port
    write_buffer: heapless::Vec<u8, 512>,
    /// Buffer containing pre-configured response data to be read
    read_buffer: heapless::Vec<u8, 512>,
    /// Current position in the read buffer
    read_position: usize,
    /// Flag to simulate write errors
    should_error_on_write: bool,
    /// Report end of stream instead of a timeout once the read data runs out
    eof_when_drained: bool,
}

#[derive(Debug)]
pub enum MockSerialError {
    /// Nothing left to read before the port timeout expired
    Timeout,
    /// Simulated buffer overflow
    BufferOverflow,
    /// Generic simulated error for testing
    SimulatedError,
}

impl core::fmt::Display for MockSerialError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl core::error::Error for MockSerialError {}

impl embedded_io::Error for MockSerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            MockSerialError::Timeout => embedded_io::ErrorKind::TimedOut,
            MockSerialError::BufferOverflow => embedded_io::ErrorKind::OutOfMemory,
            MockSerialError::SimulatedError => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for MockSerial {
    type Error = MockSerialError;
}

impl embedded_io::Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> core::result::Result<usize, Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }
        self.write_buffer
            .extend_from_slice(buf)
            .map_err(|_| MockSerialError::BufferOverflow)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> core::result::Result<(), Self::Error> {
        Ok(())
    }
}

impl embedded_io::Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> core::result::Result<usize, Self::Error> {
        if self.read_position >= self.read_buffer.len() {
            if self.eof_when_drained {
                return Ok(0);
            }
            return Err(MockSerialError::Timeout);
        }

        let available_bytes = self.read_buffer.len() - self.read_position;
        let bytes_to_read = core::cmp::min(buf.len(), available_bytes);
        buf[..bytes_to_read]
            .copy_from_slice(&self.read_buffer[self.read_position..self.read_position + bytes_to_read]);

        self.read_position += bytes_to_read;
        Ok(bytes_to_read)
    }
}

impl MockSerial {
    pub fn new() -> Self {
        Self {
            write_buffer: heapless::Vec::new(),
            read_buffer: heapless::Vec::new(),
            read_position: 0,
            should_error_on_write: false,
            eof_when_drained: false,
        }
    }

    /// Set the data that will be returned when read() is called
    pub fn set_read_data(&mut self, data: &[u8]) -> core::result::Result<(), MockSerialError> {
        self.read_buffer.clear();
        self.read_position = 0;
        self.read_buffer
            .extend_from_slice(data)
            .map_err(|_| MockSerialError::BufferOverflow)
    }

    pub fn written_data(&self) -> &[u8] {
        &self.write_buffer
    }

    pub fn set_write_error(&mut self, should_error: bool) {
        self.should_error_on_write = should_error;
    }

    /// Behave like a closed socket after the read data is used up.
    pub fn set_eof(&mut self, eof: bool) {
        self.eof_when_drained = eof;
    }
}

/// One register transaction seen by [`SimulatedHand`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    Write { address: u16, values: Vec<u16> },
    WriteByte { address: u16, value: u8 },
    Read { address: u16, count: u16 },
}

/// A byte-addressed register file standing in for a real hand.
///
/// Commanded angles settle onto the measured angle register, `settle_error` short of
/// the target.
pub struct SimulatedHand {
    map: &'static RegisterMap,
    memory: BTreeMap<u16, u8>,
    pub log: Vec<Transaction>,
    pub settle_error: i32,
    /// Fail the next write with a timeout.
    pub time_out_next_write: bool,
    /// Truncate every read to this many words.
    pub truncate_reads: Option<usize>,
    open: bool,
}

impl SimulatedHand {
    pub fn new(generation: Generation) -> Self {
        Self {
            map: RegisterMap::for_generation(generation),
            memory: BTreeMap::new(),
            log: Vec::new(),
            settle_error: 0,
            time_out_next_write: false,
            truncate_reads: None,
            open: true,
        }
    }

    pub fn poke_words(&mut self, address: u16, values: &[u16]) {
        for (i, value) in values.iter().enumerate() {
            let [lo, hi] = value.to_le_bytes();
            let at = address + 2 * i as u16;
            self.memory.insert(at, lo);
            self.memory.insert(at + 1, hi);
        }
    }

    pub fn poke_bytes(&mut self, address: u16, values: &[u8]) {
        for (i, value) in values.iter().enumerate() {
            self.memory.insert(address + i as u16, *value);
        }
    }

    pub fn peek_word(&self, address: u16) -> u16 {
        let lo = self.memory.get(&address).copied().unwrap_or(0);
        let hi = self.memory.get(&(address + 1)).copied().unwrap_or(0);
        u16::from_le_bytes([lo, hi])
    }

    pub fn peek_byte(&self, address: u16) -> u8 {
        self.memory.get(&address).copied().unwrap_or(0)
    }

    /// Every (address, word) pair written, flattened across bulk writes.
    pub fn written_words(&self) -> Vec<(u16, u16)> {
        self.log
            .iter()
            .filter_map(|t| match t {
                Transaction::Write { address, values } => Some(
                    values
                        .iter()
                        .enumerate()
                        .map(|(i, v)| (address + 2 * i as u16, *v))
                        .collect::<Vec<_>>(),
                ),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn write_count(&self) -> usize {
        self.log
            .iter()
            .filter(|t| !matches!(t, Transaction::Read { .. }))
            .count()
    }

    fn settle(&mut self) {
        let (Some(set), Some(actual)) = (
            self.map.get(Register::AngleSet),
            self.map.get(Register::AngleActual),
        ) else {
            return;
        };
        for joint in 0..6u16 {
            let target = self.peek_word(set + 2 * joint) as i32;
            let reached = (target - self.settle_error).clamp(0, 1000) as u16;
            self.poke_words(actual + 2 * joint, &[reached]);
        }
    }
}

impl RegisterTransport for SimulatedHand {
    type IoError = MockSerialError;

    const MAX_READ: u16 = 64;

    fn write_registers(&mut self, address: u16, values: &[u16]) -> Result<(), MockSerialError> {
        if !self.open {
            return Err(Error::NotConnected);
        }
        if core::mem::take(&mut self.time_out_next_write) {
            return Err(Error::Timeout);
        }
        self.log.push(Transaction::Write {
            address,
            values: values.to_vec(),
        });
        self.poke_words(address, values);
        self.settle();
        Ok(())
    }

    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), MockSerialError> {
        if !self.open {
            return Err(Error::NotConnected);
        }
        if core::mem::take(&mut self.time_out_next_write) {
            return Err(Error::Timeout);
        }
        self.log.push(Transaction::WriteByte { address, value });
        self.poke_bytes(address, &[value]);
        Ok(())
    }

    fn read_registers(&mut self, address: u16, count: u16) -> Result<Registers, MockSerialError> {
        if !self.open {
            return Err(Error::NotConnected);
        }
        self.log.push(Transaction::Read { address, count });
        let count = self.truncate_reads.map_or(count as usize, |n| n.min(count as usize));
        let mut words = Registers::new();
        for i in 0..count as u16 {
            words
                .push(self.peek_word(address + 2 * i))
                .map_err(|_| Error::BufferError)?;
        }
        Ok(words)
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }
}
