//! Connection settings, loadable from TOML, and the std transports they open.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr, TcpStream},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use serialport::SerialPort;
use tracing::info;

use crate::{
    error::{Error, RequestError, Result},
    hand::{Hand, SequencePolicy},
    modbus::ModbusTransport,
    register::Generation,
    serial::SerialTransport,
    std_io::{IoError, StdIo},
    transport::{RegisterTransport, Registers},
};

pub const DEFAULT_SERIAL_PORT: &str = "/dev/ttyUSB0";
pub const DEFAULT_BAUD_RATE: u32 = 115200;
pub const DEFAULT_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 11, 210);
pub const DEFAULT_TCP_PORT: u16 = 6000;
/// The hand can take a while to answer, a reasonably large timeout is required.
pub const DEFAULT_TIMEOUT_MS: u64 = 300;

fn default_serial_port() -> String {
    DEFAULT_SERIAL_PORT.to_string()
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_ip() -> IpAddr {
    IpAddr::V4(DEFAULT_IP)
}

fn default_tcp_port() -> u16 {
    DEFAULT_TCP_PORT
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_hand_id() -> u8 {
    1
}

/// Which link to open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransportConfig {
    Serial {
        #[serde(default = "default_serial_port")]
        port: String,
        #[serde(default = "default_baud_rate")]
        baud_rate: u32,
        #[serde(default = "default_timeout_ms")]
        timeout_ms: u64,
    },
    Modbus {
        #[serde(default = "default_ip")]
        ip: IpAddr,
        #[serde(default = "default_tcp_port")]
        port: u16,
        #[serde(default = "default_timeout_ms")]
        timeout_ms: u64,
    },
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig::Serial {
            port: default_serial_port(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Everything needed to open a session with one hand.
///
/// ```toml
/// generation = 4
/// hand_id = 1
///
/// [transport]
/// kind = "modbus"
/// ip = "192.168.11.210"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandConfig {
    pub transport: TransportConfig,
    pub generation: Generation,
    /// Serial hand id or Modbus unit id, 1-254.
    #[serde(default = "default_hand_id")]
    pub hand_id: u8,
    pub debug: bool,
    pub sequence_policy: SequencePolicy,
}

impl Default for HandConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            generation: Generation::default(),
            hand_id: default_hand_id(),
            debug: false,
            sequence_policy: SequencePolicy::default(),
        }
    }
}

impl HandConfig {
    /// Serial link on `port` at the default baud rate.
    pub fn serial(port: impl Into<String>) -> Self {
        Self {
            transport: TransportConfig::Serial {
                port: port.into(),
                baud_rate: DEFAULT_BAUD_RATE,
                timeout_ms: DEFAULT_TIMEOUT_MS,
            },
            ..Self::default()
        }
    }

    /// Modbus TCP link to `ip` on the default port.
    pub fn modbus(ip: impl Into<IpAddr>) -> Self {
        Self {
            transport: TransportConfig::Modbus {
                ip: ip.into(),
                port: DEFAULT_TCP_PORT,
                timeout_ms: DEFAULT_TIMEOUT_MS,
            },
            ..Self::default()
        }
    }

    pub fn with_generation(mut self, generation: Generation) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_hand_id(mut self, hand_id: u8) -> Self {
        self.hand_id = hand_id;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_sequence_policy(mut self, policy: SequencePolicy) -> Self {
        self.sequence_policy = policy;
        self
    }

    pub fn from_toml_str(source: &str) -> core::result::Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Open the configured link and start a session.
    pub fn connect(&self) -> Result<Hand<StdTransport>, IoError> {
        if self.hand_id == 0 || self.hand_id == 0xFF {
            return Err(RequestError::InvalidHandId(self.hand_id).into());
        }
        let transport = match &self.transport {
            TransportConfig::Serial {
                port,
                baud_rate,
                timeout_ms,
            } => {
                info!(port = %port, baud_rate, "opening serial port");
                let stream = serialport::new(port, *baud_rate)
                    .timeout(Duration::from_millis(*timeout_ms))
                    .open()
                    .map_err(|e| Error::Connection(IoError(e.into())))?;
                StdTransport::Serial(SerialTransport::new(StdIo(stream), self.hand_id)?)
            }
            TransportConfig::Modbus {
                ip,
                port,
                timeout_ms,
            } => {
                let address = SocketAddr::new(*ip, *port);
                info!(%address, "connecting to modbus server");
                let timeout = Duration::from_millis(*timeout_ms);
                let stream = TcpStream::connect_timeout(&address, timeout)
                    .map_err(|e| Error::Connection(IoError(e)))?;
                stream
                    .set_read_timeout(Some(timeout))
                    .and_then(|_| stream.set_write_timeout(Some(timeout)))
                    .and_then(|_| stream.set_nodelay(true))
                    .map_err(|e| Error::Connection(IoError(e)))?;
                StdTransport::Modbus(ModbusTransport::new(StdIo(stream), self.hand_id)?)
            }
        };
        Ok(Hand::new(transport, self.generation)
            .with_debug(self.debug)
            .with_sequence_policy(self.sequence_policy))
    }
}

type SerialLink = SerialTransport<StdIo<Box<dyn SerialPort>>>;
type ModbusLink = ModbusTransport<StdIo<TcpStream>>;

/// Either binding over a std stream, as opened by [`HandConfig::connect`].
pub enum StdTransport {
    Serial(SerialLink),
    Modbus(ModbusLink),
}

const fn min(a: u16, b: u16) -> u16 {
    if a < b { a } else { b }
}

impl RegisterTransport for StdTransport {
    type IoError = IoError;

    const MAX_READ: u16 = min(SerialLink::MAX_READ, ModbusLink::MAX_READ);

    fn write_registers(&mut self, address: u16, values: &[u16]) -> Result<(), IoError> {
        match self {
            StdTransport::Serial(link) => link.write_registers(address, values),
            StdTransport::Modbus(link) => link.write_registers(address, values),
        }
    }

    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), IoError> {
        match self {
            StdTransport::Serial(link) => link.write_byte(address, value),
            StdTransport::Modbus(link) => link.write_byte(address, value),
        }
    }

    fn read_registers(&mut self, address: u16, count: u16) -> Result<Registers, IoError> {
        match self {
            StdTransport::Serial(link) => link.read_registers(address, count),
            StdTransport::Modbus(link) => link.read_registers(address, count),
        }
    }

    fn close(&mut self) {
        match self {
            StdTransport::Serial(link) => link.close(),
            StdTransport::Modbus(link) => link.close(),
        }
    }

    fn is_open(&self) -> bool {
        match self {
            StdTransport::Serial(link) => link.is_open(),
            StdTransport::Modbus(link) => link.is_open(),
        }
    }
}
