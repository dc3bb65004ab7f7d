//! This crate provides an interface for controlling Inspire six-joint dexterous hands.
//!
//! It speaks both of the hand's links:
//! * the vendor's byte-framed serial protocol (RS485 / USB serial), see [`SerialTransport`]
//! * Modbus TCP, see [`ModbusTransport`]
//!
//! Both bindings work over any [`embedded_io`] stream, and the crate supports `no_std`
//! environments when built without the default `std` feature. With `std`, a
//! [`HandConfig`] opens a serial port or TCP socket directly.
//!
//! Generation 3 and generation 4 hands are supported. Tactile sensing is only present
//! on generation 4.
//!
//! The serial port used for hand comms should be configured like so:
//! * Default baud rate: 115200
//! * Data bits: 8
//! * Stop bits: 1
//! * Parity: None
//!
//! ```no_run
//! use inspire_hand::HandConfig;
//!
//! let mut hand = HandConfig::serial("/dev/ttyUSB0").connect()?;
//! hand.set_speed([500; 6])?;
//! hand.set_angle([-1, -1, -1, 0, -1, -1])?;
//! println!("{:?}", hand.get_angle_actual()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod error;
pub mod hand;
pub mod joint;
pub mod layer;
pub mod modbus;
pub mod register;
pub mod serial;
pub mod status;
pub mod tactile;
pub mod transport;

#[cfg(feature = "std")]
pub mod config;
#[cfg(feature = "std")]
pub mod std_io;

#[cfg(all(test, not(feature = "std")))]
extern crate std;

#[cfg(test)]
mod mock;

pub use error::{Error, ErrorCategory, RequestError};
pub use hand::{Hand, SequencePolicy};
pub use joint::{Joint, JointKind, JointValue, JointVector, Joints};
pub use modbus::ModbusTransport;
pub use register::{Generation, Register};
pub use serial::SerialTransport;
pub use status::{ActuatorStatus, ErrorFlags};
pub use tactile::TactileFrame;
pub use transport::RegisterTransport;

#[cfg(feature = "std")]
pub use config::{HandConfig, StdTransport, TransportConfig};
#[cfg(feature = "std")]
pub use std_io::{IoError, StdIo};
