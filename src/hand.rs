use core::net::Ipv4Addr;

use tracing::{debug, info, warn};

use crate::{
    error::{Error, RequestError, Result},
    joint::{JOINT_COUNT, JointKind, JointValue, JointVector, Joints},
    layer,
    register::{Generation, Register, RegisterInfo, RegisterMap},
    status::{ActuatorStatus, ErrorFlags, PackedTriple},
    tactile::{Block, FingerTactile, PalmTactile, TactileFrame, ThumbTactile},
    transport::RegisterTransport,
};

/// Registers read by [`Hand::probe_registers`].
pub const PROBED_REGISTERS: [Register; PROBE_COUNT] = [
    Register::HandId,
    Register::AngleActual,
    Register::ForceActual,
    Register::ErrorCode,
    Register::Status,
    Register::Temperature,
];

pub const PROBE_COUNT: usize = 6;

/// How [`Hand::run_action_sequence`] treats a run request with no sequence selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SequencePolicy {
    /// Send the run command regardless. The hand runs whatever sequence it has selected.
    #[default]
    Unchecked,
    /// Refuse to run until [`Hand::set_action_sequence`] has been called in this session.
    RequireSelection,
}

/// One open session with a hand.
///
/// You can create a Hand over anything implementing [`RegisterTransport`], such as
/// [`crate::SerialTransport`] or [`crate::ModbusTransport`].
///
/// "set" writes a commanded value, "get" reads a value back from the hand.
pub struct Hand<T: RegisterTransport> {
    transport: T,
    map: &'static RegisterMap,
    debug: bool,
    sequence_policy: SequencePolicy,
    selected_sequence: Option<u8>,
}

impl<T: RegisterTransport> Hand<T> {
    /// Start a session on an already opened transport.
    pub fn new(transport: T, generation: Generation) -> Self {
        info!(%generation, "hand session opened");
        Self {
            transport,
            map: RegisterMap::for_generation(generation),
            debug: false,
            sequence_policy: SequencePolicy::default(),
            selected_sequence: None,
        }
    }

    /// Like [`Self::new`], taking the generation as a plain number.
    pub fn with_generation(transport: T, generation: u8) -> core::result::Result<Self, RequestError> {
        Ok(Self::new(transport, Generation::try_from(generation)?))
    }

    /// Log every register payload at debug level.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_sequence_policy(mut self, policy: SequencePolicy) -> Self {
        self.sequence_policy = policy;
        self
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn generation(&self) -> Generation {
        self.map.generation()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_open()
    }

    /// Close the transport. Further requests fail with [`Error::NotConnected`].
    pub fn disconnect(&mut self) {
        if self.transport.is_open() {
            info!(generation = %self.generation(), "hand session closed");
        }
        self.transport.close();
    }

    /// Hand the transport back, ending the session.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Write the non-keep channels of `values` to `kind`'s setpoint register.
    ///
    /// Every channel is range checked first; if any is out of range nothing is sent.
    /// Contiguous channels go out as one bulk write.
    ///
    /// A failed write leaves the hand in an unknown state. See
    /// [`Self::confirm_joint_values`] before retrying.
    pub fn set_joint_values(
        &mut self,
        kind: JointKind,
        values: impl Into<JointVector>,
    ) -> Result<(), T::IoError> {
        let plan = layer::plan_joint_write(self.map, kind, &values.into())?;
        for (address, words) in plan.runs() {
            if self.debug {
                debug!(register = %plan.register(), address, ?words, "write joint values");
            }
            self.transport.write_registers(address, words)?;
        }
        Ok(())
    }

    /// Read six joint words from `register`, in joint order.
    pub fn read_joint_values(&mut self, register: Register) -> Result<Joints<u16>, T::IoError> {
        let address = layer::joint_read(self.map, register)?;
        let words = self
            .transport
            .read_registers(address, JOINT_COUNT as u16)?;
        if words.len() < JOINT_COUNT {
            warn!(%register, got = words.len(), "short joint read");
            return Err(Error::ShortRead {
                expected: JOINT_COUNT,
                actual: words.len(),
            });
        }
        let values = Joints(core::array::from_fn(|i| words[i]));
        if self.debug {
            debug!(%register, address, ?values, "read joint values");
        }
        Ok(values)
    }

    /// Read the three words behind a byte-per-joint register.
    pub fn read_packed_triple(&mut self, register: Register) -> Result<PackedTriple, T::IoError> {
        let (address, count) = layer::packed_read(self.map, register, JOINT_COUNT)?;
        let words = self.transport.read_registers(address, count)?;
        if words.len() < count as usize {
            warn!(%register, got = words.len(), "short packed read");
            return Err(Error::ShortRead {
                expected: count as usize,
                actual: words.len(),
            });
        }
        let packed = PackedTriple([words[0], words[1], words[2]]);
        if self.debug {
            debug!(%register, address, words = ?packed.0, "read packed values");
        }
        Ok(packed)
    }

    /// Select a factory action sequence.
    pub fn set_action_sequence(&mut self, index: u8) -> Result<(), T::IoError> {
        self.write_command(Register::ActionSequenceIndex, index)?;
        self.selected_sequence = Some(index);
        Ok(())
    }

    /// Run the selected action sequence.
    pub fn run_action_sequence(&mut self) -> Result<(), T::IoError> {
        if self.sequence_policy == SequencePolicy::RequireSelection
            && self.selected_sequence.is_none()
        {
            return Err(RequestError::NoActionSequence.into());
        }
        self.write_command(Register::ActionSequenceRun, 1)
    }

    /// Sequence selected in this session, if any.
    pub fn selected_sequence(&self) -> Option<u8> {
        self.selected_sequence
    }

    /// Clear latched actuator errors. Safe to repeat.
    pub fn reset_error(&mut self) -> Result<(), T::IoError> {
        self.write_command(Register::ClearError, 1)
    }

    /// Persist the current parameters to the hand's flash.
    pub fn save_parameters(&mut self) -> Result<(), T::IoError> {
        self.write_command(Register::Save, 1)
    }

    /// Restore factory parameters.
    pub fn restore_defaults(&mut self) -> Result<(), T::IoError> {
        self.write_command(Register::ResetParameters, 1)
    }

    /// Start force sensor calibration. The hand must be open and unloaded.
    pub fn calibrate_force_sensors(&mut self) -> Result<(), T::IoError> {
        self.write_command(Register::ForceCalibration, 1)
    }

    pub fn set_angle(&mut self, values: impl Into<JointVector>) -> Result<(), T::IoError> {
        self.set_joint_values(JointKind::Angle, values)
    }

    pub fn set_speed(&mut self, values: impl Into<JointVector>) -> Result<(), T::IoError> {
        self.set_joint_values(JointKind::Speed, values)
    }

    pub fn set_force(&mut self, values: impl Into<JointVector>) -> Result<(), T::IoError> {
        self.set_joint_values(JointKind::Force, values)
    }

    /// Command raw actuator positions, 0-2000.
    pub fn set_position(&mut self, values: impl Into<JointVector>) -> Result<(), T::IoError> {
        self.set_joint_values(JointKind::Position, values)
    }

    /// Fully open every joint.
    pub fn perform_open(&mut self) -> Result<(), T::IoError> {
        self.set_angle(JointVector::splat(1000))
    }

    /// Fully close every joint.
    pub fn perform_close(&mut self) -> Result<(), T::IoError> {
        self.set_angle(JointVector::splat(0))
    }

    pub fn return_to_zero(&mut self) -> Result<(), T::IoError> {
        self.perform_close()
    }

    pub fn get_angle_actual(&mut self) -> Result<Joints<u16>, T::IoError> {
        self.read_joint_values(Register::AngleActual)
    }

    pub fn get_angle_set(&mut self) -> Result<Joints<u16>, T::IoError> {
        self.read_joint_values(Register::AngleSet)
    }

    pub fn get_force_actual(&mut self) -> Result<Joints<u16>, T::IoError> {
        self.read_joint_values(Register::ForceActual)
    }

    pub fn get_force_set(&mut self) -> Result<Joints<u16>, T::IoError> {
        self.read_joint_values(Register::ForceSet)
    }

    pub fn get_speed_set(&mut self) -> Result<Joints<u16>, T::IoError> {
        self.read_joint_values(Register::SpeedSet)
    }

    pub fn get_position_actual(&mut self) -> Result<Joints<u16>, T::IoError> {
        self.read_joint_values(Register::PositionActual)
    }

    pub fn get_position_set(&mut self) -> Result<Joints<u16>, T::IoError> {
        self.read_joint_values(Register::PositionSet)
    }

    /// Actuator current in mA.
    pub fn get_current(&mut self) -> Result<Joints<u16>, T::IoError> {
        self.read_joint_values(Register::Current)
    }

    /// Actuator temperatures in °C.
    pub fn get_temp(&mut self) -> Result<Joints<u8>, T::IoError> {
        Ok(self.read_packed_triple(Register::Temperature)?.unpack())
    }

    pub fn get_error(&mut self) -> Result<Joints<ErrorFlags>, T::IoError> {
        Ok(self
            .read_packed_triple(Register::ErrorCode)?
            .unpack()
            .map(ErrorFlags::from_byte))
    }

    pub fn get_status(&mut self) -> Result<Joints<ActuatorStatus>, T::IoError> {
        Ok(self
            .read_packed_triple(Register::Status)?
            .unpack()
            .map(ActuatorStatus::from))
    }

    /// Check that the setpoint register holds every non-keep channel of `expected`.
    ///
    /// Use this after a failed write to learn whether the hand took the command.
    pub fn confirm_joint_values(
        &mut self,
        kind: JointKind,
        expected: impl Into<JointVector>,
    ) -> Result<bool, T::IoError> {
        let expected = expected.into();
        kind.validate(&expected)?;
        let actual = self.read_joint_values(kind.setpoint_register())?;
        Ok(expected
            .iter()
            .all(|(joint, value)| match value {
                JointValue::Keep => true,
                JointValue::Set(raw) => *raw == actual[joint] as i32,
            }))
    }

    /// The hand's configured IPv4 address. Generation 4 only.
    pub fn get_ip_address(&mut self) -> Result<Ipv4Addr, T::IoError> {
        let (address, count) = layer::packed_read(self.map, Register::IpAddress, 4)?;
        let words = self.transport.read_registers(address, count)?;
        if words.len() < count as usize {
            return Err(Error::ShortRead {
                expected: count as usize,
                actual: words.len(),
            });
        }
        let [a, b] = words[0].to_le_bytes();
        let [c, d] = words[1].to_le_bytes();
        Ok(Ipv4Addr::new(a, b, c, d))
    }

    /// Read a whole block register, split into reads the transport accepts.
    pub fn read_block(&mut self, register: Register) -> Result<Block, T::IoError> {
        let (mut address, words) = layer::block_read(self.map, register)?;
        let mut block = Block::new();
        let mut remaining = words;
        while remaining > 0 {
            let count = remaining.min(T::MAX_READ);
            let chunk = self.transport.read_registers(address, count)?;
            if chunk.len() < count as usize {
                warn!(%register, address, "short block read");
                return Err(Error::ShortRead {
                    expected: words as usize,
                    actual: block.len() + chunk.len(),
                });
            }
            block
                .extend_from_slice(&chunk[..count as usize])
                .map_err(|_| Error::BufferError)?;
            address += 2 * count;
            remaining -= count;
        }
        if self.debug {
            debug!(%register, words, "read block");
        }
        Ok(block)
    }

    /// Read every tactile pad. Generation 4 only.
    pub fn read_tactile(&mut self) -> Result<TactileFrame, T::IoError> {
        Ok(TactileFrame {
            pinky: self.read_finger(Register::PinkyTouch)?,
            ring: self.read_finger(Register::RingTouch)?,
            middle: self.read_finger(Register::MiddleTouch)?,
            index: self.read_finger(Register::IndexTouch)?,
            thumb: ThumbTactile::parse(&self.read_block(Register::ThumbTouch)?)
                .ok_or(Error::InvalidResponse)?,
            palm: PalmTactile::parse(&self.read_block(Register::PalmTouch)?)
                .ok_or(Error::InvalidResponse)?,
        })
    }

    fn read_finger(&mut self, register: Register) -> Result<FingerTactile, T::IoError> {
        FingerTactile::parse(&self.read_block(register)?).ok_or(Error::InvalidResponse)
    }

    /// Every register this session's generation maps.
    pub fn register_info(&self) -> impl Iterator<Item = RegisterInfo> + '_ {
        self.map.info()
    }

    /// Try a small read of each of [`PROBED_REGISTERS`], reporting which answered.
    ///
    /// Failures are logged and reported as `false`, never returned.
    pub fn probe_registers(&mut self) -> [(Register, bool); PROBE_COUNT] {
        info!(generation = %self.generation(), "probing registers");
        PROBED_REGISTERS.map(|register| {
            let readable = match self.map.address(register) {
                Ok(address) => match self.transport.read_registers(address, 1) {
                    Ok(words) => !words.is_empty(),
                    Err(err) => {
                        warn!(%register, address, error = %err, "register probe failed");
                        false
                    }
                },
                Err(err) => {
                    warn!(%register, error = %err, "register not mapped");
                    false
                }
            };
            (register, readable)
        })
    }

    fn write_command(&mut self, register: Register, value: u8) -> Result<(), T::IoError> {
        let address = layer::byte_register(self.map, register)?;
        if self.debug {
            debug!(%register, address, value, "write command");
        }
        self.transport.write_byte(address, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ErrorCategory,
        joint::Joint,
        mock::{SimulatedHand, Transaction},
    };
    use proptest::prelude::*;
    use std::vec::Vec;

    fn gen3() -> Hand<SimulatedHand> {
        Hand::new(SimulatedHand::new(Generation::Gen3), Generation::Gen3)
    }

    fn gen4() -> Hand<SimulatedHand> {
        Hand::new(SimulatedHand::new(Generation::Gen4), Generation::Gen4)
    }

    #[test]
    fn test_set_angle_writes_each_joint_in_place() {
        let mut hand = gen3();
        hand.set_angle([500, 800, 600, 400, 200, 1000]).unwrap();
        assert_eq!(hand.transport().write_count(), 1);
        assert_eq!(
            hand.transport().written_words(),
            [
                (1486, 500),
                (1488, 800),
                (1490, 600),
                (1492, 400),
                (1494, 200),
                (1496, 1000),
            ]
        );
    }

    #[test]
    fn test_out_of_range_sends_nothing() {
        let mut hand = gen3();
        let err = hand.set_force([100, 100, 1001, 100, 100, 100]).unwrap_err();
        assert!(matches!(
            err,
            Error::Request(RequestError::OutOfRange {
                joint: Joint::Middle,
                value: 1001,
                ..
            })
        ));
        assert_eq!(err.category(), ErrorCategory::Range);
        assert!(hand.transport().log.is_empty());

        assert!(hand.set_speed([-5, 0, 0, 0, 0, 0]).is_err());
        assert!(hand.transport().log.is_empty());
    }

    #[test]
    fn test_all_keep_sends_nothing() {
        let mut hand = gen3();
        hand.set_angle([-1; 6]).unwrap();
        hand.set_position(JointVector::KEEP_ALL).unwrap();
        assert_eq!(hand.transport().write_count(), 0);
    }

    #[test]
    fn test_read_joint_values_keeps_joint_order() {
        let mut hand = gen3();
        hand.transport_mut()
            .poke_words(1582, &[11, 22, 33, 44, 55, 66]);
        let force = hand.get_force_actual().unwrap();
        assert_eq!(force[Joint::Pinky], 11);
        assert_eq!(force[Joint::Index], 44);
        assert_eq!(force[Joint::ThumbExtend], 66);
        assert_eq!(
            hand.transport().log,
            [Transaction::Read {
                address: 1582,
                count: 6
            }]
        );
    }

    #[test]
    fn test_short_read_is_a_transport_error() {
        let mut hand = gen3();
        hand.transport_mut().truncate_reads = Some(4);
        let err = hand.get_angle_actual().unwrap_err();
        assert!(matches!(
            err,
            Error::ShortRead {
                expected: 6,
                actual: 4
            }
        ));
        assert!(err.is_transport());
    }

    #[test]
    fn test_reset_error_twice() {
        let mut hand = gen3();
        hand.reset_error().unwrap();
        hand.reset_error().unwrap();
        assert_eq!(
            hand.transport().log,
            [
                Transaction::WriteByte {
                    address: 1004,
                    value: 1
                },
                Transaction::WriteByte {
                    address: 1004,
                    value: 1
                },
            ]
        );
    }

    #[test]
    fn test_angle_round_trip() {
        let mut hand = gen3();
        hand.transport_mut().settle_error = 3;
        let command = [500u16, 800, 600, 400, 200, 1000];
        hand.set_angle(command).unwrap();
        let actual = hand.get_angle_actual().unwrap();
        for (joint, value) in actual.iter() {
            let target = command[joint.index()] as i32;
            assert!(
                (*value as i32 - target).abs() <= 5,
                "{joint}: commanded {target}, measured {value}"
            );
        }
    }

    #[test]
    fn test_generation_five_is_refused() {
        let err = Hand::with_generation(SimulatedHand::new(Generation::Gen3), 5)
            .err()
            .unwrap();
        assert_eq!(err, RequestError::UnsupportedGeneration(5));
        assert_eq!(err.category(), ErrorCategory::UnsupportedGeneration);
    }

    #[test]
    fn test_timed_out_write_keeps_session_open() {
        let mut hand = gen3();
        hand.transport_mut().time_out_next_write = true;
        let err = hand.set_angle([0u16; 6]).unwrap_err();
        assert!(matches!(err, Error::Timeout));
        assert_eq!(err.category(), ErrorCategory::Transport);
        assert!(hand.is_connected());

        // The hand did not take the command, which read-back shows.
        assert!(!hand.confirm_joint_values(JointKind::Angle, [0, 0, 0, 0, 0, 7]).unwrap());
        hand.set_angle([0, 0, 0, 0, 0, 7]).unwrap();
        assert!(hand.confirm_joint_values(JointKind::Angle, [-1, -1, -1, -1, -1, 7]).unwrap());
    }

    #[test]
    fn test_packed_fields() {
        let mut hand = gen3();
        hand.transport_mut()
            .poke_bytes(1618, &[30, 31, 32, 33, 34, 35]);
        hand.transport_mut().poke_bytes(1612, &[0, 1, 2, 3, 6, 9]);
        hand.transport_mut().poke_bytes(1606, &[0, 0b1, 0, 0b100, 0, 0]);

        assert_eq!(hand.get_temp().unwrap(), Joints([30, 31, 32, 33, 34, 35]));
        let status = hand.get_status().unwrap();
        assert_eq!(status[Joint::Pinky], ActuatorStatus::Releasing);
        assert_eq!(status[Joint::ThumbFlex], ActuatorStatus::Stalled);
        assert_eq!(status[Joint::ThumbExtend], ActuatorStatus::Unknown(9));
        let errors = hand.get_error().unwrap();
        assert!(errors[Joint::Ring].stalled());
        assert!(errors[Joint::Index].over_current());
        assert!(errors[Joint::Pinky].is_clear());
    }

    #[test]
    fn test_open_and_close_presets() {
        let mut hand = gen3();
        hand.perform_open().unwrap();
        assert_eq!(hand.get_angle_set().unwrap(), Joints([1000; 6]));
        hand.perform_close().unwrap();
        assert_eq!(hand.get_angle_set().unwrap(), Joints([0; 6]));
        hand.perform_open().unwrap();
        hand.return_to_zero().unwrap();
        assert_eq!(hand.get_angle_set().unwrap(), Joints([0; 6]));
    }

    #[test]
    fn test_setpoint_readback() {
        let mut hand = gen4();
        hand.set_speed([100, 200, 300, 400, 500, 600]).unwrap();
        hand.set_force([-1, -1, 250, -1, -1, -1]).unwrap();
        hand.set_position([2000, 0, 0, 0, 0, 1500]).unwrap();
        hand.transport_mut().poke_words(1534, &[1, 2, 3, 4, 5, 6]);
        hand.transport_mut().poke_words(1594, &[90; 6]);

        assert_eq!(
            hand.get_speed_set().unwrap(),
            Joints([100, 200, 300, 400, 500, 600])
        );
        assert_eq!(hand.get_force_set().unwrap(), Joints([0, 0, 250, 0, 0, 0]));
        assert_eq!(
            hand.get_position_set().unwrap(),
            Joints([2000, 0, 0, 0, 0, 1500])
        );
        assert_eq!(hand.get_position_actual().unwrap(), Joints([1, 2, 3, 4, 5, 6]));
        assert_eq!(hand.get_current().unwrap(), Joints([90; 6]));
    }

    #[test]
    fn test_action_sequence_writes() {
        let mut hand = gen3();
        hand.set_action_sequence(3).unwrap();
        hand.run_action_sequence().unwrap();
        assert_eq!(
            hand.transport().log,
            [
                Transaction::WriteByte {
                    address: 2320,
                    value: 3
                },
                Transaction::WriteByte {
                    address: 2322,
                    value: 1
                },
            ]
        );
        assert_eq!(hand.selected_sequence(), Some(3));
        assert_eq!(hand.transport().peek_byte(2320), 3);
    }

    #[test]
    fn test_sequence_policy() {
        let mut unchecked = gen3();
        unchecked.run_action_sequence().unwrap();

        let mut strict = gen3().with_sequence_policy(SequencePolicy::RequireSelection);
        let err = strict.run_action_sequence().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Precondition);
        assert!(strict.transport().log.is_empty());
        strict.set_action_sequence(1).unwrap();
        strict.run_action_sequence().unwrap();
    }

    #[test]
    fn test_generation_specific_registers() {
        let mut hand = gen4();
        let err = hand.set_action_sequence(1).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::UnsupportedGeneration);
        assert!(hand.transport().log.is_empty());

        let mut hand = gen3();
        assert!(matches!(
            hand.read_tactile(),
            Err(Error::Request(RequestError::Unmapped { .. }))
        ));
        assert!(hand.get_ip_address().is_err());
    }

    #[test]
    fn test_parameter_commands() {
        let mut hand = gen4();
        hand.save_parameters().unwrap();
        hand.restore_defaults().unwrap();
        hand.calibrate_force_sensors().unwrap();
        let addresses: Vec<_> = hand
            .transport()
            .log
            .iter()
            .map(|t| match t {
                Transaction::WriteByte { address, value: 1 } => *address,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(addresses, [1005, 1006, 1009]);
    }

    #[test]
    fn test_ip_address() {
        let mut hand = gen4();
        hand.transport_mut().poke_bytes(1700, &[192, 168, 11, 210]);
        assert_eq!(
            hand.get_ip_address().unwrap(),
            Ipv4Addr::new(192, 168, 11, 210)
        );
    }

    #[test]
    fn test_read_tactile_in_chunks() {
        let mut hand = gen4();
        let thumb: Vec<u16> = (0..210).collect();
        hand.transport_mut().poke_words(4480, &thumb);
        hand.transport_mut().poke_words(3000, &[7; 185]);

        let frame = hand.read_tactile().unwrap();
        assert_eq!(frame.pinky.tip[11][7], 7);
        assert_eq!(frame.ring.peak(), 0);
        assert_eq!(frame.thumb.base[0][0], 209);
        assert_eq!(frame.peak(), 209);

        let reads: Vec<_> = hand
            .transport()
            .log
            .iter()
            .filter_map(|t| match t {
                Transaction::Read { address, count } => Some((*address, *count)),
                _ => None,
            })
            .collect();
        // 64 words per read on the simulated hand.
        assert_eq!(&reads[..3], &[(3000, 64), (3128, 64), (3256, 57)]);
        assert!(reads.iter().all(|(_, count)| *count <= SimulatedHand::MAX_READ));
        assert_eq!(reads.last(), Some(&(4900 + 128, 48)));
    }

    #[test]
    fn test_probe_and_info() {
        let mut hand = gen4();
        let probed = hand.probe_registers();
        assert!(probed.iter().all(|(_, readable)| *readable));

        hand.disconnect();
        hand.disconnect();
        assert!(!hand.is_connected());
        assert!(hand.probe_registers().iter().all(|(_, readable)| !readable));
        assert!(matches!(hand.get_temp(), Err(Error::NotConnected)));

        let info: Vec<_> = hand.register_info().collect();
        assert!(
            info.iter()
                .any(|i| i.register == Register::PalmTouch && i.address == 4900)
        );
        assert!(info.iter().all(|i| i.register != Register::Voltage));
    }

    fn joint_vector() -> impl Strategy<Value = [i32; 6]> {
        prop::array::uniform6(prop_oneof![Just(-1), 0..=1000i32])
    }

    proptest! {
        #[test]
        fn prop_written_registers_match_set_channels(values in joint_vector()) {
            let mut hand = gen3();
            hand.set_speed(values).unwrap();

            let expected: Vec<(u16, u16)> = values
                .iter()
                .enumerate()
                .filter(|(_, v)| **v != -1)
                .map(|(i, v)| (1522 + 2 * i as u16, *v as u16))
                .collect();
            prop_assert_eq!(hand.transport().written_words(), expected);
        }

        #[test]
        fn prop_out_of_range_sends_nothing(
            values in joint_vector(),
            joint in 0..6usize,
            bad in prop_oneof![1001..=i32::MAX, i32::MIN..=-2],
        ) {
            let mut values = values;
            values[joint] = bad;
            let mut hand = gen3();
            prop_assert!(hand.set_angle(values).is_err());
            prop_assert_eq!(hand.transport().write_count(), 0);
        }
    }
}
