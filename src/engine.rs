//! The receive-path front end.
//!
//! [`RxEngine`] wires the leaf units of the receive path together on one
//! synchronous time base: a [`BitDestuffer`] plus the three CRC registers a
//! CAN FD receiver keeps in flight. Per ISO 11898-1 the classical CRC-15 is
//! computed over the destuffed bit sequence, while the FD CRC-17 and CRC-21
//! run over the stuffed sequence exactly as sampled from the wire, so the
//! engine forwards every triggered sample to the FD registers and suppresses
//! the CRC-15 trigger on the samples the destuffer marks as stuff bits.
//!
//! One [`RxEngine::tick`] call advances everything exactly once: inputs are
//! observed, the destuffer judges the sample, the CRC registers shift, and
//! the returned outputs are the post-edge values. The asynchronous reset
//! line is honored before any clocked update. The acceptance filter shares
//! the same tick domain but runs once per received identifier, not once per
//! bit; the engine exposes it through [`RxEngine::filter_tick`].

use serde::{Deserialize, Serialize};

use crate::crc::{CrcInput, CrcParams, SerialCrc};
use crate::destuff::{BitDestuffer, DestuffInput, DestuffOutput};
use crate::error::ConfigError;
use crate::filter::{AcceptanceConfig, FilterInput, FilterOutput, FrameFilter};

/// FD protocol flavor, selecting the CRC initialization vectors.
///
/// ISO frames seed the FD registers with a single 1 in the top bit; the
/// pre-standard (non-ISO) flavor seeds them with zero. CRC-15 always starts
/// from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FdFlavor {
    /// ISO 11898-1 frame format.
    #[default]
    Iso,
    /// Pre-standard (Bosch) FD frame format.
    NonIso,
}

impl FdFlavor {
    fn init_vector(self, params: CrcParams) -> u32 {
        match self {
            FdFlavor::Iso => 1 << (params.width - 1),
            FdFlavor::NonIso => 0,
        }
    }
}

/// Build-time configuration of the receive front end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RxEngineConfig {
    /// FD flavor; decides the CRC-17/21 init vectors.
    pub fd_flavor: FdFlavor,
    /// Acceptance-filter capability and configuration.
    pub acceptance: AcceptanceConfig,
}

/// Input wires of one bit tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct RxTickInput {
    /// Asynchronous reset; overrides every clocked update this tick.
    pub reset: bool,
    /// The sampled bus bit.
    pub data: bool,
    /// Marks this tick as a valid-sample instant.
    pub trigger: bool,
    /// Destuffing window enable.
    pub destuff_enable: bool,
    /// Gates the destuffer's violation output.
    pub stuff_error_enable: bool,
    /// Selects the fixed-interval stuffing discipline.
    pub fixed_stuff: bool,
    /// Configured run threshold, already decoded.
    pub stuff_length: u8,
    /// CRC calculation window enable, common to all three registers.
    pub crc_enable: bool,
}

/// Post-edge outputs of one bit tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RxTickOutput {
    /// Destuffer outputs, including the pass-through bit and the
    /// modulo-8 destuffed-bit count.
    pub destuff: DestuffOutput,
    /// Classical CRC register, accumulated over the destuffed sequence.
    pub crc15: u32,
    /// Short FD CRC register, accumulated over the stuffed sequence.
    pub crc17: u32,
    /// Long FD CRC register, accumulated over the stuffed sequence.
    pub crc21: u32,
}

/// The receive-side bit-stream front end.
///
/// Owns one destuffer, the three CRC registers, and the acceptance filter.
/// Each component keeps its state exclusively; the engine only wires their
/// explicit inputs and outputs.
#[derive(Debug, Clone)]
pub struct RxEngine {
    destuffer: BitDestuffer,
    crc15: SerialCrc,
    crc17: SerialCrc,
    crc21: SerialCrc,
    filter: FrameFilter,
    fd_flavor: FdFlavor,
}

impl RxEngine {
    /// Creates a receive front end from its configuration.
    ///
    /// # Errors
    /// - [`ConfigError`] - A CRC parameter set fails validation
    pub fn new(config: RxEngineConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            destuffer: BitDestuffer::new(),
            crc15: SerialCrc::new(CrcParams::CRC15_CAN)?,
            crc17: SerialCrc::new(CrcParams::CRC17_CAN_FD)?,
            crc21: SerialCrc::new(CrcParams::CRC21_CAN_FD)?,
            filter: FrameFilter::new(config.acceptance),
            fd_flavor: config.fd_flavor,
        })
    }

    /// Asynchronous reset: forces every component to its initial state.
    pub fn reset(&mut self) {
        self.destuffer.reset();
        self.crc15.reset();
        self.crc17.reset();
        self.crc21.reset();
        self.filter.reset();
    }

    /// Advances the bit-level units by one tick.
    ///
    /// The destuffer judges the sample first; its combinational judgment
    /// gates the CRC-15 trigger within the same tick, so a stuff bit never
    /// reaches the classical CRC while the FD registers consume every
    /// triggered sample.
    pub fn tick(&mut self, input: &RxTickInput) -> RxTickOutput {
        if input.reset {
            self.reset();
            return RxTickOutput {
                destuff: DestuffOutput {
                    data: crate::constants::RECESSIVE,
                    ..Default::default()
                },
                ..Default::default()
            };
        }

        let destuff = self.destuffer.tick(&DestuffInput {
            data: input.data,
            trigger: input.trigger,
            enable: input.destuff_enable,
            stuff_error_enable: input.stuff_error_enable,
            fixed_stuff: input.fixed_stuff,
            stuff_length: input.stuff_length,
        });

        let stuffed_stream = CrcInput {
            data: input.data,
            trigger: input.trigger,
            enable: input.crc_enable,
            init_vector: 0,
        };
        let destuffed_stream = CrcInput {
            trigger: input.trigger && !destuff.is_stuff_bit,
            ..stuffed_stream
        };

        let crc15 = self.crc15.tick(&destuffed_stream);
        let crc17 = self.crc17.tick(&CrcInput {
            init_vector: self.fd_flavor.init_vector(CrcParams::CRC17_CAN_FD),
            ..stuffed_stream
        });
        let crc21 = self.crc21.tick(&CrcInput {
            init_vector: self.fd_flavor.init_vector(CrcParams::CRC21_CAN_FD),
            ..stuffed_stream
        });

        RxTickOutput {
            destuff,
            crc15,
            crc17,
            crc21,
        }
    }

    /// Advances the acceptance filter by one tick, once per received
    /// identifier.
    pub fn filter_tick(&mut self, input: &FilterInput) -> FilterOutput {
        self.filter.tick(input)
    }

    /// The acceptance filter, for configuration access.
    pub fn filter(&self) -> &FrameFilter {
        &self.filter
    }

    /// Replaces the acceptance configuration between frames.
    pub fn set_acceptance(&mut self, config: AcceptanceConfig) {
        self.filter.set_config(config);
    }
}
