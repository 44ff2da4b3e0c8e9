//! Serial CRC calculation for the receive bit stream.
//!
//! This module implements the linear-feedback shift register that accumulates
//! a CRC one bit per trigger pulse, parameterized by width and generator
//! polynomial. The three checksums defined by ISO 11898-1 (CRC-15 for
//! classical frames, CRC-17 and CRC-21 for FD frames) are published as
//! [`CrcParams`] constants; any width up to 32 bits is accepted.
//!
//! The register follows synchronous-logic semantics: [`SerialCrc::tick`]
//! observes the tick's input wires, computes the next register value, and
//! returns the post-edge state. The value is loaded from the init vector on
//! the enable rising edge, shifts only on enabled trigger ticks, and holds
//! otherwise, so whatever the register holds after `enable` falls is the
//! finished CRC, stable until the next enable edge.

use serde::{Deserialize, Serialize};

use crate::constants::{
    CRC15_POLY, CRC15_WIDTH, CRC17_POLY, CRC17_WIDTH, CRC21_POLY, CRC21_WIDTH,
};
use crate::error::ConfigError;

/// Build-time parameters of one serial CRC instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrcParams {
    /// Shift-register width in bits. Must be in `1..=32`.
    pub width: u32,
    /// Generator polynomial, without the implicit top term, right-aligned.
    pub polynomial: u32,
}

impl CrcParams {
    /// CRC-15 of classical CAN frames.
    pub const CRC15_CAN: Self = Self {
        width: CRC15_WIDTH,
        polynomial: CRC15_POLY,
    };
    /// CRC-17 of FD frames carrying up to 16 data bytes.
    pub const CRC17_CAN_FD: Self = Self {
        width: CRC17_WIDTH,
        polynomial: CRC17_POLY,
    };
    /// CRC-21 of FD frames carrying more than 16 data bytes.
    pub const CRC21_CAN_FD: Self = Self {
        width: CRC21_WIDTH,
        polynomial: CRC21_POLY,
    };

    /// Mask selecting the `width` low bits of a register word.
    #[inline]
    pub(crate) const fn mask(self) -> u32 {
        if self.width >= 32 {
            u32::MAX
        } else {
            (1 << self.width) - 1
        }
    }

    /// The register's most significant bit.
    #[inline]
    const fn top_bit(self) -> u32 {
        1 << (self.width - 1)
    }

    /// Checks the width/polynomial pair once, at construction time.
    ///
    /// # Errors
    /// - [`ConfigError::ZeroCrcWidth`] - Width of zero
    /// - [`ConfigError::CrcWidthTooLarge`] - Width above the 32-bit register
    /// - [`ConfigError::PolynomialTooWide`] - Polynomial bits above the width
    pub fn validate(self) -> Result<(), ConfigError> {
        if self.width == 0 {
            return Err(ConfigError::ZeroCrcWidth);
        }
        if self.width > 32 {
            return Err(ConfigError::CrcWidthTooLarge { width: self.width });
        }
        if self.polynomial & !self.mask() != 0 {
            return Err(ConfigError::PolynomialTooWide {
                polynomial: self.polynomial,
                width: self.width,
            });
        }
        Ok(())
    }
}

/// Input wires of a [`SerialCrc`], observed once per tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrcInput {
    /// The sampled bit to accumulate.
    pub data: bool,
    /// Marks this tick as a valid-sample instant.
    pub trigger: bool,
    /// Calculation window; a rising edge loads `init_vector`.
    pub enable: bool,
    /// Value loaded into the register at the start of a calculation.
    pub init_vector: u32,
}

/// A serial CRC accumulator of configurable width and polynomial.
///
/// One instance owns exactly one shift register; a receive path that needs
/// several checksums over different views of the bit stream instantiates one
/// `SerialCrc` per checksum and drives their triggers independently.
#[derive(Debug, Clone)]
pub struct SerialCrc {
    params: CrcParams,
    value: u32,
    prev_enable: bool,
}

impl SerialCrc {
    /// Creates a CRC register for the given parameter set.
    ///
    /// # Errors
    /// - [`ConfigError`] - The width/polynomial pair is invalid
    pub fn new(params: CrcParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            params,
            value: 0,
            prev_enable: false,
        })
    }

    /// Parameter set this register was built with.
    pub fn params(&self) -> CrcParams {
        self.params
    }

    /// Current register contents.
    ///
    /// While `enable` is high this is the in-progress partial remainder;
    /// after `enable` falls it is the finished CRC.
    #[inline]
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Asynchronous reset: clears the register and the edge detector.
    pub fn reset(&mut self) {
        self.value = 0;
        self.prev_enable = false;
    }

    /// Advances the register by one tick and returns the post-edge value.
    ///
    /// On the enable rising edge the register loads `init_vector` regardless
    /// of the trigger wire. On subsequent enabled trigger ticks it shifts one
    /// bit; on trigger-less or disabled ticks it holds.
    pub fn tick(&mut self, input: &CrcInput) -> u32 {
        let rising = input.enable && !self.prev_enable;
        if rising {
            self.value = input.init_vector & self.params.mask();
        } else if input.enable && input.trigger {
            self.value = self.shifted(input.data);
        }
        self.prev_enable = input.enable;
        self.value
    }

    // One LFSR step: feedback is data XOR the register top bit; the shifted
    // register is XORed with the polynomial when feedback is set.
    #[inline]
    fn shifted(&self, data: bool) -> u32 {
        let feedback = data ^ (self.value & self.params.top_bit() != 0);
        let mut next = (self.value << 1) & self.params.mask();
        if feedback {
            next ^= self.params.polynomial;
        }
        next
    }
}
