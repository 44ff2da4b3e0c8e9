//! Error types for the receive-path engine.
//!
//! The bit-stream units themselves never fail at runtime: a stuffing-rule
//! violation is an output pulse, not an error value, and the CRC and
//! acceptance-filter units have no failure modes of their own. What remains
//! are construction-time configuration errors, defined here with `thiserror`.

use thiserror::Error;

/// Errors raised while validating build-time configuration.
///
/// Every variant is detected when a component is constructed; once a
/// component exists its per-tick operation is infallible. Inconsistent but
/// well-formed configuration (a mask covering bits a base-format identifier
/// can never set, a range that matches nothing) is the configuration
/// supplier's contract and is deliberately not checked here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A CRC shift register must hold at least one bit.
    #[error("CRC width must be non-zero")]
    ZeroCrcWidth,

    /// The serial CRC register is backed by a 32-bit word.
    #[error("CRC width {width} exceeds the 32-bit shift register")]
    CrcWidthTooLarge { width: u32 },

    /// The generator polynomial has set bits above the register width.
    #[error("polynomial 0x{polynomial:X} does not fit in {width} bits")]
    PolynomialTooWide { polynomial: u32, width: u32 },
}
