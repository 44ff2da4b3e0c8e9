//! `canrx`: the receive-side bit-stream engine of a CAN FD controller.
//!
//! This library models the receive front end of a CAN FD protocol core at
//! the bit-sample level: bit destuffing under both stuffing disciplines,
//! serial CRC accumulation at the three widths ISO 11898-1 defines, and
//! mask/range acceptance filtering of received identifiers. The primary
//! entry point is the [`RxEngine`], which advances all units in lockstep on
//! a shared tick domain.
//!
//! ## Core Concepts
//!
//! - **Ticks and triggers**: every component advances exactly once per
//!   `tick` call. An externally produced trigger pulse marks the ticks at
//!   which a bus sample is valid; trigger-less ticks are well-defined
//!   no-ops. Returned outputs are the post-edge register values.
//! - **[`BitDestuffer`]**: identifies inserted stuff bits in the sampled
//!   stream, reports rule violations as one-tick pulses, and counts the
//!   bits it removed for the ISO FD stuff-count field.
//! - **[`SerialCrc`]**: a width/polynomial-parameterized serial CRC
//!   register; the engine keeps CRC-15 on the destuffed sequence and
//!   CRC-17/CRC-21 on the stuffed sequence, per the protocol's CRC
//!   definitions.
//! - **[`FrameFilter`]**: up to four filter units judge each received
//!   identifier once; the combined decision is registered one tick and
//!   gates the downstream store/valid/abort strobes.
//!
//! ## Quick Start
//!
//! ```rust
//! use canrx::constants::{DOMINANT, NOMINAL_STUFF_LENGTH, RECESSIVE};
//! use canrx::engine::{RxEngine, RxEngineConfig, RxTickInput};
//!
//! fn main() -> Result<(), canrx::ConfigError> {
//!     let mut engine = RxEngine::new(RxEngineConfig::default())?;
//!     let sample = |data| RxTickInput {
//!         data,
//!         trigger: true,
//!         destuff_enable: true,
//!         stuff_error_enable: true,
//!         stuff_length: NOMINAL_STUFF_LENGTH,
//!         crc_enable: true,
//!         ..Default::default()
//!     };
//!
//!     // Enable during bus idle, then sample a run of five dominant bits.
//!     engine.tick(&sample(RECESSIVE));
//!     for _ in 0..5 {
//!         let out = engine.tick(&sample(DOMINANT));
//!         assert!(!out.destuff.is_stuff_bit);
//!     }
//!
//!     // The transmitter inserted a recessive stuff bit to break the run;
//!     // the destuffer flags it so consumers can discard it.
//!     let out = engine.tick(&sample(RECESSIVE));
//!     assert!(out.destuff.is_stuff_bit);
//!     assert!(!out.destuff.stuff_error);
//!     assert_eq!(out.destuff.destuffed_count, 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Scope
//!
//! Bit timing and synchronization (when a sample happens), the frame/
//! protocol controller (arbitration, error management), register decoding,
//! and frame storage are external collaborators: this crate consumes
//! already-produced trigger pulses and already-decoded configuration, and
//! produces bit-level judgments, CRC values, and a gated accept decision.

pub mod constants;
pub mod crc;
pub mod destuff;
pub mod engine;
pub mod error;
pub mod filter;
pub mod fuzz_harnesses;
pub mod types;

pub use crc::{CrcInput, CrcParams, SerialCrc};
pub use destuff::{BitDestuffer, DestuffInput, DestuffOutput, StuffCountField, stuff_count_field};
pub use engine::{FdFlavor, RxEngine, RxEngineConfig, RxTickInput, RxTickOutput};
pub use error::ConfigError;
pub use filter::{
    AcceptanceConfig, ExactFilter, FilterInput, FilterOutput, FilterStatus, FrameFilter,
    RangeFilter, StrobeSet,
};
pub use types::{CanId, FrameClass, FrameClassMask, FrameKind, IdentifierKind};
