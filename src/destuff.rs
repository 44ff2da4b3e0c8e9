//! Bit destuffing for the receive bit stream.
//!
//! This module implements the receiver half of the CAN bit-stuffing rule
//! (ISO 11898-1, Sec 10.5): identify inserted stuff bits in the sampled
//! stream, discard them from the data path, and pulse a violation flag when
//! the rule is broken. Both stuffing disciplines are supported: the
//! run-threshold discipline of the arbitration/control/data fields, and the
//! fixed-interval discipline of the FD CRC field, where a stuff bit appears
//! every `stuff_length + 1` bits regardless of polarity.
//!
//! The unit is a single priority-ordered state machine evaluated once per
//! tick: an enable rising edge restarts run tracking, a switch into fixed
//! stuffing forces a synthetic stuff bit (the FD CRC field opens with one),
//! then the ordinary stuff-point and run-bookkeeping rules apply. Outputs
//! are registered; [`BitDestuffer::tick`] returns the post-edge values,
//! which is how a consumer sees a sample's judgment "the tick after" it was
//! taken on the wire.

use crate::constants::{DESTUFF_COUNT_MODULO, MIN_STUFF_LENGTH, RECESSIVE};

// The run counter mimics a 4-bit hardware register.
const RUN_LENGTH_MASK: u8 = 0x0F;

/// Input wires of the [`BitDestuffer`], observed once per tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct DestuffInput {
    /// The sampled bus bit.
    pub data: bool,
    /// Marks this tick as a valid-sample instant.
    pub trigger: bool,
    /// Destuffing window; a rising edge restarts run tracking.
    pub enable: bool,
    /// Gates the violation output; destuffing itself is unaffected.
    pub stuff_error_enable: bool,
    /// Selects the fixed-interval discipline of the FD CRC field.
    pub fixed_stuff: bool,
    /// Configured run threshold, already decoded. Valid range `2..=7`.
    pub stuff_length: u8,
}

/// Registered outputs of the destuffer, valid the tick after the sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DestuffOutput {
    /// Pass-through copy of the sampled bit.
    pub data: bool,
    /// The passed-through bit is a stuff bit; consumers discard it.
    pub is_stuff_bit: bool,
    /// One-tick pulse: the stuffing rule was violated at this sample.
    pub stuff_error: bool,
    /// Count of bits destuffed under the run-threshold discipline, modulo 8.
    pub destuffed_count: u8,
}

/// The ISO FD stuff-count field value: Gray-coded count plus parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StuffCountField {
    /// 3-bit Gray code of the destuffed-bit count modulo 8.
    pub gray: u8,
    /// Even-parity bit over the Gray code.
    pub parity: bool,
}

/// Encodes a destuffed-bit count as the ISO FD stuff-count field.
///
/// The protocol controller places this value after the data field of an ISO
/// FD frame; the receive path only has to report the modulo-8 count that
/// feeds it.
pub fn stuff_count_field(destuffed_count: u8) -> StuffCountField {
    let count = destuffed_count % DESTUFF_COUNT_MODULO;
    let gray = count ^ (count >> 1);
    StuffCountField {
        gray,
        parity: gray.count_ones() % 2 != 0,
    }
}

/// Receive-side bit destuffer.
///
/// Owns all run-tracking state exclusively; collaborators see only the
/// registered [`DestuffOutput`]. The unit never fails: a rule violation is
/// reported as a one-tick pulse and operation continues deterministically on
/// the next tick.
#[derive(Debug, Clone)]
pub struct BitDestuffer {
    // Edge-detect registers. `prev_enable` is refreshed on every processing
    // tick and forced low while disabled, so a re-enable is always an edge.
    prev_enable: bool,
    prev_fixed_stuff: bool,
    // Consecutive same-polarity bits seen so far, 4-bit wrap.
    run_length: u8,
    // Last sampled bit, reset to recessive at run-tracking restarts.
    prev_bit: bool,
    // Registered outputs.
    data_out: bool,
    is_stuff_bit: bool,
    stuff_error: bool,
    destuff_ctr: u8,
    // Last stuff-length value already reported as invalid.
    warned_stuff_length: Option<u8>,
}

impl Default for BitDestuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl BitDestuffer {
    /// Creates a destuffer in its reset state.
    pub fn new() -> Self {
        Self {
            prev_enable: false,
            prev_fixed_stuff: false,
            run_length: 1,
            prev_bit: RECESSIVE,
            data_out: RECESSIVE,
            is_stuff_bit: false,
            stuff_error: false,
            destuff_ctr: 0,
            warned_stuff_length: None,
        }
    }

    /// Asynchronous reset: restores the initial state, including the
    /// destuffed-bit counter.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Count of bits destuffed under the run-threshold discipline, modulo 8.
    ///
    /// Frozen (not cleared) while the unit is disabled; an enable rising
    /// edge clears it.
    #[inline]
    pub fn destuffed_count(&self) -> u8 {
        self.destuff_ctr
    }

    /// Advances the destuffer by one tick and returns the post-edge outputs.
    ///
    /// Transition priority while enabled on a trigger tick: enable rising
    /// edge, then a switch into fixed stuffing, then the stuff point, then
    /// ordinary run bookkeeping. On trigger-less ticks all state holds
    /// except the violation pulse, which is forced low. While disabled the
    /// sampled bit still passes through and the destuffed-bit count is
    /// frozen.
    pub fn tick(&mut self, input: &DestuffInput) -> DestuffOutput {
        // The violation flag is a pulse, not a level.
        self.stuff_error = false;

        if !input.enable {
            // Run tracking parks at idle; sampling continues silently.
            self.run_length = 1;
            self.prev_bit = RECESSIVE;
            self.is_stuff_bit = false;
            self.prev_enable = false;
            self.prev_fixed_stuff = input.fixed_stuff;
            if input.trigger {
                self.data_out = input.data;
            }
            return self.output();
        }

        if input.trigger {
            self.check_stuff_length(input.stuff_length);
            self.data_out = input.data;

            if !self.prev_enable {
                // Start of a destuffing window: restart run tracking and the
                // counter, no stuff-bit judgment on this sample.
                self.run_length = 1;
                self.prev_bit = RECESSIVE;
                self.destuff_ctr = 0;
                self.is_stuff_bit = false;
                self.prev_fixed_stuff = false;
            } else if input.fixed_stuff && !self.prev_fixed_stuff {
                // Entering the fixed-stuff region: the first bit is a stuff
                // bit by definition, whatever the run length. A violation at
                // this boundary is still a violation.
                self.is_stuff_bit = true;
                self.stuff_error =
                    input.stuff_error_enable && input.data == self.prev_bit;
                self.run_length = 1;
                self.prev_bit = RECESSIVE;
                self.prev_fixed_stuff = input.fixed_stuff;
            } else if self.stuff_point_reached(input) {
                // The sample at the stuff point must invert the run.
                self.is_stuff_bit = true;
                self.stuff_error =
                    input.stuff_error_enable && input.data == self.prev_bit;
                self.run_length = 1;
                if !input.fixed_stuff {
                    self.destuff_ctr = (self.destuff_ctr + 1) % DESTUFF_COUNT_MODULO;
                }
                self.prev_bit = input.data;
                self.prev_fixed_stuff = input.fixed_stuff;
            } else {
                // Ordinary data bit. Fixed stuffing counts every bit;
                // run-threshold stuffing counts only polarity continuations.
                if input.data == self.prev_bit || input.fixed_stuff {
                    self.run_length = (self.run_length + 1) & RUN_LENGTH_MASK;
                } else {
                    self.run_length = 1;
                }
                self.is_stuff_bit = false;
                self.prev_bit = input.data;
                self.prev_fixed_stuff = input.fixed_stuff;
            }

            self.prev_enable = true;
        }

        self.output()
    }

    // Fixed stuffing counts the stuff bit itself inside the run, hence the
    // threshold offset of one.
    #[inline]
    fn stuff_point_reached(&self, input: &DestuffInput) -> bool {
        if input.fixed_stuff {
            self.run_length == input.stuff_length.wrapping_add(1)
        } else {
            self.run_length == input.stuff_length
        }
    }

    // A threshold of 0 or 1 is a misconfiguration to report, not to correct:
    // the comparison keeps running with whatever the value produces.
    fn check_stuff_length(&mut self, stuff_length: u8) {
        if stuff_length < MIN_STUFF_LENGTH {
            if self.warned_stuff_length != Some(stuff_length) {
                log::warn!(
                    "configured stuff length {} is below the shortest valid run ({}); \
                     destuffing continues with the configured comparison",
                    stuff_length,
                    MIN_STUFF_LENGTH
                );
                self.warned_stuff_length = Some(stuff_length);
            }
        } else {
            self.warned_stuff_length = None;
        }
    }

    #[inline]
    fn output(&self) -> DestuffOutput {
        DestuffOutput {
            data: self.data_out,
            is_stuff_bit: self.is_stuff_bit,
            stuff_error: self.stuff_error,
            destuffed_count: self.destuff_ctr,
        }
    }
}
