//! Fuzz testing harnesses for the receive-path components.
//!
//! Each harness maps fuzzer-generated bytes onto a deterministic stream of
//! tick inputs and drives one component through it, checking the invariants
//! that must hold for arbitrary input: outputs stay within their documented
//! ranges and no input sequence can panic the per-tick state machines.

use crate::crc::{CrcInput, CrcParams, SerialCrc};
use crate::destuff::{BitDestuffer, DestuffInput};
use crate::engine::{RxEngine, RxEngineConfig};
use crate::filter::{AcceptanceConfig, ExactFilter, FilterInput, RangeFilter, StrobeSet};
use crate::types::{CanId, FrameClassMask, FrameKind, IdentifierKind};

// One byte encodes one tick's input wires.
fn destuff_input_from_byte(byte: u8) -> DestuffInput {
    DestuffInput {
        data: byte & 0x01 != 0,
        trigger: byte & 0x02 != 0,
        enable: byte & 0x04 != 0,
        stuff_error_enable: byte & 0x08 != 0,
        fixed_stuff: byte & 0x10 != 0,
        stuff_length: byte >> 5,
    }
}

/// Fuzzes the bit destuffer with an arbitrary tick stream.
///
/// Every byte of `data` becomes one tick; all wire combinations are
/// reachable, including invalid stuff lengths and enable/mode edges on
/// arbitrary ticks.
///
/// # Parameters
/// - `data`: Fuzzer-generated input, one byte per tick
pub fn destuffer_tick_stream_harness(data: &[u8]) {
    let mut destuffer = BitDestuffer::new();
    for &byte in data {
        let input = destuff_input_from_byte(byte);
        let out = destuffer.tick(&input);
        assert!(out.destuffed_count < 8, "count output is modulo 8");
        if !input.trigger {
            assert!(!out.stuff_error, "violations pulse only on samples");
        }
    }
}

/// Fuzzes a serial CRC register with an arbitrary tick stream.
///
/// The width cycles through the three standard parameter sets based on the
/// first input byte so all of them see fuzz coverage.
///
/// # Parameters
/// - `data`: Fuzzer-generated input, one byte per tick
pub fn crc_tick_stream_harness(data: &[u8]) {
    let params = match data.first().copied().unwrap_or_default() % 3 {
        0 => CrcParams::CRC15_CAN,
        1 => CrcParams::CRC17_CAN_FD,
        _ => CrcParams::CRC21_CAN_FD,
    };
    let Ok(mut crc) = SerialCrc::new(params) else {
        unreachable!("standard parameter sets validate");
    };
    let mask = if params.width >= 32 {
        u32::MAX
    } else {
        (1 << params.width) - 1
    };
    for &byte in data {
        let value = crc.tick(&CrcInput {
            data: byte & 0x01 != 0,
            trigger: byte & 0x02 != 0,
            enable: byte & 0x04 != 0,
            init_vector: u32::from(byte) << 8,
        });
        assert_eq!(value & !mask, 0, "register never exceeds its width");
    }
}

/// Fuzzes the acceptance filter with a fuzzer-derived configuration and
/// identifier stream.
///
/// The first eight bytes seed the filter configuration; the rest are
/// evaluated as identifiers with rotating frame classes. Checks the
/// pass-through invariants that hold for every configuration.
///
/// # Parameters
/// - `data`: Fuzzer-generated configuration and identifier bytes
pub fn filter_decision_harness(data: &[u8]) {
    let mut words = data.chunks(4).map(|chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        u32::from_le_bytes(word)
    });
    let seed = words.next().unwrap_or_default();

    let config = AcceptanceConfig {
        filter_a: (seed & 0x1 != 0).then(|| ExactFilter {
            value: CanId::new(seed.rotate_left(3)),
            mask: CanId::new(seed.rotate_left(7)),
            accept: FrameClassMask::from_bits(seed as u8),
        }),
        filter_b: None,
        filter_c: None,
        range: (seed & 0x2 != 0).then(|| RangeFilter {
            low: CanId::new(seed.rotate_left(11)),
            high: CanId::new(seed.rotate_left(13)),
            accept: FrameClassMask::from_bits((seed >> 4) as u8),
        }),
        filters_enabled: seed & 0x4 != 0,
    };
    let none_present = !config.any_present();
    let pass_through = none_present || !config.filters_enabled;

    let mut engine = RxEngine::new(RxEngineConfig {
        acceptance: config,
        ..Default::default()
    })
    .expect("standard CRC parameter sets validate");

    for (index, word) in words.enumerate() {
        let out = engine.filter_tick(&FilterInput {
            identifier: CanId::new(word),
            identifier_kind: if index % 2 == 0 {
                IdentifierKind::Base
            } else {
                IdentifierKind::Extended
            },
            frame_kind: if index % 4 < 2 {
                FrameKind::Classic
            } else {
                FrameKind::Fd
            },
            strobes: StrobeSet {
                store_metadata: true,
                store_data: true,
                rec_valid: true,
                rec_abort: true,
            },
        });
        if none_present {
            assert!(!out.status.any(), "absent units never match");
        }
        if pass_through && index > 0 {
            assert!(out.accept, "pass-through configurations accept everything");
        }
        if !out.accept {
            assert_eq!(out.strobes, StrobeSet::default(), "rejects gate strobes");
        }
    }
}
