//! Engine-level receive-path tests.
//!
//! Drives the [`RxEngine`] with complete stuffed bit streams the way the
//! bit-timing unit would deliver them, one sample per trigger tick, and
//! checks destuffing, CRC accumulation, and their interaction across whole
//! sequences rather than single transitions.

use canrx::constants::{DOMINANT, NOMINAL_STUFF_LENGTH, RECESSIVE};
use canrx::crc::{CrcInput, CrcParams, SerialCrc};
use canrx::engine::{FdFlavor, RxEngine, RxEngineConfig, RxTickInput};
use canrx::{DestuffOutput, stuff_count_field};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Transmitter-side bit stuffing, mirroring the receiver's run tracking
/// from the recessive idle level.
fn stuff(data: &[bool], stuff_length: u8) -> Vec<bool> {
    let mut out = Vec::with_capacity(data.len() + data.len() / usize::from(stuff_length).max(1));
    let mut prev = RECESSIVE;
    let mut run = 1u8;
    for &bit in data {
        if run == stuff_length {
            let stuff_bit = !prev;
            out.push(stuff_bit);
            run = 1;
            prev = stuff_bit;
        }
        if bit == prev {
            run += 1;
        } else {
            run = 1;
        }
        prev = bit;
        out.push(bit);
    }
    out
}

fn sample(data: bool) -> RxTickInput {
    RxTickInput {
        data,
        trigger: true,
        destuff_enable: true,
        stuff_error_enable: true,
        stuff_length: NOMINAL_STUFF_LENGTH,
        crc_enable: true,
        ..Default::default()
    }
}

fn new_engine(fd_flavor: FdFlavor) -> RxEngine {
    RxEngine::new(RxEngineConfig {
        fd_flavor,
        ..Default::default()
    })
    .expect("standard configuration must validate")
}

/// Feeds the idle enable tick and then every stream bit, returning the
/// per-bit destuffer outputs.
fn run_stream(engine: &mut RxEngine, stream: &[bool]) -> Vec<DestuffOutput> {
    engine.tick(&sample(RECESSIVE));
    stream
        .iter()
        .map(|&bit| engine.tick(&sample(bit)).destuff)
        .collect()
}

#[test]
fn software_stuffed_stream_destuffs_without_violations() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let data: Vec<bool> = (0..256).map(|_| rng.random()).collect();
    let stream = stuff(&data, NOMINAL_STUFF_LENGTH);
    assert!(stream.len() > data.len(), "the pattern must force stuff bits");

    let mut engine = new_engine(FdFlavor::Iso);
    let outputs = run_stream(&mut engine, &stream);

    let recovered: Vec<bool> = outputs
        .iter()
        .filter(|out| !out.is_stuff_bit)
        .map(|out| out.data)
        .collect();
    assert_eq!(recovered, data);
    assert!(outputs.iter().all(|out| !out.stuff_error));

    let inserted = stream.len() - data.len();
    assert_eq!(
        outputs.last().unwrap().destuffed_count,
        (inserted % 8) as u8,
        "count reflects the removed bits modulo 8"
    );
}

#[test]
fn run_of_six_equal_bits_is_a_violation_exactly_once() {
    let mut engine = new_engine(FdFlavor::Iso);
    let stream = [DOMINANT; 6];
    let outputs = run_stream(&mut engine, &stream);

    let violations: Vec<usize> = outputs
        .iter()
        .enumerate()
        .filter(|(_, out)| out.stuff_error)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(violations, vec![5], "exactly one pulse, at the stuff point");
}

#[test]
fn crc15_over_destuffed_bits_matches_a_directly_fed_register() {
    let mut rng = StdRng::seed_from_u64(0xCAFE);
    let data: Vec<bool> = (0..128).map(|_| rng.random()).collect();
    let stream = stuff(&data, NOMINAL_STUFF_LENGTH);

    let mut engine = new_engine(FdFlavor::NonIso);
    let outputs = run_stream(&mut engine, &stream);
    assert!(outputs.iter().all(|out| !out.stuff_error));

    // Reference register fed the destuffed data directly.
    let mut reference = SerialCrc::new(CrcParams::CRC15_CAN).expect("valid parameters");
    reference.tick(&CrcInput {
        enable: true,
        ..Default::default()
    });
    for &bit in &data {
        reference.tick(&CrcInput {
            data: bit,
            trigger: true,
            enable: true,
            init_vector: 0,
        });
    }

    let final_tick = engine.tick(&RxTickInput {
        crc_enable: true,
        destuff_enable: true,
        stuff_length: NOMINAL_STUFF_LENGTH,
        ..Default::default()
    });
    assert_eq!(final_tick.crc15, reference.value());
}

#[test]
fn fd_registers_consume_the_stuffed_sequence() {
    let data = [DOMINANT, DOMINANT, DOMINANT, DOMINANT, DOMINANT, RECESSIVE];
    let stream = stuff(&data, NOMINAL_STUFF_LENGTH);
    assert_eq!(stream.len(), 7, "one stuff bit inside the run");

    let mut engine = new_engine(FdFlavor::NonIso);
    run_stream(&mut engine, &stream);

    let mut reference = SerialCrc::new(CrcParams::CRC17_CAN_FD).expect("valid parameters");
    reference.tick(&CrcInput {
        enable: true,
        ..Default::default()
    });
    for &bit in &stream {
        reference.tick(&CrcInput {
            data: bit,
            trigger: true,
            enable: true,
            init_vector: 0,
        });
    }

    let hold = engine.tick(&RxTickInput {
        crc_enable: true,
        destuff_enable: true,
        stuff_length: NOMINAL_STUFF_LENGTH,
        ..Default::default()
    });
    assert_eq!(hold.crc17, reference.value());
}

#[test]
fn switching_to_fixed_stuffing_mid_stream_inserts_the_boundary_stuff_bit() {
    let mut engine = new_engine(FdFlavor::Iso);
    engine.tick(&sample(RECESSIVE));
    engine.tick(&sample(DOMINANT));
    engine.tick(&sample(RECESSIVE));

    let fixed_sample = |data| RxTickInput {
        fixed_stuff: true,
        stuff_length: 4,
        ..sample(data)
    };

    // The first fixed-mode bit is a stuff bit by definition.
    let boundary = engine.tick(&fixed_sample(DOMINANT));
    assert!(boundary.destuff.is_stuff_bit);
    assert!(!boundary.destuff.stuff_error);

    // Four data bits, then the next fixed stuff point.
    for _ in 0..4 {
        let out = engine.tick(&fixed_sample(RECESSIVE));
        assert!(!out.destuff.is_stuff_bit);
    }
    let next_stuff = engine.tick(&fixed_sample(DOMINANT));
    assert!(next_stuff.destuff.is_stuff_bit);
    assert_eq!(
        next_stuff.destuff.destuffed_count, 0,
        "fixed-mode stuff bits never advance the counter"
    );
}

#[test]
fn destuffed_count_feeds_the_iso_stuff_count_field() {
    let mut rng = StdRng::seed_from_u64(42);
    let data: Vec<bool> = (0..64).map(|_| rng.random()).collect();
    let stream = stuff(&data, NOMINAL_STUFF_LENGTH);

    let mut engine = new_engine(FdFlavor::Iso);
    let outputs = run_stream(&mut engine, &stream);
    let count = outputs.last().unwrap().destuffed_count;

    let field = stuff_count_field(count);
    assert_eq!(field.gray, count ^ (count >> 1));
    let ones = field.gray.count_ones() + u32::from(field.parity);
    assert_eq!(ones % 2, 0, "field plus parity has even weight");
}

#[test]
fn reset_mid_frame_restores_a_pristine_front_end() {
    let mut engine = new_engine(FdFlavor::Iso);
    run_stream(&mut engine, &[DOMINANT, DOMINANT, RECESSIVE, DOMINANT]);

    engine.tick(&RxTickInput {
        reset: true,
        ..sample(DOMINANT)
    });

    let mut fresh = new_engine(FdFlavor::Iso);
    let replay = [RECESSIVE, DOMINANT, DOMINANT, DOMINANT];
    for &bit in &replay {
        assert_eq!(engine.tick(&sample(bit)), fresh.tick(&sample(bit)));
    }
}
