use proptest::prelude::*;
use regloop_core::arbiter::arbitrate;
use regloop_core::codec::{allocate_float, decode, encode, read_float, write_float};
use regloop_core::{ControlState, LoopCfg, ManualStep};
use regloop_hardware::MemoryRegisters;

fn manual_strategy() -> impl Strategy<Value = Option<ManualStep>> {
    prop_oneof![
        Just(None),
        Just(Some(ManualStep::Up)),
        Just(Some(ManualStep::Down)),
    ]
}

proptest! {
    #[test]
    fn codec_round_trips_every_bit_pattern(bits in any::<u32>()) {
        let v = f32::from_bits(bits);
        let (hi, lo) = encode(v);
        prop_assert_eq!(decode(hi, lo).to_bits(), bits);
    }

    #[test]
    fn register_pair_round_trips(v in any::<f32>(), addr in 0u16..1000) {
        let mut table = MemoryRegisters::new();
        allocate_float(&mut table, addr).unwrap();
        write_float(&mut table, addr, v).unwrap();
        prop_assert_eq!(read_float(&table, addr).unwrap().to_bits(), v.to_bits());
    }

    #[test]
    fn voltage_always_ends_within_hard_limits(
        start in 15.0f32..=30.0,
        remote in proptest::option::of(any::<f32>()),
        manual in manual_strategy(),
        now in 0u64..5000,
    ) {
        let cfg = LoopCfg::default();
        let mut state = ControlState { voltage: start, ..ControlState::default() };
        arbitrate(&mut state, &cfg, remote, manual, now);
        prop_assert!(state.voltage >= cfg.limits.hard_min);
        prop_assert!(state.voltage <= cfg.limits.hard_max);
    }

    #[test]
    fn sequences_of_iterations_stay_clamped(
        inputs in proptest::collection::vec(
            (proptest::option::of(-100.0f32..100.0), manual_strategy(), 0u64..2000),
            1..100,
        ),
    ) {
        let cfg = LoopCfg::default();
        let mut state = ControlState::default();
        let mut now = 0u64;
        for (remote, manual, dt) in inputs {
            now += dt;
            arbitrate(&mut state, &cfg, remote, manual, now);
            prop_assert!((cfg.limits.hard_min..=cfg.limits.hard_max).contains(&state.voltage));
        }
    }
}
