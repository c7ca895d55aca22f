#![no_main]
use libfuzzer_sys::arbitrary::{self, Arbitrary};
use libfuzzer_sys::fuzz_target;
use regloop_core::arbiter::arbitrate;
use regloop_core::codec::decode;
use regloop_core::{ControlState, LoopCfg, ManualStep};

#[derive(Debug, Arbitrary)]
struct Iteration {
    /// Raw words a remote client left in the voltage pair.
    remote: Option<(u16, u16)>,
    knob: Option<bool>,
    dt_ms: u16,
}

fuzz_target!(|iters: Vec<Iteration>| {
    let cfg = LoopCfg::default();
    let mut state = ControlState::default();
    let mut now = 0u64;
    for it in iters {
        now += u64::from(it.dt_ms);
        let read_back = it.remote.map(|(hi, lo)| decode(hi, lo));
        let manual = it
            .knob
            .map(|up| if up { ManualStep::Up } else { ManualStep::Down });
        arbitrate(&mut state, &cfg, read_back, manual, now);
        assert!(state.voltage >= cfg.limits.hard_min && state.voltage <= cfg.limits.hard_max);
    }
});
