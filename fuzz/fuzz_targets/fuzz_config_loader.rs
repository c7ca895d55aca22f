#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse errors and validation errors are fine; panics are not.
    if let Ok(cfg) = toml::from_str::<regloop_config::Config>(data)
        && cfg.validate().is_ok()
    {
        // Anything that validates must also satisfy the loop's own checks.
        let loop_cfg = regloop_core::LoopCfg::from(&cfg);
        assert!(loop_cfg.check().is_ok(), "validated config rejected by loop: {cfg:?}");
    }
});
