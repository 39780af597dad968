#![no_main]

use ipress_core::ConfigError;
use ipress_web::parse_options;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(config) = parse_options(text) else {
        return;
    };
    match config.validate() {
        Ok(()) => {
            if let Some(slop) = config.slop {
                assert!(slop.is_finite() && slop >= 0.0, "accepted slop {slop}");
            }
        }
        Err(ConfigError::InvalidSlop(slop)) => {
            assert!(!(slop.is_finite() && slop >= 0.0), "rejected slop {slop}");
        }
        Err(other) => panic!("validate returned {other:?}"),
    }
});
