#![no_main]

use icc_core::{curve, fit};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok((curve, _consumed)) = curve::decode(data) else {
        return;
    };
    let _ = fit::approximate(&curve, 256, None);
});
