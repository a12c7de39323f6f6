#![no_main]

use icc_core::curve;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = curve::decode(data);
});
