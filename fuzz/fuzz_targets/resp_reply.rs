#![no_main]

use conformkit::runner::client::read_reply;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Malformed replies must surface as errors, never panics or unbounded recursion.
    let mut reader = data;
    let _ = read_reply(&mut reader);
});
