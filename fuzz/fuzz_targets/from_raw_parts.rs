#![no_main]

extern crate dexrs;
extern crate libfuzzer_sys;

libfuzzer_sys::fuzz_target!(|data: &[u8]| {
    // must never panic, loop forever, or read out of bounds, regardless of how corrupted `data` is
    if let Ok(file) = dexrs::parse(data) {
        let _ = file.classes.len();
    }
});
