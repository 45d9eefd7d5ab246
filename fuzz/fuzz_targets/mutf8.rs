#![no_main]

use dexrs::byte_stream::ByteStream;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    let code_points = data[0] as usize;
    let mut stream = ByteStream::new(&data[1..]);
    let _ = stream.read_mutf8(code_points);
});
