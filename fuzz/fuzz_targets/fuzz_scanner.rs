#![no_main]

use jsonkit::{ScanConfig, TextSource, TokenKind, TokenScanner};
use libfuzzer_sys::fuzz_target;

#[derive(arbitrary::Arbitrary, Debug)]
struct Input {
    text: String,
    capacity: u8,
}

// The scanner must terminate at a valid boundary on any input, at any
// buffer capacity, without panicking and with a monotonic position.
fuzz_target!(|input: Input| {
    let capacity = 16 + input.capacity as usize;
    let mut scanner = TokenScanner::new(
        TextSource::new(input.text),
        ScanConfig::new().with_initial_capacity(capacity),
    );
    let mut last = scanner.position();
    if scanner.next_token().is_err() {
        return;
    }
    let mut steps = 0u32;
    while scanner.kind() != TokenKind::None && steps < 1 << 16 {
        steps += 1;
        assert!(scanner.position() >= last);
        last = scanner.position();
        if scanner.read_value().is_err() {
            return;
        }
    }
});
