#![no_main]

use jsonkit::{Datum, Value};
use libfuzzer_sys::fuzz_target;

// Binding arbitrary text through the Any reader and the Value reader must
// never panic, whatever the input looks like.
fuzz_target!(|text: String| {
    let _ = jsonkit::from_json_text::<Datum>(&text);
    let _ = jsonkit::from_json_text::<Value>(&text);
    let _ = jsonkit::from_json_text::<Vec<Option<i64>>>(&text);
});
