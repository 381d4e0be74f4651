#![no_main]
use libfuzzer_sys::fuzz_target;
use rowbridge::query::escape_pattern;
use rowbridge::store::like_match;

fuzz_target!(|input: (String, String)| {
    let (text, needle) = input;
    if text.len() > 1024 || needle.len() > 256 { return; }
    // An escaped needle is a literal substring test
    let pattern = format!("%{}%", escape_pattern(&needle));
    assert_eq!(like_match(&text, &pattern, false), text.contains(&needle));
});
