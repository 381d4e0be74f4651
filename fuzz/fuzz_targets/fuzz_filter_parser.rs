#![no_main]
use libfuzzer_sys::fuzz_target;
use rowbridge::query::{FindOptions, explain, parse_filter_json, parse_find_options_json, translate};

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 { return; }
    if let Ok(s) = std::str::from_utf8(data) {
        // Parsing and translation must never panic
        if let Ok(filter) = parse_filter_json(s) {
            let opts = FindOptions::default();
            if let Ok(q) = translate(&filter, &opts) {
                let _ = q.to_postgrest_params();
            }
            let _ = explain(&filter, &opts);
        }
        let _ = parse_find_options_json(s);
    }
});
