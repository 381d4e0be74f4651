#![no_main]
use libfuzzer_sys::fuzz_target;
use rowbridge::query::{CompiledFilter, FindOptions, eval_filter, parse_filter_json, shape_with};

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 { return; }
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(filter) = parse_filter_json(s) {
            // A few rows covering null, empty, missing and mixed types
            let docs = vec![
                bson::doc!{"a": 1, "b": 2, "name": "x", "created_at": "2024-01-01T00:00:00Z"},
                bson::doc!{"a": 10.5, "b": bson::Bson::Null, "name": "", "nested": {"z": 3}},
                bson::doc!{"active": true, "tags": ["x", "y"]},
            ];
            for d in &docs {
                let _ = eval_filter(d, &filter);
            }
            if let Ok(compiled) = CompiledFilter::new(&filter) {
                let _ = shape_with(compiled.apply(docs), &FindOptions::default());
            }
        }
    }
});
