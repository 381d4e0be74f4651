use bson::doc;
use parking_lot::RwLock;
use rowbridge::query::{self, FindOptions, parse_filter, telemetry};
use std::sync::Arc;

use crate::integration_tests::_support::store_with;

fn counter(name: &str) -> u64 {
    telemetry::metrics_text()
        .lines()
        .find_map(|l| l.strip_prefix(&format!("rowbridge_{name} ")).map(|v| v.parse().unwrap()))
        .unwrap()
}

#[tokio::test]
async fn query_lines_record_path_and_hide_filter_values() {
    let sink = Arc::new(RwLock::new(Vec::new()));
    telemetry::set_query_sink_for_tests(sink.clone());
    let store = store_with("telemetry_lines", vec![doc! { "id": 1, "secret": "hunter2" }]);
    let native = parse_filter(&doc! { "secret": "hunter2" }).unwrap();
    let or = parse_filter(&doc! { "$or": [ { "secret": "hunter2" } ] }).unwrap();
    query::find(&store, "telemetry_lines", &native, &FindOptions::default()).await.unwrap();
    query::find(&store, "telemetry_lines", &or, &FindOptions::default()).await.unwrap();

    let lines: Vec<serde_json::Value> = sink
        .read()
        .iter()
        .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap())
        .filter(|v| v["table"] == "telemetry_lines")
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["path"], "native");
    assert_eq!(lines[1]["path"], "fallback");
    assert_eq!(lines[0]["rows"], 1);
    assert_eq!(lines[0]["filter_hash"].as_str().unwrap().len(), 64);
    assert!(lines.iter().all(|l| !l.to_string().contains("hunter2")));
}

#[tokio::test]
async fn counters_move_with_each_path() {
    let store = store_with("telemetry_counts", vec![doc! { "id": 1, "name": "Museum" }]);
    let fallback_before = counter("fallback_total");
    let translation_before = counter("translation_fallbacks_total");
    let native_before = counter("native_total");

    let cs = parse_filter(&doc! { "name": { "$regex": "^M", "$options": "s" } }).unwrap();
    let rows = query::find(&store, "telemetry_counts", &cs, &FindOptions::default()).await.unwrap();
    assert_eq!(rows.len(), 1);
    let eq = parse_filter(&doc! { "id": 1 }).unwrap();
    query::find(&store, "telemetry_counts", &eq, &FindOptions::default()).await.unwrap();

    assert!(counter("fallback_total") > fallback_before);
    assert!(counter("translation_fallbacks_total") > translation_before);
    assert!(counter("native_total") > native_before);
}

#[tokio::test]
async fn backend_errors_are_counted() {
    let store = store_with("telemetry_errors", vec![]);
    store.set_offline(true);
    let before = counter("backend_errors_total");
    let f = parse_filter(&doc! {}).unwrap();
    assert!(query::find(&store, "telemetry_errors", &f, &FindOptions::default()).await.is_err());
    assert!(counter("backend_errors_total") > before);
}

#[tokio::test]
async fn query_log_file_gets_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("queries.log");
    telemetry::set_query_log(path.clone(), None);
    let store = store_with("telemetry_file", vec![doc! { "id": 1 }]);
    let f = parse_filter(&doc! { "id": 1 }).unwrap();
    query::find(&store, "telemetry_file", &f, &FindOptions::default()).await.unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.lines().any(|l| l.contains("\"table\":\"telemetry_file\"")));
}
