use rowbridge::cli::{Command, OutputFormat, run};
use std::path::PathBuf;

fn data_file(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("data.json");
    std::fs::write(
        &path,
        r#"{
            "events": [
                {"id": 1, "name": "City Museum", "created_at": "2024-01-01T00:00:00Z"},
                {"id": 2, "name": "Art Gallery", "created_at": "2024-02-01T00:00:00Z"},
                {"id": 3, "name": "Museum of Science", "created_at": "2024-03-01T00:00:00Z"}
            ]
        }"#,
    )
    .unwrap();
    path
}

#[tokio::test]
async fn find_as_csv_with_sort_and_limit() {
    let dir = tempfile::tempdir().unwrap();
    let mut out = Vec::new();
    let cmd = Command::Find {
        data: data_file(&dir),
        table: "events".into(),
        filter_json: Some(r#"{"name":{"$regex":"museum"}}"#.into()),
        sort_json: Some(r#"{"id":1}"#.into()),
        limit: Some(1),
        format: OutputFormat::Csv,
    };
    run(cmd, &mut out).await.unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    let row: std::collections::HashMap<&str, &str> =
        lines[0].split(',').zip(lines[1].split(',')).collect();
    assert_eq!(row["id"], "1");
    assert_eq!(row["name"], "City Museum");
    assert_eq!(row["created_at"], "2024-01-01T00:00:00Z");
}

#[tokio::test]
async fn find_json_output_defaults_to_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let mut out = Vec::new();
    let cmd = Command::Find {
        data: data_file(&dir),
        table: "events".into(),
        filter_json: None,
        sort_json: None,
        limit: None,
        format: OutputFormat::Json,
    };
    run(cmd, &mut out).await.unwrap();
    let arr: Vec<serde_json::Value> = serde_json::from_slice(&out).unwrap();
    let ids: Vec<i64> = arr.iter().map(|v| v["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![3, 2, 1]);
}

#[tokio::test]
async fn explain_native_shows_constraints() {
    let mut out = Vec::new();
    let cmd = Command::Explain {
        filter_json: Some(r#"{"status":{"$in":["booked","cancelled"]}}"#.into()),
        sort_json: None,
        limit: None,
    };
    run(cmd, &mut out).await.unwrap();
    let plan: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(plan["path"], "native");
    assert!(plan["query"]["constraints"].as_array().is_some_and(|c| c.len() == 1));
}

#[tokio::test]
async fn missing_table_and_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let mut out = Vec::new();
    let cmd = Command::Count { data: data_file(&dir), table: "nope".into(), filter_json: None };
    assert!(matches!(run(cmd, &mut out).await, Err(rowbridge::DbError::NoSuchTable(_))));

    let mut out = Vec::new();
    run(Command::Metrics, &mut out).await.unwrap();
    assert!(String::from_utf8(out).unwrap().contains("rowbridge_queries_total "));
}
