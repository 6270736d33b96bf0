use chrono::{TimeZone, Utc};
use udyam_schema::{
    cache::store::SchemaCache,
    schema::{assembler::build_schema, schema_model::RawControl},
    Schema, SchemaSource,
};

fn schema_with(label: &str) -> Schema {
    let controls = vec![RawControl {
        label: label.into(),
        name: None,
        control_type: "text".into(),
        required: true,
        options: None,
    }];
    build_schema(&controls, Utc.with_ymd_and_hms(2025, 8, 14, 9, 30, 0).unwrap())
}

#[test]
fn read_before_any_write_is_absent() {
    let dir = tempfile::tempdir().unwrap();
    let cache = SchemaCache::new(dir.path().join("udyamForm.json"));
    assert!(cache.read().is_none());
}

#[test]
fn write_creates_parent_directories_and_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let cache = SchemaCache::new(dir.path().join("nested").join("data").join("udyamForm.json"));
    let schema = schema_with("Mobile Number");

    cache.write(&schema).unwrap();

    assert_eq!(cache.read().unwrap(), schema);
}

#[test]
fn write_replaces_previous_copy_and_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let cache = SchemaCache::new(dir.path().join("udyamForm.json"));

    cache.write(&schema_with("Mobile Number")).unwrap();
    let second = schema_with("Landline Number");
    cache.write(&second).unwrap();

    assert_eq!(cache.read().unwrap(), second);
    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1, "only the cache file remains");
}

#[test]
fn independent_writers_to_one_path_all_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("udyamForm.json");

    // Separate cache handles share no lock, like two CLI processes.
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let cache = SchemaCache::new(&path);
            std::thread::spawn(move || {
                for round in 0..10 {
                    cache.write(&schema_with(&format!("Field {} {}", i, round)))?;
                }
                Ok::<_, udyam_schema::service::error::CacheError>(())
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    assert!(SchemaCache::new(&path).read().is_some());
    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1, "no temp files left behind");
}

#[test]
fn stored_file_is_the_client_json_shape() {
    let dir = tempfile::tempdir().unwrap();
    let cache = SchemaCache::new(dir.path().join("udyamForm.json"));
    cache.write(&schema_with("Mobile Number")).unwrap();

    let raw = std::fs::read_to_string(cache.path()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert!(json["step1"].is_array());
    assert!(json["step2"].is_array());
    assert_eq!(json["generatedAt"], "2025-08-14T09:30:00.000Z");
    assert_eq!(json["source"], "scraped");
}

#[test]
fn hand_written_cache_with_fallback_source_is_readable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("udyamForm.json");
    std::fs::write(
        &path,
        r#"{
          "step1": [{"label":"Aadhaar Number","name":"aadhar","type":"text","required":true,"pattern":"^[0-9]{12}$"}],
          "step2": [{"label":"State","name":"state","type":"select","required":false,"options":["Goa","Kerala"]}],
          "generatedAt": "2025-08-14T09:30:00.000+05:30",
          "source": "fallback"
        }"#,
    )
    .unwrap();

    let schema = SchemaCache::new(&path).read().unwrap();
    assert_eq!(schema.source, SchemaSource::Fallback);
    assert_eq!(schema.step2[0].options.as_ref().unwrap().len(), 2);
    assert_eq!(schema.generated_at, Utc.with_ymd_and_hms(2025, 8, 14, 4, 0, 0).unwrap());
}

#[test]
fn corrupt_or_mistyped_cache_reads_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("udyamForm.json");
    let cache = SchemaCache::new(&path);

    for content in ["", "not json", "[]", r#"{"step1":[],"step2":[],"generatedAt":"yesterday","source":"scraped"}"#,
        r#"{"step1":[],"step2":[],"generatedAt":"2025-08-14T09:30:00Z","source":"guessed"}"#]
    {
        std::fs::write(&path, content).unwrap();
        assert!(cache.read().is_none(), "content {:?}", content);
    }
}
