use rewind_config::HistorySettings;
use rewind_history::{ActionKind, HistoryEngine};

#[test]
fn test_load_creates_default_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rewind.json");
    assert!(!path.exists());

    let settings = HistorySettings::load_or_create(&path).unwrap();
    assert!(path.exists());
    assert_eq!(settings, HistorySettings::default());

    // File should contain valid JSON
    let contents = std::fs::read_to_string(&path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert!(parsed.is_object());
}

#[test]
fn test_load_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("rewind").join("rewind.json");

    HistorySettings::load_or_create(&path).unwrap();
    assert!(path.exists());
}

#[test]
fn test_load_existing_settings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rewind.json");
    let json = r#"{
        "limit": 3,
        "debug": true,
        "filter": { "exclude": ["JUMP", "JUMP_TO_PAST"] },
        "fields": ["counter", "total"]
    }"#;
    std::fs::write(&path, json).unwrap();

    let settings = HistorySettings::load_or_create(&path).unwrap();
    assert_eq!(settings.limit(), Some(3));
    assert!(settings.debug);
    assert_eq!(
        settings.filter.exclude,
        Some(vec![ActionKind::Jump, ActionKind::JumpToPast])
    );
    assert_eq!(
        settings.fields,
        Some(vec!["counter".to_string(), "total".to_string()])
    );
}

#[test]
fn test_broken_json_is_reported_and_kept() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rewind.json");
    std::fs::write(&path, "{ this is not valid json }}}").unwrap();

    let err = HistorySettings::load_or_create(&path).unwrap_err();
    assert!(format!("{err:#}").contains("rewind.json"));

    // The broken file must not be overwritten
    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents, "{ this is not valid json }}}");
}

#[test]
fn test_invalid_settings_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rewind.json");
    std::fs::write(&path, r#"{"limit": -4}"#).unwrap();

    assert!(HistorySettings::load(&path).is_err());
}

#[test]
fn test_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rewind.json");

    let mut settings = HistorySettings::default();
    settings.limit = Some(8);
    settings.filter.include = Some(vec![ActionKind::Enqueue, ActionKind::Undo]);
    settings.save(&path).unwrap();

    let loaded = HistorySettings::load(&path).unwrap();
    assert_eq!(loaded, settings);
}

#[test]
fn test_settings_drive_engine() {
    let settings = HistorySettings::from_json(r#"{"limit": 2, "filter": {"exclude": ["REDO"]}}"#).unwrap();
    let mut engine = HistoryEngine::with_initial(settings.history_config(), 0);
    for i in 1..=4 {
        let _ = engine.enqueue(i, None);
    }
    assert_eq!(engine.history().past.len(), 2);
    assert!(engine.undo().is_valid());
    assert!(!engine.redo().is_valid());
    assert_eq!(engine.state(), Some(&3));
}

#[test]
fn test_settings_path_with_env_var() {
    // Save and restore env var
    let original = std::env::var("REWIND_CONFIG").ok();
    std::env::set_var("REWIND_CONFIG", "/custom/rewind.json");
    let path = HistorySettings::settings_path();
    assert_eq!(path, std::path::PathBuf::from("/custom/rewind.json"));
    // Restore
    match original {
        Some(val) => std::env::set_var("REWIND_CONFIG", val),
        None => std::env::remove_var("REWIND_CONFIG"),
    }
}
