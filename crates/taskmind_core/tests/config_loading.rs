use taskmind_core::config::{save_config, AppConfig};
use taskmind_core::{load_config, ConfigError, CustomProject, Responsibility};

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config(dir.path().join("absent.json")).unwrap();

    assert!(config.assistant.offline_mode);
    assert_eq!(config.assistant.history_turns, 20);
    assert_eq!(config.assistant.model, "deepseek-chat");
    assert!(config.profile.custom_projects.is_empty());
}

#[test]
fn partial_file_merges_over_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{
            "assistant": { "temperature": 0.2, "offline_mode": false },
            "profile": {
                "default_project": "side",
                "default_responsibility": "participant",
                "custom_projects": [{ "id": "renovation", "keywords": ["装修"] }]
            }
        }"#,
    )
    .unwrap();

    let config = load_config(&path).unwrap();
    assert!((config.assistant.temperature - 0.2).abs() < f32::EPSILON);
    assert!(!config.assistant.offline_mode);
    assert_eq!(config.assistant.max_tokens, 1000);

    let context = config.profile.role_context();
    assert_eq!(context.default_project.as_deref(), Some("side"));
    assert_eq!(context.default_responsibility, Some(Responsibility::Participant));
    assert_eq!(
        context.custom_projects,
        vec![CustomProject {
            id: "renovation".to_string(),
            keywords: vec!["装修".to_string()],
        }]
    );
}

#[test]
fn malformed_file_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(load_config(&path), Err(ConfigError::Parse(_))));
}

#[test]
fn invalid_values_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "profile": { "default_responsibility": "boss" } }"#).unwrap();
    assert!(matches!(load_config(&path), Err(ConfigError::Invalid(_))));

    std::fs::write(&path, r#"{ "assistant": { "history_turns": 0 } }"#).unwrap();
    assert!(matches!(load_config(&path), Err(ConfigError::Invalid(_))));
}

#[test]
fn saved_config_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let mut config = AppConfig::default();
    config.profile.default_project = Some("side".to_string());
    config.assistant.max_tokens = 512;
    save_config(&path, &config).unwrap();

    let loaded = AppConfig::from_json(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(loaded, config);
}
