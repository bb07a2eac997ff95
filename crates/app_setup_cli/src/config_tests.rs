use super::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_setup_config_default() {
    let config = SetupConfig::default();

    assert_eq!(config.port, 8765);
    assert_eq!(config.callback_timeout_secs, 300);
    assert_eq!(config.api_base_url, "https://api.github.com");
    assert_eq!(config.web_base_url, "https://github.com");
    assert_eq!(
        config.homepage_url,
        "https://github.com/bauer-group/CI-GitHubRunner"
    );
    assert_eq!(config.user_agent, "GitHub-App-Setup-Tool");
    assert_eq!(config.key_file_name, "github-app.pem");
    assert_eq!(config.env_file_name, ".env");
    assert_eq!(config.env_template_name, ".env.example");
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("setup-github-app.toml");
    fs::write(
        &config_path,
        "port = 9000\nweb_base_url = \"https://ghe.example.com\"\n",
    )
    .unwrap();

    let config = SetupConfig::load(&config_path).expect("Failed to load config");

    assert_eq!(config.port, 9000);
    assert_eq!(config.web_base_url, "https://ghe.example.com");
    assert_eq!(config.callback_timeout_secs, 300);
    assert_eq!(config.api_base_url, "https://api.github.com");
}

#[test]
fn test_empty_file_is_default() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("empty.toml");
    fs::write(&config_path, "").unwrap();

    let config = SetupConfig::load(&config_path).unwrap();

    assert_eq!(config, SetupConfig::default());
}

#[test]
fn test_load_invalid_toml() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("invalid_config.toml");
    fs::write(&config_path, "invalid = toml = syntax").expect("Failed to write invalid TOML");

    let result = SetupConfig::load(&config_path);

    if let Err(Error::Config(msg)) = result {
        assert!(msg.contains("Failed to parse configuration file"));
    } else {
        panic!("Expected Config error");
    }
}

#[test]
fn test_load_wrong_type() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("wrong_type.toml");
    fs::write(&config_path, "port = \"eighty\"").unwrap();

    let result = SetupConfig::load(&config_path);

    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_load_nonexistent_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let result = SetupConfig::load(&temp_dir.path().join("nonexistent_config.toml"));

    if let Err(Error::Config(msg)) = result {
        assert!(msg.contains("Configuration file not found"));
    } else {
        panic!("Expected Config error");
    }
}

#[test]
fn test_load_or_default_missing_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    let config = SetupConfig::load_or_default(&temp_dir.path().join("missing.toml")).unwrap();

    assert_eq!(config, SetupConfig::default());
}

#[test]
fn test_load_or_default_reports_broken_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("broken.toml");
    fs::write(&config_path, "port = [").unwrap();

    assert!(SetupConfig::load_or_default(&config_path).is_err());
}

#[test]
fn test_get_config_path_explicit() {
    assert_eq!(
        get_config_path(Some("custom.toml")),
        PathBuf::from("custom.toml")
    );
}

#[test]
fn test_get_config_path_default() {
    let path = get_config_path(None);
    assert!(path.ends_with(DEFAULT_CONFIG_FILENAME));
}

#[test]
fn test_round_trip_through_toml() {
    let config = SetupConfig {
        port: 9100,
        ..SetupConfig::default()
    };

    let text = toml::to_string(&config).unwrap();
    let parsed: SetupConfig = toml::from_str(&text).unwrap();

    assert_eq!(parsed, config);
}
