use std::env;

use omnitime::config::{
    load_config, load_env_file, resolve_config_path, ConfigStore, FileConfigStore,
    InstanceConfig, MemoryConfigStore, Settings, ENV_API_KEY, ENV_API_URL, ENV_DEBUG,
};
use serial_test::serial;
use tempfile::tempdir;

fn sample() -> Settings {
    Settings {
        api_url: Some("https://time.example.com/api".to_string()),
        api_key: Some("secret".to_string()),
        instances: Some(vec![InstanceConfig::new("gitlab.example.com", "gitlab")]),
        debug: false,
    }
}

fn clear_env() {
    for key in [ENV_API_URL, ENV_API_KEY, ENV_DEBUG] {
        env::remove_var(key);
    }
}

#[tokio::test]
async fn file_store_round_trips_yaml() {
    let dir = tempdir().unwrap();
    let store = FileConfigStore::new(dir.path().join("nested/omnitime.yaml"));

    store.save(&sample()).await.unwrap();
    let written = std::fs::read_to_string(store.path()).unwrap();
    assert!(written.contains("apiUrl: https://time.example.com/api"));
    assert!(written.contains("hostUrl: gitlab.example.com"));

    assert_eq!(store.load().await.unwrap(), sample());
}

#[test]
fn missing_file_loads_defaults() {
    let dir = tempdir().unwrap();
    let store = FileConfigStore::new(dir.path().join("absent.yaml"));
    let settings = tokio_test::block_on(store.load()).unwrap();
    assert_eq!(settings, Settings::default());
}

#[tokio::test]
async fn malformed_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    std::fs::write(&path, "instances: [unterminated").unwrap();

    let err = FileConfigStore::new(&path).load().await.unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[tokio::test]
async fn memory_store_keeps_last_save() {
    let store = MemoryConfigStore::default();
    assert_eq!(store.load().await.unwrap(), Settings::default());
    store.save(&sample()).await.unwrap();
    assert_eq!(store.load().await.unwrap(), sample());
}

#[test]
fn explicit_path_wins() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("custom.yaml");
    assert_eq!(resolve_config_path(Some(&path)).unwrap(), path);
}

#[tokio::test]
#[serial]
async fn environment_overrides_file() {
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("omnitime.yaml");
    FileConfigStore::new(&path).save(&sample()).await.unwrap();

    env::set_var(ENV_API_URL, "https://override.example.com/api");
    env::set_var(ENV_DEBUG, "true");
    let loaded = load_config(Some(&path)).await.unwrap();
    clear_env();

    assert_eq!(loaded.path, path);
    assert_eq!(
        loaded.settings.api_url.as_deref(),
        Some("https://override.example.com/api")
    );
    assert_eq!(loaded.settings.api_key.as_deref(), Some("secret"));
    assert!(loaded.settings.debug);
}

#[tokio::test]
#[serial]
async fn unrecognised_debug_value_is_ignored() {
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("omnitime.yaml");
    let mut settings = sample();
    settings.debug = true;
    FileConfigStore::new(&path).save(&settings).await.unwrap();

    env::set_var(ENV_DEBUG, "sometimes");
    let loaded = load_config(Some(&path)).await.unwrap();
    clear_env();

    assert!(loaded.settings.debug);
}

#[test]
#[serial]
fn env_file_sets_only_unset_keys() {
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("local.env");
    std::fs::write(
        &path,
        "# local overrides\nOMNITIME_API_URL=\"https://local.example.com/api\"\nOMNITIME_API_KEY=from-file\nnot a pair\n",
    )
    .unwrap();

    env::set_var(ENV_API_KEY, "from-shell");
    load_env_file(&path);

    assert_eq!(
        env::var(ENV_API_URL).unwrap(),
        "https://local.example.com/api"
    );
    assert_eq!(env::var(ENV_API_KEY).unwrap(), "from-shell");
    clear_env();
}
