use super::*;

use std::{
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("deck_server_config_test_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join(name);
    fs::write(&path, contents).expect("write settings");
    path
}

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn missing_file_and_env_yield_defaults() {
    let settings = load_settings_from(Path::new("/nonexistent/server.toml"), no_env);
    assert_eq!(settings, Settings::default());
}

#[test]
fn file_values_override_defaults() {
    let path = temp_file(
        "server.toml",
        "bind_addr = \"0.0.0.0:9000\"\ndatabase_url = \"./var/decks.db\"\n",
    );

    let settings = load_settings_from(&path, no_env);
    assert_eq!(settings.bind_addr, "0.0.0.0:9000");
    assert_eq!(settings.database_url, "sqlite://./var/decks.db");
    assert_eq!(settings.image_base_url, Settings::default().image_base_url);

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn prefixed_env_wins_over_plain_env_and_file() {
    let path = temp_file("server.toml", "bind_addr = \"0.0.0.0:9000\"\n");
    let env = |key: &str| match key {
        "BIND_ADDR" => Some("127.0.0.1:7000".to_string()),
        "APP__BIND_ADDR" => Some("127.0.0.1:7001".to_string()),
        "IMAGE_BASE_URL" => Some("http://cdn.test/img".to_string()),
        _ => None,
    };

    let settings = load_settings_from(&path, env);
    assert_eq!(settings.bind_addr, "127.0.0.1:7001");
    assert_eq!(settings.image_base_url, "http://cdn.test/img");

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn malformed_file_is_ignored() {
    let path = temp_file("server.toml", "bind_addr = [not toml");
    let settings = load_settings_from(&path, no_env);
    assert_eq!(settings, Settings::default());
    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(
        normalize_database_url("data\\win\\test.db"),
        "sqlite://data/win/test.db"
    );
}

#[test]
fn keeps_urls_with_scheme_and_memory() {
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
    assert_eq!(
        normalize_database_url("sqlite://./data/x.db"),
        "sqlite://./data/x.db"
    );
    assert_eq!(normalize_database_url("  "), Settings::default().database_url);
}
