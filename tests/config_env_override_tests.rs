//! Environment variable overrides applied after the configuration files.
//!
//! Kept in its own test binary: it mutates the process environment.

use articles::config::{AppConfig, Environment};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_env_vars_override_file_values() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("appsettings.yaml"),
        "jwt:\n  key: file-key\ndatabase:\n  url: postgres://file/articles\n",
    )
    .unwrap();

    // SAFETY: the only test in this binary, no other thread reads the environment.
    unsafe {
        std::env::remove_var("APP_JWT_KEY");
        std::env::remove_var("APP_DATABASE_URL");
    }

    let from_file = AppConfig::load(dir.path(), &Environment::Production).unwrap();
    assert_eq!(from_file.jwt.key, "file-key");
    assert_eq!(
        from_file.database.url.as_deref(),
        Some("postgres://file/articles")
    );

    unsafe {
        std::env::set_var("APP_JWT_KEY", "env-key");
        std::env::set_var("APP_DATABASE_URL", "postgres://env/articles");
    }

    let overridden = AppConfig::load(dir.path(), &Environment::Production).unwrap();

    unsafe {
        std::env::remove_var("APP_JWT_KEY");
        std::env::remove_var("APP_DATABASE_URL");
    }

    assert_eq!(overridden.jwt.key, "env-key");
    assert_eq!(
        overridden.database.url.as_deref(),
        Some("postgres://env/articles")
    );
}
