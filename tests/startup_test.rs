//! Boot-path failures: configuration loading and route registration.

use std::fs;
use std::path::PathBuf;

use serde_json::json;

use route_registry::config::{load_from_env, ConfigError, ServerConfig, CONFIG_ENV};
use route_registry::lifecycle::{build_dispatcher, StartupError};
use route_registry::routing::{HttpMethod, RegistrationError, RouteDefinition};
use route_registry::schema::Schema;

fn write_config(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("route-registry-{}-{}.toml", name, std::process::id()));
    fs::write(&path, content).unwrap();
    path
}

/// All env-var cases share one test so they never race each other.
#[test]
fn test_load_from_env() {
    let good = write_config("good", "[listener]\nbind_address = \"127.0.0.1:9100\"\n");
    std::env::set_var(CONFIG_ENV, &good);
    let config = load_from_env().unwrap();
    assert_eq!(config.listener.bind_address, "127.0.0.1:9100");

    let broken = write_config("broken", "[listener\n");
    std::env::set_var(CONFIG_ENV, &broken);
    assert!(matches!(load_from_env().unwrap_err(), ConfigError::Parse(_)));

    let invalid = write_config("invalid", "[limits]\nmax_body_bytes = 0\n");
    std::env::set_var(CONFIG_ENV, &invalid);
    let err = load_from_env().unwrap_err();
    assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));

    std::env::set_var(CONFIG_ENV, "/definitely/not/here.toml");
    assert!(matches!(load_from_env().unwrap_err(), ConfigError::Io(_)));

    std::env::remove_var(CONFIG_ENV);
    assert!(load_from_env().is_ok());

    for path in [good, broken, invalid] {
        let _ = fs::remove_file(path);
    }
}

#[test]
fn test_failed_registration_aborts_boot() {
    let err = build_dispatcher(&ServerConfig::default(), |b| {
        b.declare(RouteDefinition::new(HttpMethod::Get, "/api/v1/a", "a", Schema::any()))?
            .declare(RouteDefinition::new(HttpMethod::Get, "/api/v1/a", "again", Schema::any()))?;
        Ok(())
    })
    .err()
    .unwrap();
    assert!(matches!(
        err,
        StartupError::Registration(RegistrationError::Duplicate(_))
    ));

    let err = build_dispatcher(&ServerConfig::default(), |b| {
        b.declare(
            RouteDefinition::new(HttpMethod::Post, "/api/v1/b", "b", Schema::any())
                .with_body(Schema::new(json!({"type": "no-such-type"}))),
        )?;
        Ok(())
    })
    .err()
    .unwrap();
    assert!(matches!(
        err,
        StartupError::Registration(RegistrationError::Schema { part: "body", .. })
    ));
}
