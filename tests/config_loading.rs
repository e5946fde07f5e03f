//! Integration tests for config loading across all file formats.

use bootproxy::config::model::{Config, DEFAULT_LOCAL_BOOT_URI, DEFAULT_UPSTREAM_BASE_URL};
use bootproxy::config::sources::parse_config_str;
use bootproxy::config::validation::validate;

fn load_example(name: &str) -> String {
    let path = format!("example/{name}");
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read {path}: {e}"))
}

#[cfg(feature = "yaml")]
#[test]
fn yaml_example_loads_and_validates() {
    let content = load_example("bootproxy.yaml");
    let config = parse_config_str("yaml", &content, "bootproxy.yaml").unwrap();
    validate(&config).unwrap();
    assert_eq!(config.upstream.timeout, 3000);
    assert_eq!(config.rewrite.store_uri, "https://store.example.org");
}

#[cfg(feature = "yaml")]
#[test]
fn minimal_yaml_fills_in_defaults() {
    let content = load_example("minimal.yaml");
    let config = parse_config_str("yaml", &content, "minimal.yaml").unwrap();
    validate(&config).unwrap();
    assert_eq!(config.rewrite.store_uri, "http://localhost:3000");
    assert_eq!(config.rewrite.local_boot_uri, DEFAULT_LOCAL_BOOT_URI);
    assert_eq!(config.upstream.base_url, DEFAULT_UPSTREAM_BASE_URL);
}

#[cfg(feature = "json")]
#[test]
fn json_example_loads_and_validates() {
    let content = load_example("bootproxy.json");
    let config = parse_config_str("json", &content, "bootproxy.json").unwrap();
    validate(&config).unwrap();
    assert_eq!(config.rewrite.store_uri, "https://store.example.org");
}

#[cfg(feature = "toml")]
#[test]
fn toml_example_loads_and_validates() {
    let content = load_example("bootproxy.toml");
    let config = parse_config_str("toml", &content, "bootproxy.toml").unwrap();
    validate(&config).unwrap();
    assert_eq!(config.upstream.timeout, 3000);
}

#[cfg(all(feature = "yaml", feature = "json", feature = "toml"))]
#[test]
fn all_formats_produce_equivalent_configs() {
    let yaml_config = parse_config_str("yaml", &load_example("bootproxy.yaml"), "yaml").unwrap();
    let json_config = parse_config_str("json", &load_example("bootproxy.json"), "json").unwrap();
    let toml_config = parse_config_str("toml", &load_example("bootproxy.toml"), "toml").unwrap();

    assert_eq!(yaml_config, json_config);
    assert_eq!(yaml_config, toml_config);
}

#[test]
fn unsupported_format_returns_error() {
    let result = parse_config_str("xml", "{}", "test.xml");
    assert!(result.is_err());
}

#[test]
fn invalid_config_fails_validation() {
    let broken = r#"{"upstream": {"base_url": "http://no-trailing-slash", "timeout": 0}}"#;
    let config: Config = serde_json::from_str(broken).unwrap();
    let errors = validate(&config).unwrap_err();
    assert_eq!(errors.len(), 2);
}
