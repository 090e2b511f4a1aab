use std::path::PathBuf;
use std::time::Duration;

use dircast::cli::Args;
use dircast::config::{Config, FileConfig};

fn make_args(port: Option<u16>, name: Option<String>) -> Args {
    Args {
        path: PathBuf::from("."),
        port,
        name,
        config: None,
    }
}

#[test]
fn defaults_when_nothing_set() {
    let config = Config::resolve(None, &make_args(None, None));
    assert_eq!(config.port, 1338);
    assert_eq!(config.notify_interval, Duration::from_secs(30));
    assert!(
        config.name.starts_with("dircast 1.0: "),
        "expected default friendly name, got: {}",
        config.name
    );
}

#[test]
fn cli_flag_overrides_default() {
    let config = Config::resolve(None, &make_args(Some(9000), None));
    assert_eq!(config.port, 9000);
}

#[test]
fn toml_overrides_default() {
    let file = FileConfig {
        port: Some(7777),
        name: None,
        notify_interval_secs: Some(120),
    };
    let config = Config::resolve(Some(file), &make_args(None, None));
    assert_eq!(config.port, 7777);
    assert_eq!(config.notify_interval, Duration::from_secs(120));
}

#[test]
fn cli_overrides_toml() {
    let file = FileConfig {
        port: Some(7777),
        name: Some("from file".to_string()),
        notify_interval_secs: None,
    };
    let config = Config::resolve(Some(file), &make_args(Some(9000), Some("from cli".to_string())));
    assert_eq!(config.port, 9000);
    assert_eq!(config.name, "from cli");
}

#[test]
fn zero_notify_interval_is_clamped() {
    let file = FileConfig {
        port: None,
        name: None,
        notify_interval_secs: Some(0),
    };
    let config = Config::resolve(Some(file), &make_args(None, None));
    assert_eq!(config.notify_interval, Duration::from_secs(1));
}

#[test]
fn toml_parse() {
    let parsed: FileConfig = toml::from_str("port = 9000\nname = \"Living Room\"\n").unwrap();
    assert_eq!(parsed.port, Some(9000));
    assert_eq!(parsed.name.as_deref(), Some("Living Room"));
}

#[test]
fn toml_unknown_fields_ignored() {
    let parsed: Result<FileConfig, _> = toml::from_str("port = 9000\nfuture_key = true\n");
    assert!(parsed.is_ok());
}
