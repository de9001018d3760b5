use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use headcount::config::HeadcountdConfig;
use headcount::ObjectClass;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "HEADCOUNT_CONFIG",
        "HEADCOUNT_API_ADDR",
        "HEADCOUNT_SOURCE_URL",
        "HEADCOUNT_DETECTOR",
        "HEADCOUNT_REMOTE_URL",
        "HEADCOUNT_TARGET_CLASS",
        "HEADCOUNT_INTERVAL_MS",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_defaults_without_a_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = HeadcountdConfig::load().expect("load defaults");

    assert_eq!(cfg.api_addr, "0.0.0.0:5000");
    assert_eq!(cfg.source.url, "stub://camera0");
    assert_eq!(cfg.source.target_fps, 10);
    assert_eq!(cfg.detector.backend, "stub");
    assert_eq!(cfg.detector.target_class, ObjectClass::Person);
    assert_eq!(cfg.interval, Duration::from_millis(100));

    clear_env();
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "api": {
            "addr": "127.0.0.1:9100"
        },
        "source": {
            "url": "http://cam.local/stream",
            "target_fps": 5,
            "width": 320,
            "height": 240
        },
        "detector": {
            "backend": "remote",
            "remote_url": "http://detector.local/detect",
            "timeout_secs": 2,
            "target_class": "person"
        },
        "loop": {
            "interval_ms": 250
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("HEADCOUNT_CONFIG", file.path());
    std::env::set_var("HEADCOUNT_TARGET_CLASS", "vehicle");
    std::env::set_var("HEADCOUNT_INTERVAL_MS", "50");

    let cfg = HeadcountdConfig::load().expect("load config");

    assert_eq!(cfg.api_addr, "127.0.0.1:9100");
    assert_eq!(cfg.source.url, "http://cam.local/stream");
    assert_eq!(cfg.source.target_fps, 5);
    assert_eq!(cfg.source.width, 320);
    assert_eq!(cfg.source.height, 240);
    assert_eq!(cfg.detector.backend, "remote");
    assert_eq!(
        cfg.detector.remote_url.as_deref(),
        Some("http://detector.local/detect")
    );
    assert_eq!(cfg.detector.timeout, Duration::from_secs(2));
    assert_eq!(cfg.detector.target_class, ObjectClass::Vehicle);
    assert_eq!(cfg.interval, Duration::from_millis(50));

    clear_env();
}

#[test]
fn rejects_remote_backend_without_a_url() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("HEADCOUNT_DETECTOR", "remote");
    let err = HeadcountdConfig::load().expect_err("remote without url must fail");
    assert!(err.to_string().contains("remote_url"));

    clear_env();
}

#[test]
fn rejects_unknown_target_classes_and_backends() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("HEADCOUNT_TARGET_CLASS", "toaster");
    assert!(HeadcountdConfig::load().is_err());
    clear_env();

    std::env::set_var("HEADCOUNT_DETECTOR", "yolo9000");
    assert!(HeadcountdConfig::load().is_err());
    clear_env();
}

#[test]
fn rejects_bad_api_addresses() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("HEADCOUNT_API_ADDR", "not-an-address");
    assert!(HeadcountdConfig::load().is_err());

    clear_env();
}
