use netdial::core::config::{loader, model::DialConfig, ListenMode};

#[test]
fn loader_initializes_and_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");

    let cfg = loader::load_or_init(dir.path()).expect("init defaults");
    assert_eq!(cfg, DialConfig::default());

    let mut changed = cfg;
    changed.cache_enabled = true;
    changed.cache_ttl_micros = 60_000_000;
    changed.listen = ListenMode::MultiClient;
    changed.split_by_family = true;
    loader::save(&changed, dir.path()).expect("save");

    let reloaded = loader::load_or_init(dir.path()).expect("reload");
    assert_eq!(reloaded, changed);
}

#[test]
fn config_json_uses_camel_case_keys() {
    let dir = tempfile::tempdir().expect("tempdir");
    loader::load_or_init(dir.path()).expect("init defaults");
    let raw =
        std::fs::read_to_string(dir.path().join("dial-config.json")).expect("read config file");
    assert!(raw.contains("\"connectTimeoutMicros\""), "{raw}");
    assert!(raw.contains("\"cacheClearOnNextUse\""), "{raw}");
}
