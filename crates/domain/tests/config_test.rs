use warden_dns_domain::config::CachingConfig;
use warden_dns_domain::{Config, ConfigError, LogFormat};

#[test]
fn test_config_default_values() {
    let config = Config::default();

    assert_eq!(config.server.dns_port, 53);
    assert_eq!(config.server.bind_address, "0.0.0.0");
    assert_eq!(config.upstream.servers.len(), 2);
    assert_eq!(config.upstream.query_timeout_ms, 2000);
    assert_eq!(config.upstream.parallel_timeout_ms, 5000);
    assert!(config.caching.enabled);
    assert_eq!(config.caching.max_entries, 100_000);
    assert_eq!(config.custom_dns.ttl_secs, 3600);
    assert_eq!(config.blocking.block_ttl_secs, 21_600);
    assert!(!config.blocking.is_enabled());
    assert!(config.query_log.dir.is_none());
    assert_eq!(config.query_log.channel_capacity, 10_000);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.format, LogFormat::Text);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_deserialization_with_all_sections() {
    let toml_str = r#"
        [server]
        dns_port = 5353
        bind_address = "127.0.0.1"

        [upstream]
        servers = ["udp://9.9.9.9:53", "tls://1.1.1.1:853", "https://dns.google/dns-query"]
        query_timeout_ms = 1500
        parallel_timeout_ms = 3000

        [client_lookup]
        upstream = "udp://192.168.178.1"
        single_name_order = [2, 1]
        [client_lookup.clients]
        laptop = ["192.168.178.29"]

        [query_log]
        dir = "/var/log/warden"
        per_client = true
        log_retention_days = 7

        [conditional.mapping]
        "fritz.box" = "udp://192.168.178.1:53"

        [custom_dns.mapping]
        "printer.lan" = ["192.168.178.3", "2001:db8::3"]

        [blocking.black_lists]
        ads = ["ads.example.com"]
        [blocking.client_groups_block]
        default = ["ads"]

        [caching]
        max_entries = 500
        min_ttl_secs = 60

        [logging]
        level = "debug"
        format = "json"
    "#;

    let config = Config::from_toml(toml_str).expect("config should parse");

    assert_eq!(config.server.dns_port, 5353);
    assert_eq!(config.upstream.parsed_servers().unwrap().len(), 3);
    assert_eq!(config.upstream.parallel_timeout_ms, 3000);
    assert_eq!(config.client_lookup.single_name_order, vec![2, 1]);
    assert!(config.query_log.per_client);
    assert_eq!(config.query_log.log_retention_days, 7);
    assert_eq!(config.custom_dns.mapping["printer.lan"].len(), 2);
    assert!(config.blocking.is_enabled());
    assert_eq!(config.caching.max_entries, 500);
    assert_eq!(config.logging.format, LogFormat::Json);
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_rejects_zero_upstreams() {
    let config = Config::from_toml("[upstream]\nservers = []\n").unwrap();

    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::Validation(msg) if msg.contains("No upstream")));
}

#[test]
fn test_validate_rejects_zero_query_log_capacity() {
    let config = Config::from_toml("[query_log]\nchannel_capacity = 0\n").unwrap();

    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::Validation(msg) if msg.contains("channel capacity")));
}

#[test]
fn test_validate_rejects_bad_upstream() {
    let config = Config::from_toml("[upstream]\nservers = [\"ftp://nope\"]\n").unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_unknown_block_group() {
    let toml_str = r#"
        [blocking.black_lists]
        ads = ["ads.example.com"]
        [blocking.client_groups_block]
        default = ["malware"]
    "#;
    let config = Config::from_toml(toml_str).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_invalid_custom_address() {
    let toml_str = r#"
        [custom_dns.mapping]
        "printer.lan" = ["not-an-ip"]
    "#;
    let config = Config::from_toml(toml_str).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_parse_error_is_reported() {
    let result = Config::from_toml("[server\n");
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_caching_clamp_ttl() {
    let config = CachingConfig {
        min_ttl_secs: 60,
        max_ttl_secs: 3600,
        ..CachingConfig::default()
    };
    assert_eq!(config.clamp_ttl(5), 60);
    assert_eq!(config.clamp_ttl(300), 300);
    assert_eq!(config.clamp_ttl(86_400), 3600);

    let unbounded = CachingConfig::default();
    assert_eq!(unbounded.clamp_ttl(86_400), 86_400);
}
