mod helpers;

use helpers::{answered_ips, query_message, MockBehavior, MockDnsServer};
use hickory_proto::op::{Message, ResponseCode};
use hickory_proto::rr::RecordType;
use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};
use warden_dns_application::use_cases::{HandleDnsQueryUseCase, PrintConfigurationUseCase};
use warden_dns_domain::{Config, DomainError};
use warden_dns_infrastructure::build_pipeline;

fn config_with_upstreams(servers: &[&str]) -> Config {
    let mut config = Config::default();
    config.upstream.servers = servers.iter().map(|s| s.to_string()).collect();
    config
}

fn stage_names(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| line.strip_prefix("-> resolver: '"))
        .map(|rest| rest.trim_end_matches('\'').to_string())
        .collect()
}

#[tokio::test]
async fn test_no_upstream_is_a_config_error() {
    let result = build_pipeline(&config_with_upstreams(&[])).await;
    assert!(matches!(result, Err(DomainError::Config(_))));
}

#[tokio::test]
async fn test_chain_order_with_single_upstream() {
    let head = build_pipeline(&config_with_upstreams(&["udp://127.0.0.1:5353"]))
        .await
        .unwrap();

    let lines = PrintConfigurationUseCase::new(head).lines();
    assert_eq!(
        stage_names(&lines),
        vec![
            "client_names",
            "query_logging",
            "conditional_upstream",
            "custom_dns",
            "blocking",
            "caching",
            "upstream",
        ]
    );
    assert!(lines.contains(&"     upstream 'udp://127.0.0.1:5353'".to_string()));
}

#[tokio::test]
async fn test_several_upstreams_end_in_parallel_race_without_cache() {
    let mut config = config_with_upstreams(&["udp://127.0.0.1:5353", "tcp://127.0.0.1:5354"]);
    config.caching.enabled = false;

    let head = build_pipeline(&config).await.unwrap();
    let names = stage_names(&PrintConfigurationUseCase::new(head).lines());

    assert!(!names.contains(&"caching".to_string()));
    assert_eq!(names.last().map(String::as_str), Some("parallel_best"));
}

#[tokio::test]
async fn test_custom_dns_answers_without_contacting_upstream() {
    let server = MockDnsServer::start(MockBehavior::default()).await;
    let mut config = config_with_upstreams(&[format!("udp://{}", server.addr()).as_str()]);
    config.custom_dns.mapping = BTreeMap::from([(
        "nas.lan".to_string(),
        vec!["192.168.178.2".to_string()],
    )]);

    let use_case = HandleDnsQueryUseCase::new(build_pipeline(&config).await.unwrap());
    let reply = use_case
        .execute(
            IpAddr::V4(Ipv4Addr::new(192, 168, 178, 20)),
            query_message("nas.lan.", RecordType::A),
        )
        .await;

    assert_eq!(
        answered_ips(&reply),
        vec![IpAddr::V4(Ipv4Addr::new(192, 168, 178, 2))]
    );
    assert!(reply.recursion_available());
    assert_eq!(server.udp_queries(), 0);
}

#[tokio::test]
async fn test_packets_flow_through_cache_and_blocking() {
    let server = MockDnsServer::start(MockBehavior::default()).await;
    let mut config = config_with_upstreams(&[format!("udp://{}", server.addr()).as_str()]);
    config.blocking.black_lists =
        BTreeMap::from([("ads".to_string(), vec!["ads.example.com".to_string()])]);
    config.blocking.client_groups_block =
        BTreeMap::from([("default".to_string(), vec!["ads".to_string()])]);

    let use_case = HandleDnsQueryUseCase::new(build_pipeline(&config).await.unwrap());
    let client = IpAddr::V4(Ipv4Addr::LOCALHOST);
    let packet = query_message("example.com.", RecordType::A).to_vec().unwrap();

    for _ in 0..2 {
        let reply = use_case.handle_packet(&packet, client).await.unwrap();
        let reply = Message::from_vec(&reply).unwrap();
        assert_eq!(reply.id(), 4711);
        assert_eq!(reply.response_code(), ResponseCode::NoError);
        assert_eq!(
            answered_ips(&reply),
            vec![IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34))]
        );
    }
    assert_eq!(server.udp_queries(), 1);

    let blocked = query_message("ads.example.com.", RecordType::A).to_vec().unwrap();
    let reply = Message::from_vec(&use_case.handle_packet(&blocked, client).await.unwrap()).unwrap();
    assert_eq!(answered_ips(&reply), vec![IpAddr::V4(Ipv4Addr::UNSPECIFIED)]);
    assert_eq!(server.udp_queries(), 1);
}

#[tokio::test]
async fn test_unreachable_upstream_yields_servfail() {
    let server = MockDnsServer::start(MockBehavior {
        silent: true,
        ..MockBehavior::default()
    })
    .await;
    let mut config = config_with_upstreams(&[format!("udp://{}", server.addr()).as_str()]);
    config.upstream.query_timeout_ms = 200;

    let use_case = HandleDnsQueryUseCase::new(build_pipeline(&config).await.unwrap());
    let reply = use_case
        .execute(
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            query_message("example.com.", RecordType::A),
        )
        .await;

    assert_eq!(reply.response_code(), ResponseCode::ServFail);
    assert_eq!(reply.id(), 4711);
    assert_eq!(reply.queries().len(), 1);
}
