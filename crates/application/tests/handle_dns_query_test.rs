mod helpers;

use helpers::{query_message, CallLog, StubTerminal};
use hickory_proto::op::{Message, ResponseCode};
use hickory_proto::rr::RecordType;
use std::net::IpAddr;
use std::sync::Arc;
use warden_dns_application::use_cases::HandleDnsQueryUseCase;
use warden_dns_domain::DomainError;

const CLIENT_IP: IpAddr = IpAddr::V4(std::net::Ipv4Addr::new(192, 168, 1, 100));

#[tokio::test]
async fn test_success_mirrors_recursion_desired() {
    let terminal = Arc::new(StubTerminal::answering(CallLog::default()));
    let use_case = HandleDnsQueryUseCase::new(terminal);

    let reply = use_case
        .execute(CLIENT_IP, query_message("example.com.", RecordType::A))
        .await;

    assert_eq!(reply.response_code(), ResponseCode::NoError);
    assert!(reply.recursion_available());
    assert_eq!(reply.id(), 4242);
    assert_eq!(reply.answers().len(), 1);
}

#[tokio::test]
async fn test_recursion_available_false_when_not_desired() {
    let terminal = Arc::new(StubTerminal::answering(CallLog::default()));
    let use_case = HandleDnsQueryUseCase::new(terminal);
    let mut query = query_message("example.com.", RecordType::A);
    query.set_recursion_desired(false);

    let reply = use_case.execute(CLIENT_IP, query).await;

    assert!(!reply.recursion_available());
}

#[tokio::test]
async fn test_failure_becomes_servfail() {
    let terminal = Arc::new(StubTerminal::failing(
        CallLog::default(),
        DomainError::ParallelTimeout { timeout_ms: 5000 },
    ));
    let use_case = HandleDnsQueryUseCase::new(terminal);

    let reply = use_case
        .execute(CLIENT_IP, query_message("example.com.", RecordType::A))
        .await;

    assert_eq!(reply.response_code(), ResponseCode::ServFail);
    assert_eq!(reply.id(), 4242);
    assert_eq!(reply.queries().len(), 1);
    assert!(reply.answers().is_empty());
}

#[tokio::test]
async fn test_handle_packet_roundtrip() {
    let terminal = Arc::new(StubTerminal::answering(CallLog::default()));
    let use_case = HandleDnsQueryUseCase::new(terminal);
    let packet = query_message("example.com.", RecordType::A).to_vec().unwrap();

    let reply_bytes = use_case.handle_packet(&packet, CLIENT_IP).await.unwrap();
    let reply = Message::from_vec(&reply_bytes).unwrap();

    assert_eq!(reply.id(), 4242);
    assert_eq!(reply.answers().len(), 1);
}

#[tokio::test]
async fn test_handle_packet_garbage_gets_formerr() {
    let terminal = Arc::new(StubTerminal::answering(CallLog::default()));
    let use_case = HandleDnsQueryUseCase::new(terminal.clone());
    let mut packet = vec![0x12, 0x34, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
    packet.extend_from_slice(&[0xff, 0xff, 0xff]);

    let reply_bytes = use_case.handle_packet(&packet, CLIENT_IP).await.unwrap();
    let reply = Message::from_vec(&reply_bytes).unwrap();

    assert_eq!(reply.id(), 0x1234);
    assert_eq!(reply.response_code(), ResponseCode::FormErr);
    assert_eq!(terminal.invocations(), 0);
}

#[tokio::test]
async fn test_handle_packet_drops_short_packets() {
    let terminal = Arc::new(StubTerminal::answering(CallLog::default()));
    let use_case = HandleDnsQueryUseCase::new(terminal);

    assert!(use_case.handle_packet(&[0x00, 0x01], CLIENT_IP).await.is_none());
}
