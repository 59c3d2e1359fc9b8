use hickory_proto::op::{Message, MessageType};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{RData, Record};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};
use tokio::task::AbortHandle;

/// How the loopback responder treats incoming queries.
#[derive(Debug, Clone)]
pub struct MockBehavior {
    pub answer: Ipv4Addr,
    pub ttl: u32,
    /// Reply over UDP with TC set and no answers, forcing a TCP retry.
    pub truncate_udp: bool,
    /// Reply with an id that does not match the query.
    pub wrong_id: bool,
    /// Read queries but never reply.
    pub silent: bool,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            answer: Ipv4Addr::new(93, 184, 216, 34),
            ttl: 300,
            truncate_udp: false,
            wrong_id: false,
            silent: false,
        }
    }
}

/// Tiny DNS responder on loopback, listening on UDP and TCP on one port.
pub struct MockDnsServer {
    addr: SocketAddr,
    udp_queries: Arc<AtomicUsize>,
    tcp_queries: Arc<AtomicUsize>,
    tasks: Vec<AbortHandle>,
}

impl MockDnsServer {
    pub async fn start(behavior: MockBehavior) -> Self {
        let (udp, tcp) = bind_pair().await;
        let addr = udp.local_addr().unwrap();
        let udp_queries = Arc::new(AtomicUsize::new(0));
        let tcp_queries = Arc::new(AtomicUsize::new(0));

        let udp_task = {
            let behavior = behavior.clone();
            let counter = udp_queries.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                while let Ok((len, peer)) = udp.recv_from(&mut buf).await {
                    counter.fetch_add(1, Ordering::SeqCst);
                    if let Some(reply) = build_reply(&buf[..len], &behavior, true) {
                        let _ = udp.send_to(&reply, peer).await;
                    }
                }
            })
        };

        let tcp_task = {
            let counter = tcp_queries.clone();
            tokio::spawn(async move {
                while let Ok((mut stream, _)) = tcp.accept().await {
                    let behavior = behavior.clone();
                    let counter = counter.clone();
                    tokio::spawn(async move {
                        let mut len_buf = [0u8; 2];
                        if stream.read_exact(&mut len_buf).await.is_err() {
                            return;
                        }
                        let mut query = vec![0u8; u16::from_be_bytes(len_buf) as usize];
                        if stream.read_exact(&mut query).await.is_err() {
                            return;
                        }
                        counter.fetch_add(1, Ordering::SeqCst);
                        if let Some(reply) = build_reply(&query, &behavior, false) {
                            let _ = stream.write_all(&(reply.len() as u16).to_be_bytes()).await;
                            let _ = stream.write_all(&reply).await;
                        }
                    });
                }
            })
        };

        Self {
            addr,
            udp_queries,
            tcp_queries,
            tasks: vec![udp_task.abort_handle(), tcp_task.abort_handle()],
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn udp_queries(&self) -> usize {
        self.udp_queries.load(Ordering::SeqCst)
    }

    pub fn tcp_queries(&self) -> usize {
        self.tcp_queries.load(Ordering::SeqCst)
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

async fn bind_pair() -> (UdpSocket, TcpListener) {
    for _ in 0..20 {
        let udp = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = udp.local_addr().unwrap();
        if let Ok(tcp) = TcpListener::bind(addr).await {
            return (udp, tcp);
        }
    }
    panic!("no free port for UDP and TCP on loopback");
}

fn build_reply(query: &[u8], behavior: &MockBehavior, over_udp: bool) -> Option<Vec<u8>> {
    if behavior.silent {
        return None;
    }
    let query = Message::from_vec(query).ok()?;

    let mut reply = Message::new();
    reply
        .set_id(if behavior.wrong_id { query.id().wrapping_add(1) } else { query.id() })
        .set_message_type(MessageType::Response)
        .set_recursion_desired(query.recursion_desired())
        .set_recursion_available(true)
        .add_queries(query.queries().iter().cloned());

    if over_udp && behavior.truncate_udp {
        reply.set_truncated(true);
    } else if let Some(question) = query.queries().first() {
        reply.add_answer(Record::from_rdata(
            question.name().clone(),
            behavior.ttl,
            RData::A(A(behavior.answer)),
        ));
    }

    reply.to_vec().ok()
}
