use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use warden_dns_application::use_cases::HandleDnsQueryUseCase;
use warden_dns_infrastructure::dns::transport::tcp::{
    read_with_length_prefix, send_with_length_prefix,
};

const TCP_IDLE_TIMEOUT: Duration = Duration::from_secs(10);
const UDP_RECV_BUFFER: usize = 4096;

/// Serves DNS over UDP and TCP on `socket_addr` until `shutdown` is cancelled.
///
/// Every query runs in its own task. A listener that cannot be bound fails
/// the whole server.
pub async fn start_dns_server(
    socket_addr: SocketAddr,
    handler: Arc<HandleDnsQueryUseCase>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let domain = if socket_addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let udp_socket = create_udp_socket(domain, socket_addr).map_err(|e| {
        error!(bind_address = %socket_addr, error = %e, "Cannot bind UDP listener");
        e
    })?;
    let tcp_listener = create_tcp_listener(domain, socket_addr).map_err(|e| {
        error!(bind_address = %socket_addr, error = %e, "Cannot bind TCP listener");
        e
    })?;

    let mut join_set: JoinSet<()> = JoinSet::new();
    join_set.spawn(run_udp_listener(
        Arc::new(udp_socket),
        handler.clone(),
        shutdown.clone(),
    ));
    join_set.spawn(run_tcp_listener(tcp_listener, handler, shutdown.clone()));

    info!(bind_address = %socket_addr, "DNS server ready (udp, tcp)");

    while let Some(joined) = join_set.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "DNS listener task failed");
            shutdown.cancel();
        }
    }
    Ok(())
}

async fn run_udp_listener(
    socket: Arc<UdpSocket>,
    handler: Arc<HandleDnsQueryUseCase>,
    shutdown: CancellationToken,
) {
    let mut recv_buf = [0u8; UDP_RECV_BUFFER];

    loop {
        let (n, from) = tokio::select! {
            _ = shutdown.cancelled() => break,
            received = socket.recv_from(&mut recv_buf) => match received {
                Ok(received) => received,
                Err(e) => {
                    warn!(error = %e, "UDP recv error");
                    continue;
                }
            },
        };

        let packet = recv_buf[..n].to_vec();
        let handler = handler.clone();
        let socket = socket.clone();
        tokio::spawn(async move {
            if let Some(response) = handler.handle_packet(&packet, from.ip()).await {
                if let Err(e) = socket.send_to(&response, from).await {
                    debug!(client = %from, error = %e, "Failed to send UDP response");
                }
            }
        });
    }

    info!("UDP listener stopped");
}

async fn run_tcp_listener(
    listener: TcpListener,
    handler: Arc<HandleDnsQueryUseCase>,
    shutdown: CancellationToken,
) {
    loop {
        let (stream, peer) = tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "TCP accept error");
                    continue;
                }
            },
        };

        let handler = handler.clone();
        let connection_shutdown = shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = connection_shutdown.cancelled() => {}
                _ = serve_tcp_connection(stream, peer, handler) => {}
            }
        });
    }

    info!("TCP listener stopped");
}

/// Answers length-prefixed queries on one connection until the client
/// closes it or stays idle too long.
async fn serve_tcp_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    handler: Arc<HandleDnsQueryUseCase>,
) {
    loop {
        let query = match tokio::time::timeout(
            TCP_IDLE_TIMEOUT,
            read_with_length_prefix(&mut stream),
        )
        .await
        {
            Ok(Ok(query)) => query,
            Ok(Err(reason)) => {
                debug!(client = %peer, reason = %reason, "TCP connection closed");
                return;
            }
            Err(_) => {
                debug!(client = %peer, "TCP connection idle, closing");
                return;
            }
        };

        let Some(response) = handler.handle_packet(&query, peer.ip()).await else {
            continue;
        };
        if let Err(reason) = send_with_length_prefix(&mut stream, &response).await {
            debug!(client = %peer, reason = %reason, "Failed to send TCP response");
            return;
        }
    }
}

fn create_udp_socket(domain: Domain, socket_addr: SocketAddr) -> anyhow::Result<UdpSocket> {
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    socket.bind(&socket_addr.into())?;
    socket.set_nonblocking(true)?;
    let std_socket: std::net::UdpSocket = socket.into();
    Ok(UdpSocket::from_std(std_socket)?)
}

fn create_tcp_listener(domain: Domain, socket_addr: SocketAddr) -> anyhow::Result<TcpListener> {
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;
    socket.set_nonblocking(true)?;
    let std_listener: std::net::TcpListener = socket.into();
    Ok(TcpListener::from_std(std_listener)?)
}
