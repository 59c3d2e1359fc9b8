use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

const DEFAULT_DNS_PORT: u16 = 53;

/// Upstream server address that may or may not be a literal IP.
///
/// Hostnames are resolved by the transport at connect time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UpstreamAddr {
    Resolved(SocketAddr),
    Unresolved { hostname: Arc<str>, port: u16 },
}

impl UpstreamAddr {
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        match self {
            UpstreamAddr::Resolved(addr) => Some(*addr),
            UpstreamAddr::Unresolved { .. } => None,
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            UpstreamAddr::Resolved(addr) => addr.port(),
            UpstreamAddr::Unresolved { port, .. } => *port,
        }
    }

    /// Host part as used for connecting: the IP literal or the hostname.
    pub fn host(&self) -> String {
        match self {
            UpstreamAddr::Resolved(addr) => addr.ip().to_string(),
            UpstreamAddr::Unresolved { hostname, .. } => hostname.to_string(),
        }
    }
}

impl fmt::Display for UpstreamAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamAddr::Resolved(addr) => write!(f, "{}", addr),
            UpstreamAddr::Unresolved { hostname, port } => write!(f, "{}:{}", hostname, port),
        }
    }
}

/// A configured upstream DNS endpoint. Immutable after parsing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Upstream {
    Udp { addr: UpstreamAddr },
    Tcp { addr: UpstreamAddr },
    Tls { addr: UpstreamAddr, hostname: Arc<str> },
    Https { url: Arc<str>, hostname: Arc<str> },
}

impl Upstream {
    pub fn addr(&self) -> Option<&UpstreamAddr> {
        match self {
            Upstream::Udp { addr } | Upstream::Tcp { addr } | Upstream::Tls { addr, .. } => {
                Some(addr)
            }
            Upstream::Https { .. } => None,
        }
    }

    pub fn protocol_name(&self) -> &'static str {
        match self {
            Upstream::Udp { .. } => "UDP",
            Upstream::Tcp { .. } => "TCP",
            Upstream::Tls { .. } => "TLS",
            Upstream::Https { .. } => "HTTPS",
        }
    }
}

fn parse_host_port(s: &str) -> Option<(&str, u16)> {
    if s.starts_with('[') {
        let end = s.find(']')?;
        let host = &s[1..end];
        let rest = &s[end + 1..];
        let port_str = rest.strip_prefix(':')?;
        let port = port_str.parse::<u16>().ok()?;
        Some((host, port))
    } else {
        let (host, port_str) = s.rsplit_once(':')?;
        let port = port_str.parse::<u16>().ok()?;
        Some((host, port))
    }
}

fn parse_upstream_addr(addr_str: &str, default_port: u16) -> Result<UpstreamAddr, String> {
    if let Ok(addr) = addr_str.parse::<SocketAddr>() {
        return Ok(UpstreamAddr::Resolved(addr));
    }
    if let Ok(ip) = addr_str.parse::<IpAddr>() {
        return Ok(UpstreamAddr::Resolved(SocketAddr::new(ip, default_port)));
    }
    if let Some((host, port)) = parse_host_port(addr_str) {
        if host.is_empty() {
            return Err(format!("Invalid address '{}'", addr_str));
        }
        return Ok(UpstreamAddr::Unresolved {
            hostname: host.into(),
            port,
        });
    }
    if !addr_str.is_empty() && !addr_str.contains(['/', ':', ' ']) {
        return Ok(UpstreamAddr::Unresolved {
            hostname: addr_str.into(),
            port: default_port,
        });
    }
    Err(format!("Invalid address '{}'", addr_str))
}

impl FromStr for Upstream {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(addr_str) = s.strip_prefix("udp://") {
            let addr = parse_upstream_addr(addr_str, DEFAULT_DNS_PORT)
                .map_err(|_| format!("Invalid UDP address '{}'", addr_str))?;
            return Ok(Upstream::Udp { addr });
        }
        if let Some(addr_str) = s.strip_prefix("tcp://") {
            let addr = parse_upstream_addr(addr_str, DEFAULT_DNS_PORT)
                .map_err(|_| format!("Invalid TCP address '{}'", addr_str))?;
            return Ok(Upstream::Tcp { addr });
        }
        if let Some(rest) = s.strip_prefix("tls://") {
            let addr = parse_upstream_addr(rest, 853).map_err(|_| {
                format!(
                    "Invalid TLS format '{}'. Expected 'tls://IP:PORT' or 'tls://HOSTNAME:PORT'",
                    s
                )
            })?;
            let hostname: Arc<str> = addr.host().into();
            return Ok(Upstream::Tls { addr, hostname });
        }
        if s.starts_with("https://") {
            let url: Arc<str> = s.into();
            let hostname: Arc<str> = s
                .strip_prefix("https://")
                .and_then(|rest| rest.split('/').next())
                .filter(|host| !host.is_empty())
                .ok_or_else(|| format!("Invalid HTTPS URL: {}", s))?
                .into();
            return Ok(Upstream::Https { url, hostname });
        }
        if let Ok(addr) = s.parse::<SocketAddr>() {
            return Ok(Upstream::Udp {
                addr: UpstreamAddr::Resolved(addr),
            });
        }
        if let Ok(ip) = s.parse::<IpAddr>() {
            return Ok(Upstream::Udp {
                addr: UpstreamAddr::Resolved(SocketAddr::new(ip, DEFAULT_DNS_PORT)),
            });
        }
        Err(format!(
            "Invalid DNS endpoint format: '{}'. Expected: udp://HOST:PORT, tcp://HOST:PORT, tls://HOST:PORT, https://URL, IP:PORT or IP",
            s
        ))
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Upstream::Udp { addr } => write!(f, "udp://{}", addr),
            Upstream::Tcp { addr } => write!(f, "tcp://{}", addr),
            Upstream::Tls { addr, hostname } => write!(f, "tls://{}:{}", hostname, addr.port()),
            Upstream::Https { url, .. } => write!(f, "{}", url),
        }
    }
}
