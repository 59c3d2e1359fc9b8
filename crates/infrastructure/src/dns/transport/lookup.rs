use std::net::SocketAddr;
use std::time::Duration;
use warden_dns_domain::{DomainError, UpstreamAddr};

/// Turns an upstream address into something connectable, resolving
/// hostnames through the system resolver. The first address returned wins.
pub async fn resolve_upstream_addr(
    addr: &UpstreamAddr,
    timeout: Duration,
) -> Result<SocketAddr, DomainError> {
    if let Some(resolved) = addr.socket_addr() {
        return Ok(resolved);
    }

    let target = addr.to_string();
    let mut addrs = tokio::time::timeout(timeout, tokio::net::lookup_host(&target))
        .await
        .map_err(|_| DomainError::UpstreamTimeout {
            upstream: target.clone(),
        })?
        .map_err(|e| DomainError::network(&target, format!("host lookup failed: {}", e)))?;

    addrs
        .next()
        .ok_or_else(|| DomainError::network(&target, "host lookup returned no addresses"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolved_address_passes_through() {
        let addr = UpstreamAddr::Resolved("9.9.9.9:53".parse().unwrap());
        let resolved = resolve_upstream_addr(&addr, Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(resolved, "9.9.9.9:53".parse::<SocketAddr>().unwrap());
    }

    #[tokio::test]
    async fn test_localhost_resolves() {
        let addr = UpstreamAddr::Unresolved {
            hostname: "localhost".into(),
            port: 5353,
        };
        let resolved = resolve_upstream_addr(&addr, Duration::from_secs(2))
            .await
            .unwrap();
        assert!(resolved.ip().is_loopback());
        assert_eq!(resolved.port(), 5353);
    }
}
