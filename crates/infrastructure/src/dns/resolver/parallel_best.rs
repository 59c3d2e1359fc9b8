use super::upstream::UpstreamResolver;
use async_trait::async_trait;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::timeout;
use tracing::{debug, warn, Instrument};
use warden_dns_application::ports::{Request, Resolver, Response};
use warden_dns_domain::{DomainError, Upstream, UpstreamFailure};

/// One racing member and the label its failures are reported under.
pub struct ParallelMember {
    pub label: String,
    pub resolver: Arc<dyn Resolver>,
}

impl ParallelMember {
    pub fn new(label: impl Into<String>, resolver: Arc<dyn Resolver>) -> Self {
        Self {
            label: label.into(),
            resolver,
        }
    }
}

/// Aborts every member task when dropped, including when the caller stops
/// polling the race before it finishes.
struct AbortOnDrop(Vec<AbortHandle>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

/// Races the same request against every member.
///
/// The first successful answer wins and every other member task is aborted.
/// Failures are collected without cancelling siblings; when all members
/// fail, the error lists each cause. The whole race is bounded by
/// `timeout`, independent of the members' own timeouts.
///
/// Members already finished successfully when the winner is observed are
/// compared by configuration order, so simultaneous answers resolve
/// deterministically to the earliest configured member.
pub struct ParallelBestResolver {
    members: Vec<ParallelMember>,
    timeout: Duration,
}

impl ParallelBestResolver {
    pub fn new(members: Vec<ParallelMember>, timeout: Duration) -> Result<Self, DomainError> {
        if members.is_empty() {
            return Err(DomainError::Config(
                "parallel resolver needs at least one upstream".to_string(),
            ));
        }
        Ok(Self { members, timeout })
    }

    pub fn from_upstreams(
        upstreams: &[Upstream],
        query_timeout: Duration,
        parallel_timeout: Duration,
    ) -> Result<Self, DomainError> {
        let members = upstreams
            .iter()
            .map(|upstream| {
                let resolver = UpstreamResolver::new(upstream.clone(), query_timeout)?;
                Ok(ParallelMember::new(upstream.to_string(), Arc::new(resolver)))
            })
            .collect::<Result<Vec<_>, DomainError>>()?;
        Self::new(members, parallel_timeout)
    }

    fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}

#[async_trait]
impl Resolver for ParallelBestResolver {
    async fn resolve(&self, request: &Request) -> Result<Response, DomainError> {
        debug!(members = self.members.len(), "Racing all upstreams");

        let mut abort_handles = AbortOnDrop(Vec::with_capacity(self.members.len()));
        let mut tasks = FuturesUnordered::new();

        for (index, member) in self.members.iter().enumerate() {
            let resolver = Arc::clone(&member.resolver);
            let request = request.clone();
            let span = request.span.clone();
            let handle =
                tokio::spawn(async move { resolver.resolve(&request).await }.instrument(span));
            abort_handles.0.push(handle.abort_handle());
            tasks.push(handle.map(move |joined| (index, joined)));
        }

        let race = timeout(self.timeout, async {
            let mut failures: Vec<(usize, UpstreamFailure)> = Vec::new();

            while let Some((index, joined)) = tasks.next().await {
                match joined {
                    Ok(Ok(response)) => {
                        let mut winner = (index, response);
                        while let Some(Some((other, joined))) = tasks.next().now_or_never() {
                            if let Ok(Ok(response)) = joined {
                                if other < winner.0 {
                                    winner = (other, response);
                                }
                            }
                        }
                        debug!(upstream = %self.members[winner.0].label, "Fastest response");
                        return Ok(winner.1);
                    }
                    Ok(Err(e)) => {
                        debug!(upstream = %self.members[index].label, error = %e, "Upstream failed");
                        failures.push((index, UpstreamFailure::new(&self.members[index].label, e)));
                    }
                    Err(e) => {
                        warn!(upstream = %self.members[index].label, error = %e, "Upstream task panicked");
                        failures.push((
                            index,
                            UpstreamFailure::new(
                                &self.members[index].label,
                                DomainError::network(&self.members[index].label, e),
                            ),
                        ));
                    }
                }
            }

            failures.sort_by_key(|(index, _)| *index);
            Err(DomainError::AllUpstreamsFailed(
                failures.into_iter().map(|(_, failure)| failure).collect(),
            ))
        })
        .await;
        drop(abort_handles);

        match race {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_ms = self.timeout_ms(), "No upstream answered in time");
                Err(DomainError::ParallelTimeout {
                    timeout_ms: self.timeout_ms(),
                })
            }
        }
    }

    fn configuration(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .members
            .iter()
            .map(|member| format!("upstream '{}'", member.label))
            .collect();
        lines.push(format!("timeout = {}ms", self.timeout_ms()));
        lines
    }

    fn name(&self) -> String {
        "parallel_best".to_string()
    }
}
