use super::request::{Request, Response};
use async_trait::async_trait;
use std::sync::Arc;
use warden_dns_domain::DomainError;

/// A pipeline stage.
///
/// Instances are shared by every in-flight request, so `resolve` takes
/// `&self` and any internal state must be safe for concurrent access.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Produces a response for the request or fails. Malformed queries are
    /// reported as errors, never panics.
    async fn resolve(&self, request: &Request) -> Result<Response, DomainError>;

    /// Human-readable lines describing the active configuration. No side effects.
    fn configuration(&self) -> Vec<String>;

    fn name(&self) -> String;

    /// Chain introspection hook; only chainable stages return `Some`.
    fn as_chained(&self) -> Option<&dyn ChainedResolver> {
        None
    }
}

/// A stage that delegates to a successor when it does not answer itself.
pub trait ChainedResolver: Resolver {
    /// Links the successor. Called once, while assembling the pipeline.
    fn set_next(&mut self, next: Arc<dyn Resolver>);

    /// The successor, for introspection only.
    fn next(&self) -> Option<&Arc<dyn Resolver>>;
}

/// Successor slot shared by the chained stages.
#[derive(Default)]
pub struct NextResolver(Option<Arc<dyn Resolver>>);

impl NextResolver {
    pub fn set(&mut self, next: Arc<dyn Resolver>) {
        self.0 = Some(next);
    }

    pub fn get(&self) -> Option<&Arc<dyn Resolver>> {
        self.0.as_ref()
    }

    pub async fn resolve(&self, request: &Request) -> Result<Response, DomainError> {
        match &self.0 {
            Some(next) => next.resolve(request).await,
            None => Err(DomainError::Config(
                "resolver has no successor in the chain".to_string(),
            )),
        }
    }
}

/// Links `stages` in order in front of `terminal` and returns the head.
///
/// With no stages the terminal itself is the head.
pub fn chain_resolvers(
    stages: Vec<Box<dyn ChainedResolver>>,
    terminal: Arc<dyn Resolver>,
) -> Arc<dyn Resolver> {
    let mut head = terminal;
    for mut stage in stages.into_iter().rev() {
        stage.set_next(head);
        let linked: Arc<dyn ChainedResolver> = Arc::from(stage);
        head = linked;
    }
    head
}
