use crate::ports::Resolver;
use std::sync::Arc;
use tracing::info;

/// Walks the chain from its head and reports each stage's configuration.
pub struct PrintConfigurationUseCase {
    head: Arc<dyn Resolver>,
}

impl PrintConfigurationUseCase {
    pub fn new(head: Arc<dyn Resolver>) -> Self {
        Self { head }
    }

    /// Stops after the first stage that is not chain-introspectable.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current: Option<&dyn Resolver> = Some(self.head.as_ref());

        while let Some(resolver) = current {
            lines.push(format!("-> resolver: '{}'", resolver.name()));
            for line in resolver.configuration() {
                lines.push(format!("     {}", line));
            }
            current = resolver
                .as_chained()
                .and_then(|chained| chained.next())
                .map(|next| next.as_ref());
        }

        lines
    }

    pub fn execute(&self) {
        info!("current configuration:");
        for line in self.lines() {
            info!("{}", line);
        }
    }
}
