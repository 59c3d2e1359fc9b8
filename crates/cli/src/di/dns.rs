use std::sync::Arc;
use tracing::info;
use warden_dns_application::use_cases::{HandleDnsQueryUseCase, PrintConfigurationUseCase};
use warden_dns_domain::Config;
use warden_dns_infrastructure::build_pipeline;

pub struct DnsServices {
    pub handler: Arc<HandleDnsQueryUseCase>,
    pub print_configuration: Arc<PrintConfigurationUseCase>,
}

impl DnsServices {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        info!(
            upstreams = config.upstream.servers.len(),
            "Initializing resolver chain"
        );

        let head = build_pipeline(config)
            .await
            .map_err(|e| anyhow::anyhow!("failed to build resolver chain: {}", e))?;

        Ok(Self {
            handler: Arc::new(HandleDnsQueryUseCase::new(Arc::clone(&head))),
            print_configuration: Arc::new(PrintConfigurationUseCase::new(head)),
        })
    }
}
