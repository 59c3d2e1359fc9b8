mod handle_dns_query;
mod print_configuration;

pub use handle_dns_query::HandleDnsQueryUseCase;
pub use print_configuration::PrintConfigurationUseCase;
