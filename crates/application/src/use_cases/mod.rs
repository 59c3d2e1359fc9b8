pub mod pipeline;

pub use pipeline::{HandleDnsQueryUseCase, PrintConfigurationUseCase};
