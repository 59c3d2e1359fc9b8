use warden_dns_domain::{CliOverrides, Config};

/// Loads the configuration file (or defaults), applies the command line
/// overrides and validates the result.
pub fn load_config(path: Option<&str>, overrides: CliOverrides) -> anyhow::Result<Config> {
    let config = Config::load(path, overrides)
        .map_err(|e| anyhow::anyhow!("failed to load configuration: {}", e))?;

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;

    Ok(config)
}
