//! CLI command implementations.

pub mod preview;

use anyhow::Result;
use provisioner_config::load_config;

pub fn validate(path: &str) -> Result<()> {
    match load_config(path) {
        Ok(config) => {
            let environments = config.environments().count();
            let resources: usize = config
                .environments()
                .filter_map(|env| env.environment.harbor.as_ref())
                .map(|harbor| harbor.len())
                .sum();
            println!(
                "Configuration is valid: {} team(s), {} environment(s), {} resource(s)",
                config.teams.len(),
                environments,
                resources
            );
            Ok(())
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            std::process::exit(1);
        }
    }
}
