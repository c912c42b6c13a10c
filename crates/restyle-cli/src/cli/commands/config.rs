//! Config command handlers.

use anyhow::{Context, Result};
use restyle_core::config;
use restyle_core::transform::AugmentationPolicy;

pub fn path() {
    println!("{}", config::paths::config_path().display());
}

pub fn init() -> Result<()> {
    let config_path = config::paths::config_path();
    config::Config::init(&config_path)
        .with_context(|| format!("init config at {}", config_path.display()))?;
    println!("Created config at {}", config_path.display());
    Ok(())
}

pub fn generate() -> Result<()> {
    let toml = config::Config::generate()?;
    print!("{toml}");
    Ok(())
}

pub fn set_augmentation(policy: AugmentationPolicy) -> Result<()> {
    let config_path = config::paths::config_path();
    config::Config::save_augmentation_to(&config_path, policy)
        .with_context(|| format!("update config at {}", config_path.display()))?;
    println!(
        "Set prompts.augmentation = \"{policy}\" in {}",
        config_path.display()
    );
    Ok(())
}
