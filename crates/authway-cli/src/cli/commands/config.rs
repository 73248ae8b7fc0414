//! Config command handlers.

use anyhow::{Context, Result};
use authway_core::config;

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

pub fn set_base_url(url: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("invalid base URL: {url}"))?;
    config::Config::save_base_url(url).context("save base_url")?;
    println!("Set base_url to {url}");
    Ok(())
}
