//! Config command handlers

use anyhow::{bail, Result};
use marq_core::Config;

use crate::output::Output;
use crate::ConfigCommands;

pub fn run(command: Option<ConfigCommands>, output: &Output) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => show(output),
        Some(ConfigCommands::Set { key, value }) => set(key, value, output),
    }
}

fn show(output: &Output) -> Result<()> {
    let config = Config::load()?;

    if output.is_json() {
        println!(
            "{}",
            serde_json::json!({
                "api_url": config.api_url,
                "feed_url": config.feed_url,
                "token_set": config.token.is_some(),
                "request_timeout_secs": config.request_timeout_secs,
                "initial_reconnect_delay_secs": config.initial_reconnect_delay_secs,
                "max_reconnect_delay_secs": config.max_reconnect_delay_secs,
            })
        );
        return Ok(());
    }

    println!("api_url              = {}", config.api_url);
    println!("feed_url             = {}", config.feed_url);
    // Never echo the token itself
    println!(
        "token                = {}",
        if config.token.is_some() { "(set)" } else { "(unset)" }
    );
    println!("request_timeout_secs = {}", config.request_timeout_secs);
    println!(
        "initial_reconnect_delay_secs = {}",
        config.initial_reconnect_delay_secs
    );
    println!(
        "max_reconnect_delay_secs     = {}",
        config.max_reconnect_delay_secs
    );
    println!("\nConfig file: {}", Config::config_file_path().display());
    Ok(())
}

fn set(key: String, value: String, output: &Output) -> Result<()> {
    let mut config = Config::load()?;

    match key.as_str() {
        "api_url" => config.api_url = value,
        "feed_url" => config.feed_url = value,
        "token" => config.token = if value.is_empty() { None } else { Some(value) },
        "request_timeout_secs" => {
            config.request_timeout_secs = value
                .parse()
                .map_err(|_| anyhow::anyhow!("request_timeout_secs must be a number"))?;
        }
        "initial_reconnect_delay_secs" => {
            config.initial_reconnect_delay_secs = value
                .parse()
                .map_err(|_| anyhow::anyhow!("initial_reconnect_delay_secs must be a number"))?;
        }
        "max_reconnect_delay_secs" => {
            config.max_reconnect_delay_secs = value
                .parse()
                .map_err(|_| anyhow::anyhow!("max_reconnect_delay_secs must be a number"))?;
        }
        other => bail!(
            "Unknown key '{}'. Valid keys: api_url, feed_url, token, request_timeout_secs, \
             initial_reconnect_delay_secs, max_reconnect_delay_secs",
            other
        ),
    }

    config.save()?;
    output.success(&format!("Set {}", key));
    Ok(())
}
