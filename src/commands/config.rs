//! Configuration commands.
//!
//! - `config show`: display the effective configuration
//! - `config set-url`: set the API base URL
//! - `config set-token`: store the bearer token

use owo_colors::OwoColorize;
use serde_json::json;

use super::{OutputOptions, print_json};
use crate::config::Config;
use crate::error::{BoardError, Result};

/// Mask a sensitive value by showing only the first 2 and last 2 characters
fn mask_sensitive_value(value: &str) -> String {
    let char_count = value.chars().count();
    if char_count > 4 {
        let first: String = value.chars().take(2).collect();
        let last: String = value.chars().skip(char_count - 2).collect();
        format!("{first}...{last}")
    } else {
        "****".to_string()
    }
}

pub fn cmd_config_show(output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let path = Config::config_path()?;
    let token = config.token().map(|t| mask_sensitive_value(&t));

    if output.json {
        return print_json(&json!({
            "path": path.display().to_string(),
            "api_url": config.api_url(),
            "token": token,
            "request_timeout": config.request_timeout,
            "connect_timeout": config.connect_timeout,
            "retries": config.retries,
        }));
    }

    println!("{}", "Configuration:".bold());
    println!("  file:            {}", path.display().dimmed());
    println!("  api_url:         {}", config.api_url().cyan());
    println!(
        "  token:           {}",
        token.unwrap_or_else(|| "not set".to_string())
    );
    println!("  request_timeout: {}s", config.request_timeout);
    println!("  connect_timeout: {}s", config.connect_timeout);
    println!("  retries:         {}", config.retries);
    Ok(())
}

pub fn cmd_config_set_url(url: &str) -> Result<()> {
    let mut config = Config::load()?;
    config.set_api_url(url)?;
    config.save()?;
    println!("Set {} = {}", "api_url".cyan(), config.api_url);
    Ok(())
}

pub fn cmd_config_set_token(token: &str) -> Result<()> {
    let token = token.trim();
    if token.is_empty() {
        return Err(BoardError::Validation("token cannot be empty".to_string()));
    }
    let mut config = Config::load()?;
    config.set_token(token.to_string());
    config.save()?;
    println!(
        "Set {} = {}",
        "auth.token".cyan(),
        mask_sensitive_value(token)
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_sensitive_value() {
        assert_eq!(mask_sensitive_value("abcdefgh"), "ab...gh");
        assert_eq!(mask_sensitive_value("abc"), "****");
    }
}
