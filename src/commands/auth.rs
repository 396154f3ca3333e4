//! Session commands (`ticketboard login`, `logout`)

use std::io::{self, BufRead};
use std::sync::Arc;

use owo_colors::OwoColorize;

use super::repository;
use crate::config::Config;
use crate::error::{BoardError, Result};
use crate::session::Session;

/// Read the password from the first line of stdin (for piped input)
fn read_password() -> Result<String> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Exchange credentials for a token, check it against `users/me` and store
/// it in the config file. Without `--password` the password is read from
/// stdin.
pub async fn cmd_login(api_url: Option<&str>, email: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => read_password()?,
    };
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(BoardError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let mut config = Config::load()?;
    let session = Arc::new(Session::anonymous());
    let repo = repository(&config, api_url, &session)?;

    let token = repo.login(email, &password).await?;
    session.set_token(token.clone());
    let user = repo.fetch_profile().await?;
    tracing::debug!(user = %user.username, role = %user.role, "logged in");
    session.login(user.clone(), token.clone());

    config.set_token(token);
    config.save()?;
    println!(
        "Logged in as {} ({})",
        user.username.cyan(),
        user.role.to_string().dimmed()
    );
    Ok(())
}

/// Forget the stored token
pub fn cmd_logout() -> Result<()> {
    let mut config = Config::load()?;
    if !config.clear_token() {
        println!("Not logged in");
        return Ok(());
    }
    config.save()?;
    println!("Logged out");
    Ok(())
}
