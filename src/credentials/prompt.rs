use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::info;

use crate::api::ApiClient;
use crate::model::Role;
use crate::session::{save_session, Session};

/// Prompts for email and password on the terminal
pub fn prompt_for_login() -> Result<(String, String)> {
    print!("Email: ");
    std::io::stdout().flush().context("Failed to flush stdout")?;

    let mut email = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut email)
        .context("Failed to read email from stdin")?;
    let email = email.trim().to_string();

    if email.is_empty() {
        anyhow::bail!("Email cannot be empty");
    }

    let password = rpassword::prompt_password("Password: ")
        .context("Failed to read password from stdin")?;

    if password.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }

    Ok((email, password))
}

/// Log in against the server and persist the resulting session
pub async fn login_interactive(client: &ApiClient, session_path: &Path) -> Result<Session> {
    let (email, password) = prompt_for_login()?;
    login_and_store(client, session_path, &email, &password).await
}

/// Create an account, then log in with it right away
pub async fn register_interactive(
    client: &ApiClient,
    session_path: &Path,
    role: Option<Role>,
) -> Result<Session> {
    let (email, password) = prompt_for_login()?;

    let user = client
        .register(&email, &password, role)
        .await
        .context("Registration failed")?;
    info!(user = %user.email, role = ?user.role, "account created");

    login_and_store(client, session_path, &email, &password).await
}

async fn login_and_store(
    client: &ApiClient,
    session_path: &Path,
    email: &str,
    password: &str,
) -> Result<Session> {
    let response = client
        .login(email, password)
        .await
        .context("Login failed")?;

    let session = Session::new(client.base_url(), response.token, response.user);
    save_session(session_path, &session)?;

    info!(user = %session.actor.email, "session stored");

    Ok(session)
}
