//! Auth command handlers.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use restyle_core::config::Config;
use restyle_core::error::RestyleError;
use restyle_core::session::{IdentityClient, SessionGate, SessionStore, mask_token};

/// Gate for commands that only read or drop the cached session.
///
/// A missing API key is tolerated here; it only matters once a refresh is needed.
pub fn session_gate(config: &Config) -> SessionGate {
    let api_key = config.identity.effective_api_key().unwrap_or_default();
    let client = IdentityClient::new(
        &config.identity.effective_base_url(),
        &config.identity.effective_token_url(),
        &api_key,
    );
    SessionGate::new(client, SessionStore::default_location())
}

fn credential_gate(config: &Config) -> Result<SessionGate> {
    let client = IdentityClient::from_config(config)?;
    Ok(SessionGate::new(client, SessionStore::default_location()))
}

fn read_value(label: &str, given: Option<String>) -> Result<String> {
    if let Some(value) = given {
        return Ok(value);
    }
    eprint!("{label}: ");
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .with_context(|| format!("read {label} from stdin"))?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub async fn login(config: &Config, email: Option<String>, password: Option<String>) -> Result<()> {
    let gate = credential_gate(config)?;
    let email = read_value("Email", email)?;
    let password = read_value("Password", password)?;

    match gate.sign_in(&email, &password).await {
        Ok(session) => {
            println!(
                "✓ Signed in as {} (token: {})",
                session.email,
                mask_token(&session.id_token)
            );
            Ok(())
        }
        // Sign-in shows the provider's message on its own.
        Err(e) => {
            if let Some(message) = e
                .downcast_ref::<RestyleError>()
                .and_then(RestyleError::identity_message)
            {
                anyhow::bail!("{message}");
            }
            Err(e)
        }
    }
}

pub async fn register(
    config: &Config,
    email: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let gate = credential_gate(config)?;
    let email = read_value("Email", email)?;
    let password = read_value("Password", password)?;

    let session = gate.sign_up(&email, &password).await?;
    println!("✓ Account created. Signed in as {}", session.email);
    println!(
        "  Session saved to: {}",
        SessionStore::default_location().path().display()
    );
    Ok(())
}

pub fn logout(config: &Config) -> Result<()> {
    let gate = session_gate(config);
    if gate.sign_out()? {
        println!("✓ Signed out");
    } else {
        println!("Not signed in (no session found).");
    }
    Ok(())
}

pub async fn whoami(config: &Config) -> Result<()> {
    let session = session_gate(config).current().await?;
    println!("{} ({})", session.email, session.local_id);

    let expires = i64::try_from(session.expires)
        .ok()
        .and_then(chrono::DateTime::from_timestamp_millis);
    if let Some(expires) = expires {
        println!(
            "  Session valid until {}",
            expires.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}
