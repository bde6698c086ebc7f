//! Session commands.

use std::io::{self, Write};

use qkart_storefront::error::messages;
use qkart_storefront::{Notice, Storefront};
use secrecy::SecretString;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::CliError;
use crate::show;

/// Log in, reading the password from stdin when none was given.
pub async fn login(
    storefront: &Storefront,
    username: &str,
    password: Option<String>,
) -> Result<(), CliError> {
    let password = match password {
        Some(password) => SecretString::from(password),
        None => read_password().await?,
    };

    let session = storefront.login(username, &password).await?;
    show(&Notice::success(messages::LOGGED_IN));

    let mut out = io::stdout().lock();
    if let Some(balance) = session.balance {
        writeln!(out, "Wallet balance: {balance}")?;
    }
    Ok(())
}

async fn read_password() -> Result<SecretString, CliError> {
    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(SecretString::from(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Forget the saved session.
pub fn logout(storefront: &Storefront) -> Result<(), CliError> {
    storefront.logout()?;
    show(&Notice::info(messages::LOGGED_OUT));
    Ok(())
}

/// Print the logged-in user and balance.
pub fn whoami(storefront: &Storefront) -> Result<(), CliError> {
    let session = storefront.session()?;
    let mut out = io::stdout().lock();

    match (session.is_logged_in(), session.username) {
        (true, Some(username)) => match session.balance {
            Some(balance) => writeln!(out, "{username} (wallet {balance})")?,
            None => writeln!(out, "{username}")?,
        },
        _ => writeln!(out, "Not logged in")?,
    }
    Ok(())
}
