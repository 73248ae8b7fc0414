//! Auth command handlers.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use authway_core::callback::{self, CallbackOutcome};
use authway_core::config::Config;
use authway_core::store::{
    ACCESS_TOKEN_KEY, FileTokenStore, REFRESH_TOKEN_KEY, TokenStore, mask_token,
};

pub fn login(config: &Config, callback_url: Option<&str>) -> Result<()> {
    let store = FileTokenStore::open_default();

    let input = match callback_url {
        Some(url) => url.to_string(),
        None => {
            // Check if already logged in
            if let Some(existing) = store.get(ACCESS_TOKEN_KEY)? {
                println!("Already logged in (token: {})", mask_token(&existing));
                print!("Do you want to replace the existing credentials? [y/N] ");
                io::stdout().flush()?;

                let mut response = String::new();
                io::stdin().lock().read_line(&mut response)?;
                if !response.trim().eq_ignore_ascii_case("y") {
                    println!("Login cancelled.");
                    return Ok(());
                }
            }

            let login_url = format!("{}/", config.base_url.trim_end_matches('/'));

            // Show instructions
            println!("To log in:");
            println!();
            println!("  1. A browser window will open (or visit the URL below)");
            println!("  2. Sign in; the identity provider redirects you back");
            println!("  3. Paste the full redirect URL here");
            println!();
            println!("Login URL:");
            println!("  {login_url}");
            println!();

            // Try to open browser (best effort, skip in tests)
            if std::env::var("AUTHWAY_NO_BROWSER").is_err() {
                let _ = open::that(&login_url);
            }

            print!("Paste the callback redirect URL: ");
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().lock().read_line(&mut input)?;
            input
        }
    };

    let outcome = callback::parse_callback_url(&input)?;
    match &outcome {
        CallbackOutcome::LoggedIn {
            access, ..
        } => {
            let destination = outcome.apply(&store)?;

            println!();
            println!("✓ Logged in (token: {})", mask_token(access));
            println!("  Credentials saved to: {}", store.path().display());
            println!("  Post-login destination: {destination}");
            Ok(())
        }
        CallbackOutcome::Failed {
            destination,
        } => {
            anyhow::bail!("Login failed (callback routed to {destination})")
        }
    }
}

pub fn logout() -> Result<()> {
    let store = FileTokenStore::open_default();
    let had_creds =
        store.get(ACCESS_TOKEN_KEY)?.is_some() || store.get(REFRESH_TOKEN_KEY)?.is_some();

    store.clear()?;

    if had_creds {
        println!("✓ Logged out");
        println!("  Credentials removed from: {}", store.path().display());
    } else {
        println!("Not logged in (no credentials found).");
    }

    Ok(())
}

pub fn status(config: &Config) -> Result<()> {
    let store = FileTokenStore::open_default();

    println!("Base URL: {}", config.base_url);
    match store.get(ACCESS_TOKEN_KEY)? {
        Some(access) => {
            println!("Access token:  {}", mask_token(&access));
            match store.get(REFRESH_TOKEN_KEY)? {
                Some(refresh) => println!("Refresh token: {}", mask_token(&refresh)),
                None => println!("Refresh token: (none)"),
            }
        }
        None => println!("Not logged in."),
    }

    Ok(())
}
