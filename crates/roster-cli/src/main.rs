//! Roster CLI application
//!
//! Terminal console for the employee directory. Every command passes the
//! authorization gate before touching the directory service.
//!
//! ```bash
//! roster login --email admin@example.com
//! roster list --class A --sort attendance --order desc
//! roster flag 7
//! roster profile edit --phone 555-0199
//! ```

// Allow common clippy lints that are stylistic preferences
#![allow(clippy::collapsible_if)]

mod args;
mod commands;
mod console;
mod context;
mod render;
mod router;

use args::Cli;
use clap::Parser;
use console::RosterConsole;
use roster_core::config::LoggingConfig;
use roster_core::error::UserFriendlyError;
use roster_core::mutation::MutationError;
use roster_core::session::AuthError;
use roster_core::{FetchError, RemoteError, RosterError, ValidationErrors, load_config};
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    // RUST_LOG wins over the configured level
    let default_level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match logging.format.as_str() {
        "json" => builder.json().init(),
        "compact" => builder.compact().init(),
        _ => builder.pretty().init(),
    }
}

/// Map a core failure to its user-facing form
fn friendly(err: &anyhow::Error) -> Option<UserFriendlyError> {
    if let Some(e) = err.downcast_ref::<RosterError>() {
        return Some(e.user_friendly());
    }
    let core = if let Some(e) = err.downcast_ref::<AuthError>() {
        RosterError::from(e.clone())
    } else if let Some(e) = err.downcast_ref::<MutationError>() {
        RosterError::from(e.clone())
    } else if let Some(e) = err.downcast_ref::<FetchError>() {
        RosterError::from(e.clone())
    } else if let Some(e) = err.downcast_ref::<RemoteError>() {
        RosterError::from(e.clone())
    } else if let Some(e) = err.downcast_ref::<ValidationErrors>() {
        RosterError::from(e.clone())
    } else {
        return None;
    };
    Some(core.user_friendly())
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let console = RosterConsole::new(cli.verbose);

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            console.error(&err.user_friendly().format_display());
            std::process::exit(2);
        }
    };
    init_tracing(&config.logging, cli.verbose);

    if let Err(err) = router::route(cli, config).await {
        match friendly(&err) {
            Some(friendly) => console.error(&friendly.format_display()),
            None => console.error(&format!("{:#}", err)),
        }
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_get_friendly_display() {
        let err = anyhow::Error::from(RosterError::from(AuthError::InvalidCredentials));
        assert!(friendly(&err).is_some());

        let err = anyhow::Error::from(MutationError::Rejected("Email already exists".into()));
        let shown = friendly(&err).unwrap().format_display();
        assert!(shown.contains("Email already exists"));

        assert!(friendly(&anyhow::anyhow!("plain")).is_none());
    }
}
