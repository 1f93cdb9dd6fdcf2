//! Command routing logic for CLI

use crate::args::{Cli, Commands, ProfileAction};
use crate::commands;
use crate::context::AppContext;
use anyhow::Result;
use roster_core::{EmploymentStatus, RosterConfig};

/// Route CLI commands to their respective handlers
pub async fn route(cli: Cli, config: RosterConfig) -> Result<()> {
    let ctx = AppContext::new(config, cli.json, cli.verbose)?;

    match cli.command {
        Commands::Login { email, password } => commands::auth::login(&ctx, &email, &password).await,
        Commands::Logout => commands::auth::logout(&ctx),
        Commands::Whoami => commands::auth::whoami(&ctx).await,

        Commands::List(args) => commands::directory::list(&ctx, &args).await,
        Commands::Show { id } => commands::directory::show(&ctx, &id).await,

        Commands::Add(args) => commands::manage::add(&ctx, args).await,
        Commands::Edit { id, fields } => commands::manage::edit(&ctx, &id, fields).await,
        Commands::Flag { id } => {
            commands::manage::set_status(&ctx, &id, EmploymentStatus::Flagged).await
        }
        Commands::Activate { id } => {
            commands::manage::set_status(&ctx, &id, EmploymentStatus::Active).await
        }
        Commands::Delete { id, yes } => commands::manage::delete(&ctx, &id, yes).await,

        Commands::Profile { action: None } => commands::profile::show(&ctx).await,
        Commands::Profile {
            action: Some(ProfileAction::Edit(fields)),
        } => commands::profile::edit(&ctx, fields).await,
    }
}
