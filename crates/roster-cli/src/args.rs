//! CLI argument definitions using clap
//!
//! - roster login --email a@b.com     # Sign in (password from --password or ROSTER_PASSWORD)
//! - roster list --class A            # Dashboard listing
//! - roster show|edit|flag|delete <id>
//! - roster profile [edit ...]        # Own record

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "roster")]
#[command(about = "Roster - employee directory console")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (default: ~/.roster/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in to the directory service
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "ROSTER_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in account
    Whoami,

    /// List employees (admin)
    List(ListArgs),

    /// Show one employee (admin)
    Show { id: String },

    /// Create an employee and their account (admin)
    Add(AddArgs),

    /// Edit an employee (admin)
    Edit {
        id: String,

        #[command(flatten)]
        fields: EditArgs,
    },

    /// Mark an employee as flagged (admin)
    Flag { id: String },

    /// Mark an employee as active again (admin)
    Activate { id: String },

    /// Delete an employee (admin)
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Show or edit your own record
    Profile {
        #[command(subcommand)]
        action: Option<ProfileAction>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProfileAction {
    /// Edit your own record
    Edit(EditArgs),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Active,
    Flagged,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    Name,
    Age,
    Class,
    Attendance,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OrderArg {
    Asc,
    Desc,
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Free text matched against name, email, phone, age and class
    #[arg(long)]
    pub search: Option<String>,

    #[arg(long)]
    pub class: Option<String>,

    #[arg(long, value_enum)]
    pub status: Option<StatusArg>,

    #[arg(long, value_enum)]
    pub sort: Option<SortArg>,

    #[arg(long, value_enum)]
    pub order: Option<OrderArg>,

    /// Rows per page (default from config)
    #[arg(long)]
    pub first: Option<u32>,

    /// Cursor returned by a previous page
    #[arg(long)]
    pub after: Option<String>,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long, env = "ROSTER_NEW_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[arg(long)]
    pub phone: String,

    #[arg(long)]
    pub age: u32,

    #[arg(long)]
    pub class: String,

    /// Repeat or separate with commas
    #[arg(long = "subject", value_delimiter = ',')]
    pub subjects: Vec<String>,

    #[arg(long, default_value_t = 0.0)]
    pub attendance: f64,
}

#[derive(Args, Debug, Default)]
pub struct EditArgs {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub age: Option<u32>,

    #[arg(long)]
    pub class: Option<String>,

    /// Replaces the whole subject list; repeat or separate with commas
    #[arg(long = "subject", value_delimiter = ',')]
    pub subjects: Option<Vec<String>>,

    #[arg(long)]
    pub attendance: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_filters() {
        let cli = Cli::parse_from([
            "roster", "list", "--search", "ada", "--status", "flagged", "--sort", "age",
            "--order", "desc", "--json",
        ]);
        assert!(cli.json);
        let Commands::List(args) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.search.as_deref(), Some("ada"));
        assert_eq!(args.status, Some(StatusArg::Flagged));
        assert_eq!(args.sort, Some(SortArg::Age));
        assert_eq!(args.order, Some(OrderArg::Desc));
    }

    #[test]
    fn test_parse_edit_subjects() {
        let cli = Cli::parse_from(["roster", "edit", "7", "--subject", "Math,Art", "--age", "30"]);
        let Commands::Edit { id, fields } = cli.command else {
            panic!("expected edit");
        };
        assert_eq!(id, "7");
        assert_eq!(fields.age, Some(30));
        assert_eq!(
            fields.subjects,
            Some(vec!["Math".to_string(), "Art".to_string()])
        );
        assert!(fields.name.is_none());
    }

    #[test]
    fn test_parse_profile_without_action() {
        let cli = Cli::parse_from(["roster", "profile"]);
        assert!(matches!(cli.command, Commands::Profile { action: None }));
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
