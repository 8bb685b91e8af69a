//! Formsmith CLI
//!
//! Command-line interface for building and managing forms.
//!
//! # Usage
//!
//! ```bash
//! formsmith login --email ada@example.com --password '...'
//! formsmith forms new --template survey --title "Team pulse"
//! formsmith forms add-field <id> --type email --label "Work email" --required
//! formsmith forms export <id> -o pulse.json
//! formsmith forms responses <id> --format json
//! ```

use clap::{Parser, Subcommand};
use colored::Colorize;
use formsmith_core::{FieldType, Template};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod output;

#[derive(Parser)]
#[command(name = "formsmith")]
#[command(version)]
#[command(about = "Formsmith Command Line Interface", long_about = None)]
pub struct Cli {
    /// API endpoint URL
    #[arg(long, env = "FORMSMITH_API_URL")]
    api_url: Option<String>,

    /// Bearer token for authentication
    #[arg(long, env = "FORMSMITH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Output format
    #[arg(long, short)]
    format: Option<output::OutputFormat>,

    /// Profile name from config file
    #[arg(long, short)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and remember the token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "FORMSMITH_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and remember the token
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "FORMSMITH_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored token
    Logout,
    /// Manage forms
    Forms {
        #[command(subcommand)]
        action: FormCommands,
    },
    /// Manage groups
    Groups {
        #[command(subcommand)]
        action: GroupCommands,
    },
    /// Configure CLI
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum FormCommands {
    /// List your forms
    List {
        #[arg(long)]
        group: Option<String>,
    },
    /// Show a form's pages and fields
    Get { id: String },
    /// Create a form from a template
    New {
        #[arg(long, default_value_t = Template::Blank)]
        template: Template,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, default_value = "")]
        group: String,
    },
    /// Add a field to a saved form
    AddField {
        id: String,
        #[arg(long = "type")]
        field_type: FieldType,
        #[arg(long)]
        label: Option<String>,
        /// Insert after this field instead of appending
        #[arg(long, conflicts_with = "page")]
        after: Option<String>,
        /// 1-based page to append to
        #[arg(long)]
        page: Option<usize>,
        #[arg(long)]
        required: bool,
    },
    /// Write the form document to a file
    Export {
        id: String,
        #[arg(short, long)]
        output: Option<String>,
        /// Include responses and views from the server
        #[arg(long)]
        with_responses: bool,
    },
    /// Delete a form
    Delete { id: String },
    /// Rename a form
    Rename { id: String, title: String },
    /// Copy a form
    Duplicate { id: String },
    /// Print the public link
    Share { id: String },
    /// List submitted responses
    Responses { id: String },
    /// List available templates
    Templates,
}

#[derive(Subcommand)]
pub enum GroupCommands {
    /// List groups
    List,
    /// Create a group
    Create { name: String },
    /// Delete a group and its forms
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Set configuration value
    Set { key: String, value: String },
    /// Get configuration value
    Get { key: String },
    /// List all configuration
    List,
    /// Initialize configuration
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_add_field_parses_type() {
        let cli = Cli::parse_from([
            "formsmith", "forms", "add-field", "f1", "--type", "email", "--label", "Work email",
        ]);
        match cli.command {
            Commands::Forms { action: FormCommands::AddField { field_type, label, .. } } => {
                assert_eq!(field_type, FieldType::Email);
                assert_eq!(label.as_deref(), Some("Work email"));
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn test_unknown_template_rejected() {
        let parsed = Cli::try_parse_from(["formsmith", "forms", "new", "--template", "nope"]);
        assert!(parsed.is_err());
    }
}
