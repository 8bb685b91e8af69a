//! CLI Commands

pub mod auth;
pub mod config;
pub mod forms;
pub mod groups;

use anyhow::{Context, Result};
use colored::Colorize;
use formsmith_client::{AppContext, ClientConfig, ClientError, DEFAULT_BASE_URL};
use formsmith_core::Notification;

use crate::config::Config;
use crate::output::OutputFormat;
use crate::{Cli, Commands};

/// Everything a command needs: the API context, the resolved output
/// format and the profile it was loaded from
pub struct Env {
    pub ctx: AppContext,
    pub format: OutputFormat,
    pub profile: Option<String>,
}

impl Env {
    /// Flags win over the profile's config file, which wins over defaults
    pub fn resolve(cli: &Cli, config: &Config) -> Result<Self> {
        let base_url = cli
            .api_url
            .clone()
            .or_else(|| config.api_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let token = cli.token.clone().or_else(|| config.token.clone());
        let format = match (cli.format, config.default_format.as_deref()) {
            (Some(format), _) => format,
            (None, Some(name)) => name
                .parse::<OutputFormat>()
                .map_err(|e: String| anyhow::anyhow!("default_format: {}", e))?,
            (None, None) => OutputFormat::Table,
        };

        let ctx = AppContext::new(ClientConfig { base_url, token, ..Default::default() })
            .context("invalid API URL")?;
        if let Some(theme) = &config.theme {
            ctx.set_theme(theme.clone());
        }
        Ok(Self { ctx, format, profile: cli.profile.clone() })
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    if let Commands::Config { action } = cli.command {
        return config::handle(action, cli.profile.as_deref());
    }

    let config = Config::load(cli.profile.as_deref())?;
    let env = Env::resolve(&cli, &config)?;

    let result = match cli.command {
        Commands::Login { email, password } => auth::login(&env, config, &email, &password).await,
        Commands::Register { name, email, password } => {
            auth::register(&env, config, &name, &email, &password).await
        }
        Commands::Logout => auth::logout(&env, config),
        Commands::Forms { action } => forms::handle(action, &env).await,
        Commands::Groups { action } => groups::handle(action, &env).await,
        Commands::Config { .. } => Ok(()),
    };

    result.map_err(explain)
}

/// Turn an expired-session error into something actionable
fn explain(err: anyhow::Error) -> anyhow::Error {
    match err.downcast_ref::<ClientError>() {
        Some(e) if e.is_auth_error() => {
            anyhow::anyhow!("{} (run `formsmith login` to sign in again)", e)
        }
        _ => err,
    }
}

pub fn print_notifications(notifications: Vec<Notification>) {
    for n in notifications {
        if n.is_error() {
            eprintln!("{} {}", "✗".red(), n.message);
        } else {
            eprintln!("{} {}", "✓".green(), n.message);
        }
    }
}

pub fn success(message: impl std::fmt::Display) {
    println!("{} {}", "✓".green().bold(), message);
}
