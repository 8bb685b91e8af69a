//! Config commands

use anyhow::Result;

use super::success;
use crate::config::{Config, KEYS};
use crate::ConfigCommands;

pub fn handle(action: ConfigCommands, profile: Option<&str>) -> Result<()> {
    match action {
        ConfigCommands::Init => {
            let path = Config::default().save(profile)?;
            success(format!("Configuration initialized at {}", path.display()));
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load(profile)?;
            config.set(&key, value)?;
            config.save(profile)?;
            success(format!("Set {}", key));
        }
        ConfigCommands::Get { key } => {
            let mut config = Config::load(profile)?;
            let value = config.get(&key)?;
            println!("{}: {}", key, value.unwrap_or_else(|| "(not set)".into()));
        }
        ConfigCommands::List => {
            let mut config = Config::load(profile)?;
            for key in KEYS {
                let value = config.get(key)?;
                println!("{}: {}", key, value.unwrap_or_else(|| "(not set)".into()));
            }
        }
    }
    Ok(())
}
