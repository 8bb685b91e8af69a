//! Login, register and logout

use anyhow::Result;

use super::{success, Env};
use crate::config::Config;

/// Sign in and store the token in the active profile
pub async fn login(env: &Env, mut config: Config, email: &str, password: &str) -> Result<()> {
    let user = env.ctx.login(email, password).await?;
    config.token = env.ctx.auth().token;
    let path = config.save(env.profile.as_deref())?;
    success(format!("Signed in as {} <{}>", user.name, user.email));
    tracing::debug!(path = %path.display(), "token stored");
    Ok(())
}

pub async fn register(
    env: &Env,
    mut config: Config,
    name: &str,
    email: &str,
    password: &str,
) -> Result<()> {
    let user = env.ctx.register(name, email, password).await?;
    config.token = env.ctx.auth().token;
    config.save(env.profile.as_deref())?;
    success(format!("Registered {} <{}>", user.name, user.email));
    Ok(())
}

pub fn logout(env: &Env, mut config: Config) -> Result<()> {
    env.ctx.logout();
    config.token = None;
    config.save(env.profile.as_deref())?;
    success("Signed out");
    Ok(())
}
