//! Login / logout commands.

use std::path::Path;

use anyhow::{anyhow, Result};
use msp_license::AppContext;

use super::fail;
use crate::config::ClientConfig;

/// Sign in to the current context's server and save the token.
pub async fn login(email: &str, password: &str, config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(config_path)?;
    let name = config.require_current()?.name.clone();
    let app = super::connect(config.require_current()?)?;

    sign_in(&app, email, password, &mut config, &name).await?;
    config.save(config_path)?;
    println!("Token saved to context \"{}\".", name);
    Ok(())
}

async fn sign_in(app: &AppContext, email: &str, password: &str, config: &mut ClientConfig, name: &str) -> Result<()> {
    let user = app.login(email, password).await.map_err(fail("Login failed"))?;
    let token = app
        .session()
        .token()
        .ok_or_else(|| anyhow!("No token in login response"))?;

    let ctx = config
        .get_mut(name)
        .ok_or_else(|| anyhow!("Context disappeared"))?;
    ctx.remember(&user, &token);
    println!("Logged in as {} ({}).", user.email, user.role);
    Ok(())
}

/// Forget the current context's token and identity.
pub fn logout(config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(config_path)?;
    let name = config.require_current()?.name.clone();

    let ctx = config
        .get_mut(&name)
        .ok_or_else(|| anyhow!("Current context not found."))?;
    ctx.forget();
    config.save(config_path)?;
    println!("Logged out from context \"{}\".", name);
    Ok(())
}
