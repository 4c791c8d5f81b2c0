//! Context management commands.

use std::path::Path;

use anyhow::Result;

use crate::config::{ClientConfig, Context};
use crate::output::{or_dash, print_json, Output, Table};

/// Create or update a context. The first context becomes current.
pub fn set(name: &str, server: Option<&str>, timeout_secs: Option<u64>, config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(config_path)?;

    let created = config.get_mut(name).is_none();
    let mut ctx = config.get_mut(name).cloned().unwrap_or_else(|| Context::new(name));
    if let Some(s) = server {
        ctx.server = s.trim_end_matches('/').to_string();
    }
    if let Some(t) = timeout_secs {
        ctx.timeout_secs = t;
    }
    config.upsert_context(ctx);
    if config.current_context.is_empty() {
        config.current_context = name.to_string();
    }

    config.save(config_path)?;
    if created {
        println!("Context \"{}\" created.", name);
    } else {
        println!("Context \"{}\" updated.", name);
    }
    Ok(())
}

pub fn list(config_path: &Path, output: Output) -> Result<()> {
    let config = ClientConfig::load(config_path)?;

    if output == Output::Json {
        // Tokens stay out of the listing.
        let contexts: Vec<_> = config
            .contexts
            .iter()
            .map(|c| {
                serde_json::json!({
                    "name": c.name,
                    "current": c.name == config.current_context,
                    "server": c.server_url(),
                    "email": c.email,
                    "role": c.role,
                })
            })
            .collect();
        return print_json(&contexts);
    }

    if config.contexts.is_empty() {
        println!("No contexts configured.");
        println!("Run: mspctl context set <name> --server <url>");
        return Ok(());
    }

    let mut table = Table::new(&["", "NAME", "SERVER", "USER", "ROLE"]);
    for ctx in &config.contexts {
        let marker = if ctx.name == config.current_context { "*" } else { " " };
        table.row(vec![
            marker.to_string(),
            ctx.name.clone(),
            ctx.server_url(),
            or_dash(Some(&ctx.email)),
            or_dash(ctx.role.map(|r| r.as_str())),
        ]);
    }
    table.print();
    Ok(())
}

/// Switch current context.
pub fn use_context(name: &str, config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(config_path)?;

    if !config.contexts.iter().any(|c| c.name == name) {
        anyhow::bail!("Context \"{}\" not found. Run `mspctl context list` to see available contexts.", name);
    }

    config.current_context = name.to_string();
    config.save(config_path)?;
    println!("Switched to context \"{}\".", name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_creates_then_updates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        set("dev", Some("http://localhost:5000/api/"), None, &path).unwrap();
        set("prod", Some("https://msp.example.com/api"), Some(10), &path).unwrap();
        set("dev", None, Some(5), &path).unwrap();

        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.current_context, "dev");
        assert_eq!(config.contexts.len(), 2);
        let dev = &config.contexts[0];
        assert_eq!(dev.server, "http://localhost:5000/api");
        assert_eq!(dev.timeout_secs, 5);
        assert_eq!(config.contexts[1].timeout_secs, 10);
    }

    #[test]
    fn use_unknown_context_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        set("dev", None, None, &path).unwrap();

        assert!(use_context("nope", &path).is_err());
        set("prod", None, None, &path).unwrap();
        use_context("prod", &path).unwrap();
        assert_eq!(ClientConfig::load(&path).unwrap().current_context, "prod");
    }
}
