//! Client-side context management.
//!
//! Reads/writes `~/.msp/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use msp_license::model::{Role, User};
use serde::{Deserialize, Serialize};

/// Environment variable overriding the server URL of every context.
pub const API_URL_ENV: &str = "MSP_API_URL";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// A single context: one license service and who is signed in to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// Context name (e.g. "prod").
    pub name: String,

    /// Service base URL (e.g. "http://localhost:5000/api").
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub server: String,

    /// Bearer token (set by `mspctl login`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Context {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            server: String::new(),
            token: String::new(),
            user_id: String::new(),
            email: String::new(),
            role: None,
            customer_id: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Server URL after the environment override and the default.
    pub fn server_url(&self) -> String {
        resolve_server(std::env::var(API_URL_ENV).ok(), &self.server)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// The signed-in user, when a token and identity were saved.
    pub fn saved_user(&self) -> Option<User> {
        if self.token.is_empty() || self.email.is_empty() {
            return None;
        }
        Some(User {
            id: self.user_id.clone(),
            email: self.email.clone(),
            name: String::new(),
            role: self.role?,
            customer_id: self.customer_id.clone(),
        })
    }

    pub fn remember(&mut self, user: &User, token: &str) {
        self.token = token.to_string();
        self.user_id = user.id.clone();
        self.email = user.email.clone();
        self.role = Some(user.role);
        self.customer_id = user.customer_id().map(str::to_string);
    }

    pub fn forget(&mut self) {
        self.token.clear();
        self.user_id.clear();
        self.email.clear();
        self.role = None;
        self.customer_id = None;
    }
}

fn resolve_server(env: Option<String>, configured: &str) -> String {
    env.filter(|v| !v.trim().is_empty())
        .or_else(|| (!configured.is_empty()).then(|| configured.to_string()))
        .unwrap_or_else(|| msp_license::DEFAULT_API_URL.to_string())
}

/// Client configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Name of the currently active context.
    #[serde(rename = "current-context", default)]
    pub current_context: String,

    #[serde(default)]
    pub contexts: Vec<Context>,
}

impl ClientConfig {
    /// Default config file path: ~/.msp/config.toml.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// Load config from disk, or return default if file doesn't exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn current(&self) -> Option<&Context> {
        self.contexts.iter().find(|c| c.name == self.current_context)
    }

    /// The active context, or an error telling the user how to pick one.
    pub fn require_current(&self) -> anyhow::Result<&Context> {
        self.current()
            .ok_or_else(|| anyhow::anyhow!("No current context. Run `mspctl use <name>`."))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Context> {
        self.contexts.iter_mut().find(|c| c.name == name)
    }

    /// Add or update a context.
    pub fn upsert_context(&mut self, ctx: Context) {
        if let Some(existing) = self.get_mut(&ctx.name) {
            *existing = ctx;
        } else {
            self.contexts.push(ctx);
        }
    }
}

/// Return the config directory (~/.msp).
fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".msp")
}
