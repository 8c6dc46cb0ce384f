//! Server configuration (ambient stack addition, SPEC_FULL.md).
//!
//! Deserialized from a TOML file at startup with `serde`/`toml`, the same
//! pair the teacher's share/export configuration used. Shares are declared
//! once here and turned into [`crate::share::Share`] values the handler
//! layer consults directly.

use std::collections::HashMap;
use std::net::SocketAddr;

use serde::Deserialize;

use crate::share::{Permission, PrefetchConfig, Share};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ShareConfig {
    pub name: String,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default = "default_permission")]
    pub default_permission: PermissionConfig,
    #[serde(default)]
    pub squash: String,
    #[serde(default)]
    pub prefetch: PrefetchConfigToml,
}

fn default_permission() -> PermissionConfig {
    PermissionConfig::Write
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionConfig {
    None,
    Read,
    Write,
}

impl From<PermissionConfig> for Permission {
    fn from(p: PermissionConfig) -> Self {
        match p {
            PermissionConfig::None => Permission::None,
            PermissionConfig::Read => Permission::Read,
            PermissionConfig::Write => Permission::Write,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct PrefetchConfigToml {
    pub enabled: bool,
    pub max_file_size: u64,
    pub chunk_size: u64,
}

impl Default for PrefetchConfigToml {
    fn default() -> Self {
        let d = PrefetchConfig::default();
        PrefetchConfigToml { enabled: d.enabled, max_file_size: d.max_file_size, chunk_size: d.chunk_size }
    }
}

impl From<PrefetchConfigToml> for PrefetchConfig {
    fn from(c: PrefetchConfigToml) -> Self {
        PrefetchConfig { enabled: c.enabled, max_file_size: c.max_file_size, chunk_size: c.chunk_size }
    }
}

impl ShareConfig {
    /// Resolves the squash rule name against [`crate::auth::SquashRule`],
    /// falling back to `root_squash` (the conservative default) on an
    /// unrecognized or empty value rather than refusing to start.
    pub fn to_share(&self) -> Share {
        Share {
            name: self.name.clone(),
            read_only: self.read_only,
            default_permission: self.default_permission.into(),
            prefetch: self.prefetch.clone().into(),
            squash_rule: if self.squash.is_empty() { "root_squash".to_string() } else { self.squash.clone() },
        }
    }
}

/// Top-level server configuration: listen address, auth-cache sizing, and
/// the set of exported shares.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    #[serde(default = "default_auth_cache_capacity")]
    pub auth_cache_capacity: u64,
    #[serde(default = "default_auth_cache_ttl_secs")]
    pub auth_cache_ttl_secs: u64,
    pub shares: Vec<ShareConfig>,
}

fn default_auth_cache_capacity() -> u64 {
    10_000
}

fn default_auth_cache_ttl_secs() -> u64 {
    300
}

impl ServerConfig {
    pub fn parse(toml_text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_text)
    }

    pub fn shares_by_name(&self) -> HashMap<String, Share> {
        self.shares.iter().map(|s| (s.name.clone(), s.to_share())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let text = r#"
            listen_addr = "0.0.0.0:2049"

            [[shares]]
            name = "export"
            read_only = false
            default_permission = "write"
            squash = "root_squash"
        "#;
        let cfg = ServerConfig::parse(text).unwrap();
        assert_eq!(cfg.shares.len(), 1);
        assert_eq!(cfg.auth_cache_capacity, 10_000);
        let share = cfg.shares[0].to_share();
        assert_eq!(share.squash_rule, "root_squash");
        assert!(!share.read_only);
    }

    #[test]
    fn missing_squash_falls_back_to_root_squash() {
        let text = r#"
            listen_addr = "127.0.0.1:2049"

            [[shares]]
            name = "export"
        "#;
        let cfg = ServerConfig::parse(text).unwrap();
        assert_eq!(cfg.shares[0].to_share().squash_rule, "root_squash");
    }
}
