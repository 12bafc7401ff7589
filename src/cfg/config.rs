// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{collections::BTreeSet, fs, path::Path, time::Duration};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::cfg::enums::{Endpoint, Realm, SqlDialect, TableRole, Transport};

/// Construction-time configuration for a [`crate::directory::client::DirectoryClient`]
/// (§4.1, §6). Replaces the source's free-form option bag: unknown fields are
/// rejected rather than silently ignored.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct DirectoryConfig {
    /// Bind principal (sAMAccountName), bound as `user@domain`.
    pub user: String,
    /// Plaintext bind password. When absent, resolved via `AuthProvider::get(user, "ads")`.
    #[serde(default)]
    pub password: Option<String>,
    /// DNS domain, e.g. `mst.edu`.
    pub domain: String,
    /// Target server hostname; when absent, callers are expected to resolve
    /// one out of band (DNS SRV lookups are out of scope, §1).
    #[serde(default)]
    pub server: Option<String>,
    /// Explicit port override; when absent, derived from `endpoint` + `transport`.
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default = "default_transport")]
    pub transport: Transport,
    #[serde(default)]
    pub use_global_catalog: bool,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_timeout", with = "serde_secs")]
    pub timeout: Duration,
    #[serde(default)]
    pub debug: bool,
    /// Explicit baseDN override; when absent, derived from `domain` (§4.1).
    #[serde(default)]
    pub base_dn: Option<String>,
    /// Number of bind attempts before giving up (§4.1: `retries = 4`).
    #[serde(default = "default_bind_retries")]
    pub bind_retries: u32,
}

fn default_transport() -> Transport {
    Transport::Tls
}
fn default_page_size() -> u32 {
    25
}
fn default_timeout() -> Duration {
    Duration::from_secs(60)
}
fn default_bind_retries() -> u32 {
    4
}

impl DirectoryConfig {
    pub fn endpoint(&self) -> Endpoint {
        if self.use_global_catalog {
            Endpoint::GlobalCatalog
        } else {
            Endpoint::DirectoryService
        }
    }

    pub fn resolved_port(&self) -> u16 {
        self.port
            .unwrap_or_else(|| self.endpoint().default_port(self.transport))
    }

    /// Derives the default baseDN for this configuration (§4.1): the
    /// realm-derived `DC=` chain, truncated to `DC=edu` when talking to the
    /// Global Catalog.
    pub fn resolved_base_dn(&self) -> String {
        if let Some(explicit) = &self.base_dn {
            return explicit.clone();
        }
        if self.use_global_catalog {
            return "DC=edu".to_string();
        }
        Realm::parse(&self.domain).default_base_dn()
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.user.is_empty(), "user must not be empty");
        ensure!(!self.domain.is_empty(), "domain must not be empty");
        ensure!(self.page_size >= 1, "page_size must be >= 1");
        ensure!(self.bind_retries >= 1, "bind_retries must be >= 1");
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        let cfg: DirectoryConfig =
            serde_yaml::from_str(&s).context("failed to parse directory config YAML")?;
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Construction-time configuration for a [`crate::tablesync::table_client::TableClient`]
/// (§4.8). One `TableClientConfig` exists per side of a sync.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct TableClientConfig {
    pub role: TableRole,
    pub dialect: SqlDialect,
    pub table: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub where_clause: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub unique_keys: Vec<BTreeSet<String>>,
    #[serde(default)]
    pub excl_cols: BTreeSet<String>,
    #[serde(default)]
    pub mask_cols: std::collections::BTreeMap<String, String>,
    #[serde(default)]
    pub max_inserts: u64,
    #[serde(default)]
    pub max_deletes: u64,
    #[serde(default)]
    pub force: bool,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub no_dups: bool,
    #[serde(default)]
    pub debug: bool,
}

impl TableClientConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.table.is_empty(), "table must not be empty");
        if self.role == TableRole::Source && !self.mask_cols.is_empty() {
            // masking only applies to the source projection (§4.9); allowed
            // on dest configs too but has no effect there.
        }
        Ok(())
    }
}

/// Bounds that the [`crate::tablesync::reconciler::Reconciler`] enforces
/// independently of either `TableClient` (§3: `MAX_PENDING = 500`).
pub const MAX_PENDING: u64 = 500;

/// Serde helpers for representing `Duration` as a number of seconds.
mod serde_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}
