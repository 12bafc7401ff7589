// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{collections::HashMap, path::PathBuf, sync::Arc};

use ads_sync_core::{
    cfg::config::DirectoryConfig,
    directory::{
        auth::{AuditEvent, AuditSink, AuthProvider, NullAuditSink},
        client::DirectoryClient,
    },
};
use anyhow::{Context, Result};
use async_trait::async_trait;

/// Path to the directory config these tests bind against. Unset (the
/// common case outside a provisioned AD lab) means "skip" — these tests
/// need a real domain controller and are not run by default (§5: live
/// network dependency).
pub fn test_config_path() -> Option<PathBuf> {
    std::env::var("ADS_SYNC_TEST_CONFIG").ok().map(PathBuf::from)
}

pub fn load_config(path: &PathBuf) -> Result<DirectoryConfig> {
    DirectoryConfig::load_from_file(path).with_context(|| format!("failed to load {path:?}"))
}

/// Fixed-credential `AuthProvider` reading `ADS_SYNC_TEST_PASSWORD` so the
/// bind password never lives in the committed config file.
pub struct EnvAuthProvider;

#[async_trait]
impl AuthProvider for EnvAuthProvider {
    async fn get(&self, user: &str, realm: &str) -> Result<String> {
        std::env::var("ADS_SYNC_TEST_PASSWORD")
            .with_context(|| format!("ADS_SYNC_TEST_PASSWORD not set (needed for {user}@{realm})"))
    }
}

/// Audit sink that records events in memory instead of discarding them, so
/// a test can assert "exactly one record per mutation" (§7).
#[derive(Default)]
pub struct RecordingAuditSink(pub tokio::sync::Mutex<Vec<AuditEvent>>);

impl AuditSink for RecordingAuditSink {
    fn record(&self, event: AuditEvent) {
        if let Ok(mut guard) = self.0.try_lock() {
            guard.push(event);
        }
    }
}

pub async fn connect(cfg: DirectoryConfig) -> Result<DirectoryClient> {
    let client = DirectoryClient::connect(cfg, &EnvAuthProvider, Arc::new(NullAuditSink))
        .await
        .context("directory bind failed")?;
    Ok(client)
}

/// Credentials map for tests that want `StaticAuthProvider`-style behavior
/// without depending on the crate's `#[cfg(test)]`-only test support.
pub struct StaticAuthProvider(pub HashMap<String, String>);

#[async_trait]
impl AuthProvider for StaticAuthProvider {
    async fn get(&self, user: &str, realm: &str) -> Result<String> {
        self.0
            .get(&format!("{user}@{realm}"))
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no credential for {user}@{realm}"))
    }
}
