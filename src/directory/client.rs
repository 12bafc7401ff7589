// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! `DirectoryClient` session: construction and bind-with-retry (§3, §4.1).
//! Every operation in `search`/`mutate`/`ldif` borrows the bound connection
//! held here; the client is not safe to share across threads (§5) — callers
//! that want parallelism construct independent clients.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, anyhow};
use ldap3::{LdapConnAsync, LdapConnSettings};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{
    cfg::{config::DirectoryConfig, enums::Transport},
    directory::auth::{AuditEvent, AuditSink, AuthProvider, NullAuditSink},
    error::{CoreError, CoreResult},
};

/// A bound LDAP session plus the configuration it was constructed from.
///
/// Invariant: once [`DirectoryClient::connect`] returns `Ok`, `bound == true`
/// for the remaining lifetime of the value; every operation reuses this same
/// session (§3).
pub struct DirectoryClient {
    pub(crate) ldap: Mutex<ldap3::Ldap>,
    pub(crate) config: DirectoryConfig,
    pub(crate) base_dn: String,
    pub(crate) bound_principal: String,
    pub(crate) audit: Arc<dyn AuditSink>,
    last_error: Mutex<Option<String>>,
}

impl std::fmt::Debug for DirectoryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryClient")
            .field("bound_principal", &self.bound_principal)
            .field("base_dn", &self.base_dn)
            .finish_non_exhaustive()
    }
}

impl DirectoryClient {
    /// Binds a new session using `config`, resolving a missing password via
    /// `auth` (§4.1: "if password absent, pull from `AuthProvider.Get(user,
    /// "ads")`"). Retries the bind up to `config.bind_retries` times (default
    /// 4); on exhaustion returns `BindFailed(lastServerMessage)`.
    pub async fn connect(
        config: DirectoryConfig,
        auth: &dyn AuthProvider,
        audit: Arc<dyn AuditSink>,
    ) -> CoreResult<Self> {
        config
            .validate()
            .map_err(|e| CoreError::InvalidArgument(e.to_string()))?;

        let password = match &config.password {
            Some(p) => p.clone(),
            None => auth
                .get(&config.user, "ads")
                .await
                .map_err(|e| CoreError::BindFailed(format!("no credential available: {e}")))?,
        };

        let host = config
            .server
            .clone()
            .ok_or_else(|| CoreError::InvalidArgument("server is required".to_string()))?;
        let port = config.resolved_port();
        let base_dn = config.resolved_base_dn();
        let bound_principal = format!("{}@{}", config.user, config.domain);
        let url = ldap_url(&config.transport, &host, port);

        let mut last_message = String::from("bind never attempted");
        for attempt in 1..=config.bind_retries.max(1) {
            match bind_once(&url, &config, &bound_principal, &password).await {
                Ok(ldap) => {
                    debug!(attempt, %url, "directory bind succeeded");
                    return Ok(Self {
                        ldap: Mutex::new(ldap),
                        config,
                        base_dn,
                        bound_principal,
                        audit,
                        last_error: Mutex::new(None),
                    });
                },
                Err(e) => {
                    warn!(attempt, %url, error = %e, "directory bind attempt failed");
                    last_message = e.to_string();
                },
            }
        }

        Err(CoreError::BindFailed(last_message))
    }

    /// Constructs a client with the audit sink defaulted to [`NullAuditSink`].
    pub async fn connect_unaudited(
        config: DirectoryConfig,
        auth: &dyn AuthProvider,
    ) -> CoreResult<Self> {
        Self::connect(config, auth, Arc::new(NullAuditSink)).await
    }

    pub fn base_dn(&self) -> &str {
        &self.base_dn
    }

    pub fn domain(&self) -> &str {
        &self.config.domain
    }

    pub fn page_size(&self) -> u32 {
        self.config.page_size
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    pub fn debug(&self) -> bool {
        self.config.debug
    }

    /// Thin legacy accessor over the last recorded error message, mirroring
    /// the source's process-wide "last error" (§9 "Global error variable").
    /// Prefer the `CoreResult` returned by each call; this exists only for
    /// host programs ported from code that polled global state.
    pub async fn last_error(&self) -> Option<String> {
        self.last_error.lock().await.clone()
    }

    pub(crate) async fn record_error(&self, message: impl Into<String>) {
        *self.last_error.lock().await = Some(message.into());
    }

    pub(crate) fn emit_audit(&self, event: AuditEvent) {
        if self.config.debug {
            debug!(operation = event.operation, target = %event.target, succeeded = event.succeeded, "directory operation");
        }
        self.audit.record(event);
    }
}

fn ldap_url(transport: &Transport, host: &str, port: u16) -> String {
    let scheme = match transport {
        Transport::Tls => "ldaps",
        Transport::Plain => "ldap",
    };
    format!("{scheme}://{host}:{port}")
}

async fn bind_once(
    url: &str,
    config: &DirectoryConfig,
    bound_principal: &str,
    password: &str,
) -> anyhow::Result<ldap3::Ldap> {
    let settings = LdapConnSettings::new().set_conn_timeout(config.timeout);
    let (conn, mut ldap) = LdapConnAsync::with_settings(settings, url)
        .await
        .with_context(|| format!("connecting to {url}"))?;
    ldap3::drive!(conn);

    let result = tokio::time::timeout(
        config.timeout,
        ldap.simple_bind(bound_principal, password),
    )
    .await
    .map_err(|_| anyhow!("bind to {url} timed out after {:?}", config.timeout))??;

    result
        .success()
        .with_context(|| format!("simple bind as {bound_principal}"))?;

    Ok(ldap)
}
