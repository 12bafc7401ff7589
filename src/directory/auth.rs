// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! External collaborator contracts. `spec.md` §1 places credential fetching
//! and audit/telemetry out of scope, "referenced only by their interface
//! contract." The crate depends only on these traits; a host program
//! supplies the real implementations (a secrets vault, a syslog sink, ...).

use async_trait::async_trait;

/// Resolves a bind secret for `(user, realm)` when a `DirectoryConfig` omits
/// `password` (§4.1: "if password absent, pull from `AuthProvider.Get(user,
/// "ads")`").
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn get(&self, user: &str, realm: &str) -> anyhow::Result<String>;
}

/// One mutation event recorded for audit purposes (§7: "production mode
/// emits one structured audit record per mutation via `AuditSink`").
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub operation: &'static str,
    pub target: String,
    pub detail: String,
    pub succeeded: bool,
}

pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// No-op sink used where the host program has not wired a real one.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _event: AuditEvent) {}
}
