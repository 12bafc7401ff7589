// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use core::fmt;

use serde::{Deserialize, Serialize};

/// Transport used for the LDAP session (§3: `{ transport: plain|tls, ... }`).
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Plain,
    Tls,
}
impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Transport::Plain => "plain",
            Transport::Tls => "tls",
        })
    }
}
impl Default for Transport {
    fn default() -> Self {
        Transport::Tls
    }
}

/// Which directory service endpoint the client resolves against
/// (§4.1: ports 389/636 for the Directory Service, 3268/3269 for the Global
/// Catalog).
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    DirectoryService,
    GlobalCatalog,
}

impl Endpoint {
    /// Default port for this endpoint given the transport (§4.1).
    pub fn default_port(self, transport: Transport) -> u16 {
        match (self, transport) {
            (Endpoint::DirectoryService, Transport::Tls) => 636,
            (Endpoint::DirectoryService, Transport::Plain) => 389,
            (Endpoint::GlobalCatalog, Transport::Tls) => 3269,
            (Endpoint::GlobalCatalog, Transport::Plain) => 3268,
        }
    }
}

/// Recognized realm/domain short names used to derive a default `baseDN`
/// (§4.1). Any other value falls back to a generic `DC=`-component split of
/// the domain string.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub enum Realm {
    MstEdu,
    UmrEdu,
    Other(String),
}

impl Realm {
    pub fn parse(domain: &str) -> Realm {
        match domain.to_ascii_lowercase().as_str() {
            "mst.edu" => Realm::MstEdu,
            "umr.edu" => Realm::UmrEdu,
            _ => Realm::Other(domain.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Realm::MstEdu => "mst.edu",
            Realm::UmrEdu => "umr.edu",
            Realm::Other(s) => s.as_str(),
        }
    }

    /// Default baseDN components for this realm (§4.1). Global Catalog
    /// truncation to `DC=edu` is applied by the caller, not here.
    pub fn default_base_dn(&self) -> String {
        match self {
            Realm::MstEdu => "DC=mst,DC=edu".to_string(),
            Realm::UmrEdu => "DC=umr,DC=edu".to_string(),
            Realm::Other(domain) => domain
                .split('.')
                .map(|part| format!("DC={part}"))
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

/// The SQL dialect a `TableClient`/`Reconciler` pair is configured for
/// (§4.10). Selects which `Dialect` implementation is injected.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    MySql,
    Oracle,
}

/// Which side of a sync a `TableClient` represents (§3).
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TableRole {
    Source,
    Dest,
}
