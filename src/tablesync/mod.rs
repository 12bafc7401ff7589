// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Table-Synchronization Core: a database-agnostic, streaming row-by-row
//! reconciliation engine that makes a destination table equal to a source
//! table (or projection) (`spec.md` §1, §3, §4.8–§4.14).
//!
//! The relational driver itself (`SQLSession`'s concrete implementation) is
//! out of scope (§1); this module depends only on the [`sql::SqlSession`]
//! trait object, the way [`crate::directory`] depends only on `AuthProvider`
//! / `AuditSink` contracts.

/// Per-dialect hooks (identifier quoting, NULLS-first sort, LONG equality,
/// single-row limit, mask alias syntax, session-open pragmas) (§4.10).
pub mod dialect;
/// The Reconciler: streaming merge-diff driver over two `TableClient`s (§4.14).
pub mod reconciler;
/// The out-of-scope `SQLSession` contract, expressed as a Rust trait object (§1).
pub mod sql;
/// Per-endpoint introspected SQL wrapper: column classification, SELECT /
/// INSERT / DELETE construction, safety gates (§4.8–§4.13).
pub mod table_client;

pub use dialect::{Dialect, MySqlDialect, OracleDialect};
pub use reconciler::Reconciler;
pub use sql::{ColumnInfo, QueryHandle, RowValue, SqlSession, TypeInfo};
pub use table_client::TableClient;
