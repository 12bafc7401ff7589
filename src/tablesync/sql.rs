// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The relational driver abstraction §1 lists as an external collaborator
//! ("`SQLSession` with `OpenQuery / OpenBoundQuery / ExecQuery / FetchRow /
//! FetchRowRef / CloseQuery / Commit / RollBack / AutoCommit / RowCount /
//! ErrorString / QuoteString / TypeInfoAll / ColumnInfo`"), expressed as a
//! Rust trait object so [`crate::tablesync::table_client::TableClient`] is
//! generic only over "a session," never over a concrete driver — the same
//! shape as `DirectoryClient`'s dependency on `AuthProvider`/`AuditSink`.
//!
//! This crate ships no production implementation; hosts supply one backed
//! by their MySQL/Oracle driver of choice.

use async_trait::async_trait;
use rust_decimal::Decimal;

/// Opaque handle to a prepared statement or open cursor. Driver
/// implementations are free to use any internal representation; callers
/// never interpret the value, only pass it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryHandle(pub u64);

/// One row value as it crosses the `SqlSession` boundary. Columns are
/// classified `string | numeric` by [`crate::tablesync::table_client`]
/// before construction (`unknown`-typed columns are excluded, §4.8 step 2),
/// so only those two non-null variants plus `Null` are representable here.
#[derive(Debug, Clone, PartialEq)]
pub enum RowValue {
    Null,
    Text(String),
    Numeric(Decimal),
}

impl RowValue {
    pub fn is_null(&self) -> bool {
        matches!(self, RowValue::Null)
    }
}

/// One entry of the driver's type-code → type-name map (§4.8 step 2: "the
/// driver's type-code→name map (first name wins per code)").
#[derive(Debug, Clone)]
pub struct TypeInfo {
    pub type_code: i32,
    pub type_name: String,
}

/// Column metadata as returned by `ColumnInfo` for an open query (§4.8
/// step 1: "names, driverTypeCodes, precision, scale").
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    pub name: String,
    pub type_code: i32,
    pub precision: i32,
    pub scale: i32,
}

/// The out-of-scope relational driver contract (§1, §6 "Database
/// interface"). A `TableClient` holds one `Arc<dyn SqlSession>` per role
/// (read/write, which may be the same session) and never touches a
/// concrete driver type.
#[async_trait]
pub trait SqlSession: Send + Sync {
    /// Opens an unparameterized query (used for the column-probe `select *
    /// ... where 1=0`, ad-hoc session pragmas, and the streaming SELECT).
    async fn open_query(&self, sql: &str) -> anyhow::Result<QueryHandle>;

    /// Opens a query with `?` placeholders, to be executed (possibly many
    /// times) via [`SqlSession::exec_query`].
    async fn open_bound_query(&self, sql: &str) -> anyhow::Result<QueryHandle>;

    /// Executes a previously opened query, binding `params` positionally.
    /// Returns the number of rows affected (inserts/deletes) or produced.
    async fn exec_query(&self, handle: QueryHandle, params: &[RowValue]) -> anyhow::Result<u64>;

    /// Fetches the next row of an open query's result set, or `None` at
    /// end of stream.
    async fn fetch_row(&self, handle: QueryHandle) -> anyhow::Result<Option<Vec<RowValue>>>;

    /// Same contract as [`SqlSession::fetch_row`]; driver implementations
    /// may use this to hand back a row referencing a reusable internal
    /// buffer instead of allocating fresh `String`s, the way the source
    /// distinguished a copying `FetchRow` from a zero-copy `FetchRowRef`.
    /// `TableClient` treats the two identically.
    async fn fetch_row_ref(&self, handle: QueryHandle) -> anyhow::Result<Option<Vec<RowValue>>>;

    async fn close_query(&self, handle: QueryHandle) -> anyhow::Result<()>;

    async fn commit(&self) -> anyhow::Result<()>;

    async fn rollback(&self) -> anyhow::Result<()>;

    async fn set_autocommit(&self, on: bool) -> anyhow::Result<()>;

    async fn row_count(&self, handle: QueryHandle) -> anyhow::Result<u64>;

    /// The driver's last error message, if it keeps one (mirrors the
    /// source's process-wide "last error", §5 "Shared resources").
    fn error_string(&self) -> Option<String>;

    /// Quotes/escapes a string literal for inline inclusion in SQL text —
    /// used only for mask-column literals (§4.9), never for row values,
    /// which always travel as bound parameters.
    fn quote_string(&self, s: &str) -> String;

    async fn type_info_all(&self) -> anyhow::Result<Vec<TypeInfo>>;

    async fn column_info(&self, handle: QueryHandle) -> anyhow::Result<Vec<ColumnInfo>>;
}
