// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Per-dialect hooks (§4.10). MySQL and Oracle specializations differ only
//! by the hooks here (plus Oracle's session-open pragmas, §4.8 step 5); a
//! `Dialect` is a trait object injected into `TableClient` by value (Design
//! Notes §9's suggested shape) — a small closed trait-object dispatch, since
//! a `Dialect` carries no per-variant wire data.

use async_trait::async_trait;

use crate::tablesync::sql::SqlSession;

/// Where a dialect's single-row-limit hook (§4.10, `no_dups`) attaches: MySQL
/// appends `LIMIT 1` after the whole statement, Oracle ANDs `rownum=1` into
/// the WHERE predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingleRowLimit {
    /// ANDed into the WHERE predicate alongside the key columns.
    WherePredicate(&'static str),
    /// Appended verbatim after the complete statement.
    StatementSuffix(&'static str),
}

#[async_trait]
pub trait Dialect: Send + Sync {
    fn name(&self) -> &'static str;

    /// Quotes a bare identifier for safe inclusion in generated SQL (§4.10).
    fn quote_ident(&self, ident: &str) -> String;

    /// Type-name substrings this dialect additionally classifies as
    /// `string` beyond the universal CHAR/TIME/DATE/BIN rule (§4.8 step 2:
    /// "MySQL specialization additionally maps `BLOB` → string").
    fn extra_string_type_names(&self) -> &'static [&'static str] {
        &[]
    }

    /// The ORDER BY expression for one column that sorts NULLs first
    /// (§4.9, §4.10).
    fn nulls_first_sort_expr(&self, quoted_ident: &str) -> String;

    /// The equality fragment for one column inside a DELETE predicate,
    /// before it is wrapped in the null-safe `(x OR (? IS NULL AND ...))`
    /// form (§4.12). `is_long` selects the LONG/CLOB-specific predicate
    /// (§4.10: Oracle's `dbms_lob.compare`).
    fn eq_predicate(&self, quoted_ident: &str, is_long: bool) -> String;

    fn single_row_limit(&self) -> SingleRowLimit;

    /// Formats a masked column's projection: a quoted literal aliased to
    /// the column name (§4.9, §4.10). `quoted_literal` has already been
    /// through [`SqlSession::quote_string`].
    fn mask_alias(&self, quoted_literal: &str, col: &str) -> String;

    /// Runs once per session a `TableClient` will use, before the first
    /// query (§4.8 step 5: Oracle's `NLS_DATE_FORMAT`/`NLS_TIMESTAMP_FORMAT`
    /// pragmas, blank-chopping, CLOB bind mode). No-op for MySQL.
    async fn on_session_open(&self, _session: &dyn SqlSession) -> anyhow::Result<()> {
        Ok(())
    }
}

/// `Dialect` for MySQL (§4.10).
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

#[async_trait]
impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("`{ident}`")
    }

    fn extra_string_type_names(&self) -> &'static [&'static str] {
        &["BLOB"]
    }

    fn nulls_first_sort_expr(&self, quoted_ident: &str) -> String {
        format!("{quoted_ident} IS NULL, {quoted_ident}")
    }

    fn eq_predicate(&self, quoted_ident: &str, _is_long: bool) -> String {
        // "(none — BLOB-as-string)": LONG/BLOB columns compare with plain
        // equality under MySQL, same as any other string column.
        format!("{quoted_ident}=?")
    }

    fn single_row_limit(&self) -> SingleRowLimit {
        SingleRowLimit::StatementSuffix("LIMIT 1")
    }

    fn mask_alias(&self, quoted_literal: &str, col: &str) -> String {
        format!("{quoted_literal} as {}", self.quote_ident(col))
    }
}

/// `Dialect` for Oracle (§4.10, §4.8 step 5).
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleDialect;

#[async_trait]
impl Dialect for OracleDialect {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn quote_ident(&self, ident: &str) -> String {
        ident.to_string()
    }

    fn nulls_first_sort_expr(&self, quoted_ident: &str) -> String {
        // Relies on Oracle's server default: NULLS LAST for DESC, NULLS
        // FIRST for ASC (§4.10; flagged for dual-dialect comparator
        // agreement tests in §9 Design Notes).
        quoted_ident.to_string()
    }

    fn eq_predicate(&self, quoted_ident: &str, is_long: bool) -> String {
        if is_long {
            format!("dbms_lob.compare({quoted_ident}, ?) = 0")
        } else {
            format!("{quoted_ident}=?")
        }
    }

    fn single_row_limit(&self) -> SingleRowLimit {
        SingleRowLimit::WherePredicate("rownum=1")
    }

    fn mask_alias(&self, quoted_literal: &str, col: &str) -> String {
        format!("{quoted_literal} {col}")
    }

    async fn on_session_open(&self, session: &dyn SqlSession) -> anyhow::Result<()> {
        for pragma in [
            "alter session set NLS_DATE_FORMAT='YYYY-MM-DD HH24:MI:SS'",
            "alter session set NLS_TIMESTAMP_FORMAT='YYYY-MM-DD HH24:MI:SS.FF'",
            "alter session set BLANK_TRIMMING=FALSE",
        ] {
            let handle = session.open_query(pragma).await?;
            session.exec_query(handle, &[]).await?;
            session.close_query(handle).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mysql_quotes_with_backticks() {
        let d = MySqlDialect;
        assert_eq!(d.quote_ident("col"), "`col`");
        assert_eq!(d.nulls_first_sort_expr("`col`"), "`col` IS NULL, `col`");
    }

    #[test]
    fn oracle_quotes_bare_and_relies_on_server_default() {
        let d = OracleDialect;
        assert_eq!(d.quote_ident("col"), "col");
        assert_eq!(d.nulls_first_sort_expr("col"), "col");
    }

    #[test]
    fn long_equality_predicate_differs_by_dialect() {
        assert_eq!(MySqlDialect.eq_predicate("`notes`", true), "`notes`=?");
        assert_eq!(
            OracleDialect.eq_predicate("notes", true),
            "dbms_lob.compare(notes, ?) = 0"
        );
    }

    #[test]
    fn single_row_limit_shape_differs_by_dialect() {
        assert_eq!(
            MySqlDialect.single_row_limit(),
            SingleRowLimit::StatementSuffix("LIMIT 1")
        );
        assert_eq!(
            OracleDialect.single_row_limit(),
            SingleRowLimit::WherePredicate("rownum=1")
        );
    }

    #[test]
    fn mask_alias_syntax_differs_by_dialect() {
        assert_eq!(MySqlDialect.mask_alias("'x'", "col"), "'x' as `col`");
        assert_eq!(OracleDialect.mask_alias("'x'", "col"), "'x' col");
    }
}
