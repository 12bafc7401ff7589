// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The streaming merge-diff driver (§4.14). Pulls one sorted row at a time
//! from a source and destination [`TableClient`], decides per row whether
//! to INSERT, DELETE, or skip, and holds at most one row per side plus
//! prepared-statement state regardless of table size (§8 "Bounded memory").

use std::cmp::Ordering;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::{
    error::{CoreError, CoreResult},
    tablesync::{
        sql::RowValue,
        table_client::{ColType, TableClient},
    },
};

/// Outcome of one merge step, reported to the caller/audit layer (§7:
/// "production mode emits one structured audit record per mutation").
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOp {
    Insert(Vec<RowValue>),
    Delete(Vec<RowValue>),
}

/// Totals for a completed (or aborted) run.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunSummary {
    pub inserts: u64,
    pub deletes: u64,
}

pub struct Reconciler {
    source: TableClient,
    dest: TableClient,
}

impl Reconciler {
    /// Builds a Reconciler over an already-`init`ialized source/dest pair.
    /// Fails `SchemaMismatch` immediately if their projections disagree
    /// (§4.14: "schemas must match: same colnames, same coltypes, same
    /// order").
    pub fn new(source: TableClient, dest: TableClient) -> CoreResult<Self> {
        if source.colnames() != dest.colnames() || source.coltypes() != dest.coltypes() {
            return Err(CoreError::SchemaMismatch(format!(
                "source vs dest column mismatch:\n  source: {}\n  dest:   {}",
                source.dump_colinfo(),
                dest.dump_colinfo()
            )));
        }
        Ok(Self { source, dest })
    }

    pub fn source(&self) -> &TableClient {
        &self.source
    }

    pub fn dest(&self) -> &TableClient {
        &self.dest
    }

    /// Runs the streaming merge (§4.14 pseudocode) to completion, invoking
    /// `on_op` for every INSERT/DELETE actually applied (the ambient audit
    /// hook, §7). On any error, the destination is rolled back before the
    /// error is returned (§7, §5 "Cancellation & timeouts").
    pub async fn run<F>(&self, mut on_op: F) -> CoreResult<RunSummary>
    where
        F: FnMut(&SyncOp),
    {
        match self.run_inner(&mut on_op).await {
            Ok(summary) => {
                self.dest.close_queries().await?;
                Ok(summary)
            },
            Err(e) => {
                warn!(error = %e, "reconciler aborting, rolling back destination");
                let _ = self.dest.roll_back().await;
                Err(e)
            },
        }
    }

    async fn run_inner<F>(&self, on_op: &mut F) -> CoreResult<RunSummary>
    where
        F: FnMut(&SyncOp),
    {
        let mut summary = RunSummary::default();
        let coltypes = self.source.coltypes();
        let is_long: Vec<bool> = (0..coltypes.len()).map(|i| self.source.is_long(i)).collect();

        let mut s = self.source.fetch().await?;
        let mut d = self.dest.fetch().await?;

        loop {
            if s.is_none() && d.is_none() {
                break;
            }

            let take_insert = match (&s, &d) {
                (Some(_), None) => true,
                (Some(sv), Some(dv)) => compare_rows(sv, dv, &coltypes, &is_long) == Ordering::Less,
                (None, _) => false,
            };
            let take_delete = !take_insert
                && match (&s, &d) {
                    (None, Some(_)) => true,
                    (Some(sv), Some(dv)) => {
                        compare_rows(sv, dv, &coltypes, &is_long) == Ordering::Greater
                    },
                    (_, None) => false,
                };

            if take_insert {
                let row = s.take().expect("take_insert implies s is Some");
                self.dest.insert(&row).await?;
                let op = SyncOp::Insert(row);
                on_op(&op);
                summary.inserts += 1;
                s = self.source.fetch().await?;
            } else if take_delete {
                let row = d.take().expect("take_delete implies d is Some");
                self.dest.delete(&row).await?;
                let op = SyncOp::Delete(row);
                on_op(&op);
                summary.deletes += 1;
                d = self.dest.fetch().await?;
            } else {
                // Rows compare equal: neither insert nor delete, advance both.
                s = self.source.fetch().await?;
                d = self.dest.fetch().await?;
            }

            self.dest.check_pending().await?;
        }

        info!(inserts = summary.inserts, deletes = summary.deletes, "reconciler run complete");
        Ok(summary)
    }
}

/// Lexicographic comparison of two projected rows, skipping `skiplong`
/// columns (§4.14). Must agree with the dialect's `ORDER BY` (§4.9, §4.10)
/// or the merge diverges.
fn compare_rows(a: &[RowValue], b: &[RowValue], coltypes: &[ColType], is_long: &[bool]) -> Ordering {
    for i in 0..coltypes.len() {
        if is_long.get(i).copied().unwrap_or(false) {
            continue;
        }
        let ord = compare_values(&a[i], &b[i], coltypes[i]);
        if ord != Ordering::Equal {
            debug!(column = i, ?ord, "reconciler comparator diverged at column");
            return ord;
        }
    }
    Ordering::Equal
}

/// Per-column comparison (§4.14): both-NULL is equal, one-NULL sorts less
/// (agrees with the NULLS-first sort both dialects produce), numeric
/// columns compare as `Decimal`, string columns compare bytewise.
fn compare_values(a: &RowValue, b: &RowValue, coltype: ColType) -> Ordering {
    match (a, b) {
        (RowValue::Null, RowValue::Null) => Ordering::Equal,
        (RowValue::Null, _) => Ordering::Less,
        (_, RowValue::Null) => Ordering::Greater,
        _ => match coltype {
            ColType::Numeric => as_decimal(a).cmp(&as_decimal(b)),
            ColType::String => as_bytes(a).cmp(as_bytes(b)),
        },
    }
}

fn as_decimal(v: &RowValue) -> Decimal {
    match v {
        RowValue::Numeric(d) => *d,
        RowValue::Text(s) => s.parse().unwrap_or_default(),
        RowValue::Null => Decimal::ZERO,
    }
}

fn as_bytes(v: &RowValue) -> &[u8] {
    match v {
        RowValue::Text(s) => s.as_bytes(),
        RowValue::Numeric(_) | RowValue::Null => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txt(s: &str) -> RowValue {
        RowValue::Text(s.to_string())
    }
    fn num(v: i64) -> RowValue {
        RowValue::Numeric(Decimal::from(v))
    }

    #[test]
    fn null_sorts_before_any_value() {
        assert_eq!(compare_values(&RowValue::Null, &txt("a"), ColType::String), Ordering::Less);
        assert_eq!(compare_values(&txt("a"), &RowValue::Null, ColType::String), Ordering::Greater);
        assert_eq!(compare_values(&RowValue::Null, &RowValue::Null, ColType::String), Ordering::Equal);
    }

    #[test]
    fn numeric_columns_compare_as_decimal_not_text() {
        // Textual comparison would put "10" before "9"; decimal must not.
        assert_eq!(compare_values(&num(9), &num(10), ColType::Numeric), Ordering::Less);
    }

    #[test]
    fn string_columns_compare_bytewise() {
        assert_eq!(compare_values(&txt("b"), &txt("B"), ColType::String), Ordering::Greater);
    }

    #[test]
    fn compare_rows_skips_long_columns() {
        let coltypes = [ColType::Numeric, ColType::String];
        let is_long = [false, true];
        let a = vec![num(1), txt("zzz")];
        let b = vec![num(1), txt("aaa")];
        assert_eq!(compare_rows(&a, &b, &coltypes, &is_long), Ordering::Equal);
    }

    #[test]
    fn compare_rows_stops_at_first_differing_column() {
        let coltypes = [ColType::Numeric, ColType::String];
        let is_long = [false, false];
        let a = vec![num(1), txt("z")];
        let b = vec![num(2), txt("a")];
        assert_eq!(compare_rows(&a, &b, &coltypes, &is_long), Ordering::Less);
    }
}
