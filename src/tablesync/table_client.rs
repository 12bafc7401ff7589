// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Per-endpoint introspected SQL wrapper (§3 "TableClient data model",
//! §4.8–§4.13): column classification, SELECT/INSERT/DELETE construction,
//! the streaming fetch, and the safety gates that bound destructive
//! mutation. One `TableClient` exists per side of a sync; the
//! [`crate::tablesync::reconciler::Reconciler`] owns exactly two and
//! releases them on every exit path (§3 "Ownership").

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    cfg::{config::TableClientConfig, enums::TableRole},
    error::{CoreError, CoreResult},
    tablesync::{
        dialect::{Dialect, SingleRowLimit},
        sql::{ColumnInfo, QueryHandle, RowValue, SqlSession, TypeInfo},
    },
};

/// Upper bound on uncommitted mutations before [`TableClient::check_pending`]
/// forces an intermediate commit (§3 invariant, `force` mode only).
pub const MAX_PENDING: u64 = 500;

/// A column's comparison/storage kind after classification (§4.8 step 2).
/// `unknown`-typed columns never reach this point — they are excluded
/// before classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColType {
    String,
    Numeric,
}

/// One projected column: its SQL name, comparison kind, and whether it's a
/// LONG/CLOB column (participates in projection and DELETE keys, excluded
/// from sort keys, §3 invariant).
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub coltype: ColType,
    pub is_long: bool,
    pub is_masked: bool,
}

/// Running counters for one `TableClient` (§3).
#[derive(Debug, Default, Clone, Copy)]
pub struct Counters {
    pub pending: u64,
    pub commits: u64,
    pub inserts: u64,
    pub deletes: u64,
    pub hit_max_inserts: bool,
    pub hit_max_deletes: bool,
}

/// The built SQL text for this client's role (§4.9, §4.11, §4.12).
#[derive(Debug, Clone)]
struct Queries {
    select: String,
    insert: Option<String>,
    delete: Option<String>,
    /// One entry per `unique_keys` set: the key's column names (in
    /// `colnames` order) paired with its prepared DELETE text (§4.12).
    delete_uniq: Vec<(Vec<String>, String)>,
}

/// Classifies one column by driver type name per §4.8 step 2. Returns
/// `None` when the column is `RAW`/`BFILE` (unknown, excluded).
fn classify_type(
    driver_type_name: &str,
    driver_type_code: i32,
    is_masked: bool,
    dialect: &dyn Dialect,
) -> CoreResult<Option<(ColType, bool)>> {
    if is_masked {
        // "A mask column is always string" (§4.8 step 2).
        return Ok(Some((ColType::String, false)));
    }

    let upper = driver_type_name.to_ascii_uppercase();

    if upper.contains("RAW") || upper.contains("BFILE") {
        return Ok(None);
    }
    if upper.contains("LONG") || driver_type_code == 40 {
        return Ok(Some((ColType::String, true)));
    }
    if upper.contains("CHAR")
        || upper.contains("TIME")
        || upper.contains("DATE")
        || upper.contains("BIN")
        || dialect.extra_string_type_names().iter().any(|n| upper.contains(n))
    {
        return Ok(Some((ColType::String, false)));
    }
    if upper.contains("DEC")
        || upper.contains("INT")
        || upper.contains("NUM")
        || upper.contains("DOUBLE")
        || upper.contains("FLOAT")
    {
        return Ok(Some((ColType::Numeric, false)));
    }

    Err(CoreError::Unsupported(format!(
        "column type '{driver_type_name}' (code {driver_type_code}) is not supported"
    )))
}

/// Builds the driver's type-code → type-name map, first name wins per code
/// (§4.8 step 2).
fn build_type_map(entries: Vec<TypeInfo>) -> BTreeMap<i32, String> {
    let mut map = BTreeMap::new();
    for entry in entries {
        map.entry(entry.type_code).or_insert(entry.type_name);
    }
    map
}

pub struct TableClient {
    role: TableRole,
    dialect: Box<dyn Dialect>,
    read: Arc<dyn SqlSession>,
    write: Arc<dyn SqlSession>,
    table: String,
    alias: Option<String>,
    where_clause: Option<String>,
    args: Vec<RowValue>,
    unique_keys: Vec<BTreeSet<String>>,
    mask_cols: BTreeMap<String, String>,
    max_inserts: u64,
    max_deletes: u64,
    force: bool,
    dry_run: bool,
    no_dups: bool,
    debug: bool,

    colinfo: Vec<ColumnInfo>,
    /// Lower-cased projected column names, positionally aligned with
    /// `columns` (§3 invariant).
    colnames: Vec<String>,
    columns: Vec<Column>,
    queries: Queries,

    select_handle: Mutex<Option<QueryHandle>>,
    insert_handle: Mutex<Option<QueryHandle>>,
    delete_handle: Mutex<Option<QueryHandle>>,
    delete_uniq_handles: Mutex<Vec<QueryHandle>>,
    counters: Mutex<Counters>,
}

impl std::fmt::Debug for TableClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableClient")
            .field("role", &self.role)
            .field("table", &self.table)
            .field("colnames", &self.colnames)
            .finish_non_exhaustive()
    }
}

impl TableClient {
    /// Introspects `cfg.table` on `read` (`role=dest` may use a distinct
    /// `write` session) and builds every prepared statement this role
    /// needs (§4.8).
    pub async fn init(
        cfg: TableClientConfig,
        read: Arc<dyn SqlSession>,
        write: Option<Arc<dyn SqlSession>>,
        dialect: Box<dyn Dialect>,
    ) -> CoreResult<Self> {
        cfg.validate()
            .map_err(|e| CoreError::InvalidArgument(e.to_string()))?;

        let write = write.unwrap_or_else(|| Arc::clone(&read));

        dialect
            .on_session_open(read.as_ref())
            .await
            .map_err(|e| CoreError::DriverError(e.to_string()))?;
        if !Arc::ptr_eq(&read, &write) {
            dialect
                .on_session_open(write.as_ref())
                .await
                .map_err(|e| CoreError::DriverError(e.to_string()))?;
        }

        let alias_sql = cfg.alias.clone().map(|a| format!(" {a}")).unwrap_or_default();
        let probe_sql = format!(
            "select * from {}{} where 1=0",
            cfg.table,
            alias_sql
        );
        let probe_handle = read
            .open_query(&probe_sql)
            .await
            .map_err(|e| CoreError::DriverError(e.to_string()))?;
        let raw_cols = read
            .column_info(probe_handle)
            .await
            .map_err(|e| CoreError::DriverError(e.to_string()))?;
        read.close_query(probe_handle)
            .await
            .map_err(|e| CoreError::DriverError(e.to_string()))?;

        let type_map = build_type_map(
            read.type_info_all()
                .await
                .map_err(|e| CoreError::DriverError(e.to_string()))?,
        );

        let mut columns = Vec::new();
        let mut colnames = Vec::new();
        for col in &raw_cols {
            let name = col.name.to_ascii_lowercase();
            if cfg.excl_cols.contains(&name) {
                continue;
            }
            let is_masked = cfg.mask_cols.contains_key(&name);
            let type_name = type_map
                .get(&col.type_code)
                .cloned()
                .unwrap_or_else(|| format!("UNKNOWN_CODE_{}", col.type_code));

            match classify_type(&type_name, col.type_code, is_masked, dialect.as_ref())? {
                None => continue,
                Some((coltype, is_long)) => {
                    colnames.push(name.clone());
                    columns.push(Column { name, coltype, is_long, is_masked });
                },
            }
        }
        for key in &cfg.unique_keys {
            for member in key {
                if !colnames.contains(member) {
                    return Err(CoreError::InvalidArgument(format!(
                        "unique key column '{member}' is not a projected column"
                    )));
                }
            }
        }

        let select_cols: Vec<String> = columns
            .iter()
            .map(|c| {
                let quoted = dialect.quote_ident(&c.name);
                if c.is_masked && cfg.role == TableRole::Source {
                    let literal = cfg.mask_cols.get(&c.name).map(String::as_str).unwrap_or("");
                    dialect.mask_alias(&read.quote_string(literal), &c.name)
                } else {
                    quoted
                }
            })
            .collect();

        let sort_cols: Vec<String> = columns
            .iter()
            .filter(|c| !c.is_long)
            .map(|c| dialect.nulls_first_sort_expr(&dialect.quote_ident(&c.name)))
            .collect();

        let distinct = if cfg.no_dups { "DISTINCT " } else { "" };
        let mut select = format!(
            "SELECT {distinct}{} FROM {}{}",
            select_cols.join(", "),
            cfg.table,
            alias_sql
        );
        if let Some(w) = &cfg.where_clause {
            select.push_str(&format!(" WHERE {w}"));
        }
        if !sort_cols.is_empty() {
            select.push_str(&format!(" ORDER BY {}", sort_cols.join(", ")));
        }

        let (insert, delete, delete_uniq) = if cfg.role == TableRole::Dest {
            let insert = Some(build_insert_sql(&cfg.table, &columns, dialect.as_ref()));
            let delete = Some(build_delete_sql(
                &cfg.table,
                &columns,
                dialect.as_ref(),
                cfg.no_dups,
            ));
            let delete_uniq = cfg
                .unique_keys
                .iter()
                .map(|key| {
                    let key_cols: Vec<Column> = columns
                        .iter()
                        .filter(|c| key.contains(&c.name))
                        .cloned()
                        .collect();
                    let names: Vec<String> = key_cols.iter().map(|c| c.name.clone()).collect();
                    let sql =
                        build_delete_sql(&cfg.table, &key_cols, dialect.as_ref(), cfg.no_dups);
                    (names, sql)
                })
                .collect();
            (insert, delete, delete_uniq)
        } else {
            (None, None, Vec::new())
        };

        if cfg.role == TableRole::Dest && !cfg.dry_run {
            write
                .set_autocommit(false)
                .await
                .map_err(|e| CoreError::DriverError(e.to_string()))?;
        }

        debug!(table = %cfg.table, role = ?cfg.role, dialect = dialect.name(), select = %select, "TableClient initialized");

        Ok(Self {
            role: cfg.role,
            dialect,
            read,
            write,
            table: cfg.table,
            alias: cfg.alias,
            where_clause: cfg.where_clause,
            args: cfg
                .args
                .into_iter()
                .map(RowValue::Text)
                .collect(),
            unique_keys: cfg.unique_keys,
            mask_cols: cfg.mask_cols,
            max_inserts: cfg.max_inserts,
            max_deletes: cfg.max_deletes,
            force: cfg.force,
            dry_run: cfg.dry_run,
            no_dups: cfg.no_dups,
            debug: cfg.debug,
            colinfo: raw_cols,
            colnames,
            columns,
            queries: Queries { select, insert, delete, delete_uniq },
            select_handle: Mutex::new(None),
            insert_handle: Mutex::new(None),
            delete_handle: Mutex::new(None),
            delete_uniq_handles: Mutex::new(Vec::new()),
            counters: Mutex::new(Counters::default()),
        })
    }

    pub fn colnames(&self) -> &[String] {
        &self.colnames
    }

    pub fn coltypes(&self) -> Vec<ColType> {
        self.columns.iter().map(|c| c.coltype).collect()
    }

    pub fn is_long(&self, idx: usize) -> bool {
        self.columns.get(idx).is_some_and(|c| c.is_long)
    }

    pub fn select_sql(&self) -> &str {
        &self.queries.select
    }

    pub fn insert_sql(&self) -> Option<&str> {
        self.queries.insert.as_deref()
    }

    pub fn delete_sql(&self) -> Option<&str> {
        self.queries.delete.as_deref()
    }

    pub async fn counters(&self) -> Counters {
        *self.counters.lock().await
    }

    /// Human-readable column-schema dump, used by the Reconciler to report
    /// a `SchemaMismatch` diff (§4.14: `dumpColinfo`).
    pub fn dump_colinfo(&self) -> String {
        self.columns
            .iter()
            .map(|c| format!("{}:{:?}{}", c.name, c.coltype, if c.is_long { ":long" } else { "" }))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Fetches the next row of the streaming SELECT, opening it lazily on
    /// first call (§4.9, §5 "Blocking operations").
    pub async fn fetch(&self) -> CoreResult<Option<Vec<RowValue>>> {
        let mut guard = self.select_handle.lock().await;
        let handle = match *guard {
            Some(h) => h,
            None => {
                let h = self
                    .read
                    .open_bound_query(&self.queries.select)
                    .await
                    .map_err(|e| CoreError::DriverError(e.to_string()))?;
                self.read
                    .exec_query(h, &self.args)
                    .await
                    .map_err(|e| CoreError::DriverError(e.to_string()))?;
                *guard = Some(h);
                h
            },
        };
        drop(guard);
        self.read
            .fetch_row(handle)
            .await
            .map_err(|e| CoreError::DriverError(e.to_string()))
    }

    /// Inserts one row (§4.11), gated by `max_inserts` (§4.13).
    pub async fn insert(&self, row: &[RowValue]) -> CoreResult<()> {
        {
            let mut counters = self.counters.lock().await;
            if self.max_inserts > 0 && counters.inserts >= self.max_inserts && !self.force {
                counters.hit_max_inserts = true;
                let attempted = counters.inserts + 1;
                drop(counters);
                if !self.dry_run {
                    self.roll_back().await?;
                }
                return Err(CoreError::MaxInsertsReached { attempted, max: self.max_inserts });
            }
        }

        if !self.dry_run {
            let mut guard = self.insert_handle.lock().await;
            let handle = match *guard {
                Some(h) => h,
                None => {
                    let sql = self
                        .queries
                        .insert
                        .as_deref()
                        .ok_or_else(|| CoreError::InvalidArgument("insert not built for this role".into()))?;
                    let h = self
                        .write
                        .open_bound_query(sql)
                        .await
                        .map_err(|e| CoreError::DriverError(e.to_string()))?;
                    *guard = Some(h);
                    h
                },
            };
            drop(guard);
            self.write
                .exec_query(handle, row)
                .await
                .map_err(|e| CoreError::DriverError(e.to_string()))?;
        }

        let mut counters = self.counters.lock().await;
        counters.inserts += 1;
        counters.pending += 1;
        if self.debug {
            debug!(table = %self.table, inserts = counters.inserts, "insert");
        }
        Ok(())
    }

    /// Deletes one row via the generic delete, keyed on every projected
    /// column (§4.12), gated by `max_deletes` (§4.13).
    pub async fn delete(&self, row: &[RowValue]) -> CoreResult<()> {
        {
            let mut counters = self.counters.lock().await;
            if self.max_deletes > 0 && counters.deletes >= self.max_deletes && !self.force {
                counters.hit_max_deletes = true;
                let attempted = counters.deletes + 1;
                drop(counters);
                if !self.dry_run {
                    self.roll_back().await?;
                }
                return Err(CoreError::MaxDeletesReached { attempted, max: self.max_deletes });
            }
        }

        if !self.dry_run {
            let mut guard = self.delete_handle.lock().await;
            let handle = match *guard {
                Some(h) => h,
                None => {
                    let sql = self
                        .queries
                        .delete
                        .as_deref()
                        .ok_or_else(|| CoreError::InvalidArgument("delete not built for this role".into()))?;
                    let h = self
                        .write
                        .open_bound_query(sql)
                        .await
                        .map_err(|e| CoreError::DriverError(e.to_string()))?;
                    *guard = Some(h);
                    h
                },
            };
            drop(guard);
            let params = doubled_params(row);
            self.write
                .exec_query(handle, &params)
                .await
                .map_err(|e| CoreError::DriverError(e.to_string()))?;
        }

        let mut counters = self.counters.lock().await;
        counters.deletes += 1;
        counters.pending += 1;
        if self.debug {
            debug!(table = %self.table, deletes = counters.deletes, "delete");
        }
        Ok(())
    }

    /// Deletes one row by a specific unique key (§4.12 "Unique deletes").
    /// `key_index` selects the entry in `unique_keys` (construction order).
    pub async fn delete_by_unique_key(&self, key_index: usize, row: &[RowValue]) -> CoreResult<()> {
        let (names, _) = self
            .queries
            .delete_uniq
            .get(key_index)
            .ok_or_else(|| CoreError::InvalidArgument(format!("no unique key #{key_index}")))?
            .clone();

        let mut guards = self.delete_uniq_handles.lock().await;
        while guards.len() <= key_index {
            let next_sql = &self.queries.delete_uniq[guards.len()].1;
            let h = self
                .write
                .open_bound_query(next_sql)
                .await
                .map_err(|e| CoreError::DriverError(e.to_string()))?;
            guards.push(h);
        }
        let handle = guards[key_index];
        drop(guards);

        let key_values: Vec<RowValue> = names
            .iter()
            .filter_map(|n| {
                self.colnames
                    .iter()
                    .position(|c| c == n)
                    .and_then(|idx| row.get(idx).cloned())
            })
            .collect();
        let params = doubled_params(&key_values);

        if !self.dry_run {
            self.write
                .exec_query(handle, &params)
                .await
                .map_err(|e| CoreError::DriverError(e.to_string()))?;
        }

        let mut counters = self.counters.lock().await;
        counters.deletes += 1;
        counters.pending += 1;
        Ok(())
    }

    /// Commits when `pending > MAX_PENDING` and `force` (§4.13). In
    /// `dry_run` no commit is issued but counters behave identically.
    pub async fn check_pending(&self) -> CoreResult<()> {
        let should_commit = {
            let counters = self.counters.lock().await;
            counters.pending > MAX_PENDING && self.force
        };
        if !should_commit {
            return Ok(());
        }
        if !self.dry_run {
            self.write
                .commit()
                .await
                .map_err(|e| CoreError::DriverError(e.to_string()))?;
        }
        let mut counters = self.counters.lock().await;
        counters.pending = 0;
        counters.commits += 1;
        Ok(())
    }

    /// Commits any pending changes (unless `dry_run`), closes every
    /// prepared statement including every `delete_uniq` entry, and
    /// restores autocommit (§4.13).
    pub async fn close_queries(&self) -> CoreResult<()> {
        if !self.dry_run && self.role == TableRole::Dest {
            let pending = self.counters.lock().await.pending;
            if pending > 0 {
                self.write
                    .commit()
                    .await
                    .map_err(|e| CoreError::DriverError(e.to_string()))?;
                let mut counters = self.counters.lock().await;
                counters.pending = 0;
                counters.commits += 1;
            }
        }

        if let Some(h) = self.select_handle.lock().await.take() {
            let _ = self.read.close_query(h).await;
        }
        if let Some(h) = self.insert_handle.lock().await.take() {
            let _ = self.write.close_query(h).await;
        }
        if let Some(h) = self.delete_handle.lock().await.take() {
            let _ = self.write.close_query(h).await;
        }
        for h in self.delete_uniq_handles.lock().await.drain(..) {
            let _ = self.write.close_query(h).await;
        }

        if self.role == TableRole::Dest && !self.dry_run {
            self.write
                .set_autocommit(true)
                .await
                .map_err(|e| CoreError::DriverError(e.to_string()))?;
        }
        Ok(())
    }

    /// Issues `RollBack` on the write session if `role=dest` (§4.13).
    pub async fn roll_back(&self) -> CoreResult<()> {
        if self.role != TableRole::Dest {
            return Ok(());
        }
        self.write
            .rollback()
            .await
            .map_err(|e| CoreError::DriverError(e.to_string()))
    }

    pub fn unique_key_count(&self) -> usize {
        self.unique_keys.len()
    }

    pub fn colinfo(&self) -> &[ColumnInfo] {
        &self.colinfo
    }

    pub fn role(&self) -> TableRole {
        self.role
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn mask_cols(&self) -> &BTreeMap<String, String> {
        &self.mask_cols
    }

    pub fn where_clause(&self) -> Option<&str> {
        self.where_clause.as_deref()
    }
}

/// Doubles each value so it can bind both `?`s of the null-safe predicate
/// `(col=? OR (? IS NULL AND col IS NULL))` (§4.12 invariant).
fn doubled_params(row: &[RowValue]) -> Vec<RowValue> {
    let mut out = Vec::with_capacity(row.len() * 2);
    for v in row {
        out.push(v.clone());
        out.push(v.clone());
    }
    out
}

fn build_insert_sql(table: &str, columns: &[Column], dialect: &dyn Dialect) -> String {
    let names: Vec<String> = columns.iter().map(|c| dialect.quote_ident(&c.name)).collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!("INSERT INTO {table} ({}) VALUES ({placeholders})", names.join(", "))
}

fn build_delete_sql(table: &str, columns: &[Column], dialect: &dyn Dialect, no_dups: bool) -> String {
    let clauses: Vec<String> = columns
        .iter()
        .map(|c| {
            let quoted = dialect.quote_ident(&c.name);
            let eq = dialect.eq_predicate(&quoted, c.is_long);
            format!("({eq} OR (? IS NULL AND {quoted} IS NULL))")
        })
        .collect();
    let mut predicate = clauses.join(" AND ");

    if no_dups && let SingleRowLimit::WherePredicate(extra) = dialect.single_row_limit() {
        predicate = format!("{predicate} AND {extra}");
    }

    let mut sql = format!("DELETE FROM {table} WHERE {predicate}");
    if no_dups && let SingleRowLimit::StatementSuffix(suffix) = dialect.single_row_limit() {
        sql = format!("{sql} {suffix}");
    }
    sql
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tablesync::dialect::{MySqlDialect, OracleDialect};

    fn col(name: &str, coltype: ColType, is_long: bool) -> Column {
        Column { name: name.to_string(), coltype, is_long, is_masked: false }
    }

    #[test]
    fn classify_type_follows_spec_rules() {
        let d = MySqlDialect;
        assert_eq!(
            classify_type("VARCHAR2", 0, false, &d).unwrap(),
            Some((ColType::String, false))
        );
        assert_eq!(
            classify_type("NUMBER", 0, false, &d).unwrap(),
            Some((ColType::Numeric, false))
        );
        assert_eq!(classify_type("RAW", 0, false, &d).unwrap(), None);
        assert_eq!(classify_type("BFILE", 0, false, &d).unwrap(), None);
        assert_eq!(
            classify_type("LONG", 0, false, &d).unwrap(),
            Some((ColType::String, true))
        );
        assert_eq!(
            classify_type("ANYTHING", 40, false, &d).unwrap(),
            Some((ColType::String, true))
        );
        assert!(classify_type("WEIRDTYPE", 999, false, &d).is_err());
    }

    #[test]
    fn mysql_classifies_blob_as_string() {
        assert_eq!(
            classify_type("BLOB", 0, false, &MySqlDialect).unwrap(),
            Some((ColType::String, false))
        );
        // Oracle has no such BLOB->string carve-out beyond BIN/CHAR/LONG.
        assert!(classify_type("BLOB", 0, false, &OracleDialect).is_err());
    }

    #[test]
    fn masked_column_is_always_string() {
        assert_eq!(
            classify_type("NUMBER", 0, true, &MySqlDialect).unwrap(),
            Some((ColType::String, false))
        );
    }

    #[test]
    fn generic_delete_sql_mysql_appends_limit_one() {
        let cols = vec![col("id", ColType::Numeric, false), col("name", ColType::String, false)];
        let sql = build_delete_sql("users", &cols, &MySqlDialect, true);
        assert_eq!(
            sql,
            "DELETE FROM users WHERE (`id`=? OR (? IS NULL AND `id` IS NULL)) AND \
             (`name`=? OR (? IS NULL AND `name` IS NULL)) LIMIT 1"
        );
    }

    #[test]
    fn generic_delete_sql_oracle_ands_rownum() {
        let cols = vec![col("id", ColType::Numeric, false)];
        let sql = build_delete_sql("users", &cols, &OracleDialect, true);
        assert_eq!(
            sql,
            "DELETE FROM users WHERE (id=? OR (? IS NULL AND id IS NULL)) AND rownum=1"
        );
    }

    #[test]
    fn long_column_uses_dialect_specific_predicate_in_delete() {
        let cols = vec![col("notes", ColType::String, true)];
        let sql = build_delete_sql("docs", &cols, &OracleDialect, false);
        assert_eq!(
            sql,
            "DELETE FROM docs WHERE (dbms_lob.compare(notes, ?) = 0 OR (? IS NULL AND notes IS NULL))"
        );
    }

    #[test]
    fn insert_sql_lists_colnames_and_placeholders() {
        let cols = vec![col("id", ColType::Numeric, false), col("name", ColType::String, false)];
        assert_eq!(
            build_insert_sql("users", &cols, &MySqlDialect),
            "INSERT INTO users (`id`, `name`) VALUES (?, ?)"
        );
    }

    #[test]
    fn doubled_params_binds_each_value_twice() {
        let row = vec![RowValue::Text("a".into()), RowValue::Null];
        let params = doubled_params(&row);
        assert_eq!(
            params,
            vec![
                RowValue::Text("a".into()),
                RowValue::Text("a".into()),
                RowValue::Null,
                RowValue::Null,
            ]
        );
    }
}
