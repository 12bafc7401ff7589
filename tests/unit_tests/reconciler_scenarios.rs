// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! End-to-end `TableClient` + `Reconciler` exercises against an in-memory
//! fake `SqlSession`, covering the concrete scenarios `spec.md` §8 names
//! ("Reconciler basic", "Cap trip").

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering as AtomicOrdering},
    },
};

use ads_sync_core::{
    cfg::{
        config::TableClientConfig,
        enums::{SqlDialect, TableRole},
    },
    error::CoreError,
    tablesync::{
        ColumnInfo, MySqlDialect, QueryHandle, Reconciler, RowValue, SqlSession, TableClient,
        TypeInfo,
    },
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

/// In-memory `SqlSession`: a fixed two-column schema (`id` numeric, `val`
/// string), a committed row set, and a transaction buffer so `commit`/
/// `rollback` behave observably (needed for the cap-trip scenario).
struct FakeSession {
    schema: Vec<ColumnInfo>,
    types: Vec<TypeInfo>,
    rows: Mutex<Vec<Vec<RowValue>>>,
    sql_text: Mutex<HashMap<u64, String>>,
    next_handle: AtomicU64,
    select_cursors: Mutex<HashMap<u64, VecDeque<Vec<RowValue>>>>,
    pending_inserts: Mutex<Vec<Vec<RowValue>>>,
    pending_deletes: Mutex<Vec<Vec<RowValue>>>,
}

impl FakeSession {
    fn new(rows: Vec<Vec<RowValue>>) -> Arc<Self> {
        Arc::new(Self {
            schema: vec![
                ColumnInfo { name: "id".into(), type_code: 3, precision: 10, scale: 0 },
                ColumnInfo { name: "val".into(), type_code: 12, precision: 255, scale: 0 },
            ],
            types: vec![
                TypeInfo { type_code: 3, type_name: "NUMBER".into() },
                TypeInfo { type_code: 12, type_name: "VARCHAR".into() },
            ],
            rows: Mutex::new(rows),
            sql_text: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
            select_cursors: Mutex::new(HashMap::new()),
            pending_inserts: Mutex::new(Vec::new()),
            pending_deletes: Mutex::new(Vec::new()),
        })
    }

    async fn committed_row_count(&self) -> usize {
        self.rows.lock().await.len()
    }
}

#[async_trait]
impl SqlSession for FakeSession {
    async fn open_query(&self, sql: &str) -> anyhow::Result<QueryHandle> {
        let h = self.next_handle.fetch_add(1, AtomicOrdering::SeqCst);
        self.sql_text.lock().await.insert(h, sql.to_string());
        Ok(QueryHandle(h))
    }

    async fn open_bound_query(&self, sql: &str) -> anyhow::Result<QueryHandle> {
        self.open_query(sql).await
    }

    async fn exec_query(&self, handle: QueryHandle, params: &[RowValue]) -> anyhow::Result<u64> {
        let sql = self.sql_text.lock().await.get(&handle.0).cloned().unwrap_or_default();
        if sql.starts_with("SELECT") {
            let snapshot: VecDeque<Vec<RowValue>> =
                self.rows.lock().await.iter().cloned().collect();
            self.select_cursors.lock().await.insert(handle.0, snapshot);
            Ok(0)
        } else if sql.starts_with("INSERT") {
            self.pending_inserts.lock().await.push(params.to_vec());
            Ok(1)
        } else if sql.starts_with("DELETE") {
            // `doubled_params` lays out [v0,v0,v1,v1,...]; every other
            // entry recovers the original row values (§4.12 invariant).
            let values: Vec<RowValue> = params.iter().step_by(2).cloned().collect();
            self.pending_deletes.lock().await.push(values);
            Ok(1)
        } else {
            Ok(0)
        }
    }

    async fn fetch_row(&self, handle: QueryHandle) -> anyhow::Result<Option<Vec<RowValue>>> {
        Ok(self
            .select_cursors
            .lock()
            .await
            .get_mut(&handle.0)
            .and_then(|q| q.pop_front()))
    }

    async fn fetch_row_ref(&self, handle: QueryHandle) -> anyhow::Result<Option<Vec<RowValue>>> {
        self.fetch_row(handle).await
    }

    async fn close_query(&self, handle: QueryHandle) -> anyhow::Result<()> {
        self.sql_text.lock().await.remove(&handle.0);
        self.select_cursors.lock().await.remove(&handle.0);
        Ok(())
    }

    async fn commit(&self) -> anyhow::Result<()> {
        let inserts = std::mem::take(&mut *self.pending_inserts.lock().await);
        let deletes = std::mem::take(&mut *self.pending_deletes.lock().await);
        let mut rows = self.rows.lock().await;
        for d in deletes {
            if let Some(pos) = rows.iter().position(|r| r == &d) {
                rows.remove(pos);
            }
        }
        rows.extend(inserts);
        Ok(())
    }

    async fn rollback(&self) -> anyhow::Result<()> {
        self.pending_inserts.lock().await.clear();
        self.pending_deletes.lock().await.clear();
        Ok(())
    }

    async fn set_autocommit(&self, _on: bool) -> anyhow::Result<()> {
        Ok(())
    }

    async fn row_count(&self, _handle: QueryHandle) -> anyhow::Result<u64> {
        Ok(0)
    }

    fn error_string(&self) -> Option<String> {
        None
    }

    fn quote_string(&self, s: &str) -> String {
        format!("'{}'", s.replace('\'', "''"))
    }

    async fn type_info_all(&self) -> anyhow::Result<Vec<TypeInfo>> {
        Ok(self.types.clone())
    }

    async fn column_info(&self, _handle: QueryHandle) -> anyhow::Result<Vec<ColumnInfo>> {
        Ok(self.schema.clone())
    }
}

fn row(id: i64, val: &str) -> Vec<RowValue> {
    vec![RowValue::Numeric(Decimal::from(id)), RowValue::Text(val.to_string())]
}

fn cfg(role: TableRole) -> TableClientConfig {
    TableClientConfig {
        role,
        dialect: SqlDialect::MySql,
        table: "widgets".into(),
        alias: None,
        where_clause: None,
        args: Vec::new(),
        unique_keys: Vec::new(),
        excl_cols: Default::default(),
        mask_cols: Default::default(),
        max_inserts: 0,
        max_deletes: 0,
        force: false,
        dry_run: false,
        no_dups: false,
        debug: false,
    }
}

/// §8 scenario 5: source `(1,'a'),(2,'b'),(3,'c')` vs dest
/// `(1,'a'),(2,'B'),(4,'d')` emits exactly `DELETE(2,'B'); INSERT(2,'b');
/// INSERT(3,'c'); DELETE(4,'d')` in that order.
#[tokio::test]
async fn reconciler_basic_scenario_from_spec() {
    let source_session = FakeSession::new(vec![row(1, "a"), row(2, "b"), row(3, "c")]);
    let dest_session = FakeSession::new(vec![row(1, "a"), row(2, "B"), row(4, "d")]);

    let source = TableClient::init(cfg(TableRole::Source), source_session, None, Box::new(MySqlDialect))
        .await
        .unwrap();
    let dest = TableClient::init(cfg(TableRole::Dest), dest_session.clone(), None, Box::new(MySqlDialect))
        .await
        .unwrap();

    let reconciler = Reconciler::new(source, dest).unwrap();
    let mut ops = Vec::new();
    let summary = reconciler.run(|op| ops.push(op.clone())).await.unwrap();

    assert_eq!(summary.inserts, 2);
    assert_eq!(summary.deletes, 2);
    assert_eq!(
        ops,
        vec![
            ads_sync_core::tablesync::reconciler::SyncOp::Delete(row(2, "B")),
            ads_sync_core::tablesync::reconciler::SyncOp::Insert(row(2, "b")),
            ads_sync_core::tablesync::reconciler::SyncOp::Insert(row(3, "c")),
            ads_sync_core::tablesync::reconciler::SyncOp::Delete(row(4, "d")),
        ]
    );
}

/// §8 scenario 6: 50 missing rows, `max_inserts=10`, `force=false`,
/// `dry_run=false` → 10 inserts attempted, then `MaxInsertsReached` and a
/// rollback; the destination is left unchanged.
#[tokio::test]
async fn cap_trip_rolls_back_destination() {
    let source_rows: Vec<Vec<RowValue>> =
        (1..=50).map(|i| row(i, &format!("v{i}"))).collect();
    let source_session = FakeSession::new(source_rows);
    let dest_session = FakeSession::new(Vec::new());

    let mut dest_cfg = cfg(TableRole::Dest);
    dest_cfg.max_inserts = 10;

    let source = TableClient::init(cfg(TableRole::Source), source_session, None, Box::new(MySqlDialect))
        .await
        .unwrap();
    let dest = TableClient::init(dest_cfg, dest_session.clone(), None, Box::new(MySqlDialect))
        .await
        .unwrap();

    let reconciler = Reconciler::new(source, dest).unwrap();
    let err = reconciler.run(|_| {}).await.unwrap_err();

    match err {
        CoreError::MaxInsertsReached { attempted, max } => {
            assert_eq!(max, 10);
            assert_eq!(attempted, 11);
        },
        other => panic!("expected MaxInsertsReached, got {other:?}"),
    }
    assert_eq!(dest_session.committed_row_count().await, 0);
}

/// Idempotence (§8): re-running against unchanged inputs with caps not
/// exceeded performs zero mutations.
#[tokio::test]
async fn identical_source_and_dest_produce_no_mutations() {
    let rows = vec![row(1, "a"), row(2, "b")];
    let source_session = FakeSession::new(rows.clone());
    let dest_session = FakeSession::new(rows);

    let source = TableClient::init(cfg(TableRole::Source), source_session, None, Box::new(MySqlDialect))
        .await
        .unwrap();
    let dest = TableClient::init(cfg(TableRole::Dest), dest_session.clone(), None, Box::new(MySqlDialect))
        .await
        .unwrap();

    let reconciler = Reconciler::new(source, dest).unwrap();
    let summary = reconciler.run(|_| {}).await.unwrap();

    assert_eq!(summary.inserts, 0);
    assert_eq!(summary.deletes, 0);
}

/// §4.14: mismatched schemas fail fast with `SchemaMismatch`, never opening
/// a merge loop.
#[tokio::test]
async fn schema_mismatch_is_rejected_before_any_fetch() {
    let source_session = FakeSession::new(vec![row(1, "a")]);
    let dest_session = FakeSession::new(vec![row(1, "a")]);

    let mut dest_cfg = cfg(TableRole::Dest);
    dest_cfg.excl_cols.insert("val".to_string());

    let source = TableClient::init(cfg(TableRole::Source), source_session, None, Box::new(MySqlDialect))
        .await
        .unwrap();
    let dest = TableClient::init(dest_cfg, dest_session, None, Box::new(MySqlDialect))
        .await
        .unwrap();

    let err = Reconciler::new(source, dest).unwrap_err();
    assert!(matches!(err, CoreError::SchemaMismatch(_)));
}
