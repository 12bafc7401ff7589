// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Structured error kinds shared by the directory and table-sync cores.
//!
//! Internal plumbing still threads `anyhow::Result` with `.context(...)` the
//! way the rest of the crate does; `CoreError` is what crosses the public API
//! boundary so a host program can match on a stable set of variants instead
//! of inspecting error strings.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("bind failed: {0}")]
    BindFailed(String),

    #[error("search failed: {0}")]
    SearchFailed(String),

    #[error("modify failed: {0}")]
    ModifyFailed(String),

    #[error("create failed: {0}")]
    CreateFailed(String),

    #[error("delete failed: {0}")]
    DeleteFailed(String),

    #[error("move failed: {0}")]
    MoveFailed(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("max inserts reached ({attempted}/{max})")]
    MaxInsertsReached { attempted: u64, max: u64 },

    #[error("max deletes reached ({attempted}/{max})")]
    MaxDeletesReached { attempted: u64, max: u64 },

    #[error("driver error: {0}")]
    DriverError(String),
}

impl CoreError {
    /// True for error kinds that leave the destination in a state that must
    /// be rolled back before returning control to the caller (§7).
    pub fn requires_rollback(&self) -> bool {
        matches!(
            self,
            CoreError::MaxInsertsReached { .. }
                | CoreError::MaxDeletesReached { .. }
                | CoreError::DriverError(_)
                | CoreError::SchemaMismatch(_)
        )
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
