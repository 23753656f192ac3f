//! Store gate - The open/closed switch that decides whether sales may be recorded.
//!
//! The flag lives in the `system_state` table under [`STORE_OPEN_KEY`]. Transitions
//! are conditional updates (`SET value = 'true' WHERE value = 'false'`), so when two
//! callers open the store at once only one of them changes the row and only that
//! one writes a `STORE_OPENED` entry. The update is the first statement of its
//! transaction, so the write lock is held before anything is read.

use crate::{
    core::{
        activity::{self, ActivityKind},
        retry::{RetryPolicy, with_contention_retry},
    },
    entities::{SystemState, system_state},
    errors::{Error, Result},
};
use sea_orm::{DatabaseTransaction, Set, SqlErr, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{info, instrument};

const STORE_OPEN_KEY: &str = "store_open";
const OPEN: &str = "true";
const CLOSED: &str = "false";

/// Creates the store state row, closed, if it does not exist yet.
///
/// Called once at start-up; the transition functions also call it so a fresh
/// database works without explicit initialization.
pub async fn ensure_initialized<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing = SystemState::find()
        .filter(system_state::Column::Key.eq(STORE_OPEN_KEY))
        .one(db)
        .await?;

    if existing.is_none() {
        let state = system_state::ActiveModel {
            key: Set(STORE_OPEN_KEY.to_string()),
            value: Set(CLOSED.to_string()),
            updated_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        };
        match state.insert(db).await {
            Ok(_) => info!("Initialized store state (closed)"),
            // Another caller created the row first
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {}
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

/// Reads whether the store is currently open. A missing state row reads as closed.
pub async fn is_open<C>(db: &C) -> Result<bool>
where
    C: ConnectionTrait,
{
    let state = SystemState::find()
        .filter(system_state::Column::Key.eq(STORE_OPEN_KEY))
        .one(db)
        .await?;

    match state {
        Some(s) => parse_flag(&s.value),
        None => Ok(false),
    }
}

/// Opens the store.
///
/// Returns `true` if the store was closed and is now open, `false` if it was
/// already open (no-op, nothing logged).
#[instrument(skip(db))]
pub async fn open_store(db: &DatabaseConnection) -> Result<bool> {
    transition(db, CLOSED, OPEN, ActivityKind::StoreOpened, "Store opened").await
}

/// Closes the store.
///
/// Returns `true` if the store was open and is now closed, `false` if it was
/// already closed (no-op, nothing logged).
#[instrument(skip(db))]
pub async fn close_store(db: &DatabaseConnection) -> Result<bool> {
    transition(db, OPEN, CLOSED, ActivityKind::StoreClosed, "Store closed").await
}

async fn transition(
    db: &DatabaseConnection,
    from: &str,
    to: &str,
    kind: ActivityKind,
    description: &str,
) -> Result<bool> {
    let changed = with_contention_retry(&RetryPolicy::default(), || {
        try_transition(db, from, to, kind, description)
    })
    .await?;

    if changed {
        info!("{}", description);
    }
    Ok(changed)
}

async fn try_transition(
    db: &DatabaseConnection,
    from: &str,
    to: &str,
    kind: ActivityKind,
    description: &str,
) -> Result<bool> {
    let txn = db.begin().await?;

    let mut changed = set_flag(&txn, from, to).await?;
    if !changed {
        // The row may not exist yet on a fresh database
        ensure_initialized(&txn).await?;
        changed = set_flag(&txn, from, to).await?;
    }

    if changed {
        activity::append(&txn, kind, description.to_string(), None).await?;
    }
    txn.commit().await?;
    Ok(changed)
}

/// Moves the flag from `from` to `to`; returns whether the row changed.
async fn set_flag(txn: &DatabaseTransaction, from: &str, to: &str) -> Result<bool> {
    let result = SystemState::update_many()
        .col_expr(system_state::Column::Value, Expr::value(to))
        .col_expr(
            system_state::Column::UpdatedAt,
            Expr::value(chrono::Utc::now().naive_utc()),
        )
        .filter(system_state::Column::Key.eq(STORE_OPEN_KEY))
        .filter(system_state::Column::Value.eq(from))
        .exec(txn)
        .await?;
    Ok(result.rows_affected == 1)
}

fn parse_flag(value: &str) -> Result<bool> {
    match value {
        OPEN => Ok(true),
        CLOSED => Ok(false),
        other => Err(Error::Config {
            message: format!("Corrupt store state value '{other}'"),
        }),
    }
}
