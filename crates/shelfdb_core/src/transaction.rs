//! Transactions with snapshot rollback.
//!
//! A transaction deep-copies the collection map before running its body.
//! The body mutates the same `Database` (it sees its own writes), but
//! implicit flushes are withheld while it runs: a successful body is
//! persisted with exactly one flush, a failing body is rolled back to
//! the snapshot and nothing reaches disk.

use crate::database::Database;
use crate::error::{CoreError, CoreResult};
use crate::store::Collections;

/// Ends the flush deferral and, unless disarmed, restores the
/// pre-transaction snapshot. Dropping covers unwinding too, so a body
/// that panics leaves the database rolled back with no deferral stuck.
struct TransactionGuard<'a> {
    db: &'a mut Database,
    snapshot: Option<Collections>,
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        self.db.persistence.end_deferral();
        if let Some(snapshot) = self.snapshot.take() {
            self.db.store_mut().replace(snapshot);
        }
    }
}

impl Database {
    /// Runs `body` atomically against this database.
    ///
    /// If `body` returns `Ok`, its cumulative mutations are kept and,
    /// under auto-commit, flushed to the backing file exactly once. If it
    /// returns `Err`, every mutation it made is discarded by restoring
    /// the pre-transaction snapshot, no file write occurs, and the
    /// failure is re-signaled wrapped in
    /// [`CoreError::TransactionFailed`].
    ///
    /// The body is not retried, and there is no isolation from itself:
    /// reads inside the body observe its earlier writes.
    ///
    /// A body that panics propagates the panic, but the database is
    /// still rolled back to the snapshot and no flush is left deferred.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// db.transaction(|db| {
    ///     db.insert("users", json!({"id": 1}))?;
    ///     db.insert("users", json!({"id": 2}))?;
    ///     Ok(())
    /// })?;
    /// ```
    pub fn transaction<F>(&mut self, body: F) -> CoreResult<()>
    where
        F: FnOnce(&mut Database) -> CoreResult<()>,
    {
        let snapshot = self.store().snapshot();

        self.persistence.begin_deferral();
        let mut guard = TransactionGuard {
            db: self,
            snapshot: Some(snapshot),
        };

        match body(&mut *guard.db) {
            Ok(()) => {
                guard.snapshot = None;
                drop(guard);
                self.flush()?;
                Ok(())
            }
            Err(cause) => Err(CoreError::transaction_failed(cause)),
        }
    }
}
