//! Immediate-mode transaction guard
//!
//! `BEGIN IMMEDIATE` takes the write lock up front, so writers are
//! serialized for the whole lifetime of the guard. Dropping a guard that was
//! neither committed nor rolled back rolls it back.

use crate::{Error, Result};
use super::database::Database;

pub const BEGIN_IMMEDIATE: &str = "BEGIN IMMEDIATE";
pub const COMMIT: &str = "COMMIT";
pub const ROLLBACK: &str = "ROLLBACK";

/// An open immediate transaction on `D`.
pub struct Transaction<'a, D: Database + ?Sized> {
    db: &'a D,
    finished: bool,
}

impl<'a, D: Database + ?Sized> Transaction<'a, D> {
    /// Begin an immediate transaction
    pub fn begin(db: &'a D) -> Result<Self> {
        db.execute(BEGIN_IMMEDIATE)
            .map_err(|e| Error::Transaction(Box::new(e)))?;
        Ok(Self { db, finished: false })
    }

    /// The database this transaction runs on
    pub fn database(&self) -> &'a D {
        self.db
    }

    /// Commit the transaction
    pub fn commit(mut self) -> Result<()> {
        self.finished = true;
        if let Err(e) = self.db.execute(COMMIT) {
            // A failed COMMIT may leave the transaction open.
            if let Err(rollback_err) = self.db.execute(ROLLBACK) {
                tracing::debug!("Rollback after failed commit: {}", rollback_err);
            }
            return Err(Error::Transaction(Box::new(e)));
        }
        Ok(())
    }

    /// Roll back the transaction
    pub fn rollback(mut self) -> Result<()> {
        self.finished = true;
        self.db
            .execute(ROLLBACK)
            .map_err(|e| Error::Transaction(Box::new(e)))
    }
}

impl<D: Database + ?Sized> Drop for Transaction<'_, D> {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.db.execute(ROLLBACK) {
                tracing::warn!("Failed to roll back abandoned transaction: {}", e);
            }
        }
    }
}

/// Run `f` inside an immediate transaction, committing on success and
/// rolling back on any error.
pub fn with_transaction<D, T, F>(db: &D, f: F) -> Result<T>
where
    D: Database + ?Sized,
    F: FnOnce(&D) -> Result<T>,
{
    let tx = Transaction::begin(db)?;
    match f(db) {
        Ok(value) => {
            tx.commit()?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback() {
                tracing::warn!("Rollback failed: {}", rollback_err);
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::testing::{FailingDatabase, RecordingDatabase};

    #[test]
    fn test_commit_sequence() {
        let db = RecordingDatabase::new();
        let tx = Transaction::begin(&db).unwrap();
        tx.database().execute("DELETE FROM newSymbols").unwrap();
        tx.commit().unwrap();

        assert_eq!(db.recorded(), vec![BEGIN_IMMEDIATE, "DELETE FROM newSymbols", COMMIT]);
    }

    #[test]
    fn test_drop_rolls_back() {
        let db = RecordingDatabase::new();
        {
            let _tx = Transaction::begin(&db).unwrap();
        }
        assert_eq!(db.recorded(), vec![BEGIN_IMMEDIATE, ROLLBACK]);
    }

    #[test]
    fn test_with_transaction_rolls_back_on_error() {
        let db = RecordingDatabase::new();
        let result: Result<()> = with_transaction(&db, |db| {
            db.execute("DELETE FROM newLocations")?;
            Err(Error::ConstraintViolation("boom".to_string()))
        });

        assert!(matches!(result, Err(Error::ConstraintViolation(_))));
        assert_eq!(db.recorded(), vec![BEGIN_IMMEDIATE, "DELETE FROM newLocations", ROLLBACK]);
    }

    #[test]
    fn test_begin_failure_is_transaction_error() {
        let db = FailingDatabase::new(RecordingDatabase::new(), BEGIN_IMMEDIATE);
        let err = Transaction::begin(&db).err().unwrap();
        assert!(matches!(err, Error::Transaction(_)));
        assert!(db.inner.recorded().is_empty());
    }

    #[test]
    fn test_commit_failure_rolls_back() {
        let db = FailingDatabase::new(RecordingDatabase::new(), COMMIT);
        let tx = Transaction::begin(&db).unwrap();
        let err = tx.commit().unwrap_err();

        assert!(matches!(err, Error::Transaction(_)));
        assert_eq!(db.inner.recorded(), vec![BEGIN_IMMEDIATE, ROLLBACK]);
    }
}
