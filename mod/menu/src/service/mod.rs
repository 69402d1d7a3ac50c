pub mod item;
pub mod language;
pub mod ocr;
pub mod schema;
pub mod store;

use std::sync::Arc;

use tracing::error;

use menuerp_core::ServiceError;
use menuerp_sql::{SqlError, SqlStore, SqlTransaction};

/// Menu service — storage-backed business logic for the back office.
///
/// All statements are composed through the store's dialect capabilities
/// (markers, pagination, identity retrieval); nothing in here branches on
/// which backend is configured.
pub struct MenuService {
    pub(crate) sql: Arc<dyn SqlStore>,
}

impl MenuService {
    pub fn new(sql: Arc<dyn SqlStore>) -> Result<Self, ServiceError> {
        schema::init_schema(sql.as_ref())?;
        Ok(Self { sql })
    }

    /// Run `f` inside a transaction. The handle owns the store's
    /// connection until commit or rollback, so statements from concurrent
    /// requests wait instead of interleaving into the open transaction.
    /// Commits on success; rolls back on any error and returns it
    /// unchanged, so the pre-call state is restored exactly.
    pub(crate) fn in_transaction<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut dyn SqlTransaction) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let mut tx = self.sql.begin().map_err(|e| {
            error!(op, error = %e, "transaction begin failed");
            ServiceError::Storage(format!("{} failed", op))
        })?;

        match f(tx.as_mut()) {
            Ok(v) => {
                tx.commit().map_err(|e| {
                    error!(op, error = %e, "transaction commit failed");
                    ServiceError::Storage(format!("{} failed", op))
                })?;
                Ok(v)
            }
            Err(err) => {
                if let Err(rb) = tx.rollback() {
                    error!(op, error = %rb, "transaction rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Translate a storage failure into the surfaced taxonomy: the raw
    /// backend error is logged, never returned to the caller.
    pub(crate) fn storage_err(&self, op: &'static str, e: SqlError) -> ServiceError {
        error!(op, error = %e, "storage operation failed");
        ServiceError::Storage(format!("{} failed", op))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use menuerp_sql::SqliteStore;

    /// Fresh service over an in-memory SQLite store.
    pub(crate) fn service() -> MenuService {
        let sql: Arc<dyn SqlStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        MenuService::new(sql).unwrap()
    }
}
