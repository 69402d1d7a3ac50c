use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

use crate::error::SqlError;
use crate::traits::{Row, SqlStore, SqlTransaction, Value};

/// SqliteStore is a SqlStore implementation backed by rusqlite (bundled
/// SQLite). Used for embedded deployments and as the test backend.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path.
    pub fn open(path: &Path) -> Result<Self, SqlError> {
        let conn = Connection::open(path)
            .map_err(|e| SqlError::Connection(e.to_string()))?;

        // Enable WAL mode for better concurrent read performance.
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| SqlError::Connection(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite database (useful for tests).
    pub fn open_in_memory() -> Result<Self, SqlError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| SqlError::Connection(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

/// Convert our Value enum to rusqlite's ToSql.
fn bind_params(params: &[Value]) -> Vec<Box<dyn rusqlite::types::ToSql + '_>> {
    params
        .iter()
        .map(|v| -> Box<dyn rusqlite::types::ToSql + '_> {
            match v {
                Value::Null => Box::new(rusqlite::types::Null),
                Value::Integer(i) => Box::new(*i),
                Value::Real(f) => Box::new(*f),
                Value::Text(s) => Box::new(s.as_str()),
                Value::Blob(b) => Box::new(b.as_slice()),
            }
        })
        .collect()
}

fn map_exec_err(e: rusqlite::Error) -> SqlError {
    match &e {
        rusqlite::Error::SqliteFailure(f, _)
            if f.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            SqlError::Constraint(e.to_string())
        }
        _ => SqlError::Execution(e.to_string()),
    }
}

fn run_query(conn: &Connection, sql: &str, params: &[Value]) -> Result<Vec<Row>, SqlError> {
    let bound = bind_params(params);
    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        bound.iter().map(|b| b.as_ref()).collect();

    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| SqlError::Query(e.to_string()))?;

    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let rows = stmt
        .query_map(param_refs.as_slice(), |row| {
            let mut columns = Vec::new();
            for (i, name) in column_names.iter().enumerate() {
                let val = row_value_at(row, i);
                columns.push((name.clone(), val));
            }
            Ok(Row { columns })
        })
        .map_err(|e| SqlError::Query(e.to_string()))?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row.map_err(|e| SqlError::Query(e.to_string()))?);
    }
    Ok(result)
}

fn run_exec(conn: &Connection, sql: &str, params: &[Value]) -> Result<u64, SqlError> {
    let bound = bind_params(params);
    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        bound.iter().map(|b| b.as_ref()).collect();

    let affected = conn
        .execute(sql, param_refs.as_slice())
        .map_err(map_exec_err)?;
    Ok(affected as u64)
}

fn run_insert(conn: &Connection, sql: &str, params: &[Value]) -> Result<i64, SqlError> {
    run_exec(conn, sql, params)?;
    Ok(conn.last_insert_rowid())
}

impl SqlStore for SqliteStore {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SqlError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SqlError::Query(e.to_string()))?;
        run_query(&conn, sql, params)
    }

    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SqlError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SqlError::Execution(e.to_string()))?;
        run_exec(&conn, sql, params)
    }

    fn insert_returning_id(&self, sql: &str, params: &[Value]) -> Result<i64, SqlError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SqlError::Execution(e.to_string()))?;
        run_insert(&conn, sql, params)
    }

    fn begin(&self) -> Result<Box<dyn SqlTransaction + '_>, SqlError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SqlError::Execution(e.to_string()))?;
        conn.execute_batch("BEGIN")
            .map_err(|e| SqlError::Execution(e.to_string()))?;
        Ok(Box::new(SqliteTransaction { conn, open: true }))
    }

    fn marker(&self, idx: usize) -> String {
        format!("?{}", idx)
    }

    fn paginate(
        &self,
        order_by: &str,
        next_idx: usize,
        params: &mut Vec<Value>,
        limit: i64,
        offset: i64,
    ) -> String {
        params.push(Value::Integer(limit));
        params.push(Value::Integer(offset));
        format!(
            "ORDER BY {} LIMIT ?{} OFFSET ?{}",
            order_by,
            next_idx,
            next_idx + 1
        )
    }

    fn auto_increment_pk(&self) -> &'static str {
        "INTEGER PRIMARY KEY AUTOINCREMENT"
    }
}

/// An open SQLite transaction. Holds the connection guard for its whole
/// lifetime, so statements from other callers wait until it ends.
struct SqliteTransaction<'a> {
    conn: MutexGuard<'a, Connection>,
    open: bool,
}

impl SqlTransaction for SqliteTransaction<'_> {
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SqlError> {
        run_query(&self.conn, sql, params)
    }

    fn exec(&mut self, sql: &str, params: &[Value]) -> Result<u64, SqlError> {
        run_exec(&self.conn, sql, params)
    }

    fn insert_returning_id(&mut self, sql: &str, params: &[Value]) -> Result<i64, SqlError> {
        run_insert(&self.conn, sql, params)
    }

    fn commit(&mut self) -> Result<(), SqlError> {
        self.open = false;
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| SqlError::Execution(e.to_string()))
    }

    fn rollback(&mut self) -> Result<(), SqlError> {
        self.open = false;
        self.conn
            .execute_batch("ROLLBACK")
            .map_err(|e| SqlError::Execution(e.to_string()))
    }
}

impl Drop for SqliteTransaction<'_> {
    fn drop(&mut self) {
        if self.open {
            let _ = self.conn.execute_batch("ROLLBACK");
        }
    }
}

/// Extract a Value from a rusqlite row at a given column index.
fn row_value_at(row: &rusqlite::Row, idx: usize) -> Value {
    // Try integer first, then real, then text, then blob, then null.
    if let Ok(i) = row.get::<_, i64>(idx) {
        return Value::Integer(i);
    }
    if let Ok(f) = row.get::<_, f64>(idx) {
        return Value::Real(f);
    }
    if let Ok(s) = row.get::<_, String>(idx) {
        return Value::Text(s);
    }
    if let Ok(b) = row.get::<_, Vec<u8>>(idx) {
        return Value::Blob(b);
    }
    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn store() -> SqliteStore {
        let s = SqliteStore::open_in_memory().unwrap();
        s.exec(
            &format!(
                "CREATE TABLE t (id {}, name TEXT UNIQUE, n INTEGER)",
                s.auto_increment_pk()
            ),
            &[],
        )
        .unwrap();
        s
    }

    #[test]
    fn insert_returns_generated_ids() {
        let s = store();
        let a = s
            .insert_returning_id(
                "INSERT INTO t (name, n) VALUES (?1, ?2)",
                &[Value::Text("a".into()), Value::Integer(1)],
            )
            .unwrap();
        let b = s
            .insert_returning_id(
                "INSERT INTO t (name, n) VALUES (?1, ?2)",
                &[Value::Text("b".into()), Value::Integer(2)],
            )
            .unwrap();
        assert!(b > a);
    }

    #[test]
    fn query_maps_columns() {
        let s = store();
        s.exec(
            "INSERT INTO t (name, n) VALUES (?1, ?2)",
            &[Value::Text("x".into()), Value::Integer(7)],
        )
        .unwrap();
        let rows = s.query("SELECT name, n FROM t", &[]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_str("name"), Some("x"));
        assert_eq!(rows[0].get_i64("n"), Some(7));
    }

    #[test]
    fn unique_violation_is_constraint() {
        let s = store();
        s.exec("INSERT INTO t (name) VALUES (?1)", &[Value::Text("dup".into())])
            .unwrap();
        let err = s
            .exec("INSERT INTO t (name) VALUES (?1)", &[Value::Text("dup".into())])
            .unwrap_err();
        assert!(matches!(err, SqlError::Constraint(_)));
    }

    #[test]
    fn rollback_discards_writes() {
        let s = store();
        let mut tx = s.begin().unwrap();
        tx.exec("INSERT INTO t (name) VALUES (?1)", &[Value::Text("tx".into())])
            .unwrap();
        tx.rollback().unwrap();
        drop(tx);
        let rows = s.query("SELECT * FROM t", &[]).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn commit_keeps_writes() {
        let s = store();
        let mut tx = s.begin().unwrap();
        tx.exec("INSERT INTO t (name) VALUES (?1)", &[Value::Text("tx".into())])
            .unwrap();
        tx.commit().unwrap();
        drop(tx);
        let rows = s.query("SELECT * FROM t", &[]).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn dropped_transaction_rolls_back() {
        let s = store();
        {
            let mut tx = s.begin().unwrap();
            tx.exec("INSERT INTO t (name) VALUES (?1)", &[Value::Text("tx".into())])
                .unwrap();
        }
        let rows = s.query("SELECT * FROM t", &[]).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn transaction_holds_connection_exclusively() {
        // A statement issued from another thread while a transaction is
        // open must wait for it to end, not land inside it.
        let s = Arc::new(store());
        let mut tx = s.begin().unwrap();
        tx.exec("INSERT INTO t (name) VALUES (?1)", &[Value::Text("inside".into())])
            .unwrap();

        let s2 = Arc::clone(&s);
        let other = std::thread::spawn(move || {
            s2.exec(
                "INSERT INTO t (name) VALUES (?1)",
                &[Value::Text("outside".into())],
            )
            .unwrap();
        });

        tx.rollback().unwrap();
        drop(tx);
        other.join().unwrap();

        // The concurrent write waited out the rollback, so it survives.
        let rows = s.query("SELECT name FROM t", &[]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_str("name"), Some("outside"));
    }

    #[test]
    fn paginate_renders_limit_offset() {
        let s = store();
        for i in 0..5 {
            s.exec(
                "INSERT INTO t (name, n) VALUES (?1, ?2)",
                &[Value::Text(format!("r{}", i)), Value::Integer(i)],
            )
            .unwrap();
        }
        let mut params = Vec::new();
        let clause = s.paginate("n DESC", 1, &mut params, 2, 1);
        let rows = s
            .query(&format!("SELECT n FROM t {}", clause), &params)
            .unwrap();
        let ns: Vec<i64> = rows.iter().filter_map(|r| r.get_i64("n")).collect();
        assert_eq!(ns, vec![3, 2]);
    }

    #[test]
    fn open_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.sqlite");
        let s = SqliteStore::open(&path).unwrap();
        s.exec("CREATE TABLE x (id INTEGER)", &[]).unwrap();
        assert!(path.exists());
    }
}
