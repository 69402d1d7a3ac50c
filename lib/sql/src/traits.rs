use crate::error::SqlError;

/// A dynamically-typed SQL parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Lift an optional integer into a parameter value.
    pub fn opt_i64(v: Option<i64>) -> Value {
        v.map(Value::Integer).unwrap_or(Value::Null)
    }

    /// Lift an optional string into a parameter value.
    pub fn opt_text(v: Option<String>) -> Value {
        v.map(Value::Text).unwrap_or(Value::Null)
    }
}

/// A row returned from a SQL query — column name to value.
#[derive(Debug, Clone)]
pub struct Row {
    pub columns: Vec<(String, Value)>,
}

impl Row {
    /// Get a column value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Get a text column value by name.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(Value::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get an integer column value by name.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(Value::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    /// Get a real column value by name.
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(Value::Real(f)) => Some(*f),
            Some(Value::Integer(i)) => Some(*i as f64),
            _ => None,
        }
    }
}

/// SqlStore provides a parameterized SQL execution interface over one of
/// the supported relational backends.
///
/// The trait carries every capability in which the backends' SQL dialects
/// differ — parameter marker syntax, pagination clause and parameter order,
/// identity retrieval after insert, and the auto-increment column DDL —
/// so service code composes statements exclusively through these methods
/// and never branches on the backend.
///
/// Statement execution is serialized over a single connection per store.
/// Autocommit statements hold the connection for one statement;
/// [`SqlStore::begin`] hands the connection to a [`SqlTransaction`] for
/// the transaction's whole lifetime.
pub trait SqlStore: Send + Sync {
    /// Execute a query and return rows.
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SqlError>;

    /// Execute a statement (INSERT/UPDATE/DELETE) and return affected row count.
    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SqlError>;

    /// Execute an INSERT into a table with an auto-increment primary key
    /// and return the generated id.
    fn insert_returning_id(&self, sql: &str, params: &[Value]) -> Result<i64, SqlError>;

    /// Open a transaction. The returned handle owns the store's connection
    /// until it commits, rolls back, or is dropped; statements from other
    /// callers block until then, so nothing can interleave into an open
    /// transaction.
    fn begin(&self) -> Result<Box<dyn SqlTransaction + '_>, SqlError>;

    /// Render the parameter marker for the 1-based parameter position `idx`.
    fn marker(&self, idx: usize) -> String;

    /// Render an ORDER BY + pagination clause and push the limit/offset
    /// parameters in the order this dialect binds them. `next_idx` is the
    /// 1-based position of the first pagination parameter.
    fn paginate(
        &self,
        order_by: &str,
        next_idx: usize,
        params: &mut Vec<Value>,
        limit: i64,
        offset: i64,
    ) -> String;

    /// DDL fragment declaring an auto-increment integer primary key column.
    fn auto_increment_pk(&self) -> &'static str;
}

/// One open transaction on a store's connection.
///
/// Every statement issued through the handle runs inside the transaction.
/// The handle must end with [`SqlTransaction::commit`] or
/// [`SqlTransaction::rollback`]; dropping it without either rolls back.
pub trait SqlTransaction {
    /// Execute a query inside the transaction and return rows.
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SqlError>;

    /// Execute a statement inside the transaction and return affected row count.
    fn exec(&mut self, sql: &str, params: &[Value]) -> Result<u64, SqlError>;

    /// Execute an INSERT inside the transaction and return the generated id.
    fn insert_returning_id(&mut self, sql: &str, params: &[Value]) -> Result<i64, SqlError>;

    /// Commit and release the connection.
    fn commit(&mut self) -> Result<(), SqlError>;

    /// Roll back and release the connection.
    fn rollback(&mut self) -> Result<(), SqlError>;
}
