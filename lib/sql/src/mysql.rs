use std::sync::{Mutex, MutexGuard};

use mysql::prelude::Queryable;
use mysql::{Conn, OptsBuilder, Params};

use crate::error::SqlError;
use crate::traits::{Row, SqlStore, SqlTransaction, Value};

/// Connection settings for the MySQL backend.
#[derive(Debug, Clone)]
pub struct MysqlConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

/// MysqlStore is a SqlStore implementation backed by the `mysql` crate.
/// One connection per store, statements serialized by a mutex — matching
/// the request-per-call execution model of the service layer.
pub struct MysqlStore {
    conn: Mutex<Conn>,
}

impl MysqlStore {
    /// Connect to a MySQL server.
    pub fn connect(config: &MysqlConfig) -> Result<Self, SqlError> {
        let opts = OptsBuilder::new()
            .ip_or_hostname(Some(config.host.clone()))
            .tcp_port(config.port)
            .user(Some(config.user.clone()))
            .pass(Some(config.password.clone()))
            .db_name(Some(config.database.clone()));

        let conn = Conn::new(opts).map_err(|e| SqlError::Connection(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn to_mysql_value(v: &Value) -> mysql::Value {
    match v {
        Value::Null => mysql::Value::NULL,
        Value::Integer(i) => mysql::Value::Int(*i),
        Value::Real(f) => mysql::Value::Double(*f),
        Value::Text(s) => mysql::Value::Bytes(s.clone().into_bytes()),
        Value::Blob(b) => mysql::Value::Bytes(b.clone()),
    }
}

fn from_mysql_value(v: mysql::Value) -> Value {
    match v {
        mysql::Value::NULL => Value::Null,
        mysql::Value::Int(i) => Value::Integer(i),
        mysql::Value::UInt(u) => Value::Integer(u as i64),
        mysql::Value::Float(f) => Value::Real(f as f64),
        mysql::Value::Double(f) => Value::Real(f),
        mysql::Value::Bytes(b) => match String::from_utf8(b) {
            Ok(s) => Value::Text(s),
            Err(e) => Value::Blob(e.into_bytes()),
        },
        mysql::Value::Date(y, mo, d, h, mi, s, _) => Value::Text(format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            y, mo, d, h, mi, s
        )),
        mysql::Value::Time(neg, d, h, mi, s, _) => {
            let sign = if neg { "-" } else { "" };
            Value::Text(format!("{}{:02}:{:02}:{:02}", sign, d as u32 * 24 + h as u32, mi, s))
        }
    }
}

fn bind(params: &[Value]) -> Params {
    if params.is_empty() {
        Params::Empty
    } else {
        Params::Positional(params.iter().map(to_mysql_value).collect())
    }
}

// MySQL error codes that indicate a key/constraint violation.
const ER_DUP_ENTRY: u16 = 1062;
const ER_ROW_IS_REFERENCED: u16 = 1451;
const ER_NO_REFERENCED_ROW: u16 = 1452;

fn map_exec_err(e: mysql::Error) -> SqlError {
    match &e {
        mysql::Error::MySqlError(me)
            if me.code == ER_DUP_ENTRY
                || me.code == ER_ROW_IS_REFERENCED
                || me.code == ER_NO_REFERENCED_ROW =>
        {
            SqlError::Constraint(e.to_string())
        }
        _ => SqlError::Execution(e.to_string()),
    }
}

fn run_query(conn: &mut Conn, sql: &str, params: &[Value]) -> Result<Vec<Row>, SqlError> {
    let rows: Vec<mysql::Row> = conn
        .exec(sql, bind(params))
        .map_err(|e| SqlError::Query(e.to_string()))?;

    let mut result = Vec::new();
    for row in rows {
        let names: Vec<String> = row
            .columns_ref()
            .iter()
            .map(|c| c.name_str().to_string())
            .collect();
        let values = row.unwrap();
        let columns = names
            .into_iter()
            .zip(values.into_iter().map(from_mysql_value))
            .collect();
        result.push(Row { columns });
    }
    Ok(result)
}

fn run_exec(conn: &mut Conn, sql: &str, params: &[Value]) -> Result<u64, SqlError> {
    let result = conn.exec_iter(sql, bind(params)).map_err(map_exec_err)?;
    Ok(result.affected_rows())
}

fn run_insert(conn: &mut Conn, sql: &str, params: &[Value]) -> Result<i64, SqlError> {
    let result = conn.exec_iter(sql, bind(params)).map_err(map_exec_err)?;
    let id = result
        .last_insert_id()
        .ok_or_else(|| SqlError::Execution("no generated id for insert".into()))?;
    Ok(id as i64)
}

impl SqlStore for MysqlStore {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SqlError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| SqlError::Query(e.to_string()))?;
        run_query(&mut conn, sql, params)
    }

    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SqlError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| SqlError::Execution(e.to_string()))?;
        run_exec(&mut conn, sql, params)
    }

    fn insert_returning_id(&self, sql: &str, params: &[Value]) -> Result<i64, SqlError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| SqlError::Execution(e.to_string()))?;
        run_insert(&mut conn, sql, params)
    }

    fn begin(&self) -> Result<Box<dyn SqlTransaction + '_>, SqlError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| SqlError::Execution(e.to_string()))?;
        conn.query_drop("START TRANSACTION")
            .map_err(|e| SqlError::Execution(e.to_string()))?;
        Ok(Box::new(MysqlTransaction { conn, open: true }))
    }

    fn marker(&self, _idx: usize) -> String {
        "?".to_string()
    }

    fn paginate(
        &self,
        order_by: &str,
        _next_idx: usize,
        params: &mut Vec<Value>,
        limit: i64,
        offset: i64,
    ) -> String {
        params.push(Value::Integer(limit));
        params.push(Value::Integer(offset));
        format!("ORDER BY {} LIMIT ? OFFSET ?", order_by)
    }

    fn auto_increment_pk(&self) -> &'static str {
        "BIGINT PRIMARY KEY AUTO_INCREMENT"
    }
}

/// An open MySQL transaction. Holds the connection guard for its whole
/// lifetime, so statements from other callers wait until it ends.
struct MysqlTransaction<'a> {
    conn: MutexGuard<'a, Conn>,
    open: bool,
}

impl SqlTransaction for MysqlTransaction<'_> {
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SqlError> {
        run_query(&mut self.conn, sql, params)
    }

    fn exec(&mut self, sql: &str, params: &[Value]) -> Result<u64, SqlError> {
        run_exec(&mut self.conn, sql, params)
    }

    fn insert_returning_id(&mut self, sql: &str, params: &[Value]) -> Result<i64, SqlError> {
        run_insert(&mut self.conn, sql, params)
    }

    fn commit(&mut self) -> Result<(), SqlError> {
        self.open = false;
        self.conn
            .query_drop("COMMIT")
            .map_err(|e| SqlError::Execution(e.to_string()))
    }

    fn rollback(&mut self) -> Result<(), SqlError> {
        self.open = false;
        self.conn
            .query_drop("ROLLBACK")
            .map_err(|e| SqlError::Execution(e.to_string()))
    }
}

impl Drop for MysqlTransaction<'_> {
    fn drop(&mut self) {
        if self.open {
            let _ = self.conn.query_drop("ROLLBACK");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_conversion_roundtrip() {
        assert_eq!(from_mysql_value(to_mysql_value(&Value::Integer(7))), Value::Integer(7));
        assert_eq!(
            from_mysql_value(to_mysql_value(&Value::Text("小籠包".into()))),
            Value::Text("小籠包".into())
        );
        assert_eq!(from_mysql_value(to_mysql_value(&Value::Null)), Value::Null);
    }

    #[test]
    fn date_values_render_as_text() {
        let v = from_mysql_value(mysql::Value::Date(2024, 5, 1, 12, 30, 0, 0));
        assert_eq!(v, Value::Text("2024-05-01 12:30:00".into()));
    }
}
