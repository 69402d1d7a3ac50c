pub mod error;
pub mod mysql;
pub mod sqlite;
pub mod traits;

pub use error::SqlError;
pub use mysql::{MysqlConfig, MysqlStore};
pub use sqlite::SqliteStore;
pub use traits::{Row, SqlStore, SqlTransaction, Value};
