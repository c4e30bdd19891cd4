// Infrastructure modules
pub mod database;              // Store interface and scoped connections
pub mod mysql_database;        // MySQL store
pub mod sqlite_database;       // SQLite store
pub mod worker_pool;           // Fixed-width worker pool

pub use database::{connect_store, ClimateStore, ConnectionSnapshot, ConnectionStats, RowId};
pub use mysql_database::MySqlStore;
pub use sqlite_database::SqliteStore;
pub use worker_pool::{Completions, WorkerPool};
