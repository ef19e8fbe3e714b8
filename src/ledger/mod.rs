//! SQLite work ledger: connection pooling, migrations, models and queries.

mod migrations;
pub mod models;
pub mod pool;
pub mod queries;

pub use models::{ConvertedVideo, SubtitleRow, WorkItem};
pub use pool::{get_conn, init_pool, DbPool};
