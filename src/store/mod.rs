pub mod sqlite;

pub use sqlite::{HistoryCounts, SqliteStore, StoredFund};
