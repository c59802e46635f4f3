//! Store Gateway: the only path to persistent state.
//!
//! Each call is independently durable once it returns; nothing spans two
//! calls. Multi-step flows that need ordering or rollback build it on top.

pub mod firestore;
pub mod memory;
pub mod query;

use async_trait::async_trait;

use crate::error::AppError;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;
pub use query::{Filter, Patch, Row, ID_FIELD};

/// Table names as constants.
pub mod tables {
    pub const USERS: &str = "users";
    pub const EVENTS: &str = "events";
}

/// Minimal table-store interface.
///
/// `update` evaluates the filter and applies the patch to each matching row
/// as a single step, returning the rows as written. A guarded filter
/// therefore behaves as a conditional update; an empty result means the
/// guard did not hold (or the row is gone).
#[async_trait]
pub trait StoreGateway: Send + Sync {
    /// Rows matching `filter`.
    async fn get(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, AppError>;

    /// Insert a row, assigning an `id` when it has none. The id is stored as
    /// a string. Returns the stored row, or `Conflict` if the id is taken.
    async fn insert(&self, table: &str, row: Row) -> Result<Row, AppError>;

    /// Apply `patch` to every row matching `filter`. Returns the updated rows.
    async fn update(&self, table: &str, filter: &Filter, patch: &Patch)
        -> Result<Vec<Row>, AppError>;

    /// Delete every row matching `filter`. Returns the deleted rows.
    async fn delete(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, AppError>;
}

/// Row id as a string, whatever its stored type. Null or empty ids are `None`.
pub fn row_id(row: &Row) -> Option<String> {
    row.get(query::ID_FIELD)
        .map(crate::models::display_string)
        .filter(|id| !id.is_empty())
}

/// Fresh store-assigned identifier.
pub(crate) fn new_row_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
