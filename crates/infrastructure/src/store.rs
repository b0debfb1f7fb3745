use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    GroupCounts, GroupField, NewTodo, Todo, TodoChanges, TodoError, TodoFilter, TodoId, TodoSort,
    TodoStats,
};

/// Persistence operations over the Todo collection.
///
/// Implementations are shared across requests behind an `Arc<dyn TodoStore>`
/// and must be safe for concurrent use.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Todos matching `filter`, ordered by `sort`.
    async fn find(&self, filter: &TodoFilter, sort: &TodoSort) -> Result<Vec<Todo>, TodoError>;

    async fn find_by_id(&self, id: &TodoId) -> Result<Option<Todo>, TodoError>;

    /// Validates `input`, assigns an id and timestamps, and persists the result.
    async fn create(&self, input: NewTodo) -> Result<Todo, TodoError>;

    /// Merges `changes` into the stored record and refreshes `updated_at`.
    async fn update_by_id(&self, id: &TodoId, changes: TodoChanges) -> Result<Todo, TodoError>;

    /// Removes the record and returns it as it was.
    async fn delete_by_id(&self, id: &TodoId) -> Result<Todo, TodoError>;

    async fn count(&self, filter: &TodoFilter) -> Result<u64, TodoError>;

    async fn group_count(&self, field: GroupField) -> Result<GroupCounts, TodoError>;

    /// Counts and groupings taken from a single read of the collection.
    async fn stats(&self, now: DateTime<Utc>) -> Result<TodoStats, TodoError>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> Result<(), TodoError>;
}

pub(crate) fn not_found(id: &TodoId) -> TodoError {
    TodoError::NotFound(id.to_string())
}
