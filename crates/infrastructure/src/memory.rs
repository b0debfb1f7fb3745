use crate::store::{not_found, TodoStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    group_count, GroupCounts, GroupField, NewTodo, Todo, TodoChanges, TodoError, TodoFilter,
    TodoId, TodoSort, TodoStats,
};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Process-local store for development and tests. Contents are lost on exit.
#[derive(Debug, Default)]
pub struct InMemoryTodoStore {
    todos: RwLock<HashMap<TodoId, Todo>>,
}

impl InMemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with already-built records.
    pub fn with_todos(todos: impl IntoIterator<Item = Todo>) -> Self {
        let todos = todos.into_iter().map(|t| (t.id.clone(), t)).collect();
        Self {
            todos: RwLock::new(todos),
        }
    }
}

#[async_trait]
impl TodoStore for InMemoryTodoStore {
    async fn find(&self, filter: &TodoFilter, sort: &TodoSort) -> Result<Vec<Todo>, TodoError> {
        let todos = self.todos.read().await;
        let mut matched: Vec<Todo> = todos
            .values()
            .filter(|todo| filter.matches(todo))
            .cloned()
            .collect();
        sort.sort(&mut matched);

        debug!(count = matched.len(), "find completed");
        Ok(matched)
    }

    async fn find_by_id(&self, id: &TodoId) -> Result<Option<Todo>, TodoError> {
        Ok(self.todos.read().await.get(id).cloned())
    }

    async fn create(&self, input: NewTodo) -> Result<Todo, TodoError> {
        let todo = input.into_todo(TodoId::new(), Utc::now())?;
        self.todos
            .write()
            .await
            .insert(todo.id.clone(), todo.clone());

        info!(todo_id = %todo.id, "todo created");
        Ok(todo)
    }

    async fn update_by_id(&self, id: &TodoId, changes: TodoChanges) -> Result<Todo, TodoError> {
        let mut todos = self.todos.write().await;
        let current = todos.get_mut(id).ok_or_else(|| not_found(id))?;

        let updated = changes.apply(current, Utc::now())?;
        *current = updated.clone();

        info!(todo_id = %id, "todo updated");
        Ok(updated)
    }

    async fn delete_by_id(&self, id: &TodoId) -> Result<Todo, TodoError> {
        let removed = self
            .todos
            .write()
            .await
            .remove(id)
            .ok_or_else(|| not_found(id))?;

        info!(todo_id = %id, "todo deleted");
        Ok(removed)
    }

    async fn count(&self, filter: &TodoFilter) -> Result<u64, TodoError> {
        let todos = self.todos.read().await;
        Ok(todos.values().filter(|todo| filter.matches(todo)).count() as u64)
    }

    async fn group_count(&self, field: GroupField) -> Result<GroupCounts, TodoError> {
        let todos = self.todos.read().await;
        Ok(group_count(todos.values(), field))
    }

    async fn stats(&self, now: DateTime<Utc>) -> Result<TodoStats, TodoError> {
        let todos = self.todos.read().await;
        Ok(TodoStats::from_todos(todos.values(), now))
    }

    async fn ping(&self) -> Result<(), TodoError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use domain::{Priority, SortField, SortOrder};
    use std::sync::Arc;

    fn new_todo(title: &str, priority: Priority, category: &str) -> NewTodo {
        NewTodo {
            priority: Some(priority),
            category: Some(category.to_string()),
            ..NewTodo::new(title)
        }
    }

    #[tokio::test]
    async fn test_create_then_find_by_id() {
        let store = InMemoryTodoStore::new();
        let created = store
            .create(new_todo("Buy milk", Priority::High, "errands"))
            .await
            .unwrap();

        let found = store.find_by_id(&created.id).await.unwrap();
        assert_eq!(found, Some(created));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input_without_persisting() {
        let store = InMemoryTodoStore::new();

        let result = store.create(NewTodo::new("")).await;
        assert!(matches!(result, Err(TodoError::Validation(_))));
        assert_eq!(store.count(&TodoFilter::all()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_find_applies_filter_and_sort() {
        let store = InMemoryTodoStore::new();
        store
            .create(new_todo("a", Priority::Low, "work"))
            .await
            .unwrap();
        store
            .create(new_todo("b", Priority::High, "work"))
            .await
            .unwrap();
        store
            .create(new_todo("c", Priority::High, "home"))
            .await
            .unwrap();

        let filter = TodoFilter {
            category: Some("work".to_string()),
            ..TodoFilter::default()
        };
        let sort = TodoSort::new(SortField::Title, SortOrder::Asc);

        let titles: Vec<String> = store
            .find(&filter, &sort)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_find_returns_empty_when_nothing_matches() {
        let store = InMemoryTodoStore::new();
        let todos = store
            .find(&TodoFilter::completed(true), &TodoSort::default())
            .await
            .unwrap();
        assert!(todos.is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_id_is_not_found() {
        let store = InMemoryTodoStore::new();
        let result = store
            .update_by_id(&TodoId::new(), TodoChanges::default())
            .await;
        assert!(matches!(result, Err(TodoError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_with_invalid_changes_keeps_record() {
        let store = InMemoryTodoStore::new();
        let created = store.create(NewTodo::new("Walk dog")).await.unwrap();

        let changes = TodoChanges {
            title: Some(String::new()),
            ..TodoChanges::default()
        };
        let result = store.update_by_id(&created.id, changes).await;
        assert!(matches!(result, Err(TodoError::Validation(_))));

        let stored = store.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(stored, created);
    }

    #[tokio::test]
    async fn test_update_refreshes_updated_at_only() {
        let store = InMemoryTodoStore::new();
        let created = store.create(NewTodo::new("Walk dog")).await.unwrap();

        let changes = TodoChanges {
            completed: Some(true),
            ..TodoChanges::default()
        };
        let updated = store.update_by_id(&created.id, changes).await.unwrap();

        assert!(updated.completed);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);
    }

    #[tokio::test]
    async fn test_delete_removes_record() {
        let store = InMemoryTodoStore::new();
        let created = store.create(NewTodo::new("Walk dog")).await.unwrap();

        let deleted = store.delete_by_id(&created.id).await.unwrap();
        assert_eq!(deleted.id, created.id);
        assert!(store.find_by_id(&created.id).await.unwrap().is_none());
        assert!(matches!(
            store.delete_by_id(&created.id).await,
            Err(TodoError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_count_and_group_count() {
        let now = Utc::now();
        let mut overdue = new_todo("late", Priority::High, "work")
            .into_todo(TodoId::new(), now)
            .unwrap();
        overdue.due_date = Some(now - Duration::days(2));
        let mut done = new_todo("done", Priority::Low, "home")
            .into_todo(TodoId::new(), now)
            .unwrap();
        done.completed = true;
        let pending = new_todo("pending", Priority::High, "work")
            .into_todo(TodoId::new(), now)
            .unwrap();

        let store = InMemoryTodoStore::with_todos([overdue, done, pending]);

        assert_eq!(store.count(&TodoFilter::all()).await.unwrap(), 3);
        assert_eq!(store.count(&TodoFilter::completed(true)).await.unwrap(), 1);
        assert_eq!(store.count(&TodoFilter::completed(false)).await.unwrap(), 2);
        assert_eq!(store.count(&TodoFilter::overdue(Utc::now())).await.unwrap(), 1);

        let by_priority = store.group_count(GroupField::Priority).await.unwrap();
        assert_eq!(by_priority["high"], 2);
        assert_eq!(by_priority["low"], 1);

        let by_category = store.group_count(GroupField::Category).await.unwrap();
        assert_eq!(by_category["work"], 2);
        assert_eq!(by_category["home"], 1);
    }

    #[tokio::test]
    async fn test_concurrent_creates_are_all_persisted() {
        let store = Arc::new(InMemoryTodoStore::new());

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.create(NewTodo::new(format!("task {i}"))).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.count(&TodoFilter::all()).await.unwrap(), 20);
    }

    #[tokio::test]
    async fn test_stats_match_counts() {
        let store = InMemoryTodoStore::new();
        store
            .create(new_todo("a", Priority::High, "work"))
            .await
            .unwrap();
        store
            .create(NewTodo {
                completed: true,
                ..new_todo("b", Priority::Low, "home")
            })
            .await
            .unwrap();

        let stats = store.stats(Utc::now()).await.unwrap();
        assert_eq!(stats.total, store.count(&TodoFilter::all()).await.unwrap());
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 1);
        assert_eq!(
            stats.by_category,
            store.group_count(GroupField::Category).await.unwrap()
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stats_stay_consistent_under_concurrent_writes() {
        let store = Arc::new(InMemoryTodoStore::new());
        let past_due = Utc::now() - Duration::days(1);

        let writer = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                for i in 0..500 {
                    let input = NewTodo {
                        completed: i % 3 == 0,
                        due_date: Some(past_due),
                        ..NewTodo::new(format!("task {i}"))
                    };
                    store.create(input).await.unwrap();
                }
            })
        };

        while !writer.is_finished() {
            let stats = store.stats(Utc::now()).await.unwrap();
            assert_eq!(stats.total, stats.completed + stats.pending, "{stats:?}");
            assert!(stats.overdue <= stats.pending, "{stats:?}");
            assert_eq!(stats.by_priority.values().sum::<u64>(), stats.total);
            tokio::task::yield_now().await;
        }
        writer.await.unwrap();

        let stats = store.stats(Utc::now()).await.unwrap();
        assert_eq!(stats.total, 500);
        assert_eq!(stats.overdue, stats.pending);
    }
}
