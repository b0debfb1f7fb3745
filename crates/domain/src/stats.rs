use crate::todo::Todo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Distinct value of a grouped field mapped to the number of Todos holding it.
pub type GroupCounts = BTreeMap<String, u64>;

/// Fields a group-count aggregation can run over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupField {
    Priority,
    Category,
}

impl GroupField {
    pub fn value_of(&self, todo: &Todo) -> String {
        match self {
            GroupField::Priority => todo.priority.as_str().to_string(),
            GroupField::Category => todo.category.clone(),
        }
    }
}

pub fn group_count<'a>(todos: impl IntoIterator<Item = &'a Todo>, field: GroupField) -> GroupCounts {
    let mut counts = GroupCounts::new();
    for todo in todos {
        *counts.entry(field.value_of(todo)).or_insert(0) += 1;
    }
    counts
}

/// Response body of `GET /todos/stats/overview`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoStats {
    pub total: u64,
    pub completed: u64,
    pub pending: u64,
    pub overdue: u64,
    pub by_priority: GroupCounts,
    pub by_category: GroupCounts,
}

impl TodoStats {
    /// Computes every figure in one pass over the same set of Todos.
    pub fn from_todos<'a>(todos: impl IntoIterator<Item = &'a Todo>, now: DateTime<Utc>) -> Self {
        let mut stats = TodoStats::default();
        for todo in todos {
            stats.total += 1;
            if todo.completed {
                stats.completed += 1;
            } else {
                stats.pending += 1;
            }
            if todo.is_overdue(now) {
                stats.overdue += 1;
            }
            *stats
                .by_priority
                .entry(GroupField::Priority.value_of(todo))
                .or_insert(0) += 1;
            *stats
                .by_category
                .entry(GroupField::Category.value_of(todo))
                .or_insert(0) += 1;
        }
        stats
    }
}
