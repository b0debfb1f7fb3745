use crate::todo::Todo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Value that disables the `category` / `priority` filters.
pub const MATCH_ALL: &str = "all";

/// Equality constraints narrowing a query. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoFilter {
    pub category: Option<String>,
    pub priority: Option<String>,
    pub completed: Option<bool>,
    /// Matches Todos whose `due_date` is strictly earlier. Todos without a due date never match.
    pub due_before: Option<DateTime<Utc>>,
}

impl TodoFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn overdue(now: DateTime<Utc>) -> Self {
        Self {
            completed: Some(false),
            due_before: Some(now),
            ..Self::default()
        }
    }

    pub fn matches(&self, todo: &Todo) -> bool {
        if let Some(category) = &self.category {
            if todo.category != *category {
                return false;
            }
        }
        if let Some(priority) = &self.priority {
            if todo.priority.as_str() != priority {
                return false;
            }
        }
        if let Some(completed) = self.completed {
            if todo.completed != completed {
                return false;
            }
        }
        if let Some(bound) = self.due_before {
            match todo.due_date {
                Some(due) if due < bound => {}
                _ => return false,
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    DueDate,
    Title,
    Priority,
    Category,
    Completed,
}

impl SortField {
    pub fn from_param(param: &str) -> Option<Self> {
        match param {
            "createdAt" => Some(SortField::CreatedAt),
            "updatedAt" => Some(SortField::UpdatedAt),
            "dueDate" => Some(SortField::DueDate),
            "title" => Some(SortField::Title),
            "priority" => Some(SortField::Priority),
            "category" => Some(SortField::Category),
            "completed" => Some(SortField::Completed),
            _ => None,
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "createdAt",
            SortField::UpdatedAt => "updatedAt",
            SortField::DueDate => "dueDate",
            SortField::Title => "title",
            SortField::Priority => "priority",
            SortField::Category => "category",
            SortField::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// `asc` is ascending; anything else is descending.
    pub fn from_param(param: &str) -> Self {
        if param == "asc" {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }

    fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TodoSort {
    pub field: SortField,
    pub order: SortOrder,
}

impl TodoSort {
    pub fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }

    /// Missing due dates sort last in either direction; ties fall back to id order.
    pub fn compare(&self, a: &Todo, b: &Todo) -> Ordering {
        let primary = match self.field {
            SortField::CreatedAt => self.order.apply(a.created_at.cmp(&b.created_at)),
            SortField::UpdatedAt => self.order.apply(a.updated_at.cmp(&b.updated_at)),
            SortField::Title => self.order.apply(a.title.cmp(&b.title)),
            SortField::Priority => self.order.apply(a.priority.rank().cmp(&b.priority.rank())),
            SortField::Category => self.order.apply(a.category.cmp(&b.category)),
            SortField::Completed => self.order.apply(a.completed.cmp(&b.completed)),
            SortField::DueDate => match (a.due_date, b.due_date) {
                (Some(x), Some(y)) => self.order.apply(x.cmp(&y)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        };

        primary.then_with(|| a.id.cmp(&b.id))
    }

    pub fn sort(&self, todos: &mut [Todo]) {
        todos.sort_by(|a, b| self.compare(a, b));
    }
}

/// Raw query parameters of `GET /todos`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTodosQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<String>,
}

impl ListTodosQuery {
    /// Only the literal `"true"` selects completed Todos; any other present value selects pending ones.
    pub fn to_filter(&self) -> TodoFilter {
        TodoFilter {
            category: narrowing(&self.category),
            priority: narrowing(&self.priority),
            completed: self.completed.as_deref().map(|value| value == "true"),
            due_before: None,
        }
    }

    pub fn to_sort(&self) -> TodoSort {
        let field = self
            .sort_by
            .as_deref()
            .and_then(SortField::from_param)
            .unwrap_or_default();
        let order = self
            .sort_order
            .as_deref()
            .map(SortOrder::from_param)
            .unwrap_or_default();

        TodoSort::new(field, order)
    }
}

fn narrowing(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .filter(|v| !v.is_empty() && *v != MATCH_ALL)
        .map(str::to_string)
}
