use crate::errors::{DomainError, TodoError, ValidationErrors};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub const TITLE_MAX_LEN: usize = 200;
pub const DESCRIPTION_MAX_LEN: usize = 1000;
pub const CATEGORY_MAX_LEN: usize = 50;
pub const DEFAULT_CATEGORY: &str = "general";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// Accepts any ULID string, including lowercase, and stores its canonical uppercase form.
    pub fn parse(id: &str) -> Result<Self, DomainError> {
        ulid::Ulid::from_string(id)
            .map(|ulid| Self(ulid.to_string()))
            .map_err(|_| DomainError::InvalidTodoId(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn timestamp_ms(&self) -> Option<u64> {
        ulid::Ulid::from_string(&self.0)
            .ok()
            .map(|ulid| ulid.timestamp_ms())
    }
}

impl Default for TodoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TodoId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Ordering used when sorting by priority.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(DomainError::InvalidPriority(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub completed: bool,
    pub priority: Priority,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// Flips `completed` and refreshes `updated_at`.
    pub fn toggle(&mut self, now: DateTime<Utc>) {
        self.completed = !self.completed;
        self.touch(now);
    }

    /// Moves `updated_at` forward. It always advances, even when the clock has not.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::milliseconds(1)
        };
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < now)
    }
}

/// Body of a create request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewTodo {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

impl NewTodo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Validates the input and builds the stored record. `created_at` and `updated_at` are both `now`.
    pub fn into_todo(self, id: TodoId, now: DateTime<Utc>) -> Result<Todo, TodoError> {
        let mut errors = ValidationErrors::default();

        let title = normalize_title(self.title, &mut errors);
        let description = normalize_description(self.description, &mut errors);
        let category = match self.category {
            Some(category) => normalize_category(category, &mut errors),
            None => DEFAULT_CATEGORY.to_string(),
        };

        errors.into_result()?;

        Ok(Todo {
            id,
            title,
            description,
            completed: self.completed,
            priority: self.priority.unwrap_or_default(),
            category,
            due_date: self.due_date,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Body of an update request. Absent fields are left untouched; `description`
/// and `dueDate` may be sent as `null` to clear them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TodoChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl TodoChanges {
    /// Merges the changes into a copy of `current`, re-validates it and refreshes `updated_at`.
    pub fn apply(self, current: &Todo, now: DateTime<Utc>) -> Result<Todo, TodoError> {
        let mut errors = ValidationErrors::default();
        let mut todo = current.clone();

        if let Some(title) = self.title {
            todo.title = normalize_title(title, &mut errors);
        }
        if let Some(description) = self.description {
            todo.description = normalize_description(description, &mut errors);
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
        if let Some(priority) = self.priority {
            todo.priority = priority;
        }
        if let Some(category) = self.category {
            todo.category = normalize_category(category, &mut errors);
        }
        if let Some(due_date) = self.due_date {
            todo.due_date = due_date;
        }

        errors.into_result()?;

        todo.touch(now);
        Ok(todo)
    }
}

// Distinguishes an explicit `null` (Some(None)) from a missing field (None).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn normalize_title(title: String, errors: &mut ValidationErrors) -> String {
    let title = title.trim().to_string();
    if title.is_empty() {
        errors.add("title", "title is required");
    } else if title.chars().count() > TITLE_MAX_LEN {
        errors.add(
            "title",
            format!("title must be at most {TITLE_MAX_LEN} characters"),
        );
    }
    title
}

fn normalize_description(
    description: Option<String>,
    errors: &mut ValidationErrors,
) -> Option<String> {
    let description = description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())?;
    if description.chars().count() > DESCRIPTION_MAX_LEN {
        errors.add(
            "description",
            format!("description must be at most {DESCRIPTION_MAX_LEN} characters"),
        );
    }
    Some(description)
}

fn normalize_category(category: String, errors: &mut ValidationErrors) -> String {
    let category = category.trim().to_string();
    if category.is_empty() {
        errors.add("category", "category cannot be empty");
    } else if category.chars().count() > CATEGORY_MAX_LEN {
        errors.add(
            "category",
            format!("category must be at most {CATEGORY_MAX_LEN} characters"),
        );
    }
    category
}
