use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, Utc};
use domain::{Priority, Todo, TodoChanges, TodoError, TodoId};
use std::collections::HashMap;

/// Value stored in the `EntityType` attribute of every Todo item.
pub const TODO_ENTITY_TYPE: &str = "Todo";
const TODO_SORT_KEY: &str = "TODO";

pub type Item = HashMap<String, AttributeValue>;

/// Primary key of the item holding `id`.
pub fn todo_key(id: &TodoId) -> Item {
    let mut key = HashMap::new();
    key.insert("PK".to_string(), AttributeValue::S(format!("TODO#{id}")));
    key.insert("SK".to_string(), AttributeValue::S(TODO_SORT_KEY.to_string()));
    key
}

pub fn todo_to_item(todo: &Todo) -> Item {
    let mut item = todo_key(&todo.id);

    item.insert(
        "EntityType".to_string(),
        AttributeValue::S(TODO_ENTITY_TYPE.to_string()),
    );
    item.insert("Id".to_string(), AttributeValue::S(todo.id.to_string()));
    item.insert("Title".to_string(), AttributeValue::S(todo.title.clone()));
    if let Some(description) = &todo.description {
        item.insert(
            "Description".to_string(),
            AttributeValue::S(description.clone()),
        );
    }
    item.insert("Completed".to_string(), AttributeValue::Bool(todo.completed));
    item.insert(
        "Priority".to_string(),
        AttributeValue::S(todo.priority.as_str().to_string()),
    );
    item.insert("Category".to_string(), AttributeValue::S(todo.category.clone()));
    if let Some(due_date) = todo.due_date {
        item.insert("DueDate".to_string(), AttributeValue::S(due_date.to_rfc3339()));
    }
    item.insert(
        "CreatedAt".to_string(),
        AttributeValue::S(todo.created_at.to_rfc3339()),
    );
    item.insert(
        "UpdatedAt".to_string(),
        AttributeValue::S(todo.updated_at.to_rfc3339()),
    );

    item
}

/// `UpdateItem` expression touching only the attributes named by a change set.
#[derive(Debug, Default)]
pub struct TodoUpdate {
    set: Vec<String>,
    remove: Vec<String>,
    names: HashMap<String, String>,
    values: Item,
}

impl TodoUpdate {
    /// `updated` supplies the normalized values; `changes` decides which attributes are written.
    /// A cleared optional field becomes a `REMOVE`. `UpdatedAt` is always set.
    pub fn new(changes: &TodoChanges, updated: &Todo) -> Self {
        let mut update = Self::default();

        if changes.title.is_some() {
            update.set("Title", AttributeValue::S(updated.title.clone()));
        }
        if changes.description.is_some() {
            match &updated.description {
                Some(description) => {
                    update.set("Description", AttributeValue::S(description.clone()))
                }
                None => update.remove("Description"),
            }
        }
        if changes.completed.is_some() {
            update.set("Completed", AttributeValue::Bool(updated.completed));
        }
        if changes.priority.is_some() {
            update.set(
                "Priority",
                AttributeValue::S(updated.priority.as_str().to_string()),
            );
        }
        if changes.category.is_some() {
            update.set("Category", AttributeValue::S(updated.category.clone()));
        }
        if changes.due_date.is_some() {
            match updated.due_date {
                Some(due_date) => update.set("DueDate", AttributeValue::S(due_date.to_rfc3339())),
                None => update.remove("DueDate"),
            }
        }
        update.set(
            "UpdatedAt",
            AttributeValue::S(updated.updated_at.to_rfc3339()),
        );

        update
    }

    fn set(&mut self, attribute: &str, value: AttributeValue) {
        self.names
            .insert(format!("#{attribute}"), attribute.to_string());
        self.values.insert(format!(":{attribute}"), value);
        self.set.push(format!("#{attribute} = :{attribute}"));
    }

    fn remove(&mut self, attribute: &str) {
        self.names
            .insert(format!("#{attribute}"), attribute.to_string());
        self.remove.push(format!("#{attribute}"));
    }

    pub fn expression(&self) -> String {
        let mut clauses = Vec::new();
        if !self.set.is_empty() {
            clauses.push(format!("SET {}", self.set.join(", ")));
        }
        if !self.remove.is_empty() {
            clauses.push(format!("REMOVE {}", self.remove.join(", ")));
        }
        clauses.join(" ")
    }

    /// Expression, attribute names and attribute values, ready for the request builder.
    pub fn into_parts(self) -> (String, HashMap<String, String>, Item) {
        let expression = self.expression();
        (expression, self.names, self.values)
    }
}

pub fn item_to_todo(item: &Item) -> Result<Todo, TodoError> {
    let id = required_string(item, "Id")?;

    Ok(Todo {
        id: TodoId::parse(&id)?,
        title: required_string(item, "Title")?,
        description: optional_string(item, "Description"),
        completed: item
            .get("Completed")
            .and_then(|v| v.as_bool().ok())
            .copied()
            .ok_or_else(|| malformed("Completed"))?,
        priority: required_string(item, "Priority")?
            .parse::<Priority>()
            .map_err(|e| TodoError::Store(e.to_string()))?,
        category: required_string(item, "Category")?,
        due_date: optional_string(item, "DueDate")
            .map(|s| parse_timestamp(&s, "DueDate"))
            .transpose()?,
        created_at: parse_timestamp(&required_string(item, "CreatedAt")?, "CreatedAt")?,
        updated_at: parse_timestamp(&required_string(item, "UpdatedAt")?, "UpdatedAt")?,
    })
}

fn optional_string(item: &Item, name: &str) -> Option<String> {
    item.get(name).and_then(|v| v.as_s().ok()).cloned()
}

fn required_string(item: &Item, name: &str) -> Result<String, TodoError> {
    optional_string(item, name).ok_or_else(|| malformed(name))
}

fn parse_timestamp(value: &str, name: &str) -> Result<DateTime<Utc>, TodoError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| malformed(name))
}

fn malformed(name: &str) -> TodoError {
    TodoError::Store(format!("Missing or invalid attribute: {name}"))
}
