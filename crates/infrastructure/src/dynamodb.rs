use crate::models::{item_to_todo, todo_key, todo_to_item, TodoUpdate, TODO_ENTITY_TYPE};
use crate::store::{not_found, TodoStore};
use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, BillingMode, KeySchemaElement, KeyType, ReturnValue,
    ScalarAttributeType,
};
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, Utc};
use domain::{
    group_count, GroupCounts, GroupField, NewTodo, Todo, TodoChanges, TodoError, TodoFilter,
    TodoId, TodoSort, TodoStats,
};
use shared::Config;
use tracing::{debug, info};

#[derive(Clone)]
pub struct DynamoDbClient {
    client: Client,
    table_name: String,
}

impl DynamoDbClient {
    /// Loads AWS settings from the environment. `dynamodb_endpoint` overrides the service
    /// endpoint, e.g. for DynamoDB Local.
    pub async fn new(config: &Config) -> Self {
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let mut builder = aws_sdk_dynamodb::config::Builder::from(&aws_config);
        if let Some(endpoint) = &config.dynamodb_endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Self {
            client: Client::from_conf(builder.build()),
            table_name: config.dynamodb_table.clone(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Creates the table with the `PK`/`SK` key schema unless it already exists.
    pub async fn create_table_if_missing(&self) -> Result<(), TodoError> {
        match self
            .client
            .describe_table()
            .table_name(&self.table_name)
            .send()
            .await
        {
            Ok(_) => return Ok(()),
            Err(err) => {
                let err = err.into_service_error();
                if !err.is_resource_not_found_exception() {
                    return Err(store_error(err));
                }
            }
        }

        let key_attribute = |name: &str| {
            AttributeDefinition::builder()
                .attribute_name(name)
                .attribute_type(ScalarAttributeType::S)
                .build()
                .map_err(store_error)
        };
        let key_element = |name: &str, key_type: KeyType| {
            KeySchemaElement::builder()
                .attribute_name(name)
                .key_type(key_type)
                .build()
                .map_err(store_error)
        };

        self.client
            .create_table()
            .table_name(&self.table_name)
            .attribute_definitions(key_attribute("PK")?)
            .attribute_definitions(key_attribute("SK")?)
            .key_schema(key_element("PK", KeyType::Hash)?)
            .key_schema(key_element("SK", KeyType::Range)?)
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await
            .map_err(store_error)?;

        info!(table = %self.table_name, "DynamoDB table created");
        Ok(())
    }
}

/// `TodoStore` backed by a DynamoDB table holding one item per Todo.
///
/// DynamoDB has no secondary query or aggregation primitive matching the list
/// and stats operations, so `find`, `count` and `group_count` scan the table
/// and evaluate filters in process.
#[derive(Clone)]
pub struct DynamoDbTodoStore {
    db: DynamoDbClient,
}

impl DynamoDbTodoStore {
    pub fn new(db: DynamoDbClient) -> Self {
        Self { db }
    }

    async fn scan_all(&self) -> Result<Vec<Todo>, TodoError> {
        let mut todos = Vec::new();
        let mut start_key = None;

        loop {
            let output = self
                .db
                .client()
                .scan()
                .table_name(self.db.table_name())
                .filter_expression("EntityType = :entity_type")
                .expression_attribute_values(
                    ":entity_type",
                    AttributeValue::S(TODO_ENTITY_TYPE.to_string()),
                )
                .consistent_read(true)
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(store_error)?;

            for item in output.items() {
                todos.push(item_to_todo(item)?);
            }

            match output.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        debug!(table = %self.db.table_name(), count = todos.len(), "scan completed");
        Ok(todos)
    }
}

#[async_trait]
impl TodoStore for DynamoDbTodoStore {
    async fn find(&self, filter: &TodoFilter, sort: &TodoSort) -> Result<Vec<Todo>, TodoError> {
        let mut todos: Vec<Todo> = self
            .scan_all()
            .await?
            .into_iter()
            .filter(|todo| filter.matches(todo))
            .collect();
        sort.sort(&mut todos);
        Ok(todos)
    }

    async fn find_by_id(&self, id: &TodoId) -> Result<Option<Todo>, TodoError> {
        let output = self
            .db
            .client()
            .get_item()
            .table_name(self.db.table_name())
            .set_key(Some(todo_key(id)))
            .consistent_read(true)
            .send()
            .await
            .map_err(store_error)?;

        output.item().map(item_to_todo).transpose()
    }

    async fn create(&self, input: NewTodo) -> Result<Todo, TodoError> {
        let todo = input.into_todo(TodoId::new(), Utc::now())?;

        self.db
            .client()
            .put_item()
            .table_name(self.db.table_name())
            .set_item(Some(todo_to_item(&todo)))
            .condition_expression("attribute_not_exists(PK)")
            .send()
            .await
            .map_err(store_error)?;

        info!(todo_id = %todo.id, "todo created");
        Ok(todo)
    }

    async fn update_by_id(&self, id: &TodoId, changes: TodoChanges) -> Result<Todo, TodoError> {
        let current = self.find_by_id(id).await?.ok_or_else(|| not_found(id))?;
        let updated = changes.clone().apply(&current, Utc::now())?;
        let (expression, names, values) = TodoUpdate::new(&changes, &updated).into_parts();

        // Writes only the attributes present in `changes`.
        let result = self
            .db
            .client()
            .update_item()
            .table_name(self.db.table_name())
            .set_key(Some(todo_key(id)))
            .update_expression(expression)
            .condition_expression("attribute_exists(PK)")
            .set_expression_attribute_names(Some(names))
            .set_expression_attribute_values(Some(values))
            .return_values(ReturnValue::AllNew)
            .send()
            .await;

        match result {
            Ok(output) => {
                let todo = output
                    .attributes()
                    .map(item_to_todo)
                    .transpose()?
                    .ok_or_else(|| not_found(id))?;
                info!(todo_id = %id, "todo updated");
                Ok(todo)
            }
            Err(err) => {
                let err = err.into_service_error();
                if err.is_conditional_check_failed_exception() {
                    Err(not_found(id))
                } else {
                    Err(store_error(err))
                }
            }
        }
    }

    async fn delete_by_id(&self, id: &TodoId) -> Result<Todo, TodoError> {
        let result = self
            .db
            .client()
            .delete_item()
            .table_name(self.db.table_name())
            .set_key(Some(todo_key(id)))
            .condition_expression("attribute_exists(PK)")
            .return_values(ReturnValue::AllOld)
            .send()
            .await;

        match result {
            Ok(output) => {
                let removed = output
                    .attributes()
                    .map(item_to_todo)
                    .transpose()?
                    .ok_or_else(|| not_found(id))?;
                info!(todo_id = %id, "todo deleted");
                Ok(removed)
            }
            Err(err) => {
                let err = err.into_service_error();
                if err.is_conditional_check_failed_exception() {
                    Err(not_found(id))
                } else {
                    Err(store_error(err))
                }
            }
        }
    }

    async fn count(&self, filter: &TodoFilter) -> Result<u64, TodoError> {
        let todos = self.scan_all().await?;
        Ok(todos.iter().filter(|todo| filter.matches(todo)).count() as u64)
    }

    async fn group_count(&self, field: GroupField) -> Result<GroupCounts, TodoError> {
        let todos = self.scan_all().await?;
        Ok(group_count(&todos, field))
    }

    async fn stats(&self, now: DateTime<Utc>) -> Result<TodoStats, TodoError> {
        let todos = self.scan_all().await?;
        Ok(TodoStats::from_todos(&todos, now))
    }

    async fn ping(&self) -> Result<(), TodoError> {
        self.db
            .client()
            .describe_table()
            .table_name(self.db.table_name())
            .send()
            .await
            .map_err(store_error)?;
        Ok(())
    }
}

fn store_error<E>(err: E) -> TodoError
where
    E: std::error::Error,
{
    TodoError::Store(DisplayErrorContext(err).to_string())
}
