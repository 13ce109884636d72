use crate::error::{Error, Result};
use crate::expression::compiler::Compiler;
use crate::expression::condition::{Condition, ConditionSet, WhereClause};
use crate::expression::ExpressionKind;
use crate::value::Item;
use crate::{client, codec, key, read, transport};

use serde::Serialize;

/// One page of query results.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryOutput {
    /// The matched items, in sort key order.
    pub items: Vec<Item>,
    /// Pagination cursor when more results remain.
    pub last_evaluated_key: Option<Item>,
}

/// Query operation.
///
/// The partition key is derived from the entity's key pattern and the given
/// attributes; the optional sort key condition ranges over the derived sort
/// key string. Filters, the key condition and the projection are compiled
/// into disjoint placeholder namespaces so their maps merge without
/// collisions.
///
/// ```rust,no_run
/// use dynamodb_intent::expression::condition;
/// use dynamodb_intent::{client, read};
///
/// # async fn example(client: &client::Client) -> dynamodb_intent::error::Result<()> {
/// let query = read::query::Query::<String> {
///     attributes: [("user_id".to_string(), "42".into())].into_iter().collect(),
///     entity: "order".to_string(),
///     sort_key_condition: Some(condition::Condition::BeginsWith("ORDER#".to_string())),
///     ..Default::default()
/// };
/// query.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query<T> {
    /// Attributes the partition key is derived from.
    pub attributes: Item,
    /// The registered entity type to query.
    pub entity: String,
    /// Filter applied server-side after the key condition.
    pub filter: Option<ConditionSet<T>>,
    /// Secondary index to query instead of the base table.
    pub index_name: Option<String>,
    /// Additional read arguments (pagination, limit, projection, order).
    pub multiple_read_args: read::common::MultipleReadArgs,
    /// Optional condition ranging over the derived sort key string.
    pub sort_key_condition: Option<Condition<String>>,
}

impl<T: Serialize> Query<T> {
    fn into_request(
        self,
        pattern: &key::EntityPattern,
        table_name: &str,
    ) -> Result<transport::QueryRequest> {
        let key_pattern = match &self.index_name {
            Some(index_name) => {
                pattern
                    .indexes
                    .get(index_name)
                    .ok_or_else(|| Error::Validation {
                        message: format!("no index named `{index_name}` on this entity"),
                        fields: Vec::new(),
                    })?
            }
            None => &pattern.key,
        };
        let partition_key = key_pattern.partition.render(&self.attributes)?;
        let mut key_compiler = Compiler::new(ExpressionKind::KeyCondition);
        key_compiler.push(WhereClause::new(
            key_pattern.partition.attribute.clone(),
            Condition::Equals(partition_key),
        ))?;
        if let Some(condition) = self.sort_key_condition {
            let sort = key_pattern.sort.as_ref().ok_or_else(|| Error::Validation {
                message: "sort key condition on an entity without a sort key".to_string(),
                fields: Vec::new(),
            })?;
            key_compiler.push(WhereClause::new(sort.attribute.clone(), condition))?;
        }
        let mut expression_attribute_names = None;
        let mut expression_attribute_values = None;
        let key_condition_expression = key_compiler.build().merge_into(
            &mut expression_attribute_names,
            &mut expression_attribute_values,
        );
        let filter_expression = match self.filter {
            Some(filter) => {
                let mut compiler = Compiler::new(ExpressionKind::Filter);
                compiler.push_set(filter)?;
                let compiled = compiler.build();
                if compiled.is_empty() {
                    None
                } else {
                    Some(compiled.merge_into(
                        &mut expression_attribute_names,
                        &mut expression_attribute_values,
                    ))
                }
            }
            None => None,
        };
        let (projection_names, projection_expression) =
            read::common::compile_projection(self.multiple_read_args.projection);
        if let Some(projection_names) = projection_names {
            expression_attribute_names
                .get_or_insert_default()
                .extend(projection_names);
        }
        Ok(transport::QueryRequest {
            consistent_read: self.multiple_read_args.consistent_read,
            exclusive_start_key: self
                .multiple_read_args
                .exclusive_start_key
                .map(codec::marshal_item),
            expression_attribute_names,
            expression_attribute_values,
            filter_expression,
            index_name: self.index_name,
            key_condition_expression,
            limit: self.multiple_read_args.limit,
            projection_expression,
            scan_index_forward: self.multiple_read_args.scan_index_forward,
            table_name: table_name.to_string(),
        })
    }

    /// Execute the query operation.
    #[tracing::instrument(name = "dynamodb_intent.query", skip_all, err)]
    pub async fn send(self, client: &client::Client) -> Result<QueryOutput> {
        let pattern = client.entity(&self.entity)?;
        let request = self.into_request(pattern, client.table_name())?;
        let response = client.send(transport::Request::Query(request)).await?;
        Ok(QueryOutput {
            items: response
                .items
                .unwrap_or_default()
                .into_iter()
                .map(codec::unmarshal_item)
                .collect(),
            last_evaluated_key: response.last_evaluated_key.map(codec::unmarshal_item),
        })
    }
}
