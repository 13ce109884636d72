use crate::error::Result;
use crate::expression::condition::ConditionSet;
use crate::value::Item;
use crate::{client, codec, key, transport, write};

use serde::Serialize;

/// Put item operation.
///
/// Derives every key for the item, stamps the key columns into it and stores
/// the full item. An optional condition turns the put into a guarded write;
/// a failed guard surfaces as [`crate::error::Error::ConditionalCheckFailed`].
///
/// ```rust,no_run
/// use dynamodb_intent::expression::condition;
/// use dynamodb_intent::{client, write};
///
/// # async fn example(client: &client::Client) -> dynamodb_intent::error::Result<()> {
/// let put_item = write::put_item::PutItem::<String> {
///     attributes: [
///         ("user_id".to_string(), "42".into()),
///         ("name".to_string(), "John".into()),
///     ]
///     .into_iter()
///     .collect(),
///     condition: Some(condition::ConditionSet::all(vec![
///         condition::WhereClause::new("pk", condition::Condition::NotExists),
///     ])),
///     entity: "user".to_string(),
/// };
/// put_item.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PutItem<T> {
    /// The item's attributes; derived key columns are stamped on top.
    pub attributes: Item,
    /// Condition that must hold for the write to be accepted.
    pub condition: Option<ConditionSet<T>>,
    /// The registered entity type to write.
    pub entity: String,
}

impl<T: Serialize> PutItem<T> {
    fn into_request(
        self,
        pattern: &key::EntityPattern,
        table_name: &str,
    ) -> Result<transport::PutItemRequest> {
        let mut attributes = self.attributes;
        pattern.stamp(&mut attributes)?;
        let mut expression_attribute_names = None;
        let mut expression_attribute_values = None;
        let condition_expression = write::common::compile_condition(self.condition)?
            .map(|compiled| {
                compiled.merge_into(
                    &mut expression_attribute_names,
                    &mut expression_attribute_values,
                )
            });
        Ok(transport::PutItemRequest {
            condition_expression,
            expression_attribute_names,
            expression_attribute_values,
            item: codec::marshal_item(attributes),
            table_name: table_name.to_string(),
        })
    }

    /// Execute the put item operation.
    #[tracing::instrument(name = "dynamodb_intent.put_item", skip_all, err)]
    pub async fn send(self, client: &client::Client) -> Result<()> {
        let pattern = client.entity(&self.entity)?;
        let request = self.into_request(pattern, client.table_name())?;
        client.send(transport::Request::PutItem(request)).await?;
        Ok(())
    }
}
