use crate::error::Result;
use crate::expression::condition::ConditionSet;
use crate::value::Item;
use crate::{client, key, transport, write};

use serde::Serialize;

/// Delete item operation.
///
/// The primary key is derived from the entity's key pattern; an optional
/// condition turns the delete into a guarded write.
///
/// ```rust,no_run
/// use dynamodb_intent::{client, write};
///
/// # async fn example(client: &client::Client) -> dynamodb_intent::error::Result<()> {
/// let delete_item = write::delete_item::DeleteItem::<String> {
///     attributes: [("user_id".to_string(), "42".into())].into_iter().collect(),
///     entity: "user".to_string(),
///     ..Default::default()
/// };
/// delete_item.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeleteItem<T> {
    /// Attributes the primary key is derived from.
    pub attributes: Item,
    /// Condition that must hold for the delete to be accepted.
    pub condition: Option<ConditionSet<T>>,
    /// The registered entity type to delete.
    pub entity: String,
}

impl<T: Serialize> DeleteItem<T> {
    fn into_request(
        self,
        pattern: &key::EntityPattern,
        table_name: &str,
    ) -> Result<transport::DeleteItemRequest> {
        let key = pattern.key_attribute_map(&self.attributes)?;
        let mut expression_attribute_names = None;
        let mut expression_attribute_values = None;
        let condition_expression = write::common::compile_condition(self.condition)?
            .map(|compiled| {
                compiled.merge_into(
                    &mut expression_attribute_names,
                    &mut expression_attribute_values,
                )
            });
        Ok(transport::DeleteItemRequest {
            condition_expression,
            expression_attribute_names,
            expression_attribute_values,
            key,
            table_name: table_name.to_string(),
        })
    }

    /// Execute the delete item operation.
    #[tracing::instrument(name = "dynamodb_intent.delete_item", skip_all, err)]
    pub async fn send(self, client: &client::Client) -> Result<()> {
        let pattern = client.entity(&self.entity)?;
        let request = self.into_request(pattern, client.table_name())?;
        client.send(transport::Request::DeleteItem(request)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::expression::condition::{Condition, WhereClause};
    use aws_sdk_dynamodb::types;
    use rstest::rstest;
    use std::collections;

    fn user_pattern() -> key::EntityPattern {
        key::EntityPattern::new(key::KeyPattern {
            partition: key::KeySpec {
                attribute: "pk".to_string(),
                segments: vec![
                    key::Segment::literal("USER#"),
                    key::Segment::attribute("user_id"),
                ],
            },
            sort: Some(key::KeySpec {
                attribute: "sk".to_string(),
                segments: vec![key::Segment::literal("PROFILE")],
            }),
        })
    }

    #[rstest]
    fn test_delete_derives_the_primary_key() {
        let delete_item = DeleteItem::<String> {
            attributes: [("user_id".to_string(), "42".into())].into_iter().collect(),
            condition: None,
            entity: "user".to_string(),
        };
        let request = delete_item
            .into_request(&user_pattern(), "app-table")
            .unwrap();
        assert_eq!(
            request.key,
            collections::HashMap::from([
                (
                    "pk".to_string(),
                    types::AttributeValue::S("USER#42".to_string())
                ),
                (
                    "sk".to_string(),
                    types::AttributeValue::S("PROFILE".to_string())
                ),
            ])
        );
        assert_eq!(request.condition_expression, None);
    }

    #[rstest]
    fn test_condition_guards_the_delete() {
        let delete_item = DeleteItem {
            attributes: [("user_id".to_string(), "42".into())].into_iter().collect(),
            condition: Some(ConditionSet::all(vec![WhereClause::new(
                "status",
                Condition::Equals("INACTIVE"),
            )])),
            entity: "user".to_string(),
        };
        let request = delete_item
            .into_request(&user_pattern(), "app-table")
            .unwrap();
        assert_eq!(request.condition_expression, Some("#n0 = :v0".to_string()));
        assert_eq!(
            request.expression_attribute_values.unwrap()[":v0"],
            types::AttributeValue::S("INACTIVE".to_string())
        );
    }
}
